/// Lifecycle of an [`Engine`](crate::Engine).
///
/// ```text
/// Uninitialized ──setup()──► SettingUp ──► Ready ──teardown()──► TearingDown ──► Uninitialized
/// ```
///
/// Teardown returns to the initial shape; the engine can be set up again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    SettingUp,
    Ready,
    TearingDown,
}

impl LifecycleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::SettingUp => "setting_up",
            LifecycleState::Ready => "ready",
            LifecycleState::TearingDown => "tearing_down",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
