//! Error types used by the engine and its command bridge.
//!
//! This module defines three enums:
//!
//! - [`BridgeError`]: a collaborator operation failed while running inside a command queue.
//! - [`EngineError`]: an engine operation was attempted without its preconditions.
//! - [`ConfigError`]: a configuration document could not be parsed.
//!
//! Bridge failures never abort a setup/teardown join; they are handed to the
//! caller's [`ErrorHandler`](crate::ErrorHandler) and published as
//! [`EventKind::BridgeFailed`](crate::EventKind::BridgeFailed).

use std::any::Any;

use thiserror::Error;

/// # Failures isolated at the command bridge.
///
/// Produced when an operation pushed through [`enqueue`](crate::bridge::enqueue)
/// returns an error, panics, or is dropped by its queue before running.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// The operation returned an error.
    #[error("{queue}: operation failed: {error}")]
    Failed {
        /// Name of the queue (or collaborator) the operation ran on.
        queue: &'static str,
        /// Rendered error chain.
        error: String,
    },

    /// The operation panicked; the panic was caught at the bridge.
    #[error("{queue}: operation panicked: {info}")]
    Panicked {
        /// Name of the queue the operation ran on.
        queue: &'static str,
        /// Panic payload, if it was a string.
        info: String,
    },

    /// The queue discarded the command without running it.
    #[error("{queue}: command dropped before it ran")]
    Dropped {
        /// Name of the queue that dropped the command.
        queue: &'static str,
    },
}

impl BridgeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use bidvisor::BridgeError;
    ///
    /// let err = BridgeError::Dropped { queue: "ad_server" };
    /// assert_eq!(err.as_label(), "bridge_dropped");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BridgeError::Failed { .. } => "bridge_failed",
            BridgeError::Panicked { .. } => "bridge_panicked",
            BridgeError::Dropped { .. } => "bridge_dropped",
        }
    }

    /// Returns a human-readable message without the queue prefix.
    pub fn as_message(&self) -> String {
        match self {
            BridgeError::Failed { error, .. } => format!("error: {error}"),
            BridgeError::Panicked { info, .. } => format!("panic: {info}"),
            BridgeError::Dropped { .. } => "dropped".to_string(),
        }
    }

    /// Name of the queue the failure was observed on.
    pub fn queue(&self) -> &'static str {
        match self {
            BridgeError::Failed { queue, .. }
            | BridgeError::Panicked { queue, .. }
            | BridgeError::Dropped { queue } => queue,
        }
    }
}

/// # Errors returned by engine operations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// `setup`/`teardown` was called before any configuration was set.
    ///
    /// Check [`Engine::is_ready`](crate::Engine::is_ready) first.
    #[error("no configuration set")]
    ConfigurationMissing,
}

impl EngineError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EngineError::ConfigurationMissing => "engine_configuration_missing",
        }
    }
}

/// # Errors produced while loading configuration.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The document is not valid JSON or does not match the configuration shape.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Renders a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
