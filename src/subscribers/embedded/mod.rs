//! # Built-in subscribers
//!
//! - [`LogWriter`]: renders engine events through `tracing` (feature `logging`).

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
