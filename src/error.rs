//! Error types
//!
//! Each subsystem defines its own error next to the code that raises it;
//! they are collected here for callers that want one import.

pub use crate::ai::TargetError;
pub use crate::config::ConfigError;
pub use crate::navigation::PathError;
