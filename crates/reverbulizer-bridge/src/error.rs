//! Error types for the bridge.

use reverbulizer_core::{ParameterError, SnapshotUnavailable};
use thiserror::Error;

/// Errors surfaced to bridge callers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    /// A parameter write was rejected by the store.
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// The spectrum snapshot could not be read this cycle. Poll again.
    #[error(transparent)]
    Unavailable(#[from] SnapshotUnavailable),

    /// No command is registered under this name.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// The command exists but its arguments have the wrong count or type.
    #[error("invalid arguments for {command}: {reason}")]
    InvalidArguments { command: String, reason: String },

    /// No pull endpoint is served at this path.
    #[error("unknown resource: {0:?}")]
    UnknownResource(String),

    /// The command queue is at capacity. Nothing was executed.
    #[error("command queue is full")]
    QueueFull,

    /// The bridge thread has stopped.
    #[error("bridge is closed")]
    Closed,

    /// The bridge thread could not be started.
    #[error("failed to spawn bridge thread: {0}")]
    Spawn(String),
}

impl BridgeError {
    pub(crate) fn invalid_arguments(command: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
