// src/error.rs
// Standardized error types for the drover engine

use thiserror::Error;

/// Main error type for the drover library
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to spawn wrapped process `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("menu prompt never observed: wrapped process closed its streams first")]
    MenuClosed,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("descriptor error: {0}")]
    Descriptor(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience type alias for Result using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// True for failures that may abort before a session object exists.
    pub fn is_spawn_failure(&self) -> bool {
        matches!(self, EngineError::Spawn { .. })
    }
}

impl From<String> for EngineError {
    fn from(s: String) -> Self {
        EngineError::Protocol(s)
    }
}
