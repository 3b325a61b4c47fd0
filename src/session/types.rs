// src/session/types.rs
// Types for driven wrapped-program sessions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

// ============================================================================
// Session state machine
// ============================================================================

/// Forward-only session state. The marker scanner and write operations may
/// only advance it, never move it backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Spawned, menu prompt not yet observed
    AwaitingMenu,
    /// Menu observed, selection write permitted
    Selecting,
    /// Selection written, parameter writes permitted
    SupplyingParameters,
    /// Exit selection written, waiting for process exit
    AwaitingExit,
    /// Process exit observed
    Completed,
    /// Fatal exception marker observed; no further writes permitted
    Failed,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingMenu => "awaiting_menu",
            Self::Selecting => "selecting",
            Self::SupplyingParameters => "supplying_parameters",
            Self::AwaitingExit => "awaiting_exit",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

// ============================================================================
// Spawn configuration
// ============================================================================

/// Per-session spawn parameters, derived from `EngineConfig` for one request
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub command: String,
    pub args: Vec<String>,
    pub working_dir: Option<PathBuf>,
    pub write_delay: Duration,
    pub exit_grace: Duration,
}

impl SessionConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
            write_delay: Duration::from_millis(250),
            exit_grace: Duration::from_millis(500),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    /// Spawn parameters for an interactive execute request
    pub fn for_execute(config: &EngineConfig) -> Self {
        Self {
            command: config.program.clone(),
            args: config.program_args.clone(),
            working_dir: config.working_dir.clone(),
            write_delay: config.write_delay,
            exit_grace: config.exit_grace,
        }
    }

    /// Spawn parameters for a compile request
    pub fn for_compile(config: &EngineConfig, program: String) -> Self {
        Self {
            command: program,
            args: config.compile_args.clone(),
            working_dir: config.working_dir.clone(),
            write_delay: config.write_delay,
            exit_grace: config.exit_grace,
        }
    }
}

// ============================================================================
// Stream plumbing
// ============================================================================

/// Which stream a captured chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamSource {
    Stdout,
    Stderr,
}

/// One captured line from the wrapped process
#[derive(Debug, Clone)]
pub struct StreamChunk {
    pub source: StreamSource,
    pub text: String,
}

// ============================================================================
// Outcome
// ============================================================================

/// Failure classification for a completed session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Menu or exit never observed within the guard's bound; process killed
    Timeout,
    /// Requested operation absent from the echoed menu; session still
    /// completed by selecting exit
    OperationNotFound,
    /// The wrapped process emitted its fatal-exception marker
    RuntimeException,
    /// Non-success exit code without a recognized exception marker
    NonZeroExit,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::OperationNotFound => "operation_not_found",
            Self::RuntimeException => "runtime_exception",
            Self::NonZeroExit => "non_zero_exit",
        }
    }
}

/// The single structured outcome every session resolves to, on every exit
/// path. Carries enough captured text to diagnose the wrapped program's
/// error without inspecting engine internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOutcome {
    pub success: bool,
    pub captured_output: String,
    pub structured_result: Option<String>,
    pub errors: Vec<String>,
    pub exit_code: Option<i32>,
    pub failure: Option<FailureKind>,
}

impl SessionOutcome {
    pub fn succeeded(captured_output: String, exit_code: i32) -> Self {
        Self {
            success: true,
            captured_output,
            structured_result: None,
            errors: Vec::new(),
            exit_code: Some(exit_code),
            failure: None,
        }
    }

    pub fn failed(kind: FailureKind, captured_output: String, exit_code: Option<i32>) -> Self {
        Self {
            success: false,
            captured_output,
            structured_result: None,
            errors: Vec::new(),
            exit_code,
            failure: Some(kind),
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    pub fn with_result(mut self, result: Option<String>) -> Self {
        self.structured_result = result;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(SessionState::Completed.is_terminal());
        assert!(SessionState::Failed.is_terminal());
        assert!(!SessionState::AwaitingMenu.is_terminal());
        assert!(!SessionState::SupplyingParameters.is_terminal());
    }

    #[test]
    fn test_outcome_constructors() {
        let ok = SessionOutcome::succeeded("menu\n".to_string(), 0);
        assert!(ok.success);
        assert_eq!(ok.exit_code, Some(0));

        let failed = SessionOutcome::failed(FailureKind::Timeout, String::new(), None)
            .with_error("session timed out");
        assert!(!failed.success);
        assert_eq!(failed.failure, Some(FailureKind::Timeout));
        assert_eq!(failed.errors.len(), 1);
    }
}
