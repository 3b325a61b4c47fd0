// src/config.rs
// Engine configuration: wrapped-program command lines, timeout bounds,
// and stdin pacing delays.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the automation engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Command that starts the wrapped interactive program
    pub program: String,
    /// Arguments passed to the wrapped program
    pub program_args: Vec<String>,
    /// Command that compiles the wrapped program's source (optional)
    pub compile_program: Option<String>,
    /// Arguments passed to the compile command
    pub compile_args: Vec<String>,
    /// Working directory for spawned processes
    pub working_dir: Option<PathBuf>,
    /// Upper bound for a compile session
    pub compile_timeout: Duration,
    /// Upper bound for an interactive execute session (longer: it pays a
    /// round-trip delay per supplied argument)
    pub execute_timeout: Duration,
    /// Delay between dependent stdin writes. The wrapped program is a
    /// sequential reader and emits its next prompt only after processing
    /// the previous line.
    pub write_delay: Duration,
    /// Grace delay before the terminal exit selection is written
    pub exit_grace: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "node".to_string(),
            program_args: Vec::new(),
            compile_program: None,
            compile_args: Vec::new(),
            working_dir: None,
            compile_timeout: Duration::from_secs(30),
            execute_timeout: Duration::from_secs(60),
            write_delay: Duration::from_millis(250),
            exit_grace: Duration::from_millis(500),
        }
    }
}

impl EngineConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Self::default()
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.program_args = args;
        self
    }

    pub fn with_compile_command(mut self, program: impl Into<String>, args: Vec<String>) -> Self {
        self.compile_program = Some(program.into());
        self.compile_args = args;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_timeouts(mut self, compile: Duration, execute: Duration) -> Self {
        self.compile_timeout = compile;
        self.execute_timeout = execute;
        self
    }

    pub fn with_pacing(mut self, write_delay: Duration, exit_grace: Duration) -> Self {
        self.write_delay = write_delay;
        self.exit_grace = exit_grace;
        self
    }

    /// Load overrides from DROVER_* environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DROVER_PROGRAM") {
            config.program = val;
        }
        if let Ok(val) = std::env::var("DROVER_COMPILE_PROGRAM") {
            config.compile_program = Some(val);
        }
        if let Ok(val) = std::env::var("DROVER_WORKING_DIR") {
            config.working_dir = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("DROVER_COMPILE_TIMEOUT_MS") {
            if let Ok(ms) = val.parse() {
                config.compile_timeout = Duration::from_millis(ms);
            }
        }
        if let Ok(val) = std::env::var("DROVER_EXECUTE_TIMEOUT_MS") {
            if let Ok(ms) = val.parse() {
                config.execute_timeout = Duration::from_millis(ms);
            }
        }
        if let Ok(val) = std::env::var("DROVER_WRITE_DELAY_MS") {
            if let Ok(ms) = val.parse() {
                config.write_delay = Duration::from_millis(ms);
            }
        }

        config
    }
}
