// src/lib.rs

pub mod analyzer;
pub mod config;
pub mod error;
pub mod menu;
pub mod orchestrator;
pub mod session;
pub mod timeout;

pub use analyzer::{analyze, ContractModel, Operation, Parameter, TypeTag};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use menu::{build_menu, render_prompt, resolve_index, MenuItem};
pub use orchestrator::Orchestrator;
pub use session::{DriverSession, FailureKind, SessionConfig, SessionOutcome, SessionState};
pub use timeout::{RequestKind, TimeoutGuard};
