//! Wrapped-process session driver
//!
//! Manages one spawned instance of the driven interactive program per
//! logical request.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Orchestrator                        │
//! │  • resolves the menu index for the target operation      │
//! │  • sequences selection → parameters → exit               │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                    DriverSession                         │
//! │  • spawn() - child process + both stream readers         │
//! │  • wait_for_menu() - one-shot menu latch                 │
//! │  • select()/supply()/finish() - paced stdin writes       │
//! │  • wait_exit() - deduplicated completion event           │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │              WRAPPED PROCESS (spawned)                   │
//! │  • prints numbered menu lines `<n>. <icon> <Name>`       │
//! │  • reads stdin sequentially, one prompt at a time        │
//! │  • `Exception:` marker on fatal contract errors          │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod process;
mod stream;
pub mod types;

pub use process::DriverSession;
pub use stream::{extract_exception, EXCEPTION_MARKER, SOURCE_EXTENSION};
pub use types::{
    FailureKind, SessionConfig, SessionOutcome, SessionState, StreamChunk, StreamSource,
};
