#![warn(missing_docs)]
//! Methodcheck Runner - Session Execution
//!
//! This crate runs comparative verification sessions:
//! - `BoundedExecutor` fixed-width worker pool with per-task deadlines
//! - `InvocationRunner` reference-first invocation and result classification
//! - `VerificationSession` header check, test execution, teardown
//! - `CheckConfig` / `SessionConfig` loaded from `methodcheck.toml`

mod config;
mod error;
mod executor;
mod runner;
mod session;

pub use config::*;
pub use error::SessionError;
pub use executor::{BoundedExecutor, ExecutorError, TaskFailure, TaskHandle, TaskOutcome};
pub use runner::InvocationRunner;
pub use session::{SessionBuilder, SessionState, VerificationSession};
