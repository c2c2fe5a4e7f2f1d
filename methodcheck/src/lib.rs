#![warn(missing_docs)]
//! # Methodcheck
//!
//! Comparative behavioral verification: checks that a candidate implementation
//! of a named operation has the reference's signature, then runs both against
//! the same inputs under a deadline and classifies every run.
//!
//! - **Header check**: presence, parameter types, return type, visibility
//! - **Reference-first execution**: a broken reference yields `Error`, never a candidate failure
//! - **Deadlines**: a hanging candidate yields `InfiniteLoop` without stalling the session
//! - **Registration**: `#[member]` builds member tables without reflection
//!
//! ## Quick Start
//!
//! ```ignore
//! use methodcheck::prelude::*;
//!
//! #[member(owner = "Solution", name = "solveTrainProblem")]
//! fn solve_reference(a: f64, b: f64, c: f64) -> f64 { ... }
//!
//! #[member(owner = "Practice", name = "solveTrainProblem")]
//! fn solve_candidate(a: f64, b: f64, c: f64) -> f64 { ... }
//!
//! let results = SessionBuilder::from_registry("Practice", "Solution", "solveTrainProblem")?
//!     .case(test_case![0.0, 0.0, 0.0])
//!     .case(test_case![-100.0, 100.0, 0.3])
//!     .build()?
//!     .run_all_tests_then_end()?;
//! ```
//!
//! ## Manual Member Tables
//!
//! ```ignore
//! let candidates = MemberTable::new("Practice")
//!     .with_member(Member::from_fn("add", |a: i32, b: i32| a + b));
//! let session = SessionBuilder::new(candidates, Member::from_fn("add", reference_add))
//!     .case(test_case![1, 2])
//!     .build()?;
//! ```

// Re-export core types
pub use methodcheck_core::{
    ArgumentMismatch, ConversionError, FromValue, IntoMember, IntoValue, InvokeError, Invoker,
    Member, MemberDef, MemberTable, Primitive, ResultKind, ResultSummary, SignatureDescriptor,
    SignatureError, Tagged, TestCase, TestCaseGenerator, TestResult, TypeTag, Value, Visibility,
    summarize, test_case, validate_arguments, validate_signature,
};

// Re-export macros
pub use methodcheck_macros::member;

// Re-export runner types
pub use methodcheck_runner::{
    AccessConfig, BoundedExecutor, CheckConfig, ComparisonConfig, ExecutorError,
    InvocationRunner, NullReturnPolicy, RunnerConfig, SessionBuilder, SessionConfig,
    SessionError, SessionState, TaskFailure, TaskHandle, TaskOutcome, VerificationSession,
};

/// Internal re-exports for macro use
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Member, MemberTable, SessionBuilder, SessionConfig, TestCase, TestResult, Value, member,
        summarize, test_case,
    };
}
