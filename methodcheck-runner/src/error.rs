use crate::executor::ExecutorError;
use methodcheck_core::{ArgumentMismatch, InvokeError, SignatureError, TestCase};
use thiserror::Error;

/// Fatal configuration errors. These never appear in a result sequence.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An explicit case was rejected at construction
    #[error("Explicit test case #{index} {case} does not fit the signature: {source}")]
    InvalidTestCase {
        /// Position among the explicit cases
        index: usize,
        /// Offending case
        case: TestCase,
        /// Why it does not fit
        #[source]
        source: ArgumentMismatch,
    },

    /// A generated case was rejected before it ran
    #[error("Generator produced {case} in round {round}, which does not fit the signature: {source}")]
    GeneratorMismatch {
        /// Zero-based generator round
        round: usize,
        /// Offending case
        case: TestCase,
        /// Why it does not fit
        #[source]
        source: ArgumentMismatch,
    },

    /// Reference descriptor could not be built
    #[error("Invalid reference signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    /// Reference is private and private access is disabled
    #[error("Reference member `{method}` is private and private access is disabled")]
    ReferenceInaccessible {
        /// Operation name
        method: String,
    },

    /// No registered reference member with that name
    #[error("Reference member `{method}` not found on `{owner}`")]
    ReferenceNotFound {
        /// Owner searched
        owner: String,
        /// Operation name
        method: String,
    },

    /// Arguments could not be marshalled into the candidate
    #[error("Could not invoke candidate with {case}: {source}")]
    Invocation {
        /// Case being run
        case: TestCase,
        /// Marshalling failure
        #[source]
        source: InvokeError,
    },

    /// Worker pool failure
    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),

    /// Operation on a session that has ended
    #[error("Session has already ended")]
    SessionEnded,
}
