//! Result Taxonomy
//!
//! Every header check and every test case produces exactly one [`TestResult`].
//! The set is closed: successes, candidate failures, and [`TestResult::Error`],
//! which is reserved for a broken reference and never blames the candidate.
//!
//! ```text
//! TestResult
//! ├── Success: HeaderSuccess, TestCaseSuccess
//! ├── Failure
//! │   ├── header: MethodNotFound, WrongParameterTypes, WrongReturnType, MethodSecurity
//! │   └── case:   TestCaseFailure, InfiniteLoop
//! └── Error
//! ```

use crate::case::TestCase;
use crate::value::{TypeTag, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one header check or one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestResult {
    /// Candidate member exists with the reference's signature
    HeaderSuccess {
        /// Operation name
        method: String,
    },
    /// Candidate output matched the reference
    TestCaseSuccess {
        /// Operation name
        method: String,
        /// Inputs of the case
        arguments: TestCase,
        /// Output shared by candidate and reference
        output: Value,
    },
    /// No member of that name on the candidate
    MethodNotFound {
        /// Operation name
        method: String,
    },
    /// Parameter types differ in length or in any position
    WrongParameterTypes {
        /// Operation name
        method: String,
        /// Reference parameter types
        expected: Vec<TypeTag>,
        /// Candidate parameter types
        actual: Vec<TypeTag>,
    },
    /// Parameters match but the return type differs
    WrongReturnType {
        /// Operation name
        method: String,
        /// Reference return type
        expected: TypeTag,
        /// Candidate return type
        actual: TypeTag,
    },
    /// Candidate is not invocable and access cannot be forced
    MethodSecurity {
        /// Operation name
        method: String,
    },
    /// Candidate output differed from the reference, or the candidate panicked (`actual: None`)
    TestCaseFailure {
        /// Operation name
        method: String,
        /// Inputs of the case
        arguments: TestCase,
        /// Reference output
        expected: Value,
        /// Candidate output, `None` if it panicked
        actual: Option<Value>,
    },
    /// Candidate did not finish before the deadline
    InfiniteLoop {
        /// Operation name
        method: String,
        /// Inputs of the case
        arguments: TestCase,
        /// Reference output
        expected: Value,
    },
    /// Reference failed or timed out
    Error {
        /// Operation name
        method: String,
    },
}

/// Coarse classification of a [`TestResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    /// Header or case passed
    Success,
    /// Candidate at fault
    Failure,
    /// Reference at fault
    Error,
}

impl TestResult {
    /// Success, candidate failure, or reference error.
    pub fn kind(&self) -> ResultKind {
        match self {
            TestResult::HeaderSuccess { .. } | TestResult::TestCaseSuccess { .. } => {
                ResultKind::Success
            }
            TestResult::MethodNotFound { .. }
            | TestResult::WrongParameterTypes { .. }
            | TestResult::WrongReturnType { .. }
            | TestResult::MethodSecurity { .. }
            | TestResult::TestCaseFailure { .. }
            | TestResult::InfiniteLoop { .. } => ResultKind::Failure,
            TestResult::Error { .. } => ResultKind::Error,
        }
    }

    /// Whether the header or case passed.
    pub fn is_success(&self) -> bool {
        self.kind() == ResultKind::Success
    }

    /// Whether the candidate is at fault.
    pub fn is_failure(&self) -> bool {
        self.kind() == ResultKind::Failure
    }

    /// Whether this result came from the header check rather than a test case.
    pub fn is_header(&self) -> bool {
        matches!(
            self,
            TestResult::HeaderSuccess { .. }
                | TestResult::MethodNotFound { .. }
                | TestResult::WrongParameterTypes { .. }
                | TestResult::WrongReturnType { .. }
                | TestResult::MethodSecurity { .. }
        )
    }

    /// Name of the operation under test.
    pub fn method(&self) -> &str {
        match self {
            TestResult::HeaderSuccess { method }
            | TestResult::TestCaseSuccess { method, .. }
            | TestResult::MethodNotFound { method }
            | TestResult::WrongParameterTypes { method, .. }
            | TestResult::WrongReturnType { method, .. }
            | TestResult::MethodSecurity { method }
            | TestResult::TestCaseFailure { method, .. }
            | TestResult::InfiniteLoop { method, .. }
            | TestResult::Error { method } => method,
        }
    }

    /// Arguments of the test case, if this is a per-case result.
    ///
    /// `Error` carries none: it is reported without blaming a particular input.
    pub fn arguments(&self) -> Option<&TestCase> {
        match self {
            TestResult::TestCaseSuccess { arguments, .. }
            | TestResult::TestCaseFailure { arguments, .. }
            | TestResult::InfiniteLoop { arguments, .. } => Some(arguments),
            _ => None,
        }
    }
}

struct TypeList<'a>(&'a [TypeTag]);

impl fmt::Display for TypeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", tag)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestResult::HeaderSuccess { method } => {
                write!(f, "The header for <{method}> looks good!")
            }
            TestResult::TestCaseSuccess {
                method,
                arguments,
                output,
            } => write!(f, "Success! <{method}{arguments}> returned <{output}>"),
            TestResult::MethodNotFound { method } => {
                write!(f, "Failure! The method <{method}> couldn't be found")
            }
            TestResult::WrongParameterTypes {
                method,
                expected,
                actual,
            } => write!(
                f,
                "Failure! <{method}> should have the parameter types <{}> but has <{}>",
                TypeList(expected),
                TypeList(actual)
            ),
            TestResult::WrongReturnType {
                method,
                expected,
                actual,
            } => write!(
                f,
                "Failure! <{method}> should have return type <{expected}> but has <{actual}>"
            ),
            TestResult::MethodSecurity { method } => {
                write!(f, "Failure! <{method}> should have public visibility")
            }
            TestResult::TestCaseFailure {
                method,
                arguments,
                expected,
                actual: Some(actual),
            } => write!(
                f,
                "Failure! <{method}{arguments}> should output <{expected}> but instead outputs <{actual}>"
            ),
            TestResult::TestCaseFailure {
                method,
                arguments,
                expected,
                actual: None,
            } => write!(
                f,
                "Failure! <{method}{arguments}> should output <{expected}> but panicked"
            ),
            TestResult::InfiniteLoop {
                method,
                arguments,
                expected,
            } => write!(
                f,
                "Failure! <{method}{arguments}> should output <{expected}> but took too long, is there an infinite loop?"
            ),
            TestResult::Error { method } => write!(
                f,
                "There was an error (not your fault) trying to run <{method}>"
            ),
        }
    }
}

/// Counts over a result sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    /// Header check passed
    pub header_passed: bool,
    /// Test cases whose output matched
    pub passed: usize,
    /// Test cases with a wrong output or a candidate panic; header failures
    /// only clear `header_passed`
    pub failed: usize,
    /// Candidate deadline exceeded
    pub timed_out: usize,
    /// Reference failures
    pub errors: usize,
}

impl ResultSummary {
    /// Header passed and every case succeeded.
    pub fn all_passed(&self) -> bool {
        self.header_passed && self.failed == 0 && self.timed_out == 0 && self.errors == 0
    }

    /// Number of test cases that ran
    pub fn total_cases(&self) -> usize {
        self.passed + self.failed + self.timed_out + self.errors
    }
}

/// Aggregate a session's results for grading.
pub fn summarize(results: &[TestResult]) -> ResultSummary {
    let mut summary = ResultSummary::default();

    for result in results {
        match result {
            TestResult::HeaderSuccess { .. } => summary.header_passed = true,
            TestResult::TestCaseSuccess { .. } => summary.passed += 1,
            TestResult::MethodNotFound { .. }
            | TestResult::WrongParameterTypes { .. }
            | TestResult::WrongReturnType { .. }
            | TestResult::MethodSecurity { .. } => summary.header_passed = false,
            TestResult::TestCaseFailure { .. } => summary.failed += 1,
            TestResult::InfiniteLoop { .. } => summary.timed_out += 1,
            TestResult::Error { .. } => summary.errors += 1,
        }
    }

    summary
}
