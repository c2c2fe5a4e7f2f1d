//! Invocation Runner
//!
//! Runs one test case against the reference and the candidate and classifies
//! the pair of outcomes into a [`TestResult`].
//!
//! The reference is awaited first. A broken reference yields
//! [`TestResult::Error`] and the candidate's outcome is never inspected.

use crate::config::NullReturnPolicy;
use crate::error::SessionError;
use crate::executor::{BoundedExecutor, ExecutorError, TaskFailure, TaskHandle, TaskOutcome};
use methodcheck_core::{InvokeError, Member, SignatureDescriptor, TestCase, TestResult, Value};
use tracing::{debug, warn};

type Invocation = Result<Value, InvokeError>;

/// Invokes a resolved candidate and the reference under the executor's deadline.
pub struct InvocationRunner<'a> {
    executor: &'a BoundedExecutor,
    descriptor: &'a SignatureDescriptor,
    candidate: &'a Member,
    reference: &'a Member,
    null_returns: NullReturnPolicy,
}

impl<'a> InvocationRunner<'a> {
    /// Bind a resolved candidate and the reference to an executor.
    pub fn new(
        executor: &'a BoundedExecutor,
        descriptor: &'a SignatureDescriptor,
        candidate: &'a Member,
        reference: &'a Member,
        null_returns: NullReturnPolicy,
    ) -> Self {
        Self {
            executor,
            descriptor,
            candidate,
            reference,
            null_returns,
        }
    }

    fn spawn(&self, member: &Member, case: &TestCase) -> Result<TaskHandle<Invocation>, ExecutorError> {
        let member = member.clone();
        let arguments = case.arguments().to_vec();
        self.executor.submit(move || member.invoke(&arguments))
    }

    /// Run one test case.
    ///
    /// Only argument marshalling failures on the candidate side are returned as
    /// errors; everything else is a classified result.
    pub fn run_test_case(&self, case: &TestCase) -> Result<TestResult, SessionError> {
        let method = self.descriptor.name().to_string();

        let reference = self.spawn(self.reference, case)?;
        let candidate = self.spawn(self.candidate, case)?;

        let expected = match self.executor.await_result(reference) {
            TaskOutcome::Completed(Ok(value)) => value,
            outcome => {
                warn!(
                    method = %method,
                    case = %case,
                    outcome = %describe_reference_failure(&outcome),
                    "reference failed; result is not attributable to the candidate"
                );
                return Ok(TestResult::Error { method });
            }
        };

        let arguments = case.clone();
        let result = match self.executor.await_result(candidate) {
            TaskOutcome::Cancelled => {
                warn!(method = %method, case = %case, "candidate exceeded the deadline");
                TestResult::InfiniteLoop {
                    method,
                    arguments,
                    expected,
                }
            }
            TaskOutcome::Raised(TaskFailure::Panicked { message }) => {
                debug!(method = %method, case = %case, panic = %message, "candidate panicked");
                TestResult::TestCaseFailure {
                    method,
                    arguments,
                    expected,
                    actual: None,
                }
            }
            TaskOutcome::Raised(TaskFailure::Lost) => {
                warn!(method = %method, case = %case, "candidate task was lost by the pool");
                TestResult::Error { method }
            }
            TaskOutcome::Completed(Err(source)) => {
                return Err(SessionError::Invocation {
                    case: arguments,
                    source,
                });
            }
            TaskOutcome::Completed(Ok(actual)) => self.compare(method, arguments, expected, actual),
        };

        debug!(method = %result.method(), case = %case, kind = ?result.kind(), "test case classified");
        Ok(result)
    }

    fn compare(&self, method: String, arguments: TestCase, expected: Value, actual: Value) -> TestResult {
        if self.descriptor.is_void() || actual == expected {
            return TestResult::TestCaseSuccess {
                method,
                arguments,
                output: actual,
            };
        }

        if actual.is_null() && self.null_returns == NullReturnPolicy::Lenient {
            warn!(
                method = %method,
                case = %arguments,
                expected = %expected,
                "accepting null candidate return under lenient policy"
            );
            return TestResult::TestCaseSuccess {
                method,
                arguments,
                output: actual,
            };
        }

        TestResult::TestCaseFailure {
            method,
            arguments,
            expected,
            actual: Some(actual),
        }
    }
}

fn describe_reference_failure(outcome: &TaskOutcome<Invocation>) -> String {
    match outcome {
        TaskOutcome::Completed(Ok(_)) => "completed".to_string(),
        TaskOutcome::Completed(Err(e)) => format!("invocation error: {}", e),
        TaskOutcome::Cancelled => "timed out".to_string(),
        TaskOutcome::Raised(TaskFailure::Panicked { message }) => format!("panicked: {}", message),
        TaskOutcome::Raised(TaskFailure::Lost) => "lost by the pool".to_string(),
    }
}
