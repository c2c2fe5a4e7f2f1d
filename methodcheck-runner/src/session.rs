//! Verification Sessions
//!
//! A session compares one candidate member table against one reference member.
//!
//! ```text
//! SessionBuilder::build()
//!   │  validate explicit cases, resolve candidate, start worker pool
//!   ▼
//! HeaderCheck ──(header failure)──────────────────┐
//!   │ HeaderSuccess                                │
//!   ▼                                              ▼
//! TestExecution: explicit cases, then N generated ──► Done (pool released)
//! ```

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::executor::BoundedExecutor;
use crate::runner::InvocationRunner;
use methodcheck_core::{
    Member, MemberTable, SignatureDescriptor, TestCase, TestCaseGenerator, TestResult,
    summarize, validate_arguments, validate_signature,
};
use tracing::{debug, info};

/// Lifecycle of a [`VerificationSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Built; header not checked yet
    HeaderCheck,
    /// Header passed; cases not run yet
    TestExecution,
    /// Finished or ended; pool released
    Done,
}

/// Collects the pieces of a session before validating them.
pub struct SessionBuilder {
    candidates: MemberTable,
    reference: Member,
    cases: Vec<TestCase>,
    generator: Option<(Box<dyn TestCaseGenerator>, usize)>,
    config: SessionConfig,
}

impl SessionBuilder {
    /// Compare the members of `candidates` against `reference`.
    pub fn new(candidates: MemberTable, reference: Member) -> Self {
        Self {
            candidates,
            reference,
            cases: Vec::new(),
            generator: None,
            config: SessionConfig::default(),
        }
    }

    /// Build candidate table and reference from the `#[member]` registry.
    pub fn from_registry(
        candidate_owner: &str,
        reference_owner: &str,
        method: &str,
    ) -> Result<Self, SessionError> {
        let reference = MemberTable::from_registry(reference_owner)
            .get(method)
            .cloned()
            .ok_or_else(|| SessionError::ReferenceNotFound {
                owner: reference_owner.to_string(),
                method: method.to_string(),
            })?;

        Ok(Self::new(MemberTable::from_registry(candidate_owner), reference))
    }

    /// Add an explicit case, run in insertion order.
    pub fn case(mut self, case: impl Into<TestCase>) -> Self {
        self.cases.push(case.into());
        self
    }

    /// Add several explicit cases.
    pub fn cases(mut self, cases: impl IntoIterator<Item = TestCase>) -> Self {
        self.cases.extend(cases);
        self
    }

    /// Call `generator` `rounds` times after the explicit cases.
    pub fn generator(mut self, generator: impl TestCaseGenerator + 'static, rounds: usize) -> Self {
        self.generator = Some((Box::new(generator), rounds));
        self
    }

    /// Replace the default [`SessionConfig`].
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Validate everything and start the worker pool.
    pub fn build(self) -> Result<VerificationSession, SessionError> {
        let descriptor = self.reference.signature()?;

        if !self.reference.is_public() && !self.config.allow_private_access {
            return Err(SessionError::ReferenceInaccessible {
                method: descriptor.name().to_string(),
            });
        }

        for (index, case) in self.cases.iter().enumerate() {
            validate_arguments(case, &descriptor).map_err(|source| {
                SessionError::InvalidTestCase {
                    index,
                    case: case.clone(),
                    source,
                }
            })?;
        }

        let resolved = self.candidates.resolve(&descriptor).cloned();
        let executor = BoundedExecutor::new(self.config.workers, self.config.timeout)?;

        let (generator, generation_rounds) = match self.generator {
            Some((generator, rounds)) => (Some(generator), rounds),
            None => (None, 0),
        };

        info!(
            method = %descriptor.name(),
            candidate = %self.candidates.type_name(),
            explicit_cases = self.cases.len(),
            generation_rounds,
            workers = executor.workers(),
            timeout_ms = executor.timeout().as_millis() as u64,
            "verification session built"
        );

        Ok(VerificationSession {
            descriptor,
            candidates: self.candidates,
            resolved,
            reference: self.reference,
            cases: self.cases,
            generator,
            generation_rounds,
            config: self.config,
            executor,
            state: SessionState::HeaderCheck,
            header: None,
        })
    }
}

/// Compares a candidate against a reference over a set of test cases.
///
/// Owns its worker pool; the pool is released by [`end`](Self::end), by
/// [`run_all_tests_then_end`](Self::run_all_tests_then_end), or on drop.
pub struct VerificationSession {
    descriptor: SignatureDescriptor,
    candidates: MemberTable,
    resolved: Option<Member>,
    reference: Member,
    cases: Vec<TestCase>,
    generator: Option<Box<dyn TestCaseGenerator>>,
    generation_rounds: usize,
    config: SessionConfig,
    executor: BoundedExecutor,
    state: SessionState,
    header: Option<TestResult>,
}

impl VerificationSession {
    /// Signature extracted from the reference
    pub fn descriptor(&self) -> &SignatureDescriptor {
        &self.descriptor
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check presence, parameter types, return type and visibility, in that order.
    ///
    /// Runs once; later calls return the cached verdict. A failed header ends
    /// the session.
    pub fn test_method_header(&mut self) -> Result<TestResult, SessionError> {
        if let Some(header) = &self.header {
            return Ok(header.clone());
        }
        if self.state == SessionState::Done {
            return Err(SessionError::SessionEnded);
        }

        let header = self.check_header();
        info!(
            method = %self.descriptor.name(),
            candidate = %self.candidates.type_name(),
            verdict = %header,
            "header checked"
        );

        self.header = Some(header.clone());
        if header.is_success() {
            self.state = SessionState::TestExecution;
        } else {
            self.end();
        }
        Ok(header)
    }

    fn check_header(&self) -> TestResult {
        let method = self.descriptor.name().to_string();

        let Some(candidate) = &self.resolved else {
            return TestResult::MethodNotFound { method };
        };

        if !validate_signature(candidate, &self.descriptor) {
            return TestResult::WrongParameterTypes {
                method,
                expected: self.descriptor.parameter_types().to_vec(),
                actual: candidate.parameter_types().to_vec(),
            };
        }

        if candidate.return_type() != self.descriptor.return_type() {
            return TestResult::WrongReturnType {
                method,
                expected: self.descriptor.return_type().clone(),
                actual: candidate.return_type().clone(),
            };
        }

        if !candidate.is_public() && !self.config.allow_private_access {
            return TestResult::MethodSecurity { method };
        }

        TestResult::HeaderSuccess { method }
    }

    /// Run explicit cases in order, then the generator's rounds, then end the
    /// session.
    ///
    /// Runs the header check first if it has not run yet; returns no results
    /// when the header fails. Cases run once: a later call returns
    /// [`SessionError::SessionEnded`].
    pub fn run_test_cases(&mut self) -> Result<Vec<TestResult>, SessionError> {
        if self.state == SessionState::HeaderCheck && !self.test_method_header()?.is_success() {
            return Ok(Vec::new());
        }
        if self.state == SessionState::Done {
            return Err(SessionError::SessionEnded);
        }

        let outcome = self.execute_cases();
        self.end();
        outcome
    }

    fn execute_cases(&mut self) -> Result<Vec<TestResult>, SessionError> {
        let Some(candidate) = &self.resolved else {
            return Ok(Vec::new());
        };
        let runner = InvocationRunner::new(
            &self.executor,
            &self.descriptor,
            candidate,
            &self.reference,
            self.config.null_returns,
        );

        let mut results = Vec::with_capacity(self.cases.len() + self.generation_rounds);
        for case in &self.cases {
            debug!(method = %self.descriptor.name(), case = %case, "running explicit case");
            results.push(runner.run_test_case(case)?);
        }

        if let Some(generator) = self.generator.as_mut() {
            for round in 0..self.generation_rounds {
                let case = generator.generate();
                validate_arguments(&case, &self.descriptor).map_err(|source| {
                    SessionError::GeneratorMismatch {
                        round,
                        case: case.clone(),
                        source,
                    }
                })?;
                debug!(method = %self.descriptor.name(), round, case = %case, "running generated case");
                results.push(runner.run_test_case(&case)?);
            }
        }

        Ok(results)
    }

    /// Header check, every test case, then teardown.
    ///
    /// The session is ended on every path, including fatal errors.
    pub fn run_all_tests_then_end(&mut self) -> Result<Vec<TestResult>, SessionError> {
        let outcome = self.run_all();
        self.end();

        if let Ok(results) = &outcome {
            let summary = summarize(results);
            info!(
                method = %self.descriptor.name(),
                header_passed = summary.header_passed,
                passed = summary.passed,
                failed = summary.failed,
                timed_out = summary.timed_out,
                errors = summary.errors,
                "verification finished"
            );
        }
        outcome
    }

    fn run_all(&mut self) -> Result<Vec<TestResult>, SessionError> {
        let header = self.test_method_header()?;
        let passed = header.is_success();
        let mut results = vec![header];
        if passed {
            results.extend(self.run_test_cases()?);
        }
        Ok(results)
    }

    /// Release the worker pool. Safe to call any number of times.
    pub fn end(&mut self) {
        if self.state != SessionState::Done {
            debug!(method = %self.descriptor.name(), "session ended");
        }
        self.executor.shutdown();
        self.state = SessionState::Done;
    }
}

impl Drop for VerificationSession {
    fn drop(&mut self) {
        self.end();
    }
}
