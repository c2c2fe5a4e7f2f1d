//! Test Cases and Generators

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One argument tuple used to probe a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestCase {
    arguments: Vec<Value>,
}

impl TestCase {
    /// Wrap an argument tuple.
    pub fn new(arguments: Vec<Value>) -> Self {
        Self { arguments }
    }

    /// Arguments in parameter order.
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }

    /// Take the arguments out of the case.
    pub fn into_arguments(self) -> Vec<Value> {
        self.arguments
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.arguments.len()
    }

    /// Whether the case has no arguments.
    pub fn is_empty(&self) -> bool {
        self.arguments.is_empty()
    }
}

impl From<Vec<Value>> for TestCase {
    fn from(arguments: Vec<Value>) -> Self {
        Self::new(arguments)
    }
}

impl fmt::Display for TestCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

/// Build a [`TestCase`] from literals convertible into [`Value`].
///
/// ```
/// use methodcheck_core::{test_case, Value};
///
/// let case = test_case![-100.0, 100.0, 0.3];
/// assert_eq!(case.arguments()[0], Value::Double(-100.0));
/// ```
#[macro_export]
macro_rules! test_case {
    () => {
        $crate::TestCase::new(::std::vec::Vec::new())
    };
    ($($arg:expr),+ $(,)?) => {
        $crate::TestCase::new(::std::vec![$($crate::Value::from($arg)),+])
    };
}

/// Source of additional test cases, invoked on demand.
///
/// Generators need not be deterministic or restartable; the session calls
/// [`generate`](TestCaseGenerator::generate) once per configured round.
pub trait TestCaseGenerator: Send {
    /// Produce the next test case.
    fn generate(&mut self) -> TestCase;
}

impl<F> TestCaseGenerator for F
where
    F: FnMut() -> TestCase + Send,
{
    fn generate(&mut self) -> TestCase {
        self()
    }
}
