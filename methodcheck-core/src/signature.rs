//! Signature Descriptors and Argument Validation
//!
//! A [`SignatureDescriptor`] is extracted once from the reference member and
//! is then the yardstick for both the candidate's header and every test case.
//!
//! Two different comparisons live here:
//! - [`validate_signature`]: declared parameter types must match *exactly*.
//! - [`validate_arguments`]: runtime argument tags may also match through the
//!   boxed/primitive equivalence, and `Null` is accepted for nullable tags.

use crate::case::TestCase;
use crate::member::Member;
use crate::value::{TypeTag, Value};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors building a descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// Name is empty or whitespace
    #[error("signature name must not be empty")]
    EmptyName,
}

/// Why an argument tuple does not fit a signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentMismatch {
    /// Wrong number of arguments
    #[error("expected {expected} argument(s), got {actual}")]
    Arity {
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// `Null` for a parameter that cannot hold it
    #[error("argument {index}: null is not allowed for {expected}")]
    UnexpectedNull {
        /// Argument position
        index: usize,
        /// Declared parameter type
        expected: TypeTag,
    },

    /// Argument of another shape
    #[error("argument {index}: expected {expected}, got {actual} ({value})")]
    Type {
        /// Argument position
        index: usize,
        /// Declared parameter type
        expected: TypeTag,
        /// Runtime tag of the argument
        actual: TypeTag,
        /// Rendered argument
        value: String,
    },

    /// Array argument with an item the element type rejects
    #[error("argument {index}, item {position}: {value} does not fit {expected}")]
    Element {
        /// Argument position
        index: usize,
        /// Item position inside the array
        position: usize,
        /// Declared element type
        expected: TypeTag,
        /// Rendered item
        value: String,
    },
}

/// Name, parameter types and return type of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureDescriptor {
    name: String,
    parameter_types: Vec<TypeTag>,
    return_type: TypeTag,
}

impl SignatureDescriptor {
    /// Create a descriptor. Fails on an empty or blank name.
    pub fn new(
        name: impl Into<String>,
        parameter_types: Vec<TypeTag>,
        return_type: TypeTag,
    ) -> Result<Self, SignatureError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SignatureError::EmptyName);
        }
        Ok(Self {
            name,
            parameter_types,
            return_type,
        })
    }

    /// Extract the descriptor of a member. Fails if the member's name is blank.
    pub fn describe(member: &Member) -> Result<Self, SignatureError> {
        Self::new(
            member.name(),
            member.parameter_types().to_vec(),
            member.return_type().clone(),
        )
    }

    /// Operation name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types, in order
    pub fn parameter_types(&self) -> &[TypeTag] {
        &self.parameter_types
    }

    /// Declared return type
    pub fn return_type(&self) -> &TypeTag {
        &self.return_type
    }

    /// Number of parameters
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    /// Whether the operation returns nothing.
    pub fn is_void(&self) -> bool {
        self.return_type == TypeTag::Void
    }

    /// Exact, pairwise parameter-type equality.
    pub fn parameters_match(&self, parameter_types: &[TypeTag]) -> bool {
        self.parameter_types.len() == parameter_types.len()
            && self
                .parameter_types
                .iter()
                .zip(parameter_types)
                .all(|(expected, actual)| expected == actual)
    }

    /// Check an argument tuple against the declared parameter types.
    pub fn check_arguments(&self, arguments: &[Value]) -> Result<(), ArgumentMismatch> {
        if arguments.len() != self.parameter_types.len() {
            return Err(ArgumentMismatch::Arity {
                expected: self.parameter_types.len(),
                actual: arguments.len(),
            });
        }

        for (index, (expected, value)) in self.parameter_types.iter().zip(arguments).enumerate() {
            if !expected.accepts(value) {
                return Err(mismatch(index, expected, value));
            }
        }
        Ok(())
    }
}

fn mismatch(index: usize, expected: &TypeTag, value: &Value) -> ArgumentMismatch {
    if let (Some(declared), Value::Array { element, items }) = (expected.element(), value) {
        if element.is_like(declared) {
            if let Some(position) = items.iter().position(|item| !declared.accepts(item)) {
                return ArgumentMismatch::Element {
                    index,
                    position,
                    expected: declared.clone(),
                    value: items[position].to_string(),
                };
            }
        }
    }

    match value.type_tag() {
        None => ArgumentMismatch::UnexpectedNull {
            index,
            expected: expected.clone(),
        },
        Some(actual) => ArgumentMismatch::Type {
            index,
            expected: expected.clone(),
            actual,
            value: value.to_string(),
        },
    }
}

/// Whether a candidate's parameter types match the descriptor exactly.
pub fn validate_signature(member: &Member, descriptor: &SignatureDescriptor) -> bool {
    descriptor.parameters_match(member.parameter_types())
}

/// Whether a test case may be run against the descriptor.
pub fn validate_arguments(
    test_case: &TestCase,
    descriptor: &SignatureDescriptor,
) -> Result<(), ArgumentMismatch> {
    descriptor.check_arguments(test_case.arguments())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_case;
    use crate::value::Primitive;
    use proptest::prelude::*;

    fn int() -> TypeTag {
        TypeTag::Primitive(Primitive::Int)
    }

    fn double() -> TypeTag {
        TypeTag::Primitive(Primitive::Double)
    }

    fn descriptor(params: Vec<TypeTag>) -> SignatureDescriptor {
        SignatureDescriptor::new("op", params, int()).unwrap()
    }

    #[test]
    fn test_empty_name_rejected() {
        assert_eq!(
            SignatureDescriptor::new("  ", vec![], TypeTag::Void),
            Err(SignatureError::EmptyName)
        );
    }

    #[test]
    fn test_string_for_int_rejected() {
        let sig = descriptor(vec![int(), int()]);
        let err = validate_arguments(&test_case![1, "x"], &sig).unwrap_err();
        assert_eq!(
            err,
            ArgumentMismatch::Type {
                index: 1,
                expected: int(),
                actual: TypeTag::String,
                value: "x".to_string(),
            }
        );
    }

    #[test]
    fn test_boxed_int_accepted_for_primitive() {
        let sig = descriptor(vec![int()]);
        assert!(validate_arguments(&test_case![42], &sig).is_ok());
    }

    #[test]
    fn test_no_numeric_widening() {
        let sig = descriptor(vec![TypeTag::Primitive(Primitive::Long)]);
        assert!(validate_arguments(&test_case![42], &sig).is_err());
        assert!(validate_arguments(&test_case![42_i64], &sig).is_ok());
    }

    #[test]
    fn test_arity_mismatch() {
        let sig = descriptor(vec![double(), double(), double()]);
        assert_eq!(
            validate_arguments(&test_case![1.0, 2.0], &sig),
            Err(ArgumentMismatch::Arity {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_null_only_for_nullable() {
        let optional_string = TypeTag::Nullable(Box::new(TypeTag::String));
        let sig = descriptor(vec![int(), TypeTag::Boxed(Primitive::Int), optional_string]);
        let ok = TestCase::new(vec![Value::Int(1), Value::Null, Value::Null]);
        assert!(validate_arguments(&ok, &sig).is_ok());

        let bad = TestCase::new(vec![Value::Null, Value::Null, Value::Null]);
        assert_eq!(
            validate_arguments(&bad, &sig),
            Err(ArgumentMismatch::UnexpectedNull {
                index: 0,
                expected: int()
            })
        );
    }

    #[test]
    fn test_null_rejected_for_plain_string() {
        let sig = descriptor(vec![TypeTag::String]);
        assert_eq!(
            validate_arguments(&TestCase::new(vec![Value::Null]), &sig),
            Err(ArgumentMismatch::UnexpectedNull {
                index: 0,
                expected: TypeTag::String
            })
        );
    }

    #[test]
    fn test_array_item_mismatch_reported() {
        let sig = descriptor(vec![TypeTag::Array(Box::new(int()))]);
        let case = TestCase::new(vec![Value::Array {
            element: int(),
            items: vec![Value::Int(1), Value::Str("x".into())],
        }]);
        assert_eq!(
            validate_arguments(&case, &sig),
            Err(ArgumentMismatch::Element {
                index: 0,
                position: 1,
                expected: int(),
                value: "x".to_string(),
            })
        );
        assert!(validate_arguments(&TestCase::new(vec![Value::array(vec![4, 5])]), &sig).is_ok());
    }

    #[test]
    fn test_describe_rejects_blank_member_name() {
        let member = Member::from_fn("", |x: i32| x);
        assert_eq!(SignatureDescriptor::describe(&member), Err(SignatureError::EmptyName));
        assert_eq!(member.signature(), Err(SignatureError::EmptyName));

        let named = Member::from_fn("twice", |x: i32| x * 2);
        assert_eq!(named.signature().unwrap().name(), "twice");
    }

    #[test]
    fn test_parameters_match_is_exact() {
        let sig = descriptor(vec![int(), double()]);
        assert!(sig.parameters_match(&[int(), double()]));
        assert!(!sig.parameters_match(&[TypeTag::Boxed(Primitive::Int), double()]));
        assert!(!sig.parameters_match(&[int()]));
        assert!(!sig.parameters_match(&[double(), int()]));
    }

    proptest! {
        #[test]
        fn prop_doubles_always_fit_double_params(a in any::<f64>(), b in any::<f64>()) {
            let sig = descriptor(vec![double(), double()]);
            prop_assert!(validate_arguments(&test_case![a, b], &sig).is_ok());
        }

        #[test]
        fn prop_wrong_arity_always_rejected(n in 0usize..8) {
            prop_assume!(n != 2);
            let sig = descriptor(vec![int(), int()]);
            let case = TestCase::new(vec![Value::Int(0); n]);
            let is_arity_error = matches!(validate_arguments(&case, &sig), Err(ArgumentMismatch::Arity { .. }));
            prop_assert!(is_arity_error);
        }
    }
}
