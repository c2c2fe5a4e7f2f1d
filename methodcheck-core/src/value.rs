//! Dynamic Values and Type Tags
//!
//! Test-case arguments travel through the engine as [`Value`]s, and every
//! declared parameter or return type is described by a [`TypeTag`]. The
//! argument validator compares the two without knowing the Rust types behind
//! a member.
//!
//! Scalars stored in a `Value` are always *boxed*: `Value::Int(3)` reports
//! `TypeTag::Boxed(Primitive::Int)`, while a declared `i32` parameter is
//! `TypeTag::Primitive(Primitive::Int)`. [`TypeTag::is_like`] bridges the two.
//!
//! ## Rust type mapping
//!
//! | Rust type    | Tag                        |
//! |--------------|----------------------------|
//! | `i32`        | `Primitive(Int)`           |
//! | `Option<i32>`| `Boxed(Int)`               |
//! | `String`     | `String`                   |
//! | `Option<String>` | `Nullable(String)`     |
//! | `Vec<T>`     | `Array(tag of T)`          |
//! | `()`         | `Void`                     |
//!
//! Only `Boxed` and `Nullable` tags accept `Value::Null`; a plain `String` or
//! `Vec<T>` parameter cannot receive it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// The eight scalar kinds that exist both as primitives and as boxed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    /// 32-bit signed integer
    Int,
    /// 64-bit signed integer
    Long,
    /// 16-bit signed integer
    Short,
    /// 8-bit signed integer
    Byte,
    /// 64-bit float
    Double,
    /// 32-bit float
    Float,
    /// Unicode scalar value
    Char,
    /// Boolean
    Boolean,
}

impl Primitive {
    /// Every primitive kind, in declaration order.
    pub const ALL: [Primitive; 8] = [
        Primitive::Int,
        Primitive::Long,
        Primitive::Short,
        Primitive::Byte,
        Primitive::Double,
        Primitive::Float,
        Primitive::Char,
        Primitive::Boolean,
    ];

    /// Name of the primitive form (`int`, `double`, ...).
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Short => "short",
            Primitive::Byte => "byte",
            Primitive::Double => "double",
            Primitive::Float => "float",
            Primitive::Char => "char",
            Primitive::Boolean => "boolean",
        }
    }

    /// Name of the boxed form (`Integer`, `Double`, ...).
    pub fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Short => "Short",
            Primitive::Byte => "Byte",
            Primitive::Double => "Double",
            Primitive::Float => "Float",
            Primitive::Char => "Character",
            Primitive::Boolean => "Boolean",
        }
    }
}

/// Semantic identifier for the shape of a value or a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum TypeTag {
    /// Non-nullable scalar
    Primitive(Primitive),
    /// Nullable wrapper around a scalar
    Boxed(Primitive),
    /// Text
    String,
    /// Homogeneous sequence with the given element tag
    Array(Box<TypeTag>),
    /// Composite object identified by its type name
    Object(String),
    /// Optional non-scalar (`Option<String>`, `Option<Vec<T>>`, ...)
    Nullable(Box<TypeTag>),
    /// No value (return type only)
    Void,
}

impl TypeTag {
    /// Whether `Value::Null` is an acceptable value for this tag.
    pub fn is_nullable(&self) -> bool {
        matches!(self, TypeTag::Boxed(_) | TypeTag::Nullable(_))
    }

    /// The tag of an optional value of this type.
    ///
    /// Primitives become `Boxed`, tags that already accept `Null` are
    /// unchanged, and everything else is wrapped in `Nullable`.
    pub fn boxed(self) -> TypeTag {
        match self {
            TypeTag::Primitive(p) => TypeTag::Boxed(p),
            tag @ (TypeTag::Boxed(_) | TypeTag::Nullable(_)) => tag,
            other => TypeTag::Nullable(Box::new(other)),
        }
    }

    /// Declared element tag of an array, optional or not.
    pub fn element(&self) -> Option<&TypeTag> {
        match self {
            TypeTag::Array(element) => Some(element),
            TypeTag::Nullable(inner) => inner.element(),
            _ => None,
        }
    }

    /// Whether a value reporting `self` may be passed where `target` is declared.
    ///
    /// Exact equality, plus `Boxed(p)` against `Primitive(p)`. This is the only
    /// relaxation; there is no widening between numeric kinds.
    pub fn is_like(&self, target: &TypeTag) -> bool {
        self == target
            || matches!((self, target), (TypeTag::Boxed(a), TypeTag::Primitive(b)) if a == b)
    }

    /// Whether `value` may be passed where `self` is declared.
    ///
    /// Array items are checked one by one against the declared element tag.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => self.is_nullable(),
            (TypeTag::Nullable(inner), _) => inner.accepts(value),
            (TypeTag::Array(declared), Value::Array { element, items }) => {
                element.is_like(declared) && items.iter().all(|item| declared.accepts(item))
            }
            _ => value.type_tag().is_some_and(|tag| tag.is_like(self)),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Primitive(p) => f.write_str(p.name()),
            TypeTag::Boxed(p) => f.write_str(p.boxed_name()),
            TypeTag::String => f.write_str("String"),
            TypeTag::Array(element) => write!(f, "{}[]", element),
            TypeTag::Object(name) => f.write_str(name),
            TypeTag::Nullable(inner) => write!(f, "{}?", inner),
            TypeTag::Void => f.write_str("void"),
        }
    }
}

/// A dynamically-typed argument or return value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    /// Absent value
    Null,
    /// Result of a void member
    Unit,
    /// Boxed `int`
    Int(i32),
    /// Boxed `long`
    Long(i64),
    /// Boxed `short`
    Short(i16),
    /// Boxed `byte`
    Byte(i8),
    /// Boxed `double`
    Double(f64),
    /// Boxed `float`
    Float(f32),
    /// Boxed `char`
    Char(char),
    /// Boxed `boolean`
    Boolean(bool),
    /// Text
    Str(String),
    /// Sequence of values sharing an element tag
    Array {
        /// Declared element tag
        element: TypeTag,
        /// Elements
        items: Vec<Value>,
    },
    /// Composite object
    Object {
        /// Type name, matched against `TypeTag::Object`
        type_name: String,
        /// Field values by name
        fields: BTreeMap<String, Value>,
    },
}

impl Value {
    /// Runtime tag of this value, or `None` for `Null`.
    pub fn type_tag(&self) -> Option<TypeTag> {
        let tag = match self {
            Value::Null => return None,
            Value::Unit => TypeTag::Void,
            Value::Int(_) => TypeTag::Boxed(Primitive::Int),
            Value::Long(_) => TypeTag::Boxed(Primitive::Long),
            Value::Short(_) => TypeTag::Boxed(Primitive::Short),
            Value::Byte(_) => TypeTag::Boxed(Primitive::Byte),
            Value::Double(_) => TypeTag::Boxed(Primitive::Double),
            Value::Float(_) => TypeTag::Boxed(Primitive::Float),
            Value::Char(_) => TypeTag::Boxed(Primitive::Char),
            Value::Boolean(_) => TypeTag::Boxed(Primitive::Boolean),
            Value::Str(_) => TypeTag::String,
            Value::Array { element, .. } => TypeTag::Array(Box::new(element.clone())),
            Value::Object { type_name, .. } => TypeTag::Object(type_name.clone()),
        };
        Some(tag)
    }

    /// Whether this is `Value::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Build an array value from typed elements.
    pub fn array<T: IntoValue + Tagged>(items: impl IntoIterator<Item = T>) -> Self {
        Value::Array {
            element: T::type_tag(),
            items: items.into_iter().map(IntoValue::into_value).collect(),
        }
    }

    /// Build a composite object value.
    pub fn object<K: Into<String>>(
        type_name: impl Into<String>,
        fields: impl IntoIterator<Item = (K, Value)>,
    ) -> Self {
        Value::Object {
            type_name: type_name.into(),
            fields: fields.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Numeric view of a `Double` or `Float`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Float(v) => Some(f64::from(*v)),
            _ => None,
        }
    }
}

fn double_eq(a: f64, b: f64) -> bool {
    (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
}

fn float_eq(a: f32, b: f32) -> bool {
    (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
}

/// Structural equality with boxed-float semantics: NaN equals NaN and
/// `0.0` differs from `-0.0`.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) | (Value::Unit, Value::Unit) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Short(a), Value::Short(b)) => a == b,
            (Value::Byte(a), Value::Byte(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => double_eq(*a, *b),
            (Value::Float(a), Value::Float(b)) => float_eq(*a, *b),
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (
                Value::Array {
                    element: ea,
                    items: ia,
                },
                Value::Array {
                    element: eb,
                    items: ib,
                },
            ) => ea == eb && ia == ib,
            (
                Value::Object {
                    type_name: ta,
                    fields: fa,
                },
                Value::Object {
                    type_name: tb,
                    fields: fb,
                },
            ) => ta == tb && fa == fb,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Unit => f.write_str("void"),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{:?}", v),
            Value::Float(v) => write!(f, "{:?}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Str(v) => f.write_str(v),
            Value::Array { items, .. } => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Object { type_name, fields } => {
                write!(f, "{} {{", type_name)?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, " {}: {}", name, value)?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// Failure to turn a [`Value`] into a concrete Rust parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// `Null` was supplied for a non-nullable type
    #[error("expected {expected}, found null")]
    UnexpectedNull {
        /// Declared type
        expected: TypeTag,
    },
    /// A value of another shape was supplied
    #[error("expected {expected}, found {found}")]
    Mismatch {
        /// Declared type
        expected: TypeTag,
        /// Runtime tag of the supplied value
        found: TypeTag,
    },
}

impl ConversionError {
    /// Build the error describing why `value` does not fit `expected`.
    pub fn unexpected(expected: TypeTag, value: &Value) -> Self {
        match value.type_tag() {
            None => ConversionError::UnexpectedNull { expected },
            Some(found) => ConversionError::Mismatch { expected, found },
        }
    }
}

/// Rust types with a statically known [`TypeTag`].
pub trait Tagged {
    /// Tag this type declares in a signature.
    fn type_tag() -> TypeTag;
}

/// Rust types that can be read out of a [`Value`] argument.
pub trait FromValue: Sized {
    /// Convert, failing if the value has the wrong shape.
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

/// Rust types that can be returned as a [`Value`].
pub trait IntoValue {
    /// Convert into a dynamic value.
    fn into_value(self) -> Value;
}

macro_rules! scalar_value {
    ($ty:ty, $variant:ident) => {
        impl Tagged for $ty {
            fn type_tag() -> TypeTag {
                TypeTag::Primitive(Primitive::$variant)
            }
        }

        impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self, ConversionError> {
                match value {
                    Value::$variant(v) => Ok(*v),
                    other => Err(ConversionError::unexpected(Self::type_tag(), other)),
                }
            }
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

scalar_value!(i32, Int);
scalar_value!(i64, Long);
scalar_value!(i16, Short);
scalar_value!(i8, Byte);
scalar_value!(f64, Double);
scalar_value!(f32, Float);
scalar_value!(char, Char);
scalar_value!(bool, Boolean);

impl Tagged for String {
    fn type_tag() -> TypeTag {
        TypeTag::String
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            other => Err(ConversionError::unexpected(TypeTag::String, other)),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl<T: Tagged> Tagged for Option<T> {
    fn type_tag() -> TypeTag {
        T::type_tag().boxed()
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Tagged> Tagged for Vec<T> {
    fn type_tag() -> TypeTag {
        TypeTag::Array(Box::new(T::type_tag()))
    }
}

impl<T: FromValue + Tagged> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Array { items, .. } => items.iter().map(T::from_value).collect(),
            other => Err(ConversionError::unexpected(Self::type_tag(), other)),
        }
    }
}

impl<T: IntoValue + Tagged> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::array(self)
    }
}

impl Tagged for () {
    fn type_tag() -> TypeTag {
        TypeTag::Void
    }
}

impl FromValue for () {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        match value {
            Value::Unit | Value::Null => Ok(()),
            other => Err(ConversionError::unexpected(TypeTag::Void, other)),
        }
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Unit
    }
}
