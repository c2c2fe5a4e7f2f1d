#![warn(missing_docs)]
//! Methodcheck Core - Data Model
//!
//! This crate holds everything a verification session reasons about:
//! - `Value` / `TypeTag` dynamic values and their type shapes
//! - `SignatureDescriptor` and the argument validator
//! - `Member` / `MemberTable` explicit member tables (with `#[member]` registry)
//! - `TestCase` and the `TestCaseGenerator` capability
//! - `TestResult` taxonomy and `summarize`

mod case;
mod member;
mod result;
mod signature;
mod value;

pub use case::{TestCase, TestCaseGenerator};
pub use member::{IntoMember, InvokeError, Invoker, Member, MemberTable, Visibility};
pub use result::{ResultKind, ResultSummary, TestResult, summarize};
pub use signature::{
    ArgumentMismatch, SignatureDescriptor, SignatureError, validate_arguments, validate_signature,
};
pub use value::{ConversionError, FromValue, IntoValue, Primitive, Tagged, TypeTag, Value};

/// Member registered via `#[methodcheck::member]`
#[derive(Debug, Clone)]
pub struct MemberDef {
    /// Owning type the member is declared on
    pub owner: &'static str,
    /// Member name used for lookup
    pub name: &'static str,
    /// Declared visibility
    pub visibility: Visibility,
    /// Builds the member (tags and invoker)
    pub build: fn() -> Member,
    /// Source file path
    pub file: &'static str,
    /// Source line number
    pub line: u32,
}

// Collect all registered members
inventory::collect!(MemberDef);

/// Anchor to prevent LTO from stripping inventory entries
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<MemberDef> {}
};
