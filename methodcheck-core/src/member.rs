//! Members and Member Tables
//!
//! Rust has no runtime reflection, so the members of a candidate or reference
//! "type" are an explicit table: each [`Member`] pairs a name and declared
//! [`TypeTag`]s with a type-erased invoker. Members are built from ordinary
//! functions through [`Member::from_fn`], by hand with [`Member::new`], or
//! collected from the `#[member]` registry via [`MemberTable::from_registry`].

use crate::MemberDef;
use crate::signature::{SignatureDescriptor, SignatureError, validate_signature};
use crate::value::{ConversionError, FromValue, IntoValue, Tagged, TypeTag, Value};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while marshalling arguments into a member call.
///
/// These are failures of the harness, not of the member's own code; a panic
/// inside the member is reported separately by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvokeError {
    /// Wrong number of arguments
    #[error("`{member}` takes {expected} argument(s), got {actual}")]
    Arity {
        /// Member name
        member: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// An argument could not be converted to its parameter type
    #[error("`{member}` argument {index}: {source}")]
    Argument {
        /// Member name
        member: String,
        /// Argument position
        index: usize,
        /// Conversion failure
        #[source]
        source: ConversionError,
    },
}

/// Whether a member may be invoked without forcing access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Invocable as is
    #[default]
    Public,
    /// Invocable only when private access is allowed
    Private,
}

/// Type-erased call entry point.
pub type Invoker = Arc<dyn Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync>;

/// A named, invocable operation with declared parameter and return types.
#[derive(Clone)]
pub struct Member {
    name: String,
    parameter_types: Vec<TypeTag>,
    return_type: TypeTag,
    visibility: Visibility,
    invoker: Invoker,
}

impl Member {
    /// Build a member from declared types and a raw invoker.
    pub fn new(
        name: impl Into<String>,
        parameter_types: Vec<TypeTag>,
        return_type: TypeTag,
        invoker: impl Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_types,
            return_type,
            visibility: Visibility::Public,
            invoker: Arc::new(invoker),
        }
    }

    /// Build a member from a typed function; tags come from its Rust signature.
    pub fn from_fn<F, Args>(name: impl Into<String>, f: F) -> Self
    where
        F: IntoMember<Args>,
    {
        let name = name.into();
        Self {
            parameter_types: F::parameter_types(),
            return_type: F::return_type(),
            visibility: Visibility::Public,
            invoker: f.into_invoker(name.clone()),
            name,
        }
    }

    /// Set the visibility, builder style.
    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    /// Mark the member private.
    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    /// Member name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter types
    pub fn parameter_types(&self) -> &[TypeTag] {
        &self.parameter_types
    }

    /// Declared return type
    pub fn return_type(&self) -> &TypeTag {
        &self.return_type
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the member is public
    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }

    /// Descriptor of this member. Fails if the name is blank.
    pub fn signature(&self) -> Result<SignatureDescriptor, SignatureError> {
        SignatureDescriptor::describe(self)
    }

    /// Call the member. Panics in the member's body propagate to the caller.
    pub fn invoke(&self, arguments: &[Value]) -> Result<Value, InvokeError> {
        (self.invoker)(arguments)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("parameter_types", &self.parameter_types)
            .field("return_type", &self.return_type)
            .field("visibility", &self.visibility)
            .finish_non_exhaustive()
    }
}

/// Functions that can become a [`Member`].
///
/// Implemented for `Fn` closures and function items of up to eight
/// parameters whose parameter types are [`FromValue`] + [`Tagged`] and whose
/// return type is [`IntoValue`] + [`Tagged`].
pub trait IntoMember<Args>: Send + Sync + 'static {
    /// Declared parameter tags.
    fn parameter_types() -> Vec<TypeTag>;
    /// Declared return tag.
    fn return_type() -> TypeTag;
    /// Erase the function behind an [`Invoker`].
    fn into_invoker(self, name: String) -> Invoker;
}

fn convert<T: FromValue>(member: &str, index: usize, value: &Value) -> Result<T, InvokeError> {
    T::from_value(value).map_err(|source| InvokeError::Argument {
        member: member.to_string(),
        index,
        source,
    })
}

macro_rules! impl_into_member {
    ($count:expr; $($arg:ident $idx:tt),*) => {
        impl<F, R, $($arg,)*> IntoMember<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: IntoValue + Tagged,
            $($arg: FromValue + Tagged,)*
        {
            fn parameter_types() -> Vec<TypeTag> {
                vec![$($arg::type_tag()),*]
            }

            fn return_type() -> TypeTag {
                R::type_tag()
            }

            #[allow(unused_variables)]
            fn into_invoker(self, name: String) -> Invoker {
                Arc::new(move |args: &[Value]| {
                    if args.len() != $count {
                        return Err(InvokeError::Arity {
                            member: name.clone(),
                            expected: $count,
                            actual: args.len(),
                        });
                    }
                    Ok((self)($(convert::<$arg>(&name, $idx, &args[$idx])?),*).into_value())
                })
            }
        }
    };
}

impl_into_member!(0;);
impl_into_member!(1; A0 0);
impl_into_member!(2; A0 0, A1 1);
impl_into_member!(3; A0 0, A1 1, A2 2);
impl_into_member!(4; A0 0, A1 1, A2 2, A3 3);
impl_into_member!(5; A0 0, A1 1, A2 2, A3 3, A4 4);
impl_into_member!(6; A0 0, A1 1, A2 2, A3 3, A4 4, A5 5);
impl_into_member!(7; A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6);
impl_into_member!(8; A0 0, A1 1, A2 2, A3 3, A4 4, A5 5, A6 6, A7 7);

/// Snapshot of the members declared on one type.
///
/// Declaration order is preserved; lookups by name return members in that order.
#[derive(Debug, Clone)]
pub struct MemberTable {
    type_name: String,
    members: Vec<Member>,
    by_name: FxHashMap<String, Vec<usize>>,
}

impl MemberTable {
    /// Create an empty table for `type_name`.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            members: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// Collect every `#[member]` registered with `owner`, ordered by source location.
    pub fn from_registry(owner: &str) -> Self {
        let mut defs: Vec<&MemberDef> = inventory::iter::<MemberDef>
            .into_iter()
            .filter(|def| def.owner == owner)
            .collect();
        defs.sort_by_key(|def| (def.file, def.line));

        defs.into_iter().fold(Self::new(owner), |table, def| {
            table.with_member((def.build)().with_visibility(def.visibility))
        })
    }

    /// Add a member, builder style.
    pub fn with_member(mut self, member: Member) -> Self {
        self.insert(member);
        self
    }

    /// Add a member after all previously declared ones.
    pub fn insert(&mut self, member: Member) {
        let index = self.members.len();
        self.by_name
            .entry(member.name().to_string())
            .or_default()
            .push(index);
        self.members.push(member);
    }

    /// Name of the type whose members this table holds
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Number of members, overloads counted separately
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether the table has no members
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// All members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    /// Members named `name`, in declaration order.
    pub fn named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a Member> + 'a {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(|&index| &self.members[index])
    }

    /// First member named `name`.
    pub fn get(&self, name: &str) -> Option<&Member> {
        self.named(name).next()
    }

    /// Resolve the member a descriptor refers to.
    ///
    /// Among same-named overloads the first whose parameter types match wins;
    /// otherwise the first name match is returned so a wrong signature can be
    /// reported instead of "not found".
    pub fn resolve(&self, descriptor: &SignatureDescriptor) -> Option<&Member> {
        self.named(descriptor.name())
            .find(|member| validate_signature(member, descriptor))
            .or_else(|| self.get(descriptor.name()))
    }
}
