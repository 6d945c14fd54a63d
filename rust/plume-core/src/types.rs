//! Type witnesses for declared return types.
//!
//! Interface methods are registered together with a [`TypeRef`] describing
//! their declared return type. A `TypeRef` records which generic declaration it
//! instantiates (`decl_id`), its type parameters, and, for concrete payload
//! types, a witness that knows how to deserialize a body into that type.
//!
//! Decoded values travel through the dispatch table as a [`Payload`] and are
//! converted back to their static type at the typed edge of the proxy.

use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;

use serde::de::DeserializeOwned;

use crate::error::PlumeError;

/// A dynamically typed decoded value.
pub type Payload = Box<dyn Any + Send>;

type JsonWitness = fn(&[u8]) -> Result<Payload, serde_json::Error>;

fn decode_json<T: DeserializeOwned + Send + 'static>(
    bytes: &[u8],
) -> Result<Payload, serde_json::Error> {
    let value: T = serde_json::from_slice(bytes)?;
    Ok(Box::new(value))
}

/// Description of a declared type.
#[derive(Clone)]
pub struct TypeRef {
    name: Cow<'static, str>,
    decl_id: TypeId,
    type_params: Vec<TypeRef>,
    json: Option<JsonWitness>,
}

impl TypeRef {
    /// A concrete payload type that decoders can produce.
    pub fn of<T: DeserializeOwned + Send + 'static>() -> Self {
        Self {
            name: Cow::Borrowed(std::any::type_name::<T>()),
            decl_id: TypeId::of::<T>(),
            type_params: Vec::new(),
            json: Some(decode_json::<T>),
        }
    }

    /// An instantiation of a generic declaration.
    ///
    /// `decl_id` must be the same for every instantiation of the declaration,
    /// e.g. `TypeId::of::<Wrapper<()>>()`.
    pub fn generic(
        name: impl Into<Cow<'static, str>>,
        decl_id: TypeId,
        type_params: Vec<TypeRef>,
    ) -> Self {
        Self {
            name: name.into(),
            decl_id,
            type_params,
            json: None,
        }
    }

    /// A generic declaration used without type parameters.
    pub fn raw(name: impl Into<Cow<'static, str>>, decl_id: TypeId) -> Self {
        Self::generic(name, decl_id, Vec::new())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the declaration this type instantiates.
    pub fn decl_id(&self) -> TypeId {
        self.decl_id
    }

    pub fn type_params(&self) -> &[TypeRef] {
        &self.type_params
    }

    /// Whether this type has any type parameters.
    pub fn is_parameterized(&self) -> bool {
        !self.type_params.is_empty()
    }

    /// Whether this is the concrete type `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.decl_id == TypeId::of::<T>() && self.type_params.is_empty()
    }

    /// Resolve the last type parameter of this type, if this type is a
    /// parameterized instantiation of `decl_id`.
    pub fn last_type_param(&self, decl_id: TypeId) -> Option<&TypeRef> {
        if self.decl_id != decl_id {
            return None;
        }
        self.type_params.last()
    }

    /// Whether a JSON decoder can produce this type.
    pub fn is_decodable(&self) -> bool {
        self.json.is_some()
    }

    /// Deserialize a JSON document into this type.
    ///
    /// Returns `None` when the type has no decoding witness (e.g. it is a
    /// wrapper type rather than a payload type).
    pub fn decode_json(&self, bytes: &[u8]) -> Option<Result<Payload, serde_json::Error>> {
        self.json.map(|decode| decode(bytes))
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.decl_id == other.decl_id && self.type_params == other.type_params
    }
}

impl Eq for TypeRef {}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some((first, rest)) = self.type_params.split_first() {
            write!(f, "<{first}")?;
            for param in rest {
                write!(f, ", {param}")?;
            }
            f.write_str(">")?;
        }
        Ok(())
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeRef({self})")
    }
}

/// Convert a payload back into the type the caller expects.
pub fn downcast_payload<T: 'static>(payload: Payload) -> Result<T, PlumeError> {
    payload
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| PlumeError::ReturnType {
            expected: std::any::type_name::<T>(),
        })
}

/// Types that an interface method may declare as its return type.
///
/// `declared_type` is the registration-time witness used by contracts;
/// `from_invocation` turns whatever the invocation handler produced into the
/// declared type.
pub trait Returns: Sized {
    fn declared_type() -> TypeRef;

    fn from_invocation(result: Result<Payload, PlumeError>) -> Self;
}

/// Plain synchronous return: the call is performed before the method returns.
impl<T> Returns for Result<T, PlumeError>
where
    T: DeserializeOwned + Send + 'static,
{
    fn declared_type() -> TypeRef {
        TypeRef::of::<T>()
    }

    fn from_invocation(result: Result<Payload, PlumeError>) -> Self {
        result.and_then(downcast_payload::<T>)
    }
}
