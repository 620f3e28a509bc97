//! Runtime values.
//!
//! A [`Value`] is a piece of [`Data`] stamped with the registered type it
//! belongs to. The type stamp, not the Rust variant, is what the converter
//! and comparator registries dispatch on.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Identity of a registered semantic type.
///
/// Allocated sequentially by the type registry. `TypeId::OBJECT` is the
/// universal fallback type every other type is assignable to.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct TypeId(u32);

impl TypeId {
    /// The universal fallback type.
    pub const OBJECT: TypeId = TypeId(0);

    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        TypeId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque addon-defined payload, compared by identity.
#[derive(Clone)]
pub struct Handle(Arc<dyn Any + Send + Sync>);

impl Handle {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Handle(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({:p})", Arc::as_ptr(&self.0))
    }
}

/// The payload of a runtime value.
#[derive(Clone, Debug, PartialEq)]
pub enum Data {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(Arc<str>),
    Handle(Handle),
}

impl Data {
    pub fn text(s: impl AsRef<str>) -> Self {
        Data::Text(Arc::from(s.as_ref()))
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Data::Boolean(b) => write!(f, "{b}"),
            Data::Integer(n) => write!(f, "{n}"),
            Data::Float(x) => write!(f, "{x}"),
            Data::Text(s) => write!(f, "{s}"),
            Data::Handle(h) => write!(f, "{h:?}"),
        }
    }
}

/// A runtime value: data plus the registered type it belongs to.
///
/// Two values are equal when both the type stamp and the data are equal.
/// Handles compare by identity.
#[derive(Clone, Debug, PartialEq)]
pub struct Value {
    ty: TypeId,
    data: Data,
}

impl Value {
    pub fn new(ty: TypeId, data: Data) -> Self {
        Value { ty, data }
    }

    #[inline]
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    #[inline]
    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn into_data(self) -> Data {
        self.data
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.data {
            Data::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.data {
            Data::Integer(n) => Some(n),
            _ => None,
        }
    }

    /// Numeric view of integer and float data.
    #[expect(
        clippy::cast_precision_loss,
        reason = "script numbers are compared as f64 like the display layer does"
    )]
    pub fn as_float(&self) -> Option<f64> {
        match self.data {
            Data::Integer(n) => Some(n as f64),
            Data::Float(x) => Some(x),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            Data::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_handle<T: Any>(&self) -> Option<&T> {
        match &self.data {
            Data::Handle(h) => h.downcast_ref::<T>(),
            _ => None,
        }
    }
}
