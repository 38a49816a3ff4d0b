//! The dynamic value exchanged between a computation and its driver.
//!
//! A computation yields a [`Value`] to describe what it is waiting on and is
//! resumed with a [`Value`] once that wait is over. The same type therefore
//! carries plain data (numbers, strings, containers of results) as well as
//! the suspendable shapes the classifier recognizes: deferred values, nested
//! computations, computation factories and callback operations.
//!
//! Containers nest arbitrarily: a list of maps of deferred values is a valid
//! yield, and it resolves to a list of maps of results.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::computation::{Computation, Factory, Resumable};
use crate::deferred::{Deferred, Thenable};
use crate::drive::Context;
use crate::operation::{Completion, Operation};

/// A key → value mapping.
///
/// Keys are kept sorted, so results built from a mapping enumerate in the
/// same order as their source.
pub type Map = BTreeMap<String, Value>;

/// A dynamically-shaped value.
#[derive(Clone, Default)]
pub enum Value {
    /// The absence of a value. Computations are first resumed with it.
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// An ordered sequence. Yielding one fans out over its elements.
    List(Vec<Value>),
    /// A keyed collection. Yielding one fans out over its entries.
    Map(Map),
    /// A value exposing the [`Thenable`] registration contract.
    Deferred(Arc<dyn Thenable>),
    /// An already-constructed nested computation.
    Computation(Resumable),
    /// A factory building a fresh nested computation each time it is yielded.
    Factory(Factory),
    /// A callback-style operation.
    Operation(Operation),
    /// Any other object. Not recognized by the standard classifier.
    Foreign(Foreign),
}

impl Value {
    /// Wraps a computation so it can be yielded as a nested resumable.
    pub fn computation<C>(computation: C) -> Self
    where
        C: Computation + 'static,
    {
        Self::Computation(Resumable::new(computation))
    }

    /// Wraps a factory so it can be yielded as a nested resumable.
    pub fn factory<F>(factory: F) -> Self
    where
        F: Fn(&Context) -> Box<dyn Computation> + Send + Sync + 'static,
    {
        Self::Factory(Factory::new(factory))
    }

    /// Wraps a reusable callback-style operation.
    pub fn operation<F>(f: F) -> Self
    where
        F: Fn(&Context, Completion) + Send + Sync + 'static,
    {
        Self::Operation(Operation::new(f))
    }

    /// Wraps a single-shot callback-style operation.
    pub fn operation_once<F>(f: F) -> Self
    where
        F: FnOnce(&Context, Completion) + Send + 'static,
    {
        Self::Operation(Operation::once(f))
    }

    /// Wraps any deferred-value implementation.
    pub fn deferred<T>(thenable: T) -> Self
    where
        T: Thenable + 'static,
    {
        Self::Deferred(Arc::new(thenable))
    }

    /// Wraps an arbitrary foreign object.
    pub fn foreign<T>(object: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self::Foreign(Foreign::new(object))
    }

    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the boolean held, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer held, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the number held as a float. Integers are widened.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            Self::Int(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Returns the string held, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the entries of a list value.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries of a map value.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Consumes the value, returning the list it holds.
    pub fn into_list(self) -> Option<Vec<Value>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Consumes the value, returning the map it holds.
    pub fn into_map(self) -> Option<Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Deferred(_) => "deferred",
            Self::Computation(_) => "computation",
            Self::Factory(_) => "factory",
            Self::Operation(_) => "operation",
            Self::Foreign(_) => "foreign",
        }
    }
}

impl PartialEq for Value {
    /// Data compares structurally. Deferred values, nested computations,
    /// factories, operations and foreign objects compare by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Deferred(a), Self::Deferred(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            (Self::Computation(a), Self::Computation(b)) => a.same(b),
            (Self::Factory(a), Self::Factory(b)) => a.same(b),
            (Self::Operation(a), Self::Operation(b)) => a.same(b),
            (Self::Foreign(a), Self::Foreign(b)) => a.same(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Self::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Self::Foreign(foreign) => f.debug_tuple("Foreign").field(&foreign.type_name).finish(),
            other => write!(f, "<{}>", other.kind()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, item)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
            Self::Foreign(foreign) => write!(f, "<foreign {}>", foreign.type_name),
            other => write!(f, "<{}>", other.kind()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Int(n.into())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Map(map)
    }
}

impl From<Deferred> for Value {
    fn from(deferred: Deferred) -> Self {
        Self::Deferred(Arc::new(deferred))
    }
}

impl From<Operation> for Value {
    fn from(operation: Operation) -> Self {
        Self::Operation(operation)
    }
}

impl From<Resumable> for Value {
    fn from(resumable: Resumable) -> Self {
        Self::Computation(resumable)
    }
}

impl From<Factory> for Value {
    fn from(factory: Factory) -> Self {
        Self::Factory(factory)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::List(iter.into_iter().collect())
    }
}

/// An opaque object carried through a [`Value`].
#[derive(Clone)]
pub struct Foreign {
    type_name: &'static str,
    object: Arc<dyn Any + Send + Sync>,
}

impl Foreign {
    /// Wraps `object`, remembering its type name for display.
    pub fn new<T>(object: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            type_name: std::any::type_name::<T>(),
            object: Arc::new(object),
        }
    }

    /// Name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the wrapped object if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    fn same(&self, other: &Foreign) -> bool {
        Arc::ptr_eq(&self.object, &other.object)
    }
}
