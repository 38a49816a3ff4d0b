//! Value classification.
//!
//! Before a yielded value can be waited on, it is tagged with the shape that
//! decides how it gets lowered into an operation. The classifier is pure: it
//! only looks at the value.
//!
//! Rules are checked in a fixed order, first match wins:
//!
//! 1. [`Tag::ResumableHandle`]: a nested computation or computation factory
//! 2. [`Tag::Deferred`]: a value exposing the registration contract
//! 3. [`Tag::CallbackOperation`]: a callback-style operation
//! 4. [`Tag::OrderedCollection`]: a list
//! 5. [`Tag::KeyedCollection`]: a map
//! 6. [`Tag::Plain`]: scalar data, already resolved
//!
//! Anything else is [`Tag::Unrecognized`].
//!
//! A custom [`Classify`] implementation can widen the rules, for instance to
//! accept some [`Value::Foreign`] objects as plain results. The adapter still
//! checks that the value really has the tagged shape.

use crate::value::Value;

/// The shape of a yielded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    ResumableHandle,
    Deferred,
    CallbackOperation,
    OrderedCollection,
    KeyedCollection,
    Plain,
    Unrecognized,
}

impl Tag {
    /// Returns `true` for the two fan-out shapes.
    pub fn is_collection(self) -> bool {
        matches!(self, Self::OrderedCollection | Self::KeyedCollection)
    }
}

/// A pluggable classification strategy.
pub trait Classify: Send + Sync {
    fn classify(&self, value: &Value) -> Tag;
}

/// The standard ordered rule list.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardClassifier;

impl Classify for StandardClassifier {
    fn classify(&self, value: &Value) -> Tag {
        classify(value)
    }
}

/// Classifies `value` with the standard rules.
pub fn classify(value: &Value) -> Tag {
    match value {
        Value::Computation(_) | Value::Factory(_) => Tag::ResumableHandle,
        Value::Deferred(_) => Tag::Deferred,
        Value::Operation(_) => Tag::CallbackOperation,
        Value::List(_) => Tag::OrderedCollection,
        Value::Map(_) => Tag::KeyedCollection,
        Value::Null | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_) => {
            Tag::Plain
        }
        Value::Foreign(_) => Tag::Unrecognized,
    }
}

impl<F> Classify for F
where
    F: Fn(&Value) -> Tag + Send + Sync,
{
    fn classify(&self, value: &Value) -> Tag {
        self(value)
    }
}
