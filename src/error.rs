//! Error taxonomy.
//!
//! Every failure the engine deals with is an [`Error`]. Errors are cheap to
//! clone so a settled deferred value can hand the same rejection to every
//! registered reaction, and they travel verbatim: a fan-out propagates the
//! first failing entry's error as-is, without wrapping it.

use std::any::Any;
use std::sync::Arc;

use thiserror::Error;

use crate::classify::Tag;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by operations, computations and the engine itself.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A yielded value matches none of the recognized shapes.
    #[error(
        "you may only yield an operation, deferred value, computation, list, or map, \
         but the following was passed: \"{value}\""
    )]
    Classification {
        /// Rendering of the offending value.
        value: String,
    },

    /// A classifier tagged a value with a shape the value does not have.
    #[error("value \"{value}\" was classified as {tag:?} but does not have that shape")]
    Mismatch {
        /// The tag the classifier produced.
        tag: Tag,
        /// Rendering of the offending value.
        value: String,
    },

    /// A failure reported by an operation, a deferred value or a computation.
    #[error(transparent)]
    Failed(Arc<dyn std::error::Error + Send + Sync>),

    /// A plain failure message.
    #[error("{0}")]
    Message(String),

    /// A panic caught while invoking an operation or resuming a computation.
    #[error("panicked: {0}")]
    Panicked(String),

    /// Every handle to a completion callback was dropped before it fired.
    #[error("completion callback dropped without being invoked")]
    Abandoned,

    /// A take-once value (an operation or a computation) was used twice.
    #[error("take-once value already consumed")]
    Consumed,
}

impl Error {
    /// Wraps an arbitrary error.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Failed(Arc::new(error))
    }

    /// Builds an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Builds an error from a panic payload caught with `catch_unwind`.
    pub(crate) fn panicked(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "opaque panic payload".to_string()
        };

        Self::Panicked(message)
    }

    /// Returns `true` for [`Error::Classification`] and [`Error::Mismatch`].
    pub fn is_classification(&self) -> bool {
        matches!(self, Self::Classification { .. } | Self::Mismatch { .. })
    }

    /// Attempts to view the wrapped error as a concrete type.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        match self {
            Self::Failed(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Returns `true` when both errors are the same failure.
    ///
    /// Wrapped errors compare by identity, everything else by value.
    pub fn same(&self, other: &Error) -> bool {
        match (self, other) {
            (Self::Failed(a), Self::Failed(b)) => Arc::ptr_eq(a, b),
            (Self::Classification { value: a }, Self::Classification { value: b }) => a == b,
            (Self::Mismatch { tag: t1, value: a }, Self::Mismatch { tag: t2, value: b }) => {
                t1 == t2 && a == b
            }
            (Self::Message(a), Self::Message(b)) => a == b,
            (Self::Panicked(a), Self::Panicked(b)) => a == b,
            (Self::Abandoned, Self::Abandoned) | (Self::Consumed, Self::Consumed) => true,
            _ => false,
        }
    }
}
