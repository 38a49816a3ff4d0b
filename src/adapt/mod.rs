//! Continuation adapter.
//!
//! Lowers a classified value into the single canonical shape the driver
//! knows how to wait on: an [`Operation`].
//!
//! - nested computations and factories run under a fresh driver that
//!   inherits the context, completing with its terminal outcome,
//! - deferred values register reactions forwarding to the completion,
//! - operations pass through unchanged,
//! - lists and maps fan out (see [`aggregate`]),
//! - plain values complete with themselves from a scheduled job.

mod aggregate;

use crate::classify::Tag;
use crate::computation::{Computation, Factory};
use crate::deferred::Thenable;
use crate::drive::{Context, Driver, Notify};
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::value::Value;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Classifies and lowers a value yielded directly by a computation.
///
/// Under the strict-yield policy a plain value is a classification error.
pub(crate) fn adapt_yielded(value: Value, ctx: &Context) -> Result<Operation> {
    let tag = classify(&value, ctx)?;
    tracing::trace!(?tag, kind = value.kind(), "classified yielded value");

    if tag == Tag::Plain && ctx.is_strict() {
        return Err(Error::Classification {
            value: value.to_string(),
        });
    }

    adapt(tag, value)
}

/// Classifies `value` with the context's classifier.
///
/// A panicking classifier is reported as an error.
pub(crate) fn classify(value: &Value, ctx: &Context) -> Result<Tag> {
    panic::catch_unwind(AssertUnwindSafe(|| ctx.classifier().classify(value)))
        .map_err(Error::panicked)
}

/// Lowers `value`, tagged `tag`, into an operation.
///
/// The operation receives the context it runs under when invoked, which is
/// how nested drivers inherit it.
pub(crate) fn adapt(tag: Tag, value: Value) -> Result<Operation> {
    match (tag, value) {
        (Tag::ResumableHandle, Value::Computation(resumable)) => Ok(nested(resumable.take()?)),
        (Tag::ResumableHandle, Value::Factory(factory)) => Ok(from_factory(factory)),
        (Tag::Deferred, Value::Deferred(thenable)) => Ok(from_thenable(thenable)),
        (Tag::CallbackOperation, Value::Operation(operation)) => Ok(operation),
        (Tag::OrderedCollection, Value::List(items)) => Ok(aggregate::ordered(items)),
        (Tag::KeyedCollection, Value::Map(map)) => Ok(aggregate::keyed(map)),
        (Tag::Plain, value) => Ok(resolved(value)),
        (Tag::Unrecognized, value) => Err(Error::Classification {
            value: value.to_string(),
        }),
        (tag, value) => Err(Error::Mismatch {
            tag,
            value: value.to_string(),
        }),
    }
}

/// Runs `computation` under a nested driver.
fn nested(computation: Box<dyn Computation>) -> Operation {
    Operation::once(move |ctx, completion| {
        Driver::new(computation, ctx.clone(), Notify::Completion(completion)).start();
    })
}

/// Builds a fresh computation from `factory` and runs it under a nested
/// driver.
fn from_factory(factory: Factory) -> Operation {
    Operation::once(move |ctx, completion| {
        let computation = factory.build(ctx);
        Driver::new(computation, ctx.clone(), Notify::Completion(completion)).start();
    })
}

/// Forwards the first settlement of `thenable` to the completion.
fn from_thenable(thenable: Arc<dyn Thenable>) -> Operation {
    Operation::once(move |_, completion| {
        let on_failure = completion.clone();

        thenable.register(
            Box::new(move |value: Value| {
                completion.ok(value);
            }),
            Box::new(move |error: Error| {
                on_failure.fail(error);
            }),
        );
    })
}

/// Completes with `value` from a scheduled job.
fn resolved(value: Value) -> Operation {
    Operation::once(move |ctx, completion| {
        ctx.schedule(move || {
            completion.ok(value);
        });
    })
}
