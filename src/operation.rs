//! Callback-style operations and their completion callback.
//!
//! Every yielded value is lowered into an [`Operation`]: a function that,
//! once invoked, eventually reports its outcome through the [`Completion`] it
//! was handed. The driver does not trust operations to report exactly once;
//! the completion enforces it.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::drive::Context;
use crate::error::{Error, Result};
use crate::value::Value;

type OnceFn = Box<dyn FnOnce(&Context, Completion) + Send>;
type ReusableFn = Arc<dyn Fn(&Context, Completion) + Send + Sync>;

#[derive(Clone)]
enum Body {
    Reusable(ReusableFn),
    Once(Arc<Mutex<Option<OnceFn>>>),
}

/// A callback-style operation.
///
/// An operation is invoked with the driver's [`Context`] and a
/// [`Completion`]. It may complete inline or from any thread later on.
#[derive(Clone)]
pub struct Operation {
    body: Body,
}

impl Operation {
    /// Creates an operation that can be invoked any number of times, once per
    /// yield.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Context, Completion) + Send + Sync + 'static,
    {
        Self {
            body: Body::Reusable(Arc::new(f)),
        }
    }

    /// Creates an operation that can be invoked a single time.
    ///
    /// Invoking it again completes with [`Error::Consumed`].
    pub fn once<F>(f: F) -> Self
    where
        F: FnOnce(&Context, Completion) + Send + 'static,
    {
        Self {
            body: Body::Once(Arc::new(Mutex::new(Some(Box::new(f))))),
        }
    }

    /// Invokes the operation.
    ///
    /// A panic raised synchronously by the operation is caught and reported
    /// as a failure, deferred through the context's scheduler and subject to
    /// the completion's at-most-once guard.
    pub(crate) fn invoke(self, ctx: &Context, completion: Completion) {
        let f: OnceFn = match self.body {
            Body::Reusable(f) => {
                Box::new(move |ctx: &Context, completion: Completion| f(ctx, completion))
            }
            Body::Once(slot) => match slot.lock().take() {
                Some(f) => f,
                None => {
                    ctx.schedule(move || {
                        completion.fail(Error::Consumed);
                    });
                    return;
                }
            },
        };

        let guard = completion.clone();
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| f(ctx, completion))) {
            let error = Error::panicked(payload);
            tracing::debug!(%error, "operation panicked while being invoked");

            ctx.schedule(move || {
                guard.fail(error);
            });
        }
    }

    pub(crate) fn same(&self, other: &Operation) -> bool {
        match (&self.body, &other.body) {
            (Body::Reusable(a), Body::Reusable(b)) => Arc::ptr_eq(a, b),
            (Body::Once(a), Body::Once(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.body {
            Body::Reusable(_) => "reusable",
            Body::Once(_) => "once",
        };
        f.debug_tuple("Operation").field(&kind).finish()
    }
}

type Callback = Box<dyn FnOnce(Result<Value>) + Send>;

struct Slot {
    callback: Mutex<Option<Callback>>,
}

impl Drop for Slot {
    /// Completes with [`Error::Abandoned`] if no clone ever completed.
    fn drop(&mut self) {
        if let Some(callback) = self.callback.get_mut().take() {
            tracing::debug!("completion dropped without being invoked");
            callback(Err(Error::Abandoned));
        }
    }
}

/// The `(error, result)` completion callback handed to an operation.
///
/// Clones share one slot: the first call to [`complete`](Self::complete)
/// wins and every later call is ignored. If every clone is dropped before
/// anything completes, the callback fires with [`Error::Abandoned`].
#[derive(Clone)]
pub struct Completion {
    slot: Arc<Slot>,
}

impl Completion {
    pub(crate) fn new<F>(callback: F) -> Self
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        Self {
            slot: Arc::new(Slot {
                callback: Mutex::new(Some(Box::new(callback))),
            }),
        }
    }

    /// Reports the outcome. Returns `false` if an outcome was already
    /// reported, in which case this one is discarded.
    pub fn complete(&self, result: Result<Value>) -> bool {
        let callback = self.slot.callback.lock().take();

        match callback {
            Some(callback) => {
                callback(result);
                true
            }
            None => {
                tracing::debug!(ok = result.is_ok(), "ignoring duplicate completion");
                false
            }
        }
    }

    /// Reports success.
    pub fn ok(&self, value: impl Into<Value>) -> bool {
        self.complete(Ok(value.into()))
    }

    /// Reports success with several results, collected into a list.
    pub fn ok_many<I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = Value>,
    {
        self.complete(Ok(Value::List(values.into_iter().collect())))
    }

    /// Reports failure.
    pub fn fail(&self, error: Error) -> bool {
        self.complete(Err(error))
    }

    /// Returns `true` once an outcome has been reported.
    pub fn is_completed(&self) -> bool {
        self.slot.callback.lock().is_none()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("completed", &self.is_completed())
            .finish()
    }
}
