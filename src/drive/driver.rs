use super::context::Context;
use super::join::Notify;
use crate::adapt;
use crate::computation::{Computation, Step};
use crate::error::{Error, Result};
use crate::operation::Completion;
use crate::value::Value;

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// The suspension driver.
///
/// A driver owns one computation and advances it one step at a time:
///
/// - **Start**: resume with [`Value::Null`].
/// - **Stepping**: a yielded value is classified and lowered into an
///   operation, which is invoked once with a fresh [`Completion`]. A value
///   that cannot be lowered resumes the computation with the error instead.
/// - The completion schedules the next resumption, with the result or with
///   the error, on the context's scheduler.
/// - **Terminal**: the computation finished, failed or panicked. It is
///   dropped and the outcome is handed to the observer as a scheduled job.
///
/// Resumptions never overlap: a new one is only scheduled by the completion
/// of the operation dispatched by the previous one.
pub(crate) struct Driver {
    /// Identifier used in diagnostics.
    id: u64,

    /// Context every operation is invoked with.
    ctx: Context,

    /// The computation; `None` once terminal.
    computation: Mutex<Option<Box<dyn Computation>>>,

    /// Terminal observer; taken when the outcome is delivered.
    notify: Mutex<Option<Notify>>,

    /// Number of resumptions so far.
    steps: AtomicU64,
}

impl Driver {
    pub(crate) fn new(
        computation: Box<dyn Computation>,
        ctx: Context,
        notify: Notify,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            ctx,
            computation: Mutex::new(Some(computation)),
            notify: Mutex::new(Some(notify)),
            steps: AtomicU64::new(0),
        })
    }

    /// Performs the first resumption on the calling thread.
    ///
    /// Whatever happens, the outcome is only ever delivered through the
    /// observer, never returned or raised here.
    pub(crate) fn start(self: Arc<Self>) {
        tracing::debug!(driver = self.id, "driver started");
        self.step(Ok(Value::Null));
    }

    /// Resumes the computation with `input` and acts on the resulting step.
    fn step(self: &Arc<Self>, input: Result<Value>) {
        let outcome = {
            let mut slot = self.computation.lock();
            let Some(computation) = slot.as_mut() else {
                return;
            };

            let step = self.steps.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(driver = self.id, step, ok = input.is_ok(), "resuming");

            panic::catch_unwind(AssertUnwindSafe(|| match input {
                Ok(value) => computation.resume(value),
                Err(error) => computation.resume_with_error(error),
            }))
        };

        match outcome {
            Ok(Ok(Step::Yield(value))) => self.dispatch(value),
            Ok(Ok(Step::Done(value))) => self.finish(Ok(value)),
            Ok(Err(error)) => self.finish(Err(error)),
            Err(payload) => self.finish(Err(Error::panicked(payload))),
        }
    }

    /// Lowers a yielded value and invokes the resulting operation.
    fn dispatch(self: &Arc<Self>, yielded: Value) {
        let operation = match adapt::adapt_yielded(yielded, &self.ctx) {
            Ok(operation) => operation,
            Err(error) => {
                tracing::debug!(driver = self.id, %error, "yielded value rejected");
                self.resume_later(Err(error));
                return;
            }
        };

        let driver = self.clone();
        let completion = Completion::new(move |result| driver.resume_later(result));

        operation.invoke(&self.ctx, completion);
    }

    /// Schedules the next resumption.
    fn resume_later(self: &Arc<Self>, input: Result<Value>) {
        let driver = self.clone();
        self.ctx.schedule(move || driver.step(input));
    }

    /// Enters the terminal state and schedules the notification.
    fn finish(&self, outcome: Result<Value>) {
        let computation = self.computation.lock().take();
        drop(computation);

        let Some(notify) = self.notify.lock().take() else {
            return;
        };

        tracing::debug!(
            driver = self.id,
            steps = self.steps.load(Ordering::Relaxed),
            ok = outcome.is_ok(),
            "driver finished"
        );

        let sink = self.ctx.fault_sink().cloned();
        self.ctx
            .schedule(move || notify.deliver(outcome, sink.as_ref()));
    }
}

impl Drop for Driver {
    /// A driver dropped before reaching a terminal state (its pending jobs
    /// were discarded) notifies its observer with [`Error::Abandoned`].
    fn drop(&mut self) {
        if let Some(notify) = self.notify.get_mut().take() {
            tracing::debug!(driver = self.id, "driver dropped before finishing");

            let sink = self.ctx.fault_sink().cloned();
            self.ctx
                .schedule(move || notify.deliver(Err(Error::Abandoned), sink.as_ref()));
        }
    }
}
