use super::context;
use super::injector::Injector;
use super::{Job, Schedule};
use crate::classify::{Classify, StandardClassifier};
use crate::computation::Computation;
use crate::drive::{Context, Drive};
use crate::error::Error;
use crate::fault::{self, FaultSink};

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Defaults inherited by every driver started through a handle.
pub(crate) struct Defaults {
    pub(crate) strict_yields: bool,
    pub(crate) classifier: Arc<dyn Classify>,
    pub(crate) fault_sink: Option<Arc<dyn FaultSink>>,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            strict_yields: false,
            classifier: Arc::new(StandardClassifier),
            fault_sink: None,
        }
    }
}

/// A cloneable handle to a runtime.
///
/// The handle is the runtime's scheduling capability: it queues jobs and
/// starts drivers. It stays usable after the runtime is dropped, but jobs
/// scheduled from then on are discarded.
#[derive(Clone)]
pub struct Handle {
    pub(crate) injector: Arc<Injector>,
    pub(crate) defaults: Arc<Defaults>,
}

impl Handle {
    pub(crate) fn new(injector: Arc<Injector>, defaults: Defaults) -> Self {
        Self {
            injector,
            defaults: Arc::new(defaults),
        }
    }

    /// Returns the handle of the runtime running the current thread.
    ///
    /// This is set on worker threads and, for a current-thread runtime,
    /// while [`Runtime::block_on`](super::core::Runtime::block_on) or
    /// [`Runtime::run_until_idle`](super::core::Runtime::run_until_idle) runs.
    pub fn current() -> Option<Handle> {
        context::current()
    }

    /// Builds a fresh execution context carrying this runtime's defaults.
    pub fn context(&self) -> Context {
        let mut ctx = Context::new(Arc::new(self.clone()))
            .with_strict(self.defaults.strict_yields)
            .with_classifier(self.defaults.classifier.clone());

        if let Some(sink) = &self.defaults.fault_sink {
            ctx = ctx.with_fault_sink(sink.clone());
        }

        ctx
    }

    /// Prepares to drive `computation` on this runtime.
    pub fn drive<C>(&self, computation: C) -> Drive
    where
        C: Computation + 'static,
    {
        Drive::with_context(computation, self.context()).on_runtime(self.clone())
    }

    /// Number of jobs waiting in the queue.
    pub fn queued(&self) -> usize {
        self.injector.len()
    }

    /// Runs one job, reporting a panic escaping it to the fault sink.
    pub(crate) fn run_job(&self, job: Job) {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            let error = Error::panicked(payload);
            tracing::warn!(%error, "job panicked");

            fault::report_to(self.defaults.fault_sink.as_ref(), error);
        }
    }
}

impl Schedule for Handle {
    fn schedule(&self, job: Job) {
        self.injector.push(job);
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("queued", &self.queued())
            .field("strict_yields", &self.defaults.strict_yields)
            .finish()
    }
}
