use crate::classify::{Classify, StandardClassifier};
use crate::fault::FaultSink;
use crate::runtime::Schedule;

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The execution context a driver runs under.
///
/// Every operation a driver invokes receives its context, and nested
/// computations and fan-out entries inherit it unchanged. It carries:
/// - the scheduler resumptions and notifications are queued on,
/// - the binding fixed by [`Drive::bind`](super::Drive::bind),
/// - the classifier used on yielded values,
/// - the strict-yield policy and an optional fault sink override.
#[derive(Clone)]
pub struct Context {
    scheduler: Arc<dyn Schedule>,
    binding: Option<Arc<dyn Any + Send + Sync>>,
    classifier: Arc<dyn Classify>,
    fault_sink: Option<Arc<dyn FaultSink>>,
    strict: bool,
}

impl Context {
    /// Creates a context scheduling on `scheduler`, with the standard
    /// classifier, no binding and lenient yields.
    pub fn new(scheduler: Arc<dyn Schedule>) -> Self {
        Self {
            scheduler,
            binding: None,
            classifier: Arc::new(StandardClassifier),
            fault_sink: None,
            strict: false,
        }
    }

    /// Sets the value operations see through [`binding`](Self::binding).
    pub fn with_binding<T>(mut self, binding: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.binding = Some(Arc::new(binding));
        self
    }

    pub(crate) fn with_shared_binding(mut self, binding: Arc<dyn Any + Send + Sync>) -> Self {
        self.binding = Some(binding);
        self
    }

    /// Replaces the classifier used on yielded values.
    pub fn with_classifier(mut self, classifier: Arc<dyn Classify>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Routes unobserved failures to `sink` instead of the global one.
    pub fn with_fault_sink(mut self, sink: Arc<dyn FaultSink>) -> Self {
        self.fault_sink = Some(sink);
        self
    }

    /// When `strict`, yielding a plain value is a classification error.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Returns the binding if it is a `T`.
    pub fn binding<T: Any>(&self) -> Option<&T> {
        self.binding.as_deref()?.downcast_ref::<T>()
    }

    /// Queues `f` to run after the current call returns.
    pub fn schedule<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.scheduler.schedule(Box::new(f));
    }

    /// The scheduler resumptions are queued on.
    pub fn scheduler(&self) -> &Arc<dyn Schedule> {
        &self.scheduler
    }

    /// Whether plain yields are rejected.
    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub(crate) fn classifier(&self) -> &dyn Classify {
        &*self.classifier
    }

    pub(crate) fn fault_sink(&self) -> Option<&Arc<dyn FaultSink>> {
        self.fault_sink.as_ref()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("bound", &self.binding.is_some())
            .field("strict", &self.strict)
            .finish()
    }
}
