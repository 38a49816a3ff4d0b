//! Process-wide fault sink.
//!
//! A driver nobody observes has no caller to hand its terminal error to.
//! Such errors, and panics escaping runtime jobs, are reported here instead
//! of being swallowed.
//!
//! The sink has an explicit lifecycle: [`install`] one at process start (or
//! in a test), [`uninstall`] it when done. When nothing is installed, faults
//! are logged through [`LogSink`]. A runtime built with
//! [`RuntimeBuilder::fault_sink`](crate::RuntimeBuilder::fault_sink) reports
//! to its own sink and bypasses this one.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::Error;

/// Receives unhandled faults.
pub trait FaultSink: Send + Sync {
    fn report(&self, error: Error);
}

impl<F> FaultSink for F
where
    F: Fn(Error) + Send + Sync,
{
    fn report(&self, error: Error) {
        self(error)
    }
}

static SINK: RwLock<Option<Arc<dyn FaultSink>>> = parking_lot::const_rwlock(None);

/// Installs `sink` as the process-wide fault sink, returning the previous one.
pub fn install(sink: Arc<dyn FaultSink>) -> Option<Arc<dyn FaultSink>> {
    SINK.write().replace(sink)
}

/// Removes the process-wide fault sink, returning it.
pub fn uninstall() -> Option<Arc<dyn FaultSink>> {
    SINK.write().take()
}

/// Reports `error` to the process-wide fault sink.
pub fn report(error: Error) {
    let sink = SINK.read().clone();

    match sink {
        Some(sink) => sink.report(error),
        None => LogSink.report(error),
    }
}

/// Reports `error` to `sink` if given, to the process-wide sink otherwise.
pub(crate) fn report_to(sink: Option<&Arc<dyn FaultSink>>, error: Error) {
    match sink {
        Some(sink) => sink.report(error),
        None => report(error),
    }
}

/// Logs every fault at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl FaultSink for LogSink {
    fn report(&self, error: Error) {
        tracing::error!(%error, "unhandled fault");
    }
}

/// Buffers faults for later inspection.
#[derive(Default)]
pub struct Collector {
    errors: Mutex<Vec<Error>>,
}

impl Collector {
    /// Creates an empty collector, shared so it can be installed as a sink.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Removes and returns every buffered fault.
    pub fn take(&self) -> Vec<Error> {
        std::mem::take(&mut *self.errors.lock())
    }

    /// Number of faults collected and not yet taken.
    pub fn len(&self) -> usize {
        self.errors.lock().len()
    }

    /// Returns `true` when nothing is waiting to be taken.
    pub fn is_empty(&self) -> bool {
        self.errors.lock().is_empty()
    }

    /// Asserts that no fault was reported.
    ///
    /// # Panics
    ///
    /// Panics, listing the buffered faults, if there are any.
    pub fn assert_empty(&self) {
        let errors = self.errors.lock();
        assert!(errors.is_empty(), "unexpected faults: {errors:?}");
    }
}

impl FaultSink for Collector {
    fn report(&self, error: Error) {
        self.errors.lock().push(error);
    }
}

impl fmt::Debug for Collector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collector")
            .field("faults", &self.len())
            .finish()
    }
}
