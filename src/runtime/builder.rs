use super::core::Runtime;
use super::handle::Defaults;
use crate::classify::Classify;
use crate::fault::FaultSink;

use std::io;
use std::sync::Arc;
use std::thread;

/// Builder for configuring and creating a runtime.
///
/// `RuntimeBuilder` selects where jobs run (on the calling thread or on a
/// pool of worker threads) and the defaults inherited by every driver the
/// runtime starts.
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .worker_threads(4)
///     .strict_yields(true)
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    /// Number of worker threads; `0` runs jobs on the calling thread.
    worker_threads: usize,

    /// Prefix of worker thread names.
    thread_name: String,

    /// Defaults handed to every driver.
    strict_yields: bool,
    classifier: Option<Arc<dyn Classify>>,
    fault_sink: Option<Arc<dyn FaultSink>>,
}

impl RuntimeBuilder {
    /// Creates a builder for a multi-threaded runtime.
    ///
    /// By default, the number of worker threads is set to the number
    /// of available logical CPUs, falling back to `1` if unavailable.
    pub fn new() -> Self {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            worker_threads,
            thread_name: "fiberline-worker".to_string(),
            strict_yields: false,
            classifier: None,
            fault_sink: None,
        }
    }

    /// Creates a builder for a runtime that runs every job on the thread
    /// calling [`Runtime::block_on`] or [`Runtime::run_until_idle`].
    pub fn current_thread() -> Self {
        Self {
            worker_threads: 0,
            ..Self::new()
        }
    }

    /// Sets the number of worker threads used by the runtime.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn worker_threads(mut self, n: usize) -> Self {
        assert!(n > 0, "worker_threads must be > 0");

        self.worker_threads = n;
        self
    }

    /// Sets the prefix of worker thread names.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Rejects plain values yielded directly by a computation with a
    /// classification error. Plain entries of a fan-out are still accepted.
    pub fn strict_yields(mut self, strict: bool) -> Self {
        self.strict_yields = strict;
        self
    }

    /// Replaces the standard classifier.
    pub fn classifier(mut self, classifier: impl Classify + 'static) -> Self {
        self.classifier = Some(Arc::new(classifier));
        self
    }

    /// Reports unhandled faults of this runtime to `sink` instead of the
    /// process-wide fault sink.
    pub fn fault_sink(mut self, sink: Arc<dyn FaultSink>) -> Self {
        self.fault_sink = Some(sink);
        self
    }

    /// Builds the runtime, spawning its worker threads.
    ///
    /// # Errors
    ///
    /// Fails if a worker thread cannot be spawned.
    pub fn build(self) -> io::Result<Runtime> {
        let mut defaults = Defaults {
            strict_yields: self.strict_yields,
            fault_sink: self.fault_sink,
            ..Defaults::default()
        };

        if let Some(classifier) = self.classifier {
            defaults.classifier = classifier;
        }

        Runtime::new(self.worker_threads, &self.thread_name, defaults)
    }
}

impl Default for RuntimeBuilder {
    /// Creates a default `RuntimeBuilder`.
    fn default() -> Self {
        Self::new()
    }
}
