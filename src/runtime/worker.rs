use super::context::enter_context;
use super::handle::Handle;

/// A worker thread of a multi-threaded runtime.
///
/// Workers share the runtime's FIFO injector: each one takes the oldest
/// queued job, runs it, and parks when the queue is empty.
pub(crate) struct Worker {
    /// Identifier of the worker, used in diagnostics.
    id: usize,

    /// Handle of the owning runtime.
    handle: Handle,
}

impl Worker {
    pub(crate) fn new(id: usize, handle: Handle) -> Self {
        Self { id, handle }
    }

    /// Runs the worker loop until the runtime shuts down.
    ///
    /// The runtime handle is installed as the current handle for the whole
    /// lifetime of the thread.
    pub(crate) fn run(self) {
        let handle = self.handle.clone();

        enter_context(handle, || {
            tracing::trace!(worker = self.id, "worker started");

            loop {
                if self.handle.injector.is_shutdown() {
                    break;
                }

                if let Some(job) = self.handle.injector.pop() {
                    self.handle.run_job(job);
                    continue;
                }

                self.handle.injector.park();
            }

            tracing::trace!(worker = self.id, "worker stopped");
        });
    }
}
