use super::Job;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

/// Upper bound on a single park, so a missed notification costs at most
/// this much latency.
const PARK_TIMEOUT: Duration = Duration::from_millis(1);

/// The FIFO job queue shared by every thread of a runtime.
///
/// Jobs are pushed at the back and taken from the front. Idle threads park
/// on a condition variable until a job arrives or the runtime shuts down.
pub(crate) struct Injector {
    /// Queued jobs, oldest first.
    queue: Mutex<VecDeque<Job>>,

    /// Wakes parked threads.
    condvar: Condvar,

    /// Set once the runtime starts shutting down.
    shutdown: AtomicBool,
}

impl Injector {
    pub(crate) fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    /// Pushes a job at the back of the queue and wakes one parked thread.
    ///
    /// Jobs pushed after shutdown are dropped.
    pub(crate) fn push(&self, job: Job) {
        if self.is_shutdown() {
            // Dropped outside the lock: dropping a job may schedule another.
            drop(job);
            return;
        }

        self.queue.lock().push_back(job);
        self.condvar.notify_one();
    }

    /// Takes the oldest queued job.
    pub(crate) fn pop(&self) -> Option<Job> {
        self.queue.lock().pop_front()
    }

    /// Parks the current thread until a job is pushed, shutdown begins, or
    /// the park times out.
    pub(crate) fn park(&self) {
        let mut queue = self.queue.lock();

        if queue.is_empty() && !self.is_shutdown() {
            let _ = self.condvar.wait_for(&mut queue, PARK_TIMEOUT);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Signals shutdown and wakes every parked thread.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.condvar.notify_all();
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Drops every queued job, returning how many there were.
    pub(crate) fn drain(&self) -> usize {
        let jobs = std::mem::take(&mut *self.queue.lock());
        let count = jobs.len();

        drop(jobs);
        count
    }
}
