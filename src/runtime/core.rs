use super::context::enter_context;
use super::handle::{Defaults, Handle};
use super::injector::Injector;
use super::worker::Worker;
use crate::computation::Computation;
use crate::drive::Drive;
use crate::error::{Error, Result};
use crate::value::Value;

use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, TryRecvError};
use std::thread::{self, JoinHandle};

/// The runtime that runs driver jobs.
///
/// `Runtime` is responsible for:
/// - owning the FIFO job queue drivers schedule their resumptions on,
/// - running those jobs, either on worker threads or on the calling thread,
/// - providing a synchronous entry point via [`block_on`](Self::block_on).
///
/// Dropping the runtime stops the workers and discards queued jobs.
pub struct Runtime {
    /// Scheduling handle shared with every driver.
    handle: Handle,

    /// Worker threads; empty for a current-thread runtime.
    workers: Vec<JoinHandle<()>>,
}

impl Runtime {
    /// Creates a runtime with `worker_threads` workers, or a current-thread
    /// runtime if `worker_threads == 0`.
    pub(crate) fn new(
        worker_threads: usize,
        thread_name: &str,
        defaults: Defaults,
    ) -> io::Result<Self> {
        let handle = Handle::new(Arc::new(Injector::new()), defaults);
        let mut workers = Vec::with_capacity(worker_threads);

        for id in 0..worker_threads {
            let worker = Worker::new(id, handle.clone());

            let spawned = thread::Builder::new()
                .name(format!("{thread_name}-{id}"))
                .spawn(move || worker.run());

            match spawned {
                Ok(join) => workers.push(join),
                Err(error) => {
                    handle.injector.shutdown();
                    for join in workers {
                        let _ = join.join();
                    }
                    return Err(error);
                }
            }
        }

        tracing::debug!(workers = worker_threads, "runtime started");

        Ok(Self { handle, workers })
    }

    /// Returns the runtime's handle.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Returns `true` if jobs run on the calling thread.
    pub fn is_current_thread(&self) -> bool {
        self.workers.is_empty()
    }

    /// Prepares to drive `computation` on this runtime.
    pub fn drive<C>(&self, computation: C) -> Drive
    where
        C: Computation + 'static,
    {
        self.handle.drive(computation)
    }

    /// Drives `computation` to its terminal outcome, blocking the current
    /// thread.
    ///
    /// On a current-thread runtime the calling thread runs every queued job
    /// until the outcome is known.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let result = runtime.block_on(sequence([Value::from(1)]));
    /// assert_eq!(result?, Value::List(vec![Value::from(1)]));
    /// ```
    pub fn block_on<C>(&self, computation: C) -> Result<Value>
    where
        C: Computation + 'static,
    {
        self.block_on_drive(self.drive(computation))
    }

    /// Like [`block_on`](Self::block_on), for a prepared [`Drive`].
    pub fn block_on_drive(&self, drive: Drive) -> Result<Value> {
        let (transmitter, receiver) = mpsc::channel();

        enter_context(self.handle.clone(), || {
            drive.start_with(move |outcome| {
                let _ = transmitter.send(outcome);
            });

            if !self.is_current_thread() {
                return receiver.recv().unwrap_or(Err(Error::Abandoned));
            }

            loop {
                while let Some(job) = self.handle.injector.pop() {
                    self.handle.run_job(job);
                }

                match receiver.try_recv() {
                    Ok(outcome) => return outcome,
                    Err(TryRecvError::Disconnected) => return Err(Error::Abandoned),
                    Err(TryRecvError::Empty) => self.handle.injector.park(),
                }
            }
        })
    }

    /// Runs queued jobs on the calling thread until the queue is empty,
    /// returning how many ran.
    ///
    /// Jobs scheduled while draining run too. On a multi-threaded runtime
    /// the workers own the queue and this returns `0` immediately.
    pub fn run_until_idle(&self) -> usize {
        if !self.is_current_thread() {
            return 0;
        }

        enter_context(self.handle.clone(), || {
            let mut ran = 0;
            while let Some(job) = self.handle.injector.pop() {
                self.handle.run_job(job);
                ran += 1;
            }
            ran
        })
    }
}

impl Drop for Runtime {
    /// Shuts down the runtime.
    ///
    /// This performs the following steps:
    /// 1. Signals shutdown and wakes parked workers
    /// 2. Joins all worker threads
    /// 3. Discards jobs still queued
    fn drop(&mut self) {
        self.handle.injector.shutdown();

        for join in self.workers.drain(..) {
            let _ = join.join();
        }

        let discarded = self.handle.injector.drain();
        if discarded > 0 {
            tracing::debug!(discarded, "runtime dropped with queued jobs");
        }
    }
}
