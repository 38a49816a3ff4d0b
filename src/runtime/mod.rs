//! Execution context for drivers.
//!
//! This module provides the "schedule on completion queue" primitive every
//! driver relies on, together with the runtime that runs the queued jobs.
//!
//! It is responsible for:
//! - queueing jobs in FIFO order and never running them inline,
//! - running them on the calling thread or on a pool of worker threads,
//! - exposing the current runtime handle to code running inside it,
//! - carrying the defaults every driver started on the runtime inherits.
//!
//! Most users only touch [`RuntimeBuilder`], [`Runtime`] and [`Handle`].

mod injector;
mod worker;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod core;
pub(crate) mod handle;

/// A unit of work queued on a scheduler.
pub type Job = Box<dyn FnOnce() + Send>;

/// The deferred-scheduling primitive.
///
/// Implementations must never run `job` inline: it runs later, after the
/// call that scheduled it has returned, and jobs scheduled from one thread
/// start in the order they were scheduled.
pub trait Schedule: Send + Sync {
    fn schedule(&self, job: Job);
}
