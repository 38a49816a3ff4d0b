use crate::error::{Error, Result};
use crate::fault::{self, FaultSink};
use crate::operation::Completion;
use crate::value::Value;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll, Waker};

use parking_lot::Mutex;

/// Who hears about a driver's terminal outcome.
pub(crate) enum Notify {
    /// A caller-supplied callback.
    Callback(Box<dyn FnOnce(Result<Value>) + Send>),

    /// The completion of the operation that started a nested driver.
    Completion(Completion),

    /// A [`JoinHandle`].
    Join(Arc<JoinState>),

    /// Nobody: errors go to the fault sink.
    Unobserved,
}

impl Notify {
    /// Hands `outcome` to the observer.
    pub(crate) fn deliver(self, outcome: Result<Value>, sink: Option<&Arc<dyn FaultSink>>) {
        match self {
            Self::Callback(callback) => callback(outcome),
            Self::Completion(completion) => {
                completion.complete(outcome);
            }
            Self::Join(state) => state.finish(outcome),
            Self::Unobserved => {
                if let Err(error) = outcome {
                    fault::report_to(sink, error);
                }
            }
        }
    }
}

/// Shared state between a driver and its [`JoinHandle`].
pub(crate) struct JoinState {
    /// Terminal outcome, until taken by the handle.
    outcome: Mutex<Option<Result<Value>>>,

    /// Set once the outcome is stored.
    finished: AtomicBool,

    /// Wakers of tasks awaiting the handle.
    waiters: Mutex<Vec<Waker>>,
}

impl JoinState {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            outcome: Mutex::new(None),
            finished: AtomicBool::new(false),
            waiters: Mutex::new(Vec::new()),
        })
    }

    fn finish(&self, outcome: Result<Value>) {
        *self.outcome.lock() = Some(outcome);
        self.finished.store(true, Ordering::Release);

        let waiters = std::mem::take(&mut *self.waiters.lock());
        for waker in waiters {
            waker.wake();
        }
    }
}

/// A handle to a driver started with [`Drive::spawn`](super::Drive::spawn).
///
/// A `JoinHandle` implements [`Future`] and resolves to the driver's
/// terminal outcome. Dropping it does **not** stop the driver; it only
/// discards the outcome.
pub struct JoinHandle {
    pub(crate) state: Arc<JoinState>,
}

impl JoinHandle {
    /// Returns `true` once the terminal outcome has been delivered.
    pub fn is_finished(&self) -> bool {
        self.state.finished.load(Ordering::Acquire)
    }

    /// Takes the outcome if it has been delivered.
    pub fn try_take(&mut self) -> Option<Result<Value>> {
        self.state.outcome.lock().take()
    }
}

impl Future for JoinHandle {
    type Output = Result<Value>;

    /// Polls the join handle.
    ///
    /// The waker is registered **before** re-checking the outcome to avoid
    /// missed wake-ups. Polling again after the outcome was returned yields
    /// [`Error::Consumed`].
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.is_finished() {
            let outcome = self.state.outcome.lock().take();
            return Poll::Ready(outcome.unwrap_or(Err(Error::Consumed)));
        }

        self.state.waiters.lock().push(cx.waker().clone());

        if self.is_finished() {
            let outcome = self.state.outcome.lock().take();
            return Poll::Ready(outcome.unwrap_or(Err(Error::Consumed)));
        }

        Poll::Pending
    }
}
