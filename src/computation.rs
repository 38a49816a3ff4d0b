//! Resumable computations.
//!
//! A [`Computation`] is a state machine advanced one suspension at a time.
//! Each resumption hands it the outcome of its previous yield and returns a
//! [`Step`]: either another value to wait on, or its final value.
//!
//! Any type implementing the two resume operations is a computation; the
//! helpers [`from_fn`] and [`sequence`] cover the common cases of a closure
//! driven state machine and a fixed list of yields.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::drive::Context;
use crate::error::{Error, Result};
use crate::value::Value;

/// The outcome of resuming a computation.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// The computation paused and is waiting on the given value.
    Yield(Value),
    /// The computation finished with the given value.
    Done(Value),
}

impl Step {
    /// Returns `true` for the terminal step.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }
}

/// A resumable computation.
///
/// The driver owns a computation exclusively and never resumes it
/// concurrently. After it returns [`Step::Done`] or an error it is never
/// resumed again.
///
/// Returning `Err` from either method is a fault of the computation itself
/// and terminates the driver with that error.
pub trait Computation: Send {
    /// Resumes with the result of the previous yield.
    ///
    /// The first resumption receives [`Value::Null`].
    fn resume(&mut self, value: Value) -> Result<Step>;

    /// Resumes with the failure of the previous yield.
    ///
    /// The default rethrows, i.e. the computation has no recovery logic.
    fn resume_with_error(&mut self, error: Error) -> Result<Step> {
        Err(error)
    }
}

impl<C: Computation + ?Sized> Computation for Box<C> {
    fn resume(&mut self, value: Value) -> Result<Step> {
        (**self).resume(value)
    }

    fn resume_with_error(&mut self, error: Error) -> Result<Step> {
        (**self).resume_with_error(error)
    }
}

/// A computation built from a closure.
///
/// See [`from_fn`].
pub struct FromFn<F> {
    f: F,
}

/// Builds a computation from a closure receiving each resumption.
///
/// The closure is called with `Ok(value)` for [`Computation::resume`] and
/// `Err(error)` for [`Computation::resume_with_error`].
///
/// # Examples
///
/// ```rust,ignore
/// let mut stage = 0;
/// let computation = from_fn(move |input| {
///     stage += 1;
///     match stage {
///         1 => Ok(Step::Yield(Value::from(1))),
///         _ => Ok(Step::Done(input?)),
///     }
/// });
/// ```
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: FnMut(Result<Value>) -> Result<Step> + Send,
{
    FromFn { f }
}

impl<F> Computation for FromFn<F>
where
    F: FnMut(Result<Value>) -> Result<Step> + Send,
{
    fn resume(&mut self, value: Value) -> Result<Step> {
        (self.f)(Ok(value))
    }

    fn resume_with_error(&mut self, error: Error) -> Result<Step> {
        (self.f)(Err(error))
    }
}

/// A computation yielding a fixed list of values in order.
///
/// See [`sequence`].
pub struct Sequence {
    pending: std::vec::IntoIter<Value>,
    results: Vec<Value>,
    started: bool,
}

/// Builds a computation that yields each value in turn and finishes with the
/// list of their results. The first failure terminates it.
pub fn sequence<I>(yields: I) -> Sequence
where
    I: IntoIterator<Item = Value>,
{
    Sequence {
        pending: yields.into_iter().collect::<Vec<_>>().into_iter(),
        results: Vec::new(),
        started: false,
    }
}

impl Computation for Sequence {
    fn resume(&mut self, value: Value) -> Result<Step> {
        if self.started {
            self.results.push(value);
        }
        self.started = true;

        match self.pending.next() {
            Some(next) => Ok(Step::Yield(next)),
            None => Ok(Step::Done(Value::List(std::mem::take(&mut self.results)))),
        }
    }
}

/// A shareable, take-once handle on a constructed computation.
///
/// Cloning the handle does not clone the computation: the first driver to
/// take it owns it, later attempts fail with [`Error::Consumed`].
#[derive(Clone)]
pub struct Resumable {
    slot: Arc<Mutex<Option<Box<dyn Computation>>>>,
}

impl Resumable {
    /// Wraps `computation` so it can travel inside a [`Value`].
    pub fn new<C>(computation: C) -> Self
    where
        C: Computation + 'static,
    {
        Self::from_box(Box::new(computation))
    }

    /// Like [`new`](Self::new), for an already boxed computation.
    pub fn from_box(computation: Box<dyn Computation>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(computation))),
        }
    }

    /// Takes ownership of the computation.
    pub fn take(&self) -> Result<Box<dyn Computation>> {
        self.slot.lock().take().ok_or(Error::Consumed)
    }

    /// Returns `true` once the computation has been taken out to run.
    pub fn is_consumed(&self) -> bool {
        self.slot.lock().is_none()
    }

    pub(crate) fn same(&self, other: &Resumable) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl fmt::Debug for Resumable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resumable")
            .field("consumed", &self.is_consumed())
            .finish()
    }
}

/// Builds a fresh computation each time it is yielded.
///
/// The factory receives the yielding driver's [`Context`], so the nested
/// computation inherits the same binding and scheduler.
#[derive(Clone)]
pub struct Factory {
    build: Arc<dyn Fn(&Context) -> Box<dyn Computation> + Send + Sync>,
}

impl Factory {
    /// Creates a factory from a function building a fresh computation per
    /// run, given the context it will run under.
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(&Context) -> Box<dyn Computation> + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(build),
        }
    }

    /// Builds a new computation for a run under `ctx`.
    pub fn build(&self, ctx: &Context) -> Box<dyn Computation> {
        (self.build)(ctx)
    }

    pub(crate) fn same(&self, other: &Factory) -> bool {
        Arc::ptr_eq(&self.build, &other.build)
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Factory")
    }
}
