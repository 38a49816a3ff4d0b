//! Driving computations.
//!
//! [`drive`] is the single entry point: it takes a computation, lets the
//! caller fix the context binding and the terminal observer, and starts the
//! suspension driver.
//!
//! ```rust,ignore
//! let (value, resolver) = Deferred::new();
//!
//! fiberline::drive(sequence([Value::from(value)]))
//!     .bind(Config::default())
//!     .start_with(|outcome| println!("finished: {outcome:?}"));
//!
//! resolver.resolve(42);
//! ```

mod context;
mod driver;
mod join;

pub use context::Context;
pub use join::JoinHandle;

pub(crate) use driver::Driver;
pub(crate) use join::{JoinState, Notify};

use crate::computation::Computation;
use crate::error::Result;
use crate::runtime::context::enter_context;
use crate::runtime::handle::Handle;
use crate::value::Value;

use std::any::Any;

/// A computation ready to be driven.
///
/// Created by [`drive`], [`Handle::drive`] or [`Drive::with_context`], and
/// consumed by one of [`start`](Self::start), [`start_with`](Self::start_with)
/// or [`spawn`](Self::spawn).
#[must_use = "a Drive does nothing until started"]
pub struct Drive {
    computation: Box<dyn Computation>,
    ctx: Context,

    /// Runtime installed as the current one while the first step runs.
    handle: Option<Handle>,
}

/// Prepares to drive `computation` on the current runtime.
///
/// # Panics
///
/// Panics if called outside the context of a runtime. Use
/// [`Handle::drive`] to drive from elsewhere.
pub fn drive<C>(computation: C) -> Drive
where
    C: Computation + 'static,
{
    let handle = Handle::current().expect("drive must be called within the context of a runtime");

    handle.drive(computation)
}

impl Drive {
    /// Prepares to drive `computation` under an explicit context.
    pub fn with_context<C>(computation: C, ctx: Context) -> Self
    where
        C: Computation + 'static,
    {
        Self {
            computation: Box::new(computation),
            ctx,
            handle: None,
        }
    }

    /// Runs the first step with `handle` as the current runtime, so
    /// operations invoked by it can call [`drive`].
    pub(crate) fn on_runtime(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Fixes the binding every yielded operation observes through
    /// [`Context::binding`].
    pub fn bind<T>(mut self, binding: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.ctx = self.ctx.with_binding(binding);
        self
    }

    /// Overrides the strict-yield policy inherited from the runtime.
    pub fn strict(mut self, strict: bool) -> Self {
        self.ctx = self.ctx.with_strict(strict);
        self
    }

    /// Starts driving with nobody observing the outcome.
    ///
    /// A terminal error is reported to the fault sink.
    pub fn start(self) {
        self.launch(Notify::Unobserved);
    }

    /// Starts driving; `callback` receives the terminal outcome exactly once,
    /// always from a scheduled job and never from within this call.
    pub fn start_with<F>(self, callback: F)
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        self.launch(Notify::Callback(Box::new(callback)));
    }

    /// Starts driving and returns a handle resolving to the outcome.
    pub fn spawn(self) -> JoinHandle {
        let state = JoinState::new();

        self.launch(Notify::Join(state.clone()));

        JoinHandle { state }
    }

    fn launch(self, notify: Notify) {
        let driver = Driver::new(self.computation, self.ctx, notify);

        match self.handle {
            Some(handle) => enter_context(handle, || driver.start()),
            None => driver.start(),
        }
    }
}
