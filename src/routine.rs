//! Reusable entry points built from a computation factory.
//!
//! A [`Routine`] turns "a function that builds a computation from some
//! arguments" into something that can be called like a callback-style
//! function: with its arguments and, optionally, a final callback. It can also
//! be turned into an [`Operation`], so calling a routine can itself be
//! yielded by another computation.

use crate::computation::{Computation, from_fn};
use crate::drive::{Context, Drive, Driver, JoinHandle, Notify};
use crate::error::{Error, Result};
use crate::operation::Operation;
use crate::runtime::handle::Handle;
use crate::value::Value;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

type Build = dyn Fn(&Context, Vec<Value>) -> Box<dyn Computation> + Send + Sync;

/// A computation factory taking arguments.
#[derive(Clone)]
pub struct Routine {
    build: Arc<Build>,
    binding: Option<Arc<dyn Any + Send + Sync>>,
}

impl Routine {
    /// Creates a routine from a factory receiving the context the
    /// computation will run under and the call's arguments.
    pub fn new<F, C>(build: F) -> Self
    where
        F: Fn(&Context, Vec<Value>) -> C + Send + Sync + 'static,
        C: Computation + 'static,
    {
        Self {
            build: Arc::new(move |ctx: &Context, args: Vec<Value>| -> Box<dyn Computation> {
                Box::new(build(ctx, args))
            }),
            binding: None,
        }
    }

    /// Fixes the binding every call runs under.
    pub fn bind<T>(mut self, binding: T) -> Self
    where
        T: Any + Send + Sync,
    {
        self.binding = Some(Arc::new(binding));
        self
    }

    /// Calls the routine on `handle`'s runtime; `done` receives the terminal
    /// outcome.
    pub fn call_with<F>(&self, handle: &Handle, args: Vec<Value>, done: F)
    where
        F: FnOnce(Result<Value>) + Send + 'static,
    {
        self.prepare(handle, args).start_with(done);
    }

    /// Calls the routine on `handle`'s runtime with nobody observing the
    /// outcome. A terminal error is reported to the fault sink.
    pub fn call(&self, handle: &Handle, args: Vec<Value>) {
        self.prepare(handle, args).start();
    }

    /// Calls the routine on `handle`'s runtime and returns a handle
    /// resolving to the outcome.
    pub fn spawn(&self, handle: &Handle, args: Vec<Value>) -> JoinHandle {
        self.prepare(handle, args).spawn()
    }

    /// A panicking factory yields a computation failing with the panic, so
    /// the caller still only hears about it through the outcome.
    fn prepare(&self, handle: &Handle, args: Vec<Value>) -> Drive {
        let ctx = self.context(handle.context());

        let built = panic::catch_unwind(AssertUnwindSafe(|| (self.build)(&ctx, args)));

        let computation: Box<dyn Computation> = match built {
            Ok(computation) => computation,
            Err(payload) => {
                let error = Error::panicked(payload);
                tracing::debug!(%error, "routine factory panicked");
                Box::new(from_fn(move |_| Err(error.clone())))
            }
        };

        Drive::with_context(computation, ctx).on_runtime(handle.clone())
    }

    /// Returns an operation calling the routine with `args`, under the
    /// context of whoever invokes it unless the routine has its own binding.
    pub fn operation(&self, args: Vec<Value>) -> Operation {
        let routine = self.clone();

        Operation::once(move |ctx, completion| {
            let ctx = routine.context(ctx.clone());
            let computation = (routine.build)(&ctx, args);

            Driver::new(computation, ctx, Notify::Completion(completion)).start();
        })
    }

    fn context(&self, ctx: Context) -> Context {
        match &self.binding {
            Some(binding) => ctx.with_shared_binding(binding.clone()),
            None => ctx,
        }
    }
}

impl fmt::Debug for Routine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Routine")
            .field("bound", &self.binding.is_some())
            .finish()
    }
}
