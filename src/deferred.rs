//! Deferred values.
//!
//! The engine only relies on the [`Thenable`] contract: a value that accepts
//! a success reaction and a failure reaction and calls one of them once its
//! result is known. [`Deferred`] is a small reference implementation, settled
//! through its paired [`Resolver`] from any thread.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::value::Value;

/// Reaction invoked when a deferred value settles.
pub type Reaction<T> = Box<dyn Fn(T) + Send + Sync>;

/// The deferred-value contract.
///
/// Implementations may call either reaction any number of times, or both;
/// the adapter only honors the first call.
pub trait Thenable: Send + Sync {
    /// Registers the reactions to run when the value settles.
    fn register(&self, on_success: Reaction<Value>, on_failure: Reaction<Error>);
}

enum State {
    Pending(Vec<(Reaction<Value>, Reaction<Error>)>),
    Settled(Result<Value>),
}

/// A value settled later through its [`Resolver`].
///
/// Reactions registered before settlement run on the settling thread;
/// reactions registered afterwards run immediately on the registering
/// thread. Dropping the resolver unsettled rejects with
/// [`Error::Abandoned`].
#[derive(Clone)]
pub struct Deferred {
    state: Arc<Mutex<State>>,
}

/// Settles the paired [`Deferred`].
pub struct Resolver {
    state: Arc<Mutex<State>>,
}

impl Deferred {
    /// Creates an unsettled deferred value and its resolver.
    pub fn new() -> (Deferred, Resolver) {
        let state = Arc::new(Mutex::new(State::Pending(Vec::new())));

        (
            Deferred {
                state: state.clone(),
            },
            Resolver { state },
        )
    }

    /// Creates a deferred value already resolved with `value`.
    pub fn resolved(value: impl Into<Value>) -> Deferred {
        Deferred {
            state: Arc::new(Mutex::new(State::Settled(Ok(value.into())))),
        }
    }

    /// Creates a deferred value already rejected with `error`.
    pub fn rejected(error: Error) -> Deferred {
        Deferred {
            state: Arc::new(Mutex::new(State::Settled(Err(error)))),
        }
    }

    /// Returns `true` once resolved or rejected.
    pub fn is_settled(&self) -> bool {
        matches!(*self.state.lock(), State::Settled(_))
    }
}

impl Thenable for Deferred {
    fn register(&self, on_success: Reaction<Value>, on_failure: Reaction<Error>) {
        let settled = {
            let mut state = self.state.lock();
            match &mut *state {
                State::Pending(reactions) => {
                    reactions.push((on_success, on_failure));
                    return;
                }
                State::Settled(result) => result.clone(),
            }
        };

        match settled {
            Ok(value) => on_success(value),
            Err(error) => on_failure(error),
        }
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.is_settled())
            .finish()
    }
}

impl Resolver {
    /// Resolves with `value`. Returns `false` if already settled.
    pub fn resolve(&self, value: impl Into<Value>) -> bool {
        self.settle(Ok(value.into()))
    }

    /// Rejects with `error`. Returns `false` if already settled.
    pub fn reject(&self, error: Error) -> bool {
        self.settle(Err(error))
    }

    /// Settles with `result`. Returns `false` if already settled.
    pub fn settle(&self, result: Result<Value>) -> bool {
        let reactions = {
            let mut state = self.state.lock();
            if matches!(*state, State::Settled(_)) {
                return false;
            }

            match std::mem::replace(&mut *state, State::Settled(result.clone())) {
                State::Pending(reactions) => reactions,
                State::Settled(_) => Vec::new(),
            }
        };

        for (on_success, on_failure) in reactions {
            match &result {
                Ok(value) => on_success(value.clone()),
                Err(error) => on_failure(error.clone()),
            }
        }

        true
    }
}

impl Drop for Resolver {
    /// Rejects with [`Error::Abandoned`] if still unsettled.
    fn drop(&mut self) {
        self.settle(Err(Error::Abandoned));
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver")
    }
}
