//! # Fiberline
//!
//! **Fiberline** is a suspension-driving engine. It runs a resumable
//! computation that pauses at defined points, looks at the value offered at
//! each pause, and decides how to resume it: right away, after a
//! callback-style operation completes, once a deferred value settles, after
//! a nested computation finishes, or once every entry of a list or map has
//! been waited on concurrently and its results reassembled in the source
//! shape.
//!
//! The engine is made of four parts, leaves first:
//!
//! - a **classifier** tagging each yielded [`Value`] with its shape ([`classify`]),
//! - an **adapter** lowering every shape into one canonical [`Operation`],
//! - a **fan-out aggregator** for lists and maps, failing fast on the first error,
//! - the **driver**, which owns the computation and resumes it strictly in
//!   sequence, feeding operation failures back into it as errors.
//!
//! Resumptions and terminal notifications always go through a scheduler
//! (see [`Schedule`]); they never run inline within the call that triggered
//! them.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fiberline::{Deferred, RuntimeBuilder, Value, computation::sequence, list};
//!
//! let runtime = RuntimeBuilder::current_thread().build()?;
//!
//! let (a, resolve_a) = Deferred::new();
//! let (b, resolve_b) = Deferred::new();
//! resolve_b.resolve(2);
//! resolve_a.resolve(1);
//!
//! let outcome = runtime.block_on(sequence([list![a, b]]))?;
//! assert_eq!(outcome, list![list![1, 2]]);
//! ```
//!
//! ## Modules
//!
//! - [`computation`]: the resumable computation protocol and helpers
//! - [`classify`]: value classification
//! - [`fault`]: the process-wide fault sink
//! - [`routine`]: callable wrappers around computation factories

mod adapt;
mod deferred;
mod drive;
mod error;
mod macros;
mod operation;
mod runtime;
mod value;

pub mod classify;
pub mod computation;
pub mod fault;
pub mod routine;

pub use computation::{Computation, Step};
pub use deferred::{Deferred, Reaction, Resolver, Thenable};
pub use drive::{Context, Drive, JoinHandle, drive};
pub use error::{Error, Result};
pub use operation::{Completion, Operation};
pub use routine::Routine;
pub use runtime::builder::RuntimeBuilder;
pub use runtime::core::Runtime;
pub use runtime::handle::Handle;
pub use runtime::{Job, Schedule};
pub use value::{Foreign, Map, Value};
