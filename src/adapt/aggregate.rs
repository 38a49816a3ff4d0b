//! Fan-out aggregation.
//!
//! A yielded list or map becomes one operation that starts an operation per
//! entry, all at once, and completes with a container of the same shape
//! holding each entry's result in that entry's slot.
//!
//! The first failing entry completes the aggregate with its error, verbatim.
//! Entries still running at that point are neither cancelled nor awaited:
//! their outcomes are discarded when they arrive.

use super::{adapt, classify};
use crate::error::{Error, Result};
use crate::operation::{Completion, Operation};
use crate::value::{Map, Value};

use std::sync::Arc;

use parking_lot::Mutex;

/// Result container being filled in, mirroring the source collection.
enum Slots {
    Ordered(Vec<Option<Value>>),
    Keyed(Vec<(String, Option<Value>)>),
}

impl Slots {
    fn store(&mut self, index: usize, value: Value) {
        match self {
            Self::Ordered(slots) => slots[index] = Some(value),
            Self::Keyed(slots) => slots[index].1 = Some(value),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Self::Ordered(slots) => {
                Value::List(slots.into_iter().map(Option::unwrap_or_default).collect())
            }
            Self::Keyed(slots) => Value::Map(
                slots
                    .into_iter()
                    .map(|(key, value)| (key, value.unwrap_or_default()))
                    .collect(),
            ),
        }
    }
}

struct State {
    slots: Slots,

    /// Entries that have not completed yet.
    pending: usize,

    /// Set once the aggregate completed, successfully or not.
    finished: bool,
}

/// One running fan-out.
struct Fanout {
    state: Mutex<State>,
    completion: Completion,
}

impl Fanout {
    fn is_finished(&self) -> bool {
        self.state.lock().finished
    }

    /// Records the outcome of entry `index`.
    fn settle(&self, index: usize, result: Result<Value>) {
        let outcome = {
            let mut state = self.state.lock();

            if state.finished {
                tracing::debug!(index, ok = result.is_ok(), "discarding fan-out entry outcome");
                return;
            }

            match result {
                Err(error) => {
                    state.finished = true;
                    Err(error)
                }
                Ok(value) => {
                    state.slots.store(index, value);
                    state.pending -= 1;

                    if state.pending > 0 {
                        return;
                    }

                    state.finished = true;
                    let slots = std::mem::replace(&mut state.slots, Slots::Ordered(Vec::new()));
                    Ok(slots.into_value())
                }
            }
        };

        self.completion.complete(outcome);
    }
}

/// Fans out over a list; completes with a list of the same length.
pub(super) fn ordered(items: Vec<Value>) -> Operation {
    let slots = Slots::Ordered(vec![None; items.len()]);

    fan_out(items, slots)
}

/// Fans out over a map; completes with a map with the same keys.
pub(super) fn keyed(map: Map) -> Operation {
    let (keys, values): (Vec<String>, Vec<Value>) = map.into_iter().unzip();
    let slots = Slots::Keyed(keys.into_iter().map(|key| (key, None)).collect());

    fan_out(values, slots)
}

/// Entries are enumerated once, when the collection is lowered; the
/// collection is owned from then on, so later changes to the source cannot
/// affect the fan-out.
fn fan_out(entries: Vec<Value>, slots: Slots) -> Operation {
    Operation::once(move |ctx, completion| {
        if entries.is_empty() {
            let empty = slots.into_value();
            ctx.schedule(move || {
                completion.ok(empty);
            });
            return;
        }

        tracing::trace!(entries = entries.len(), "fanning out");

        let fanout = Arc::new(Fanout {
            state: Mutex::new(State {
                slots,
                pending: entries.len(),
                finished: false,
            }),
            completion,
        });

        for (index, entry) in entries.into_iter().enumerate() {
            if fanout.is_finished() {
                break;
            }

            let operation: Result<Operation, Error> =
                classify(&entry, ctx).and_then(|tag| adapt(tag, entry));

            match operation {
                Ok(operation) => {
                    let fanout = fanout.clone();
                    let completion = Completion::new(move |result| fanout.settle(index, result));
                    operation.invoke(ctx, completion);
                }
                Err(error) => {
                    fanout.settle(index, Err(error));
                    break;
                }
            }
        }
    })
}
