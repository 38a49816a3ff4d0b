#![allow(dead_code)]

use fiberline::fault::Collector;
use fiberline::{Error, Result, Runtime, RuntimeBuilder, Value};

use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly tracing subscriber, filtered by `RUST_LOG`.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A current-thread runtime reporting faults to the returned collector.
pub fn current_thread() -> (Runtime, Arc<Collector>) {
    init_test_logging();

    let faults = Collector::new();
    let rt = RuntimeBuilder::current_thread()
        .fault_sink(faults.clone())
        .build()
        .unwrap();

    (rt, faults)
}

/// Slot receiving a terminal outcome from a callback.
#[derive(Clone, Default)]
pub struct Outcome(Arc<Mutex<Option<Result<Value>>>>);

impl Outcome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a callback storing the outcome in this slot.
    pub fn callback(&self) -> impl FnOnce(Result<Value>) + Send + 'static {
        let slot = self.0.clone();
        move |outcome| {
            *slot.lock().unwrap() = Some(outcome);
        }
    }

    pub fn is_set(&self) -> bool {
        self.0.lock().unwrap().is_some()
    }

    pub fn take(&self) -> Option<Result<Value>> {
        self.0.lock().unwrap().take()
    }

    pub fn value(&self) -> Value {
        match self.take() {
            Some(Ok(value)) => value,
            other => panic!("expected a value, got {other:?}"),
        }
    }

    pub fn error(&self) -> Error {
        match self.take() {
            Some(Err(error)) => error,
            other => panic!("expected an error, got {other:?}"),
        }
    }
}

/// Asserts that `error` is the plain message `expected`.
pub fn assert_message(error: &Error, expected: &str) {
    match error {
        Error::Message(message) => assert_eq!(message, expected),
        other => panic!("expected message {expected:?}, got {other:?}"),
    }
}
