mod common;

use common::{Outcome, assert_message, current_thread};
use fiberline::computation::sequence;
use fiberline::{Deferred, Error, Reaction, Thenable, Value, list};

use std::sync::{Arc, Mutex};

#[test]
fn test_settled_deferred_fires_late_registrations() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();

    Deferred::resolved(3).register(
        Box::new(move |value: Value| seen_clone.lock().unwrap().push(value)),
        Box::new(|_: Error| {}),
    );

    assert_eq!(*seen.lock().unwrap(), vec![Value::from(3)]);
}

#[test]
fn test_resolver_settles_once() {
    let (deferred, resolver) = Deferred::new();
    assert!(!deferred.is_settled());

    assert!(resolver.resolve(1), "First settlement should be accepted");
    assert!(!resolver.reject(Error::msg("late")), "Second settlement should be ignored");
    assert!(deferred.is_settled());
}

#[test]
fn test_every_registration_sees_the_result() {
    let (deferred, resolver) = Deferred::new();
    let seen = Arc::new(Mutex::new(Vec::new()));

    for _ in 0..3 {
        let seen = seen.clone();
        deferred.register(
            Box::new(move |value: Value| seen.lock().unwrap().push(value)),
            Box::new(|_: Error| {}),
        );
    }
    resolver.resolve("done");

    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[test]
fn test_dropped_resolver_rejects_as_abandoned() {
    let (rt, _faults) = current_thread();
    let (deferred, resolver) = Deferred::new();
    let outcome = Outcome::new();

    rt.drive(sequence([Value::from(deferred)]))
        .start_with(outcome.callback());
    drop(resolver);
    rt.run_until_idle();

    assert!(matches!(outcome.error(), Error::Abandoned));
}

#[test]
fn test_rejected_deferred_fails_the_yield() {
    let (rt, _faults) = current_thread();

    let result = rt.block_on(sequence([Value::from(Deferred::rejected(Error::msg("rejected")))]));

    assert_message(&result.unwrap_err(), "rejected");
}

/// A thenable that breaks the contract by reporting several outcomes.
struct Unruly;

impl Thenable for Unruly {
    fn register(&self, on_success: Reaction<Value>, on_failure: Reaction<Error>) {
        on_success(Value::from("first"));
        on_success(Value::from("second"));
        on_failure(Error::msg("third"));
    }
}

#[test]
fn test_only_first_thenable_outcome_counts() {
    let (rt, faults) = current_thread();

    let result = rt.block_on(sequence([Value::deferred(Unruly)]));

    assert_eq!(result.unwrap(), list!["first"]);
    faults.assert_empty();
}

/// A thenable settling from another thread.
struct Delayed(i64);

impl Thenable for Delayed {
    fn register(&self, on_success: Reaction<Value>, _on_failure: Reaction<Error>) {
        let value = self.0;
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(5));
            on_success(Value::from(value));
        });
    }
}

#[test]
fn test_custom_thenable_settling_off_thread() {
    let (rt, _faults) = current_thread();

    let delayed = list![Value::deferred(Delayed(1)), Value::deferred(Delayed(2))];
    let result = rt.block_on(sequence([delayed]));

    assert_eq!(result.unwrap(), list![list![1, 2]]);
}
