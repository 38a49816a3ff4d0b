mod common;

use common::{Outcome, assert_message, current_thread};
use fiberline::computation::{from_fn, sequence};
use fiberline::{Deferred, Error, Result, Step, Value, list};

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context as TaskContext, Poll, Waker};

#[test]
fn test_plain_yields_resolve_to_themselves() {
    let (rt, faults) = current_thread();

    let result = rt.block_on(sequence([Value::from(1), Value::from("two"), Value::Null]));

    assert_eq!(
        result.unwrap(),
        list![1, "two", Value::Null],
        "Plain values should be handed back unchanged"
    );
    faults.assert_empty();
}

#[test]
fn test_first_resumption_receives_null() {
    let (rt, _faults) = current_thread();

    let result = rt.block_on(from_fn(|input: Result<Value>| Ok(Step::Done(input?))));

    assert_eq!(result.unwrap(), Value::Null, "First resumption should carry no value");
}

#[test]
fn test_notification_is_never_synchronous() {
    let (rt, _faults) = current_thread();
    let outcome = Outcome::new();

    rt.drive(from_fn(|_| Ok(Step::Done(Value::from(7)))))
        .start_with(outcome.callback());

    assert!(
        !outcome.is_set(),
        "Callback should not run within the call that started the driver"
    );

    assert!(rt.run_until_idle() >= 1, "Notification should be a queued job");
    assert_eq!(outcome.value(), Value::from(7));
}

#[test]
fn test_notification_runs_after_triggering_call_returns() {
    let (rt, _faults) = current_thread();
    let (deferred, resolver) = Deferred::new();

    let marker = Arc::new(AtomicUsize::new(0));
    let observed = Arc::new(AtomicUsize::new(usize::MAX));
    let marker_clone = marker.clone();
    let observed_clone = observed.clone();

    rt.drive(sequence([Value::from(deferred)]))
        .start_with(move |_| {
            observed_clone.store(marker_clone.load(Ordering::SeqCst), Ordering::SeqCst);
        });

    resolver.resolve(1);
    marker.store(1, Ordering::SeqCst);
    rt.run_until_idle();

    assert_eq!(
        observed.load(Ordering::SeqCst),
        1,
        "Callback should observe state written after resolve() returned"
    );
}

#[test]
fn test_resumptions_follow_yield_order() {
    let (rt, _faults) = current_thread();
    let log = Arc::new(Mutex::new(Vec::new()));

    let yields = (0..5).map(|i| {
        let log = log.clone();
        Value::operation(move |_, completion| {
            log.lock().unwrap().push(i);
            completion.ok(i * 10);
        })
    });

    let result = rt.block_on(sequence(yields)).unwrap();

    assert_eq!(*log.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    assert_eq!(result, list![0, 10, 20, 30, 40]);
}

#[test]
fn test_operation_error_is_fed_back_and_recovered() {
    let (rt, faults) = current_thread();
    let failing = Value::operation(|_, completion| {
        completion.fail(Error::msg("boom"));
    });

    let mut stage = 0;
    let result = rt.block_on(from_fn(move |input| {
        stage += 1;
        match stage {
            1 => Ok(Step::Yield(failing.clone())),
            _ => {
                let error = input.unwrap_err();
                Ok(Step::Done(Value::from(format!("recovered: {error}"))))
            }
        }
    }));

    assert_eq!(result.unwrap(), Value::from("recovered: boom"));
    faults.assert_empty();
}

#[test]
fn test_unhandled_operation_error_terminates() {
    let (rt, _faults) = current_thread();
    let reached = Arc::new(AtomicBool::new(false));
    let reached_clone = reached.clone();

    let result = rt.block_on(sequence([
        Value::operation(|_, completion| {
            completion.fail(Error::msg("boom"));
        }),
        Value::operation(move |_, completion| {
            reached_clone.store(true, Ordering::SeqCst);
            completion.ok(Value::Null);
        }),
    ]));

    assert_message(&result.unwrap_err(), "boom");
    assert!(
        !reached.load(Ordering::SeqCst),
        "Nothing after the failing yield should run"
    );
}

#[test]
fn test_computation_fault_terminates() {
    let (rt, _faults) = current_thread();

    let result = rt.block_on(from_fn(|_| Err(Error::msg("fault"))));

    assert_message(&result.unwrap_err(), "fault");
}

#[test]
fn test_computation_panic_becomes_terminal_error() {
    let (rt, _faults) = current_thread();

    let result = rt.block_on(from_fn(|_: Result<Value>| -> Result<Step> { panic!("kaboom") }));

    assert!(
        matches!(result, Err(Error::Panicked(ref message)) if message == "kaboom"),
        "Panic should surface as a terminal error, got {result:?}"
    );
}

#[test]
fn test_operation_panic_is_fed_back() {
    let (rt, _faults) = current_thread();

    let result = rt.block_on(sequence([Value::operation(|_, _| panic!("op exploded"))]));

    assert!(
        matches!(result, Err(Error::Panicked(ref message)) if message == "op exploded"),
        "Operation panic should be reported as its failure, got {result:?}"
    );
}

#[test]
fn test_duplicate_completion_is_ignored() {
    let (rt, faults) = current_thread();
    let accepted = Arc::new(Mutex::new(Vec::new()));
    let accepted_clone = accepted.clone();

    let result = rt.block_on(sequence([Value::operation(move |_, completion| {
        let mut accepted = accepted_clone.lock().unwrap();
        accepted.push(completion.ok(1));
        accepted.push(completion.ok(2));
        accepted.push(completion.fail(Error::msg("late")));
    })]));

    assert_eq!(result.unwrap(), list![1], "Only the first outcome should count");
    assert_eq!(*accepted.lock().unwrap(), vec![true, false, false]);
    faults.assert_empty();
}

#[test]
fn test_dropped_completion_is_abandoned() {
    let (rt, _faults) = current_thread();

    let result = rt.block_on(sequence([Value::operation(|_, _completion| {})]));

    assert!(
        matches!(result, Err(Error::Abandoned)),
        "Dropping every completion handle should fail the yield, got {result:?}"
    );
}

#[test]
fn test_completion_from_another_thread() {
    let (rt, _faults) = current_thread();

    let result = rt.block_on(sequence([Value::operation(|_, completion| {
        std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(10));
            completion.ok("late");
        });
    })]));

    assert_eq!(result.unwrap(), list!["late"]);
}

#[test]
fn test_multiple_results_collected_into_list() {
    let (rt, _faults) = current_thread();

    let result = rt.block_on(sequence([Value::operation(|_, completion| {
        completion.ok_many([Value::from(1), Value::from(2)]);
    })]));

    assert_eq!(result.unwrap(), list![list![1, 2]]);
}

#[test]
fn test_binding_visible_to_operations() {
    let (rt, _faults) = current_thread();

    let drive = rt
        .drive(sequence([Value::operation(|ctx, completion| {
            let name = ctx.binding::<&'static str>().copied();
            completion.ok(name);
        })]))
        .bind("receiver");

    assert_eq!(rt.block_on_drive(drive).unwrap(), list!["receiver"]);
}

#[test]
fn test_missing_binding_is_none() {
    let (rt, _faults) = current_thread();

    let result = rt.block_on(sequence([Value::operation(|ctx, completion| {
        completion.ok(ctx.binding::<u64>().is_none());
    })]));

    assert_eq!(result.unwrap(), list![true]);
}

#[test]
fn test_nested_computation_result() {
    let (rt, _faults) = current_thread();

    let inner = sequence([Value::from(1), Value::from(2)]);
    let result = rt.block_on(sequence([Value::computation(inner), Value::from(3)]));

    assert_eq!(result.unwrap(), list![list![1, 2], 3]);
}

#[test]
fn test_nested_computation_error_propagates() {
    let (rt, _faults) = current_thread();

    let inner = from_fn(|_| Err(Error::msg("inner failed")));
    let result = rt.block_on(sequence([Value::computation(inner)]));

    assert_message(&result.unwrap_err(), "inner failed");
}

#[test]
fn test_factory_inherits_binding() {
    let (rt, _faults) = current_thread();

    let factory = Value::factory(|ctx| {
        let bound = ctx.binding::<i64>().copied().unwrap_or_default();
        Box::new(sequence([Value::from(bound)]))
    });

    let drive = rt.drive(sequence([factory.clone(), factory])).bind(9i64);

    assert_eq!(
        rt.block_on_drive(drive).unwrap(),
        list![list![9], list![9]],
        "A factory should build a fresh computation per yield"
    );
}

#[test]
fn test_resumable_yielded_twice_is_consumed() {
    let (rt, _faults) = current_thread();

    let nested = Value::computation(sequence([Value::from(1)]));
    let result = rt.block_on(sequence([nested.clone(), nested]));

    assert!(
        matches!(result, Err(Error::Consumed)),
        "A nested computation should only run once, got {result:?}"
    );
}

#[test]
fn test_once_operation_yielded_twice_is_consumed() {
    let (rt, _faults) = current_thread();

    let op = Value::operation_once(|_, completion| {
        completion.ok(1);
    });
    let result = rt.block_on(sequence([op.clone(), op]));

    assert!(matches!(result, Err(Error::Consumed)), "got {result:?}");
}

#[test]
fn test_deep_sequence_does_not_grow_the_stack() {
    let (rt, _faults) = current_thread();

    let yields = (0..10_000).map(|i| {
        Value::operation(move |_, completion| {
            completion.ok(i);
        })
    });

    let result = rt.block_on(sequence(yields)).unwrap();

    assert_eq!(result.as_list().map(<[Value]>::len), Some(10_000));
}

#[test]
fn test_spawn_join_handle() {
    let (rt, _faults) = current_thread();

    let mut handle = rt.drive(sequence([Value::from(5)])).spawn();
    assert!(!handle.is_finished(), "Nothing has run yet");

    rt.run_until_idle();
    assert!(handle.is_finished());

    let mut cx = TaskContext::from_waker(Waker::noop());
    match Pin::new(&mut handle).poll(&mut cx) {
        Poll::Ready(Ok(value)) => assert_eq!(value, list![5]),
        other => panic!("expected a ready value, got {other:?}"),
    }

    assert!(
        matches!(Pin::new(&mut handle).poll(&mut cx), Poll::Ready(Err(Error::Consumed))),
        "Polling after completion should report the outcome as consumed"
    );
}

#[test]
fn test_join_handle_try_take() {
    let (rt, _faults) = current_thread();

    let mut handle = rt.drive(from_fn(|_| Err(Error::msg("nope")))).spawn();
    assert!(handle.try_take().is_none());

    rt.run_until_idle();
    assert_message(&handle.try_take().unwrap().unwrap_err(), "nope");
}
