mod common;

use common::{Outcome, current_thread};
use fiberline::computation::sequence;
use fiberline::{Deferred, Error, Map, Value};

use proptest::prelude::*;

use std::collections::BTreeSet;

/// A completion order over `0..n`, for `n` in `1..max`.
fn completion_order(max: usize) -> impl Strategy<Value = Vec<usize>> {
    (1..max).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
}

proptest! {
    #[test]
    fn test_list_results_follow_source_order(order in completion_order(10)) {
        let (rt, _faults) = current_thread();
        let (deferreds, resolvers): (Vec<_>, Vec<_>) =
            order.iter().map(|_| Deferred::new()).unzip();
        let outcome = Outcome::new();

        rt.drive(sequence([deferreds.into_iter().map(Value::from).collect::<Value>()]))
            .start_with(outcome.callback());

        for &index in &order {
            prop_assert!(!outcome.is_set());
            resolvers[index].resolve(index as i64 * 10);
            rt.run_until_idle();
        }

        let expected: Value = (0..order.len() as i64).map(|i| Value::from(i * 10)).collect();
        prop_assert_eq!(outcome.value(), Value::List(vec![expected]));
    }

    #[test]
    fn test_first_failure_in_completion_order_wins(
        order in completion_order(8),
        failing in prop::collection::vec(any::<bool>(), 8),
    ) {
        let (rt, _faults) = current_thread();
        let (deferreds, resolvers): (Vec<_>, Vec<_>) =
            order.iter().map(|_| Deferred::new()).unzip();
        let outcome = Outcome::new();

        rt.drive(sequence([deferreds.into_iter().map(Value::from).collect::<Value>()]))
            .start_with(outcome.callback());

        for &index in &order {
            if failing[index] {
                resolvers[index].reject(Error::msg(format!("entry {index}")));
            } else {
                resolvers[index].resolve(index as i64);
            }
            rt.run_until_idle();
        }

        match order.iter().find(|&&index| failing[index]) {
            Some(first) => {
                let error = outcome.error();
                prop_assert_eq!(error.to_string(), format!("entry {first}"));
            }
            None => {
                let expected: Value = (0..order.len() as i64).map(Value::from).collect();
                prop_assert_eq!(outcome.value(), Value::List(vec![expected]));
            }
        }
    }

    #[test]
    fn test_map_results_keep_key_set(keys in prop::collection::btree_set("[a-z]{1,6}", 0..8)) {
        let (rt, _faults) = current_thread();

        let source: Map = keys
            .iter()
            .enumerate()
            .map(|(i, key)| {
                let value = if i % 2 == 0 {
                    Value::from(Deferred::resolved(key.len() as i64))
                } else {
                    Value::from(key.len() as i64)
                };
                (key.clone(), value)
            })
            .collect();

        let result = rt.block_on(sequence([Value::Map(source)])).unwrap();
        let list = result.into_list().unwrap();
        let map = list[0].as_map().unwrap();

        prop_assert_eq!(map.keys().cloned().collect::<BTreeSet<_>>(), keys.clone());
        for (key, value) in map {
            prop_assert_eq!(value.as_int(), Some(key.len() as i64));
        }
    }
}
