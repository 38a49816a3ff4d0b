use fiberline::classify::Tag;
use fiberline::{Error, Value};

use std::fmt;

#[derive(Debug)]
struct Timeout {
    millis: u64,
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timed out after {}ms", self.millis)
    }
}

impl std::error::Error for Timeout {}

#[test]
fn test_wrapped_error_is_transparent() {
    let error = Error::new(Timeout { millis: 30 });

    assert_eq!(error.to_string(), "timed out after 30ms");
    assert_eq!(error.downcast_ref::<Timeout>().map(|t| t.millis), Some(30));
    assert!(error.downcast_ref::<fmt::Error>().is_none());
    assert!(!error.is_classification());
}

#[test]
fn test_wrapped_error_identity_survives_clones() {
    let error = Error::new(Timeout { millis: 1 });

    assert!(error.clone().same(&error), "Clones share the wrapped error");
    assert!(!Error::new(Timeout { millis: 1 }).same(&error));
}

#[test]
fn test_other_variants_compare_by_value() {
    assert!(Error::msg("a").same(&Error::msg("a")));
    assert!(!Error::msg("a").same(&Error::msg("b")));
    assert!(Error::Abandoned.same(&Error::Abandoned));
    assert!(Error::Consumed.same(&Error::Consumed));
    assert!(!Error::Abandoned.same(&Error::Consumed));
    assert!(Error::Panicked("p".into()).same(&Error::Panicked("p".into())));

    let classification = Error::Classification {
        value: Value::from(1).to_string(),
    };
    assert!(classification.same(&classification.clone()));
    assert!(classification.is_classification());

    let mismatch = Error::Mismatch {
        tag: Tag::Deferred,
        value: "1".into(),
    };
    assert!(mismatch.is_classification());
    assert!(!mismatch.same(&classification));
    assert!(Error::msg("x").downcast_ref::<Timeout>().is_none());
}
