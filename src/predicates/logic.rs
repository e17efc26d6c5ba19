//!
//! Truthiness, equality and raise-capture predicates.
//!
//! ## Predicates Provided
//!
//! - **`ok`**: the argument is truthy
//! - **`equal`**: the two arguments are structurally equal
//! - **`throws`**: calling the first argument with the rest raises a truthy payload

use crate::equality::equal;
use crate::predicates::{arg, Outcome, PredicateFn};
use crate::value::{capture, Value};

/// True unless `value` is `nil` or `false`.
pub fn ok(value: &Value) -> bool {
    value.is_truthy()
}

/// Calls `callee` with `args`, capturing anything it raises.
///
/// Passes only when the call raised and the raised payload is itself truthy;
/// a raise carrying `nil` or `false` does not count. The captured payload is
/// returned as the secondary result either way.
///
/// ```rust
/// use tally::predicates::throws;
/// use tally::Value;
/// let boom = Value::function(|_| Err(Value::from("boom")));
/// let outcome = throws(&boom, &[]);
/// assert!(outcome.passed);
/// assert_eq!(outcome.payload, Some(Value::from("boom")));
/// assert!(!throws(&Value::function(|_| Ok(Value::Nil)), &[]).passed);
/// ```
pub fn throws(callee: &Value, args: &[Value]) -> Outcome {
    match capture(|| callee.call(args)) {
        Ok(_) => Outcome::from(false),
        Err(payload) => Outcome::with_payload(payload.is_truthy(), payload),
    }
}

/// Usage: ok(value)
pub const PRED_OK: PredicateFn = |args| Outcome::from(ok(&arg(args, 0)));

/// Usage: equal(a, b)
pub const PRED_EQUAL: PredicateFn = |args| Outcome::from(equal(&arg(args, 0), &arg(args, 1)));

/// Usage: throws(f, args...)
pub const PRED_THROWS: PredicateFn = |args| match args.split_first() {
    Some((callee, rest)) => throws(callee, rest),
    None => throws(&Value::Nil, &[]),
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_empty_table_are_truthy() {
        assert!(ok(&Value::from(0)));
        assert!(ok(&Value::list(Vec::<Value>::new())));
        assert!(!ok(&Value::Nil));
        assert!(!ok(&Value::from(false)));
    }

    #[test]
    fn raise_with_falsy_payload_does_not_count() {
        let quiet = Value::function(|_| Err(Value::Nil));
        let outcome = throws(&quiet, &[]);
        assert!(!outcome.passed);
        assert_eq!(outcome.payload, Some(Value::Nil));
    }

    #[test]
    fn throws_forwards_arguments() {
        let picky = Value::function(|args| match args.first() {
            Some(Value::Number(n)) if *n < 0.0 => Err(Value::from("negative")),
            _ => Ok(Value::Nil),
        });
        assert!(throws(&picky, &[Value::from(-1)]).passed);
        assert!(!throws(&picky, &[Value::from(1)]).passed);
    }

    #[test]
    fn calling_a_non_function_counts_as_a_raise() {
        assert!(PRED_THROWS(&[Value::from(42)]).passed);
        assert!(PRED_THROWS(&[]).passed);
    }

    #[test]
    fn panics_are_captured() {
        let panicking = Value::function(|_| panic!("kaboom"));
        let outcome = throws(&panicking, &[]);
        assert!(outcome.passed);
        assert_eq!(outcome.payload, Some(Value::from("kaboom")));
    }
}
