//! Deep structural equality.
//!
//! Scalars compare by value (functions by identity). Two tables are equal
//! when four passes agree:
//!
//! 1. every positional entry of `a` equals the entry at the same position in `b`
//! 2. every positional entry of `b` equals the entry at the same position in `a`
//! 3. every associative entry of `a` equals `b`'s value for that key
//! 4. every associative entry of `b` equals `a`'s value for that key
//!
//! A missing entry compares as `nil`. A table never equals a scalar.

use std::rc::Rc;

use crate::value::{Table, Value};

/// Returns true if `a` and `b` are structurally equal.
///
/// ```rust
/// use tally::{equal, Value};
/// assert!(equal(&Value::list([1, 2, 3]), &Value::list([1, 2, 3])));
/// assert!(!equal(&Value::list([1, 2, 3]), &Value::list([1, 2, 4])));
/// assert!(!equal(&Value::from(1), &Value::list([1])));
/// ```
pub fn equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Table(x), Value::Table(y)) => Rc::ptr_eq(x, y) || tables_equal(x, y),
        (Value::Table(_), _) | (_, Value::Table(_)) => false,
        _ => scalars_equal(a, b),
    }
}

fn scalars_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Nil, Value::Nil) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        // NaN is equal to itself so that every scalar is reflexively equal.
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Function(x), Value::Function(y)) => x.ptr_eq(y),
        _ => false,
    }
}

fn tables_equal(a: &Table, b: &Table) -> bool {
    positional_covered(a, b)
        && positional_covered(b, a)
        && associative_covered(a, b)
        && associative_covered(b, a)
}

fn positional_covered(from: &Table, into: &Table) -> bool {
    from.positional()
        .iter()
        .zip(1..)
        .all(|(item, position)| equal(item, &into.get_index(position)))
}

fn associative_covered(from: &Table, into: &Table) -> bool {
    from.associative()
        .all(|(key, item)| equal(item, &into.get(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Key;

    #[test]
    fn key_order_is_irrelevant() {
        let a = Value::record([("a", 1), ("b", 2)]);
        let b = Value::record([("b", 2), ("a", 1)]);
        assert!(equal(&a, &b));
    }

    #[test]
    fn extra_associative_key_breaks_equality() {
        let mut with_extra = Table::from_seq([1, 2].map(Value::from));
        with_extra.insert(Key::from("x"), Value::from(9));
        let plain = Value::list([1, 2]);
        let with_extra = Value::from(with_extra);
        assert!(!equal(&plain, &with_extra));
        assert!(!equal(&with_extra, &plain));
    }

    #[test]
    fn shorter_sequence_is_not_equal() {
        assert!(!equal(&Value::list([1, 2]), &Value::list([1, 2, 3])));
        assert!(!equal(&Value::list([1, 2, 3]), &Value::list([1, 2])));
    }

    #[test]
    fn nan_is_reflexive() {
        let nan = Value::from(f64::NAN);
        assert!(equal(&nan, &nan));
    }

    #[test]
    fn functions_compare_by_identity() {
        let f = Value::function(|_| Ok(Value::Nil));
        let g = Value::function(|_| Ok(Value::Nil));
        assert!(equal(&f, &f.clone()));
        assert!(!equal(&f, &g));
    }

    #[test]
    fn nested_tables_compare_deeply() {
        let a = Value::record([("inner", Value::list([1, 2]))]);
        let b = Value::record([("inner", Value::list([1, 2]))]);
        let c = Value::record([("inner", Value::list([1, 3]))]);
        assert!(equal(&a, &b));
        assert!(!equal(&a, &c));
    }
}
