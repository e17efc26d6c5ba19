//!
//! Kind and shape predicates.
//!
//! Kind checks compare the value's kind tag against the expected tag with
//! the equality engine. Shape checks look at the two facets of a table:
//!
//! - **array-shaped**: walking every entry yields keys `1, 2, 3, ...` with no gap
//! - **hash-shaped**: nothing at position 1
//!
//! Both hold for an empty table.

use crate::equality::equal;
use crate::predicates::{arg, Outcome, PredicateFn};
use crate::value::{Key, Value, MAX_DELEGATION_DEPTH};

/// True if `value`'s kind tag is `kind`.
pub fn is_kind(value: &Value, kind: &str) -> bool {
    equal(&Value::from(value.kind()), &Value::from(kind))
}

pub fn is_table(value: &Value) -> bool {
    is_kind(value, "table")
}

/// True if every entry of the table sits at the next expected position.
///
/// ```rust
/// use tally::predicates::is_array;
/// use tally::Value;
/// assert!(is_array(&Value::list([10, 20, 30])));
/// assert!(!is_array(&Value::record([("x", 1)])));
/// ```
pub fn is_array(value: &Value) -> bool {
    let Some(table) = value.as_table() else {
        return false;
    };
    table
        .entries()
        .zip(1..)
        .all(|((key, _), expected)| key == Key::Integer(expected))
}

/// True if the table has no positional entries.
pub fn is_hash(value: &Value) -> bool {
    value
        .as_table()
        .is_some_and(|table| table.get_index(1).is_nil())
}

/// True if `value` is a function, or a table whose call capability resolves
/// (through at most [`MAX_DELEGATION_DEPTH`] delegations) to a function.
pub fn is_callable(value: &Value) -> bool {
    callable_within(value, MAX_DELEGATION_DEPTH)
}

fn callable_within(value: &Value, budget: usize) -> bool {
    match value {
        Value::Function(_) => true,
        Value::Table(table) => match table.call_target() {
            Some(target) if budget > 0 => callable_within(target, budget - 1),
            _ => false,
        },
        _ => false,
    }
}

pub const PRED_IS_NIL: PredicateFn = |args| Outcome::from(is_kind(&arg(args, 0), "nil"));
pub const PRED_IS_NUMBER: PredicateFn = |args| Outcome::from(is_kind(&arg(args, 0), "number"));
pub const PRED_IS_BOOLEAN: PredicateFn = |args| Outcome::from(is_kind(&arg(args, 0), "boolean"));
pub const PRED_IS_STRING: PredicateFn = |args| Outcome::from(is_kind(&arg(args, 0), "string"));
pub const PRED_IS_FUNCTION: PredicateFn =
    |args| Outcome::from(is_kind(&arg(args, 0), "function"));
pub const PRED_IS_TABLE: PredicateFn = |args| Outcome::from(is_table(&arg(args, 0)));
pub const PRED_IS_ARRAY: PredicateFn = |args| Outcome::from(is_array(&arg(args, 0)));
pub const PRED_IS_HASH: PredicateFn = |args| Outcome::from(is_hash(&arg(args, 0)));
pub const PRED_IS_CALLABLE: PredicateFn = |args| Outcome::from(is_callable(&arg(args, 0)));
