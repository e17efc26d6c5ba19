//! # Tally Predicate Library
//!
//! Predicates are the primitive checks behind every assertion. Each one is a
//! pure function over its arguments that yields an [`Outcome`].
//!
//! ## Module Structure
//!
//! - **`logic`**: `ok`, `equal`, `throws`
//! - **`types`**: kind and shape checks (`is_nil`, `is_array`, `is_callable`, ...)
//! - **`registry`**: the name → predicate table handed to every test context
//! - **`negate`**: derives `not_<name>` for every registered predicate
//!
//! ## Registration
//!
//! [`BASE_PREDICATES`] is the closed list of built-in predicates.
//! [`PredicateRegistry::standard`] builds it once, adds exactly one level of
//! negations, and is never mutated afterwards.

pub mod logic;
mod negate;
mod registry;
pub mod types;

pub use logic::{ok, throws};
pub use registry::{Outcome, Predicate, PredicateFn, PredicateRegistry};
pub use types::{is_array, is_callable, is_hash, is_kind, is_table};

/// Every built-in predicate, by name.
pub const BASE_PREDICATES: &[(&str, PredicateFn)] = &[
    ("ok", logic::PRED_OK),
    ("equal", logic::PRED_EQUAL),
    ("throws", logic::PRED_THROWS),
    ("is_nil", types::PRED_IS_NIL),
    ("is_number", types::PRED_IS_NUMBER),
    ("is_boolean", types::PRED_IS_BOOLEAN),
    ("is_string", types::PRED_IS_STRING),
    ("is_function", types::PRED_IS_FUNCTION),
    ("is_table", types::PRED_IS_TABLE),
    ("is_array", types::PRED_IS_ARRAY),
    ("is_hash", types::PRED_IS_HASH),
    ("is_callable", types::PRED_IS_CALLABLE),
];

/// Returns the `index`th argument, or `nil` when it was not supplied.
fn arg(args: &[crate::Value], index: usize) -> crate::Value {
    args.get(index).cloned().unwrap_or_default()
}
