//! The predicate registry.
//!
//! The registry is the single source of truth for assertion names. It is
//! built once at the entry point and shared by reference (through an `Rc`)
//! with every test context. Never construct a hidden local registry inside a
//! runner.

use std::fmt;
use std::rc::Rc;

use im::HashMap;

use crate::predicates::{negate, BASE_PREDICATES};
use crate::Value;

/// Plain predicate signature used by the built-in table.
pub type PredicateFn = fn(args: &[Value]) -> Outcome;

/// Result of evaluating a predicate: a pass/fail verdict and an optional
/// secondary result (for example the payload captured by `throws`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outcome {
    pub passed: bool,
    pub payload: Option<Value>,
}

impl Outcome {
    pub fn with_payload(passed: bool, payload: Value) -> Self {
        Self {
            passed,
            payload: Some(payload),
        }
    }
}

impl From<bool> for Outcome {
    fn from(passed: bool) -> Self {
        Self {
            passed,
            payload: None,
        }
    }
}

/// A named check, callable any number of times.
#[derive(Clone)]
pub struct Predicate(Rc<dyn Fn(&[Value]) -> Outcome>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Outcome + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn check(&self, args: &[Value]) -> Outcome {
        (self.0)(args)
    }
}

impl From<PredicateFn> for Predicate {
    fn from(f: PredicateFn) -> Self {
        Self::new(f)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}

/// Immutable name → predicate mapping.
#[derive(Debug, Clone, Default)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Predicate>,
}

impl PredicateRegistry {
    /// Builds the canonical registry: every built-in predicate plus its
    /// `not_` variant.
    ///
    /// # Example
    /// ```rust
    /// use tally::predicates::PredicateRegistry;
    /// use tally::Value;
    /// let registry = PredicateRegistry::standard();
    /// assert!(registry.contains("is_array"));
    /// assert!(registry.contains("not_is_array"));
    /// let outcome = registry.check("not_equal", &[Value::from(1), Value::from(2)]);
    /// assert_eq!(outcome.map(|o| o.passed), Some(true));
    /// ```
    pub fn standard() -> Self {
        Self::from_table(BASE_PREDICATES).with_negations()
    }

    /// Builds a registry holding exactly the given predicates.
    pub fn from_table(table: &[(&str, PredicateFn)]) -> Self {
        let predicates = table
            .iter()
            .map(|(name, f)| ((*name).to_string(), Predicate::from(*f)))
            .collect();
        Self { predicates }
    }

    /// Returns a registry extended with `not_<name>` for every predicate
    /// currently present. Only one level is derived: calling this twice adds
    /// `not_not_<name>` as well.
    pub fn with_negations(self) -> Self {
        let negated = negate::derive_negations(&self.predicates);
        Self {
            predicates: self.predicates.union(negated),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Evaluates the named predicate without recording anything. Returns
    /// `None` for an unknown name.
    pub fn check(&self, name: &str, args: &[Value]) -> Option<Outcome> {
        self.get(name).map(|p| p.check(args))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.predicates.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}
