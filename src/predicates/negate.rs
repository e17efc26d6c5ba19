use im::HashMap;

use crate::predicates::{Outcome, Predicate};

/// Builds `not_<name>` for every entry of `base`. The negation forwards all
/// arguments and inverts the verdict; any secondary result is dropped.
pub(super) fn derive_negations(base: &HashMap<String, Predicate>) -> HashMap<String, Predicate> {
    base.iter()
        .map(|(name, predicate)| {
            let inner = predicate.clone();
            let negated = Predicate::new(move |args| Outcome::from(!inner.check(args).passed));
            (format!("not_{name}"), negated)
        })
        .collect()
}
