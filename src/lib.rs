//! Tally: a small unit-test harness.
//!
//! Tests receive a [`Context`] and make assertions by predicate name; the
//! [`SuiteRunner`] runs every test of a module and completes once each has
//! called `done`, and the [`FileSequencer`] runs modules one file at a time,
//! folding their results into one [`ExitStatus`].

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod equality;
pub mod loader;
pub mod predicates;
pub mod runtime;
pub mod value;

pub use crate::diagnostics::HarnessError;
pub use crate::equality::equal;
pub use crate::loader::{ModuleLoader, TestModule};
pub use crate::predicates::{Outcome, PredicateRegistry};
pub use crate::runtime::{Context, ExitStatus, FileSequencer, Harness, SuiteRunner};
pub use crate::value::{Function, Key, Table, Value};
