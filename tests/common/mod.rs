//! # Tally Test Support
//!
//! Builds harnesses that print into a shared buffer with a manual clock, so
//! runner output can be asserted line by line.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use tally::cli::output::{AnsiColorizer, DiagnosticBuffer, OutputBuffer};
use tally::loader::{CwdResolver, StaticModuleLoader};
use tally::runtime::{ManualClock, Reporter, SharedOutput};
use tally::{FileSequencer, Harness, PredicateRegistry, SuiteRunner};

/// A harness plus handles on everything it writes to.
pub struct Fixture {
    pub harness: Harness,
    pub output: Rc<RefCell<OutputBuffer>>,
    pub clock: Rc<ManualClock>,
}

impl Fixture {
    pub fn new() -> Self {
        let output = Rc::new(RefCell::new(OutputBuffer::new()));
        let clock = Rc::new(ManualClock::new());
        let shared: SharedOutput = output.clone();
        let reporter = Reporter::new(shared, Rc::new(AnsiColorizer::new(false)));
        let harness = Harness::new(
            Rc::new(PredicateRegistry::standard()),
            clock.clone(),
            reporter,
        );
        Self {
            harness,
            output,
            clock,
        }
    }

    pub fn runner(&self) -> SuiteRunner {
        SuiteRunner::new(self.harness.clone())
    }

    pub fn sequencer(&self, loader: StaticModuleLoader) -> (FileSequencer, Rc<DiagnosticBuffer>) {
        let diagnostics = Rc::new(DiagnosticBuffer::new());
        let sequencer = FileSequencer::new(self.runner(), loader, CwdResolver, diagnostics.clone());
        (sequencer, diagnostics)
    }

    pub fn output(&self) -> String {
        self.output.borrow().as_str().to_string()
    }

    pub fn lines(&self) -> Vec<String> {
        self.output
            .borrow()
            .lines()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Lines describing failures, i.e. the indented ones under a summary.
    pub fn failure_lines(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.starts_with("  ") && !line.starts_with("   "))
            .collect()
    }
}
