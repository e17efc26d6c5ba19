//! Narrow output interfaces used by the runtime.
//!
//! The runtime never writes to the terminal directly: summary lines go to an
//! [`OutputSink`], colour comes from a [`Colorizer`], and load failures go to
//! a [`DiagnosticSink`]. Concrete implementations live in `cli::output`.

use std::cell::RefCell;
use std::rc::Rc;

use difference::{Changeset, Difference};
use termcolor::Color;

use crate::diagnostics::HarnessError;

/// Output sink for summary and failure lines, to make output testable and injectable.
pub trait OutputSink {
    fn emit(&mut self, text: &str);
}

/// Wraps text in a colour.
pub trait Colorizer {
    fn colorize(&self, color: Color, text: &str) -> String;
}

/// Receives errors that are reported but do not stop the run.
pub trait DiagnosticSink {
    fn report(&self, error: HarnessError);
}

pub type SharedOutput = Rc<RefCell<dyn OutputSink>>;

/// Line-oriented writer shared by every context of a run.
#[derive(Clone)]
pub struct Reporter {
    output: SharedOutput,
    colorizer: Rc<dyn Colorizer>,
}

impl Reporter {
    pub fn new(output: SharedOutput, colorizer: Rc<dyn Colorizer>) -> Self {
        Self { output, colorizer }
    }

    pub fn line(&self, text: &str) {
        self.output.borrow_mut().emit(text);
    }

    pub fn colored_line(&self, color: Color, text: &str) {
        let text = self.colorizer.colorize(color, text);
        self.line(&text);
    }

    /// Prints a line diff between two renderings: removed lines in red with
    /// `-`, added lines in green with `+`.
    pub fn diff(&self, expected: &str, actual: &str) {
        let changeset = Changeset::new(expected, actual, "\n");
        for diff in &changeset.diffs {
            match diff {
                Difference::Same(block) => {
                    for line in block.lines() {
                        self.line(&format!("     {line}"));
                    }
                }
                Difference::Rem(block) => {
                    for line in block.lines() {
                        self.colored_line(Color::Red, &format!("   - {line}"));
                    }
                }
                Difference::Add(block) => {
                    for line in block.lines() {
                        self.colored_line(Color::Green, &format!("   + {line}"));
                    }
                }
            }
        }
    }
}
