//! Handles all user-facing output for the CLI.
//!
//! Concrete implementations of the runtime's output interfaces: sinks for
//! summary lines, the ANSI colorizer, and diagnostic sinks for errors that
//! are reported without stopping the run.

// ============================================================================
// OUTPUT SINKS: OutputBuffer and StdoutSink implementations
// ============================================================================

use std::cell::RefCell;
use std::io::Write;

use termcolor::{Ansi, Color, ColorSpec, WriteColor};

use crate::diagnostics::HarnessError;
use crate::runtime::{Colorizer, DiagnosticSink, OutputSink};

/// OutputBuffer: collects output into a String for testing or programmatic capture.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    pub buffer: String,
}

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn lines(&self) -> Vec<&str> {
        self.buffer.lines().collect()
    }
}

impl OutputSink for OutputBuffer {
    fn emit(&mut self, text: &str) {
        if !self.buffer.is_empty() {
            self.buffer.push('\n');
        }
        self.buffer.push_str(text);
    }
}

/// StdoutSink: writes output to stdout for CLI and default runner use.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, text: &str) {
        println!("{}", text);
    }
}

// ============================================================================
// COLOUR
// ============================================================================

/// Emits ANSI escape sequences through `termcolor`, or plain text when
/// disabled.
#[derive(Debug, Clone, Copy)]
pub struct AnsiColorizer {
    enabled: bool,
}

impl AnsiColorizer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }
}

impl Colorizer for AnsiColorizer {
    fn colorize(&self, color: Color, text: &str) -> String {
        if !self.enabled {
            return text.to_string();
        }
        let mut ansi = Ansi::new(Vec::new());
        let written = ansi
            .set_color(ColorSpec::new().set_fg(Some(color)))
            .and_then(|()| ansi.write_all(text.as_bytes()))
            .and_then(|()| ansi.reset());
        match written {
            Ok(()) => String::from_utf8(ansi.into_inner()).unwrap_or_else(|_| text.to_string()),
            Err(_) => text.to_string(),
        }
    }
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// Renders each error as a `miette` report on stderr.
#[derive(Debug, Default)]
pub struct StderrDiagnostics;

impl DiagnosticSink for StderrDiagnostics {
    fn report(&self, error: HarnessError) {
        let report = miette::Report::new(error);
        eprintln!("{report:?}");
    }
}

/// Keeps reported errors for later inspection.
#[derive(Debug, Default)]
pub struct DiagnosticBuffer {
    errors: RefCell<Vec<HarnessError>>,
}

impl DiagnosticBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.errors.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }

    /// Display strings of every reported error, in order.
    pub fn messages(&self) -> Vec<String> {
        self.errors.borrow().iter().map(ToString::to_string).collect()
    }
}

impl DiagnosticSink for DiagnosticBuffer {
    fn report(&self, error: HarnessError) {
        self.errors.borrow_mut().push(error);
    }
}
