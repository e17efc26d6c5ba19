//! The per-test recording context.
//!
//! A [`Context`] wraps every predicate in the registry: a passing check bumps
//! the `tried` counter, a failing one appends a [`Failure`] carrying the
//! caller's location and arguments. [`Context::done`] finalizes the test,
//! prints its summary line and failures, and hands a [`TestReport`] to the
//! continuation supplied when the context was built.
//!
//! Contexts are cheap handles. Cloning one does not copy its counters, so a
//! test may keep a clone and finish later from a deferred task.

use std::cell::RefCell;
use std::fmt;
use std::panic::Location;
use std::rc::Rc;
use std::time::Duration;

use termcolor::Color;
use tracing::{debug, warn};

use crate::predicates::PredicateRegistry;
use crate::runtime::{Harness, Scheduler};
use crate::value::{capture, Value};

/// Where an assertion was made: a Rust source position or a test-file step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation(String);

impl SourceLocation {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl From<&Location<'_>> for SourceLocation {
    fn from(location: &Location<'_>) -> Self {
        Self(format!(
            "{}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        ))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One recorded failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// A predicate returned a falsy verdict.
    Assertion {
        location: SourceLocation,
        assertion: String,
        args: Vec<Value>,
    },
    /// No predicate is registered under the requested name.
    UnknownAssertion {
        location: SourceLocation,
        assertion: String,
    },
    /// The test raised outside of any `throws` check.
    Uncaught { payload: Value },
}

impl Failure {
    /// The two renderings worth diffing, for a failed `equal` on composites.
    fn diff_operands(&self) -> Option<(String, String)> {
        let Failure::Assertion {
            assertion, args, ..
        } = self
        else {
            return None;
        };
        match (assertion.as_str(), args.as_slice()) {
            ("equal", [expected @ Value::Table(_), actual @ Value::Table(_), ..]) => {
                Some((expected.pretty(), actual.pretty()))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Assertion {
                location,
                assertion,
                args,
            } => {
                write!(f, "{location}: {assertion}: assertion failed")?;
                if !args.is_empty() {
                    let rendered: Vec<String> = args.iter().map(Value::repr).collect();
                    write!(f, " ({})", rendered.join(", "))?;
                }
                Ok(())
            }
            Failure::UnknownAssertion {
                location,
                assertion,
            } => write!(f, "{location}: {assertion}: unknown assertion"),
            Failure::Uncaught { payload } => write!(f, "uncaught error: {}", payload),
        }
    }
}

/// Final tally of one test, produced by [`Context::done`].
#[derive(Debug, Clone)]
pub struct TestReport {
    pub name: String,
    pub tried: usize,
    pub failures: Vec<Failure>,
    pub elapsed: Duration,
}

impl TestReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of assertions made, passing or not.
    pub fn total(&self) -> usize {
        self.tried + self.failures.len()
    }

    /// `"<name>: <tried>/<total> within <seconds> seconds"`
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} within {:.3} seconds",
            self.name,
            self.tried,
            self.total(),
            self.elapsed.as_secs_f64()
        )
    }
}

type OnDone = Box<dyn FnOnce(&TestReport)>;

struct State {
    tried: usize,
    errors: Vec<Failure>,
    started_at: Duration,
    finished: bool,
}

struct Inner {
    name: String,
    harness: Harness,
    scheduler: Scheduler,
    state: RefCell<State>,
    on_done: RefCell<Option<OnDone>>,
}

/// Recording context handed to a single test function.
#[derive(Clone)]
pub struct Context {
    inner: Rc<Inner>,
}

impl Context {
    /// Builds a fresh context for the test `name`. `on_done` runs exactly
    /// once, when the test finalizes.
    pub fn build(
        name: impl Into<String>,
        harness: Harness,
        scheduler: Scheduler,
        on_done: impl FnOnce(&TestReport) + 'static,
    ) -> Self {
        let started_at = harness.clock.now();
        Self {
            inner: Rc::new(Inner {
                name: name.into(),
                harness,
                scheduler,
                state: RefCell::new(State {
                    tried: 0,
                    errors: Vec::new(),
                    started_at,
                    finished: false,
                }),
                on_done: RefCell::new(Some(Box::new(on_done))),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The raw predicates, for checks that should not be recorded.
    pub fn registry(&self) -> &PredicateRegistry {
        &self.inner.harness.registry
    }

    // ------------------------------------------------------------------------
    // Assertions
    // ------------------------------------------------------------------------

    /// Runs the predicate `assertion` and records the outcome against the
    /// caller's source location. Returns the verdict.
    #[track_caller]
    pub fn check(&self, assertion: &str, args: &[Value]) -> bool {
        self.check_at(SourceLocation::from(Location::caller()), assertion, args)
    }

    /// Like [`Context::check`], with an explicit location.
    pub fn check_at(&self, location: SourceLocation, assertion: &str, args: &[Value]) -> bool {
        let Some(outcome) = self.inner.harness.registry.check(assertion, args) else {
            self.record(Failure::UnknownAssertion {
                location,
                assertion: assertion.to_string(),
            });
            return false;
        };
        if outcome.passed {
            self.inner.state.borrow_mut().tried += 1;
        } else {
            self.record(Failure::Assertion {
                location,
                assertion: assertion.to_string(),
                args: args.to_vec(),
            });
        }
        outcome.passed
    }

    #[track_caller]
    pub fn ok(&self, value: impl Into<Value>) -> bool {
        self.check("ok", &[value.into()])
    }

    #[track_caller]
    pub fn equal(&self, expected: impl Into<Value>, actual: impl Into<Value>) -> bool {
        self.check("equal", &[expected.into(), actual.into()])
    }

    #[track_caller]
    pub fn throws(&self, callee: impl Into<Value>, args: &[Value]) -> bool {
        let mut all = Vec::with_capacity(args.len() + 1);
        all.push(callee.into());
        all.extend_from_slice(args);
        self.check("throws", &all)
    }

    /// Appends a failure without running a predicate.
    ///
    /// The summary of a test that already called `done` is final, so a late
    /// failure is printed on its own line and logged instead.
    pub fn record(&self, failure: Failure) {
        if self.is_finished() {
            warn!(test = %self.inner.name, %failure, "assertion failed after done");
            self.inner.harness.reporter.colored_line(
                Color::Red,
                &format!("{}: failed after done: {}", self.inner.name, failure),
            );
        }
        self.inner.state.borrow_mut().errors.push(failure);
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    pub fn tried(&self) -> usize {
        self.inner.state.borrow().tried
    }

    pub fn failures(&self) -> Vec<Failure> {
        self.inner.state.borrow().errors.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.state.borrow().finished
    }

    /// Schedules `task` to run after the current test functions return. An
    /// error or panic from the task finalizes the test abnormally.
    pub fn defer(&self, task: impl FnOnce(&Context) -> Result<(), Value> + 'static) {
        let ctx = self.clone();
        self.inner.scheduler.push(move || ctx.guard(task));
    }

    /// Runs `body` against this context, taking the abnormal path if it
    /// raises or panics.
    pub(crate) fn guard(&self, body: impl FnOnce(&Context) -> Result<(), Value>) {
        if let Err(payload) = capture(|| body(self)) {
            self.raise(payload);
        }
    }

    /// Records an uncaught error and finalizes the test.
    ///
    /// A test that already called `done` keeps its verdict; the error is
    /// printed and logged only.
    pub fn raise(&self, payload: Value) {
        if self.is_finished() {
            warn!(test = %self.inner.name, error = %payload, "test raised after calling done");
            self.inner.harness.reporter.colored_line(
                Color::Red,
                &format!("{}: raised after done: {}", self.inner.name, payload),
            );
            return;
        }
        self.record(Failure::Uncaught { payload });
        self.done();
    }

    /// Finalizes the test: prints the summary and failures, then runs the
    /// completion continuation. Calls after the first are ignored.
    pub fn done(&self) {
        let report = {
            let mut state = self.inner.state.borrow_mut();
            if state.finished {
                warn!(test = %self.inner.name, "done called more than once; ignoring");
                return;
            }
            state.finished = true;
            TestReport {
                name: self.inner.name.clone(),
                tried: state.tried,
                failures: state.errors.clone(),
                elapsed: self
                    .inner
                    .harness
                    .clock
                    .now()
                    .saturating_sub(state.started_at),
            }
        };
        self.print(&report);
        debug!(test = %report.name, passed = report.passed(), "test finished");
        let on_done = self.inner.on_done.borrow_mut().take();
        if let Some(on_done) = on_done {
            on_done(&report);
        }
    }

    fn print(&self, report: &TestReport) {
        let reporter = &self.inner.harness.reporter;
        let color = if report.passed() {
            Color::Green
        } else {
            Color::Red
        };
        reporter.colored_line(color, &report.summary());
        for failure in &report.failures {
            reporter.line(&format!("  {failure}"));
            if let Some((expected, actual)) = failure.diff_operands() {
                reporter.diff(&expected, &actual);
            }
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Context")
            .field("name", &self.inner.name)
            .field("tried", &state.tried)
            .field("errors", &state.errors.len())
            .field("finished", &state.finished)
            .finish()
    }
}
