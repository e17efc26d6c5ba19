//! Runs every test of one module.
//!
//! Each test gets a fresh [`Context`]. All contexts of a run share one
//! [`SuiteState`] through their completion continuation: the last test to
//! call `done` fires the suite's `on_complete` with the worst status seen.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::loader::TestModule;
use crate::runtime::{Context, ExitStatus, Harness, Scheduler, TestReport};

type OnComplete = Box<dyn FnOnce(ExitStatus)>;

struct SuiteState {
    remaining: usize,
    status: ExitStatus,
    on_complete: Option<OnComplete>,
}

/// Executes test modules against a shared [`Harness`].
#[derive(Clone)]
pub struct SuiteRunner {
    harness: Harness,
}

impl SuiteRunner {
    pub fn new(harness: Harness) -> Self {
        Self { harness }
    }

    pub fn harness(&self) -> &Harness {
        &self.harness
    }

    /// Runs every test in `module` and drains deferred work.
    ///
    /// `on_complete` fires exactly once, after the last test finalizes. An
    /// absent or empty module completes immediately with
    /// [`ExitStatus::Passed`]. Returns the names of tests that never
    /// finalized; when that list is non-empty `on_complete` has not fired.
    pub fn run(
        &self,
        module: Option<TestModule>,
        on_complete: impl FnOnce(ExitStatus) + 'static,
    ) -> Vec<String> {
        let tests = module.map(TestModule::into_tests).unwrap_or_default();
        if tests.is_empty() {
            on_complete(ExitStatus::Passed);
            return Vec::new();
        }

        debug!(tests = tests.len(), "running suite");
        let state = Rc::new(RefCell::new(SuiteState {
            remaining: tests.len(),
            status: ExitStatus::Passed,
            on_complete: Some(Box::new(on_complete)),
        }));
        let scheduler = Scheduler::new();

        let mut contexts = Vec::with_capacity(tests.len());
        for (name, test) in tests {
            let ctx = Context::build(
                name,
                self.harness.clone(),
                scheduler.clone(),
                Self::finalizer(&state),
            );
            contexts.push(ctx.clone());
            ctx.guard(|ctx| test(ctx));
        }

        let deferred = scheduler.drain();
        if deferred > 0 {
            debug!(deferred, "drained deferred tasks");
        }

        contexts
            .iter()
            .filter(|ctx| !ctx.is_finished())
            .map(|ctx| ctx.name().to_string())
            .collect()
    }

    /// Continuation run by each context's `done`: folds the test's verdict
    /// into the suite and completes the suite after the last test.
    fn finalizer(state: &Rc<RefCell<SuiteState>>) -> impl FnOnce(&TestReport) + 'static {
        let state = Rc::clone(state);
        move |report| {
            let completion = {
                let mut suite = state.borrow_mut();
                if !report.passed() {
                    suite.status = ExitStatus::Failed;
                }
                suite.remaining -= 1;
                if suite.remaining == 0 {
                    let status = suite.status;
                    suite.on_complete.take().map(|f| (f, status))
                } else {
                    None
                }
            };
            if let Some((on_complete, status)) = completion {
                debug!(?status, "suite complete");
                on_complete(status);
            }
        }
    }
}
