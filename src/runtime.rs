//! Runtime for executing test suites.
//!
//! Control flows downward, completion flows back up through one-shot
//! continuations:
//!
//! ```text
//! FileSequencer ──loads──▶ SuiteRunner ──per test──▶ Context ──▶ PredicateRegistry
//!       ▲                       │  ▲                     │
//!       └── suite status ───────┘  └──── done() ─────────┘
//! ```
//!
//! Everything runs on one thread. A test may hand its [`Context`] to a
//! deferred task and finish later; the suite only completes once every test
//! has called `done`.

use std::rc::Rc;

use crate::predicates::PredicateRegistry;

pub mod clock;
pub mod context;
pub mod report;
pub mod scheduler;
pub mod sequencer;
pub mod suite;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use context::{Context, Failure, SourceLocation, TestReport};
pub use report::{Colorizer, DiagnosticSink, OutputSink, Reporter, SharedOutput};
pub use scheduler::Scheduler;
pub use sequencer::FileSequencer;
pub use suite::SuiteRunner;

/// Worst-of status threaded through suites and files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExitStatus {
    #[default]
    Passed,
    Failed,
}

impl ExitStatus {
    /// Combines two statuses; once failed, always failed.
    pub fn worst(self, other: ExitStatus) -> ExitStatus {
        if self == ExitStatus::Failed || other == ExitStatus::Failed {
            ExitStatus::Failed
        } else {
            ExitStatus::Passed
        }
    }

    pub fn is_failed(self) -> bool {
        self == ExitStatus::Failed
    }

    /// Process exit code: 0 when passed, 1 when failed.
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Passed => 0,
            ExitStatus::Failed => 1,
        }
    }
}

/// The services every test context needs: the predicate registry, a clock
/// and somewhere to print.
#[derive(Clone)]
pub struct Harness {
    pub registry: Rc<PredicateRegistry>,
    pub clock: Rc<dyn Clock>,
    pub reporter: Reporter,
}

impl Harness {
    pub fn new(registry: Rc<PredicateRegistry>, clock: Rc<dyn Clock>, reporter: Reporter) -> Self {
        Self {
            registry,
            clock,
            reporter,
        }
    }
}
