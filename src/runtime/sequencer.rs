//! Processes test files one at a time.
//!
//! The worklist is a stack: paths are popped from the end, so files run in
//! reverse of the order given. Each file is resolved against the working
//! directory, loaded, and run to completion before the next one starts. The
//! accumulated status only ever moves from passed to failed.

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::diagnostics::HarnessError;
use crate::loader::{ModuleLoader, PathResolver};
use crate::runtime::{DiagnosticSink, ExitStatus, SuiteRunner};

pub struct FileSequencer {
    runner: SuiteRunner,
    loader: Box<dyn ModuleLoader>,
    resolver: Box<dyn PathResolver>,
    diagnostics: Rc<dyn DiagnosticSink>,
    strict: bool,
}

impl FileSequencer {
    pub fn new(
        runner: SuiteRunner,
        loader: impl ModuleLoader + 'static,
        resolver: impl PathResolver + 'static,
        diagnostics: Rc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            runner,
            loader: Box::new(loader),
            resolver: Box::new(resolver),
            diagnostics,
            strict: false,
        }
    }

    /// When set, a file that fails to load fails the run instead of being
    /// skipped.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Runs every file and passes the accumulated status to `on_complete`.
    pub fn run(
        &self,
        files: Vec<PathBuf>,
        on_complete: impl FnOnce(ExitStatus),
    ) -> Result<(), HarnessError> {
        let status = self.run_to_status(files)?;
        on_complete(status);
        Ok(())
    }

    /// Runs every file and returns the accumulated status.
    ///
    /// Fails with [`HarnessError::Stalled`] if a suite drains all its work
    /// while some test has still not called `done`; later files are not run.
    pub fn run_to_status(&self, mut files: Vec<PathBuf>) -> Result<ExitStatus, HarnessError> {
        let base = self.resolver.base()?;
        let mut accumulated = ExitStatus::Passed;

        while let Some(file) = files.pop() {
            let path = self.resolver.resolve(&base, &file);
            debug!(file = %path.display(), "loading test module");

            let module = match self.loader.load(&path) {
                Ok(module) => module,
                Err(err) => {
                    warn!(file = %path.display(), error = %err, "skipping module that failed to load");
                    self.diagnostics.report(err);
                    if self.strict {
                        accumulated = ExitStatus::Failed;
                    }
                    continue;
                }
            };

            let slot = Rc::new(Cell::new(None));
            let completion = Rc::clone(&slot);
            let pending = self
                .runner
                .run(Some(module), move |status| completion.set(Some(status)));

            match slot.get() {
                Some(status) => accumulated = accumulated.worst(status),
                None => return Err(HarnessError::stalled(&path, pending)),
            }
        }

        Ok(accumulated)
    }
}
