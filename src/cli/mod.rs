//! The Tally Command-Line Interface.
//!
//! This module is the main entry point for the `tally` binary and wires the
//! library together: configuration, file discovery, the harness, and the
//! file sequencer.

use std::cell::RefCell;
use std::process;
use std::rc::Rc;

use clap::Parser;
use tracing::debug;

use crate::cli::args::TallyArgs;
use crate::cli::output::{AnsiColorizer, StderrDiagnostics, StdoutSink};
use crate::config::HarnessConfig;
use crate::diagnostics::HarnessError;
use crate::loader::discovery::expand_paths;
use crate::loader::yaml::YamlModuleLoader;
use crate::loader::CwdResolver;
use crate::predicates::PredicateRegistry;
use crate::runtime::{
    ExitStatus, FileSequencer, Harness, MonotonicClock, Reporter, SharedOutput, SuiteRunner,
};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = TallyArgs::parse();
    init_logging(args.verbose);

    match execute(&args) {
        Ok(status) => process::exit(status.code()),
        Err(e) => {
            eprintln!("{:?}", miette::Report::new(e));
            process::exit(1);
        }
    }
}

/// Runs the files named by `args` and returns the combined status.
pub fn execute(args: &TallyArgs) -> Result<ExitStatus, HarnessError> {
    let config = resolve_config(args)?;
    let files = expand_paths(&args.paths, &config.extensions);
    debug!(files = files.len(), strict = config.strict, "starting run");

    let output: SharedOutput = Rc::new(RefCell::new(StdoutSink));
    let reporter = Reporter::new(output, Rc::new(AnsiColorizer::new(config.use_colors())));
    let harness = Harness::new(
        Rc::new(PredicateRegistry::standard()),
        Rc::new(MonotonicClock::new()),
        reporter,
    );

    FileSequencer::new(
        SuiteRunner::new(harness),
        YamlModuleLoader,
        CwdResolver,
        Rc::new(StderrDiagnostics),
    )
    .strict(config.strict)
    .run_to_status(files)
}

/// Layers command-line flags over the configuration file.
fn resolve_config(args: &TallyArgs) -> Result<HarnessConfig, HarnessError> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::load(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(color) = args.color {
        config.color = color;
    }
    if args.strict {
        config.strict = true;
    }
    Ok(config)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
