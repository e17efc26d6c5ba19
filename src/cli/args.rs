//! Defines the command-line arguments for the Tally CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::Parser;
use std::path::PathBuf;

use crate::config::ColorMode;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "tally",
    version,
    about = "Runs YAML test modules and exits non-zero if any test fails."
)]
pub struct TallyArgs {
    /// Test files, or directories to search for test files.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// When to colour the output.
    #[arg(long, value_enum)]
    pub color: Option<ColorMode>,

    /// Fail the run when a test file cannot be loaded.
    #[arg(long)]
    pub strict: bool,

    /// Read settings from a YAML file.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log runner activity to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}
