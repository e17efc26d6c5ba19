//! Unified, `miette`-based diagnostics for the harness.
//!
//! Every failure that escapes a component boundary is a [`HarnessError`]:
//! unreadable files, malformed test modules, bad configuration, and runs that
//! stall because a test never finalized. Assertion failures and errors raised
//! by tests are *not* errors at this level; they are recorded on the test
//! context and only influence the exit status.
//!
//! Errors render through [`miette::Report`], which picks up the code, help
//! text and, for YAML errors, the offending source location.

use std::path::Path;

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("could not read `{path}`")]
    #[diagnostic(code(tally::io))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{path}` is not valid YAML: {message}")]
    #[diagnostic(
        code(tally::parse),
        help("test modules are YAML mappings from test names to lists of steps")
    )]
    Parse {
        path: String,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: Option<SourceSpan>,
    },

    #[error("`{path}` is not a valid test module: {reason}")]
    #[diagnostic(code(tally::invalid_module))]
    InvalidModule {
        path: String,
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("invalid configuration in `{path}`: {message}")]
    #[diagnostic(code(tally::config))]
    Config { path: String, message: String },

    #[error("run stalled in `{file}`: {} test(s) never called done", .pending.len())]
    #[diagnostic(code(tally::stalled))]
    Stalled {
        file: String,
        pending: Vec<String>,
        #[help]
        help: String,
    },
}

impl HarnessError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        HarnessError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    /// Wraps a YAML error, pointing at the reported location when there is one.
    pub fn parse(path: &str, source: &str, error: &serde_yaml::Error) -> Self {
        let span = error
            .location()
            .map(|location| SourceSpan::from((location.index(), 1)));
        HarnessError::Parse {
            path: path.to_string(),
            message: error.to_string(),
            src: NamedSource::new(path, source.to_string()),
            span,
        }
    }

    pub fn invalid_module(path: &str, reason: impl Into<String>) -> Self {
        HarnessError::InvalidModule {
            path: path.to_string(),
            reason: reason.into(),
            help: None,
        }
    }

    pub fn stalled(file: &Path, pending: Vec<String>) -> Self {
        let help = format!(
            "still waiting on: {}; every test must call done exactly once",
            pending.join(", ")
        );
        HarnessError::Stalled {
            file: file.display().to_string(),
            pending,
            help,
        }
    }

    /// Attaches help text to an [`HarnessError::InvalidModule`]. Other
    /// variants are returned unchanged.
    pub fn with_help(self, text: impl Into<String>) -> Self {
        match self {
            HarnessError::InvalidModule { path, reason, .. } => HarnessError::InvalidModule {
                path,
                reason,
                help: Some(text.into()),
            },
            other => other,
        }
    }
}
