//! Harness configuration.
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! an optional YAML file (`--config`), and command-line flags.
//!
//! ```yaml
//! color: never        # auto | always | never
//! strict: true        # fail the run when a module cannot be loaded
//! extensions: [yaml]  # files picked up when a directory is given
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::diagnostics::HarnessError;

/// When to emit ANSI colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Colour when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn enabled(self) -> bool {
        match self {
            ColorMode::Auto => atty::is(atty::Stream::Stdout),
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub color: ColorMode,
    /// Treat a module load failure as a failing run.
    pub strict: bool,
    /// Extensions of the files collected from directory arguments.
    pub extensions: Vec<String>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            color: ColorMode::Auto,
            strict: false,
            extensions: vec!["yaml".to_string(), "yml".to_string()],
        }
    }
}

impl HarnessConfig {
    /// Reads a configuration file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let source = fs::read_to_string(path).map_err(|e| HarnessError::io(path, e))?;
        Self::from_yaml(&path.display().to_string(), &source)
    }

    pub fn from_yaml(origin: &str, source: &str) -> Result<Self, HarnessError> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(source).map_err(|e| HarnessError::Config {
            path: origin.to_string(),
            message: e.to_string(),
        })
    }

    pub fn use_colors(&self) -> bool {
        self.color.enabled()
    }
}
