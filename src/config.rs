//! Analysis configuration
//!
//! Layered, lowest precedence first: built-in defaults, an optional TOML
//! file, the `SCOP_ROOT` environment variable, then command-line flags.
//!
//! # Example memcheck.toml
//!
//! ```toml
//! root = "/home/me/project"
//! path_match = "components"
//! csv_path = "out/static_function_analysis.csv"
//! json_path = "out/static_function_analysis.json"
//! exclude = ["^main$", "^_GLOBAL__"]
//! ```

use crate::membership::PathMatch;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming the user source root
pub const ROOT_ENV_VAR: &str = "SCOP_ROOT";

pub const DEFAULT_CSV_PATH: &str = "static_function_analysis.csv";
pub const DEFAULT_JSON_PATH: &str = "static_function_analysis.json";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Root of the user's source tree; `None` analyzes nothing
    pub root: Option<PathBuf>,
    pub path_match: PathMatch,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    /// Regexes matched against mangled and demangled names
    pub exclude: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            root: None,
            path_match: PathMatch::default(),
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            json_path: PathBuf::from(DEFAULT_JSON_PATH),
            exclude: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML")
    }

    /// Root from `SCOP_ROOT`; an empty value counts as unset
    pub fn root_from_env() -> Option<PathBuf> {
        match env::var_os(ROOT_ENV_VAR) {
            Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
            _ => None,
        }
    }

    /// Overlay the environment on top of this configuration
    pub fn with_env(mut self) -> Self {
        if let Some(root) = Self::root_from_env() {
            tracing::debug!("{} overrides root: {}", ROOT_ENV_VAR, root.display());
            self.root = Some(root);
        }
        self
    }
}
