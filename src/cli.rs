//! CLI argument parsing for memcheck

use crate::config::AnalysisConfig;
use crate::membership::PathMatch;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "memcheck")]
#[command(version)]
#[command(
    about = "Static per-function load/store/byte counts for user code in an IR module",
    long_about = None
)]
pub struct Cli {
    /// IR module dump (JSON) to analyze
    #[arg(value_name = "MODULE")]
    pub module: PathBuf,

    /// Root of the user source tree (overrides SCOP_ROOT)
    #[arg(short = 'r', long = "root", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// CSV report path
    #[arg(long = "csv", value_name = "FILE")]
    pub csv: Option<PathBuf>,

    /// JSON report path
    #[arg(long = "json", value_name = "FILE")]
    pub json: Option<PathBuf>,

    /// How source paths are compared against the root
    #[arg(long = "path-match", value_enum)]
    pub path_match: Option<PathMatch>,

    /// Skip functions whose mangled or demangled name matches REGEX (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "REGEX")]
    pub exclude: Vec<String>,

    /// Comma-separated pass pipeline
    #[arg(long = "passes", value_name = "PIPELINE", default_value = "memcheck")]
    pub passes: String,

    /// Enable debug tracing output (logs to stderr)
    #[arg(long = "debug")]
    pub debug: bool,
}

impl Cli {
    /// Resolve the effective configuration: file, then SCOP_ROOT, then flags
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let base = match &self.config {
            Some(path) => AnalysisConfig::from_file(path)?,
            None => AnalysisConfig::default(),
        };
        Ok(self.apply_overrides(base.with_env()))
    }

    fn apply_overrides(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(root) = &self.root {
            config.root = Some(root.clone());
        }
        if let Some(csv) = &self.csv {
            config.csv_path = csv.clone();
        }
        if let Some(json) = &self.json {
            config.json_path = json.clone();
        }
        if let Some(mode) = self.path_match {
            config.path_match = mode;
        }
        config.exclude.extend(self.exclude.iter().cloned());
        config
    }
}
