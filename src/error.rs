//! Error types for module loading, layout parsing, pipelines and artifacts

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or analyzing a module
#[derive(Error, Debug)]
pub enum MemcheckError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output artifact {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid module JSON: {0}")]
    ModuleParse(#[from] serde_json::Error),

    #[error("Invalid data layout specifier '{spec}': {message}")]
    DataLayout { spec: String, message: String },

    #[error("Invalid type '{text}': {message}")]
    TypeSyntax { text: String, message: String },

    #[error("Unknown pass name '{0}'")]
    UnknownPass(String),

    #[error("Pass '{0}' does not accept parameters")]
    PassParameters(String),

    #[error("Invalid exclude pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type for memcheck operations
pub type Result<T> = std::result::Result<T, MemcheckError>;

impl MemcheckError {
    pub(crate) fn output(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MemcheckError::Output {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn type_syntax(text: &str, message: impl Into<String>) -> Self {
        MemcheckError::TypeSyntax {
            text: text.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn data_layout(spec: &str, message: impl Into<String>) -> Self {
        MemcheckError::DataLayout {
            spec: spec.to_string(),
            message: message.into(),
        }
    }
}
