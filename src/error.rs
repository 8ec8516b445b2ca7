//! Error taxonomy.
//!
//! `ConfigError` is fatal and raised before any notebook is read.
//! `CheckError` is scoped to one (check, file) pair; the runner turns it
//! into an Error verdict so it never aborts the run.

use crate::models::ErrorKind;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Pre-flight configuration failures. The process exits without
/// evaluating any notebook.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no notebook path given; pass at least one file or directory")]
    NoPaths,
    #[error("Please select at least one check!")]
    NoCheckSelected,
    #[error("unknown check `{0}` (expected one of: {list})", list = crate::checks::CheckKind::names().join(", "))]
    UnknownCheck(String),
    #[error("`{name}` must be greater than 0")]
    InvalidLimit { name: &'static str },
    #[error("invalid exclude pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("failed to read config file {}: {source}", path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {}: {message}", path.display())]
    ParseConfig { path: PathBuf, message: String },
}

/// Failure while evaluating a single check against a single notebook.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("not a valid notebook: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Parameter(#[from] ParamError),
    #[error("kernel `{}` unavailable: {message}", .kernel.as_deref().unwrap_or("<unset>"))]
    Kernel {
        kernel: Option<String>,
        message: String,
    },
    #[error("{error_type}: {message}")]
    Execution { error_type: String, message: String },
    #[error("execution engine unavailable: {0}")]
    Engine(String),
}

impl CheckError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckError::Io { .. } => ErrorKind::Io,
            CheckError::Parse(_) => ErrorKind::Parse,
            CheckError::Parameter(_) => ErrorKind::Parameter,
            CheckError::Kernel { .. } => ErrorKind::Kernel,
            CheckError::Execution { .. } => ErrorKind::Execution,
            CheckError::Engine(_) => ErrorKind::Engine,
        }
    }
}

/// Parameter extraction failures for the parameterized execute check.
#[derive(Debug, Error)]
pub enum ParamError {
    #[error("No cell with \"parameters\" tag found!")]
    MissingParametersCell,
    #[error("found {0} cells with \"parameters\" tag, expected exactly one")]
    AmbiguousParametersCell(usize),
    #[error("no parameter translator for kernel `{0}`")]
    NoTranslator(String),
    #[error("failed to evaluate parameter `{name}` with value `{raw}`: {source}")]
    Eval {
        name: String,
        raw: String,
        #[source]
        source: LiteralError,
    },
}

/// A default value fell outside the accepted literal grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub message: String,
}
