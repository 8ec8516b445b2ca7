//! Execution check.
//!
//! Running a notebook is delegated to an [`Engine`]. This module builds the
//! parameter bag, hands the engine an isolated scratch directory, and maps
//! its [`Outcome`] onto the check verdict. Execution never yields an
//! ordinary Fail: anything that stops the notebook from running to
//! completion is an Error.

pub mod literal;
pub mod papermill;
pub mod params;

use crate::error::CheckError;
use crate::models::notebook::Notebook;
use log::{info, warn};
use std::path::Path;

/// Parameter name to runtime value, in declaration order.
pub type ParameterBag = serde_json::Map<String, serde_json::Value>;

/// Everything an engine needs to run one notebook.
#[derive(Debug)]
pub struct ExecutionRequest<'a> {
    pub notebook: &'a Path,
    pub kernel: Option<&'a str>,
    pub parameters: &'a ParameterBag,
    /// Private to this invocation; removed once it returns.
    pub scratch_dir: &'a Path,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// What happened when the engine ran a notebook.
pub enum Outcome {
    Completed,
    /// Notebook code raised.
    Failed { error_type: String, message: String },
    /// The declared kernel is missing or unknown.
    KernelUnavailable {
        kernel: Option<String>,
        message: String,
    },
    /// The engine itself could not be started.
    EngineUnavailable(String),
}

/// Capability to execute a notebook against its kernel.
pub trait Engine: Send + Sync {
    fn execute(&self, request: &ExecutionRequest<'_>) -> Outcome;
}

/// Run the execute check for one notebook.
pub fn run(
    path: &Path,
    notebook: &Notebook,
    with_parameters: bool,
    engine: &dyn Engine,
) -> Result<(), CheckError> {
    let parameters = if with_parameters {
        params::extract(notebook)?
    } else {
        ParameterBag::new()
    };
    let scratch = tempfile::Builder::new()
        .prefix("nbcheck-")
        .tempdir()
        .map_err(|source| CheckError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
    let request = ExecutionRequest {
        notebook: path,
        kernel: notebook.kernel_name(),
        parameters: &parameters,
        scratch_dir: scratch.path(),
    };
    info!(
        "executing {} (kernel={}, parameters={})",
        path.display(),
        request.kernel.unwrap_or("<unset>"),
        parameters.len()
    );
    match engine.execute(&request) {
        Outcome::Completed => Ok(()),
        Outcome::Failed {
            error_type,
            message,
        } => {
            warn!("{} raised {error_type}", path.display());
            Err(CheckError::Execution {
                error_type,
                message,
            })
        }
        Outcome::KernelUnavailable { kernel, message } => {
            warn!("{}: kernel unavailable", path.display());
            Err(CheckError::Kernel { kernel, message })
        }
        Outcome::EngineUnavailable(message) => Err(CheckError::Engine(message)),
    }
}
