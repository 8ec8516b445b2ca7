//! `papermill` engine adapter.
//!
//! Runs `papermill <notebook> <scratch>/output.ipynb --cwd <notebook dir> -k <kernel>`
//! with parameters passed as YAML, and classifies the process result.

use super::{Engine, ExecutionRequest, Outcome};
use log::debug;
use regex::Regex;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

pub const DEFAULT_ENGINE: &str = "papermill";
pub const NO_KERNEL_MESSAGE: &str = "No kernel name found in notebook and no override provided";
const OUTPUT_NAME: &str = "output.ipynb";

#[derive(Debug, Clone)]
/// Runs notebooks through the papermill command line.
pub struct PapermillEngine {
    program: String,
    extra_args: Vec<String>,
}

impl Default for PapermillEngine {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINE, Vec::new())
    }
}

impl PapermillEngine {
    pub fn new(program: impl Into<String>, extra_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            extra_args,
        }
    }

    fn command(&self, request: &ExecutionRequest<'_>) -> Result<Command, Outcome> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(request.notebook)
            .arg(request.scratch_dir.join(OUTPUT_NAME));
        if let Some(dir) = request.notebook.parent().filter(|d| !d.as_os_str().is_empty()) {
            cmd.arg("--cwd").arg(dir);
        }
        if let Some(kernel) = request.kernel {
            cmd.arg("-k").arg(kernel);
        }
        if !request.parameters.is_empty() {
            let yaml = serde_yaml::to_string(request.parameters).map_err(|e| Outcome::Failed {
                error_type: "ParameterEncodingError".into(),
                message: e.to_string(),
            })?;
            cmd.arg("-y").arg(yaml);
        }
        cmd.args(&self.extra_args)
            .current_dir(request.scratch_dir)
            .stdin(Stdio::null());
        Ok(cmd)
    }
}

impl Engine for PapermillEngine {
    fn execute(&self, request: &ExecutionRequest<'_>) -> Outcome {
        if request.kernel.is_none() {
            return Outcome::KernelUnavailable {
                kernel: None,
                message: NO_KERNEL_MESSAGE.to_string(),
            };
        }
        let mut cmd = match self.command(request) {
            Ok(cmd) => cmd,
            Err(outcome) => return outcome,
        };
        debug!("spawning {:?}", cmd);
        match cmd.output() {
            Err(e) => Outcome::EngineUnavailable(format!("failed to launch `{}`: {e}", self.program)),
            Ok(out) if out.status.success() => Outcome::Completed,
            Ok(out) => classify_failure(
                &String::from_utf8_lossy(&out.stderr),
                &out.status.to_string(),
            ),
        }
    }
}

fn no_such_kernel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"No such kernel named (\S+)").expect("kernel regex"))
}

fn exception_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][\w.]*(?:Error|Exception|Interrupt|Exit)):\s*(.*)$")
            .expect("exception regex")
    })
}

/// Map a failed engine run (its stderr and exit status) to an outcome.
pub fn classify_failure(stderr: &str, status: &str) -> Outcome {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.chars().all(|c| c == '-'))
        .collect();

    if let Some(caps) = no_such_kernel_re().captures(stderr) {
        let kernel = caps[1].trim_matches(|c| c == '\'' || c == '"').to_string();
        return Outcome::KernelUnavailable {
            message: format!("No such kernel named {kernel}"),
            kernel: Some(kernel),
        };
    }
    if stderr.contains("NoSuchKernel") || stderr.contains("No kernel name found") {
        let message = lines
            .iter()
            .rev()
            .find(|l| l.contains("kernel"))
            .map(|l| l.to_string())
            .unwrap_or_else(|| NO_KERNEL_MESSAGE.to_string());
        return Outcome::KernelUnavailable {
            kernel: None,
            message,
        };
    }
    if let Some(pos) = lines.iter().position(|l| l.contains("PapermillExecutionError")) {
        let after = &lines[pos + 1..];
        let cell = after
            .iter()
            .find(|l| l.starts_with("Exception encountered at"))
            .copied();
        let last = after.last().copied().unwrap_or("");
        let message = match cell {
            Some(cell) if cell != last => format!("{cell} {last}"),
            _ => last.to_string(),
        };
        return Outcome::Failed {
            error_type: "PapermillExecutionError".into(),
            message,
        };
    }
    match lines.last() {
        Some(last) => match exception_line_re().captures(last) {
            Some(caps) => Outcome::Failed {
                error_type: caps[1].rsplit('.').next().unwrap_or(&caps[1]).to_string(),
                message: caps[2].to_string(),
            },
            None => Outcome::Failed {
                error_type: "EngineError".into(),
                message: last.to_string(),
            },
        },
        None => Outcome::Failed {
            error_type: "EngineError".into(),
            message: format!("engine exited with {status}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execute::ParameterBag;
    use serde_json::json;
    use std::path::Path;

    const EXECUTION_STDERR: &str = r#"Executing:   0%|          | 0/3 [00:00<?, ?cell/s]
Executing notebook with kernel: python3
Traceback (most recent call last):
  File "/usr/bin/papermill", line 8, in <module>
    sys.exit(papermill())
papermill.exceptions.PapermillExecutionError:
---------------------------------------------------------------------------
Exception encountered at "In [2]":
---------------------------------------------------------------------------
ZeroDivisionError                         Traceback (most recent call last)
Cell In[2], line 1
----> 1 1/0

ZeroDivisionError: division by zero
"#;

    #[test]
    fn execution_error_keeps_cell_and_exception() {
        let out = classify_failure(EXECUTION_STDERR, "exit status: 1");
        assert_eq!(
            out,
            Outcome::Failed {
                error_type: "PapermillExecutionError".into(),
                message: "Exception encountered at \"In [2]\": ZeroDivisionError: division by zero"
                    .into(),
            }
        );
    }

    #[test]
    fn unknown_kernel_is_named() {
        let stderr = "Traceback (most recent call last):\n  ...\njupyter_client.kernelspec.NoSuchKernel: No such kernel named nope3\n";
        assert_eq!(
            classify_failure(stderr, "exit status: 1"),
            Outcome::KernelUnavailable {
                kernel: Some("nope3".into()),
                message: "No such kernel named nope3".into(),
            }
        );
    }

    #[test]
    fn missing_kernel_name() {
        let stderr = "ValueError: No kernel name found in notebook and no override provided.\n";
        match classify_failure(stderr, "exit status: 1") {
            Outcome::KernelUnavailable { kernel, message } => {
                assert_eq!(kernel, None);
                assert!(message.contains("No kernel name found"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn generic_exception_line_is_split() {
        let out = classify_failure("boom\nyaml.parser.ParserError: bad input\n", "exit status: 1");
        assert_eq!(
            out,
            Outcome::Failed {
                error_type: "ParserError".into(),
                message: "bad input".into(),
            }
        );
    }

    #[test]
    fn empty_stderr_reports_status() {
        assert_eq!(
            classify_failure("", "exit status: 3"),
            Outcome::Failed {
                error_type: "EngineError".into(),
                message: "engine exited with exit status: 3".into(),
            }
        );
    }

    #[test]
    fn missing_kernel_short_circuits_without_spawning() {
        let engine = PapermillEngine::new("nbcheck-engine-that-does-not-exist", Vec::new());
        let dir = tempfile::tempdir().unwrap();
        let params = ParameterBag::new();
        let out = engine.execute(&ExecutionRequest {
            notebook: Path::new("nb.ipynb"),
            kernel: None,
            parameters: &params,
            scratch_dir: dir.path(),
        });
        assert_eq!(
            out,
            Outcome::KernelUnavailable {
                kernel: None,
                message: NO_KERNEL_MESSAGE.into(),
            }
        );
    }

    #[test]
    fn missing_program_is_engine_unavailable() {
        let engine = PapermillEngine::new("nbcheck-engine-that-does-not-exist", Vec::new());
        let dir = tempfile::tempdir().unwrap();
        let params = ParameterBag::new();
        let out = engine.execute(&ExecutionRequest {
            notebook: Path::new("nb.ipynb"),
            kernel: Some("python3"),
            parameters: &params,
            scratch_dir: dir.path(),
        });
        assert!(matches!(out, Outcome::EngineUnavailable(m) if m.contains("failed to launch")));
    }

    #[test]
    fn command_passes_yaml_parameters_and_cwd() {
        let engine = PapermillEngine::new("papermill", vec!["--log-output".into()]);
        let dir = tempfile::tempdir().unwrap();
        let mut params = ParameterBag::new();
        params.insert("alpha".into(), json!(0.5));
        let request = ExecutionRequest {
            notebook: Path::new("/work/nbs/a.ipynb"),
            kernel: Some("python3"),
            parameters: &params,
            scratch_dir: dir.path(),
        };
        let cmd = engine.command(&request).unwrap();
        let args: Vec<String> = cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(args[0], "/work/nbs/a.ipynb");
        assert!(args[1].ends_with(OUTPUT_NAME));
        assert_eq!(&args[2..4], ["--cwd", "/work/nbs"]);
        assert_eq!(&args[4..6], ["-k", "python3"]);
        assert_eq!(args[6], "-y");
        assert!(args[7].contains("alpha: 0.5"));
        assert_eq!(args[8], "--log-output");
        assert_eq!(cmd.get_current_dir(), Some(dir.path()));
    }
}
