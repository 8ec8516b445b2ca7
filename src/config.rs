//! Configuration discovery and effective settings resolution.
//!
//! nbcheck reads `nbcheck.toml|yaml|yml` from the working directory (or
//! the closest ancestor, stopping at the repository root) and merges it
//! with CLI flags into an immutable [`Settings`].
//! Defaults:
//! - `max_cell_count`: 20
//! - `max_line_in_cell`: 300
//! - `max_total_line_in_nb`: 1000
//! - `output`: `human`
//! - `execute.engine`: `papermill`
//!
//! Overrides precedence: CLI > config file > defaults.

use crate::checks::{
    CheckKind, DEFAULT_MAX_CELL_COUNT, DEFAULT_MAX_LINE_IN_CELL, DEFAULT_MAX_TOTAL_LINE_IN_NB,
};
use crate::cli::Cli;
use crate::error::ConfigError;
use crate::execute::papermill::DEFAULT_ENGINE;
use crate::output::OutputMode;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAMES: [&str; 3] = ["nbcheck.toml", "nbcheck.yaml", "nbcheck.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `nbcheck.toml|yaml`.
pub struct FileConfig {
    /// Check names used when no check flag is given.
    #[serde(default)]
    pub checks: Vec<String>,
    pub max_cell_count: Option<usize>,
    pub max_line_in_cell: Option<usize>,
    pub max_total_line_in_nb: Option<usize>,
    /// Appended to patterns given on the command line.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    pub output: Option<OutputMode>,
    pub verbose: Option<bool>,
    pub execute_without_parameters: Option<bool>,
    pub jobs: Option<usize>,
    #[serde(default)]
    pub execute: Option<ExecuteCfg>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// `[execute]` section: which engine command to run and extra arguments.
pub struct ExecuteCfg {
    pub engine: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_cell_count: usize,
    pub max_line_in_cell: usize,
    pub max_total_line_in_nb: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_cell_count: DEFAULT_MAX_CELL_COUNT,
            max_line_in_cell: DEFAULT_MAX_LINE_IN_CELL,
            max_total_line_in_nb: DEFAULT_MAX_TOTAL_LINE_IN_NB,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub command: String,
    pub args: Vec<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            command: DEFAULT_ENGINE.to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
/// Fully-resolved settings, fixed for the whole run.
pub struct Settings {
    pub paths: Vec<PathBuf>,
    pub checks: Vec<CheckKind>,
    pub limits: Limits,
    pub execute_with_parameters: bool,
    pub exclude_patterns: Vec<String>,
    pub output: OutputMode,
    pub verbose: bool,
    pub no_color: bool,
    pub jobs: Option<usize>,
    pub engine: EngineSettings,
    /// Config file that contributed, if any.
    pub config_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            checks: Vec::new(),
            limits: Limits::default(),
            execute_with_parameters: true,
            exclude_patterns: Vec::new(),
            output: OutputMode::Human,
            verbose: false,
            no_color: false,
            jobs: None,
            engine: EngineSettings::default(),
            config_path: None,
        }
    }
}

/// Walk upward from `start` looking for a config file.
///
/// The search stops at the first directory holding `.git`.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut cur = start;
    loop {
        for name in CONFIG_FILE_NAMES {
            let candidate = cur.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        if cur.join(".git").exists() {
            return None;
        }
        cur = cur.parent()?;
    }
}

/// Load a config file; YAML by extension, TOML otherwise.
pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_err = |message: String| ConfigError::ParseConfig {
        path: path.to_path_buf(),
        message,
    };
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            // An empty YAML document is an empty config.
            if s.trim().is_empty() {
                return Ok(FileConfig::default());
            }
            serde_yaml::from_str(&s).map_err(|e| parse_err(e.to_string()))
        }
        _ => toml::from_str(&s).map_err(|e| parse_err(e.to_string())),
    }
}

fn limit(
    name: &'static str,
    cli: Option<usize>,
    file: Option<usize>,
    default: usize,
) -> Result<usize, ConfigError> {
    match cli.or(file).unwrap_or(default) {
        0 => Err(ConfigError::InvalidLimit { name }),
        n => Ok(n),
    }
}

/// Resolve `Settings` by merging CLI flags, the config file, and defaults.
pub fn resolve(cli: &Cli, cwd: &Path) -> Result<Settings, ConfigError> {
    let config_path = match &cli.config {
        Some(p) => Some(cwd.join(p)),
        None => find_config_file(cwd),
    };
    let file = match &config_path {
        Some(p) => {
            debug!("loading config {}", p.display());
            load_config(p)?
        }
        None => FileConfig::default(),
    };

    if cli.paths.is_empty() {
        return Err(ConfigError::NoPaths);
    }
    let paths = cli.paths.iter().map(|p| cwd.join(p)).collect();

    let mut checks = cli.selected_checks();
    if checks.is_empty() {
        checks = file
            .checks
            .iter()
            .map(|name| name.parse::<CheckKind>())
            .collect::<Result<Vec<_>, _>>()?;
    }

    let limits = Limits {
        max_cell_count: limit(
            "max_cell_count",
            cli.max_cell_count,
            file.max_cell_count,
            DEFAULT_MAX_CELL_COUNT,
        )?,
        max_line_in_cell: limit(
            "max_line_in_cell",
            cli.max_line_in_cell,
            file.max_line_in_cell,
            DEFAULT_MAX_LINE_IN_CELL,
        )?,
        max_total_line_in_nb: limit(
            "max_total_line_in_nb",
            cli.max_total_line_in_nb,
            file.max_total_line_in_nb,
            DEFAULT_MAX_TOTAL_LINE_IN_NB,
        )?,
    };

    let jobs = match cli.jobs.or(file.jobs) {
        Some(0) => return Err(ConfigError::InvalidLimit { name: "jobs" }),
        other => other,
    };

    let mut exclude_patterns = cli.exclude_patterns.clone();
    exclude_patterns.extend(file.exclude_patterns.iter().cloned());

    let execute = file.execute.unwrap_or_default();
    let engine = EngineSettings {
        command: execute
            .engine
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENGINE.to_string()),
        args: execute.args,
    };

    let settings = Settings {
        paths,
        checks,
        limits,
        execute_with_parameters: !(cli.execute_without_parameters
            || file.execute_without_parameters.unwrap_or(false)),
        exclude_patterns,
        output: cli.output.or(file.output).unwrap_or_default(),
        verbose: cli.verbose || file.verbose.unwrap_or(false),
        no_color: cli.no_color,
        jobs,
        engine,
        config_path,
    };
    debug!("resolved settings: {:?}", settings);
    Ok(settings)
}
