//! Notebook checks.
//!
//! `CheckKind` names a check; `Check` is a selected check together with the
//! parameters it needs. The five structural predicates are pure functions
//! over a parsed `Notebook`; `execute` delegates to an `Engine`.

use crate::error::{CheckError, ConfigError};
use crate::execute::{self, Engine};
use crate::models::notebook::Notebook;
use crate::models::CheckResult;
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_MAX_CELL_COUNT: usize = 20;
pub const DEFAULT_MAX_LINE_IN_CELL: usize = 300;
pub const DEFAULT_MAX_TOTAL_LINE_IN_NB: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Check names, in canonical report order.
pub enum CheckKind {
    CellCount,
    IsAscending,
    HasMarkdown,
    LineInCell,
    TotalLineInNotebook,
    Execute,
}

impl CheckKind {
    pub const ALL: [CheckKind; 6] = [
        CheckKind::CellCount,
        CheckKind::IsAscending,
        CheckKind::HasMarkdown,
        CheckKind::LineInCell,
        CheckKind::TotalLineInNotebook,
        CheckKind::Execute,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::CellCount => "cell_count",
            CheckKind::IsAscending => "is_ascending",
            CheckKind::HasMarkdown => "has_md",
            CheckKind::LineInCell => "line_in_cell",
            CheckKind::TotalLineInNotebook => "total_line_in_nb",
            CheckKind::Execute => "execute",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.name()).collect()
    }
}

impl FromStr for CheckKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownCheck(s.to_string()))
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// A selected check with its parameters bound.
pub enum Check {
    CellCount { max: usize },
    IsAscending,
    HasMarkdown,
    LineInCell { max: usize },
    TotalLineInNotebook { max: usize },
    Execute { with_parameters: bool },
}

impl Check {
    pub fn kind(&self) -> CheckKind {
        match self {
            Check::CellCount { .. } => CheckKind::CellCount,
            Check::IsAscending => CheckKind::IsAscending,
            Check::HasMarkdown => CheckKind::HasMarkdown,
            Check::LineInCell { .. } => CheckKind::LineInCell,
            Check::TotalLineInNotebook { .. } => CheckKind::TotalLineInNotebook,
            Check::Execute { .. } => CheckKind::Execute,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    /// One-line description shown in the report header for this check.
    pub fn description(&self) -> String {
        match self {
            Check::CellCount { max } => format!("check cell count does not exceed {max}"),
            Check::IsAscending => {
                "check the cell number (execution_count) is in ascending order".to_string()
            }
            Check::HasMarkdown => "check notebook has at least one markdown cell".to_string(),
            Check::LineInCell { max } => {
                format!("check all code cells in notebook have lines less than {max}")
            }
            Check::TotalLineInNotebook { max } => {
                format!("check sum of lines in all code cells does not exceed {max}")
            }
            Check::Execute {
                with_parameters: true,
            } => "check notebook can be (parameterized) executed and no error raised".to_string(),
            Check::Execute {
                with_parameters: false,
            } => "check notebook can be executed and no error raised".to_string(),
        }
    }

    /// Remedy printed when at least one file fails this check.
    pub fn failure_hint(&self) -> &'static str {
        match self {
            Check::CellCount { .. } => {
                "Some of your notebooks have too many cells.\nTry to split these notebooks into multiple notebooks."
            }
            Check::IsAscending => {
                "Some of your notebooks are in the wrong order.\nTry to 'restart and run all' or rearrange your cells."
            }
            Check::HasMarkdown => {
                "Some of your notebooks don't have any markdown cell.\nTry to add a markdown cell describing your notebook."
            }
            Check::LineInCell { .. } => "Some of your notebooks have cells with too many lines.",
            Check::TotalLineInNotebook { .. } => {
                "Some of your notebooks have too many lines.\nConsider splitting them into several notebooks with different purposes."
            }
            Check::Execute { .. } => {
                "Some of your notebooks failed to execute.\nRe-run your notebook and make sure no error is raised."
            }
        }
    }

    /// Load `path` and evaluate this check. Never panics or propagates:
    /// every failure becomes an Error verdict.
    pub fn run(&self, path: &Path, engine: &dyn Engine) -> CheckResult {
        match self.evaluate(path, engine) {
            Ok(result) => result,
            Err(err) => CheckResult::error(&err),
        }
    }

    fn evaluate(&self, path: &Path, engine: &dyn Engine) -> Result<CheckResult, CheckError> {
        let nb = Notebook::load(path)?;
        let result = match *self {
            Check::CellCount { max } => cell_count(&nb, max),
            Check::IsAscending => is_ascending(&nb),
            Check::HasMarkdown => has_markdown(&nb),
            Check::LineInCell { max } => line_in_cell(&nb, max),
            Check::TotalLineInNotebook { max } => total_line_in_notebook(&nb, max),
            Check::Execute { with_parameters } => {
                execute::run(path, &nb, with_parameters, engine)?;
                CheckResult::pass()
            }
        };
        Ok(result)
    }
}

impl Serialize for Check {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Number of code cells must stay below `max`.
pub fn cell_count(nb: &Notebook, max: usize) -> CheckResult {
    let count = nb.code_cells().count();
    CheckResult::verdict(count < max, || {
        format!("{count} code cells (limit {max})")
    })
}

/// Non-null execution counts of code cells must strictly increase.
pub fn is_ascending(nb: &Notebook) -> CheckResult {
    let counts: Vec<i64> = nb.code_cells().filter_map(|c| c.execution_count).collect();
    match counts.windows(2).find(|w| w[1] <= w[0]) {
        None => CheckResult::pass(),
        Some(w) => CheckResult::fail(format!("execution count {} follows {}", w[1], w[0])),
    }
}

/// At least one markdown cell.
pub fn has_markdown(nb: &Notebook) -> CheckResult {
    CheckResult::verdict(nb.markdown_cells().next().is_some(), || {
        "no markdown cell found".to_string()
    })
}

/// Every code cell must have fewer than `max` lines.
pub fn line_in_cell(nb: &Notebook, max: usize) -> CheckResult {
    let offender = nb
        .cells
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_code())
        .find(|(_, c)| c.line_count() >= max);
    match offender {
        None => CheckResult::pass(),
        Some((idx, cell)) => CheckResult::fail(format!(
            "cell {} has {} lines (limit {max})",
            idx + 1,
            cell.line_count()
        )),
    }
}

/// Code cells together must have fewer than `max` lines.
pub fn total_line_in_notebook(nb: &Notebook, max: usize) -> CheckResult {
    let total: usize = nb.code_cells().map(|c| c.line_count()).sum();
    CheckResult::verdict(total < max, || {
        format!("{total} lines in code cells (limit {max})")
    })
}
