//! Check selection.

use crate::checks::{Check, CheckKind};
use crate::config::Settings;
use crate::error::ConfigError;
use log::debug;

/// Turn the selected check kinds into bound checks, in canonical order.
///
/// Duplicates collapse; an empty selection is rejected before any file is
/// read.
pub fn select(settings: &Settings) -> Result<Vec<Check>, ConfigError> {
    let checks: Vec<Check> = CheckKind::ALL
        .into_iter()
        .filter(|k| settings.checks.contains(k))
        .map(|kind| bind(kind, settings))
        .collect();
    if checks.is_empty() {
        return Err(ConfigError::NoCheckSelected);
    }
    debug!(
        "selected checks: {}",
        checks.iter().map(Check::name).collect::<Vec<_>>().join(", ")
    );
    Ok(checks)
}

fn bind(kind: CheckKind, settings: &Settings) -> Check {
    let limits = &settings.limits;
    match kind {
        CheckKind::CellCount => Check::CellCount {
            max: limits.max_cell_count,
        },
        CheckKind::IsAscending => Check::IsAscending,
        CheckKind::HasMarkdown => Check::HasMarkdown,
        CheckKind::LineInCell => Check::LineInCell {
            max: limits.max_line_in_cell,
        },
        CheckKind::TotalLineInNotebook => Check::TotalLineInNotebook {
            max: limits.max_total_line_in_nb,
        },
        CheckKind::Execute => Check::Execute {
            with_parameters: settings.execute_with_parameters,
        },
    }
}
