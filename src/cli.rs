//! CLI argument parsing via `clap`.

use crate::checks::CheckKind;
use crate::output::OutputMode;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "nbcheck",
    version,
    about = "Check notebooks for structure and executability",
    long_about = "nbcheck - check your notebook format. Select one or more checks and point it at notebooks or directories.\n\nConfiguration precedence: CLI > nbcheck.toml > defaults.",
    after_help = "Examples:\n  nbcheck . --cell_count --is_ascending\n  nbcheck a.ipynb b.ipynb --has_md\n  nbcheck a.ipynb b.ipynb --line_in_cell --max_line_in_cell 100\n  nbcheck notebooks/ --execute --exclude_patterns 'drafts/*'"
)]
/// Top-level CLI options.
pub struct Cli {
    #[arg(value_name = "PATHS", help = "Notebooks or directories to run checks on")]
    pub paths: Vec<PathBuf>,

    #[arg(long = "cell_count", alias = "cell-count", help = "Check the number of code cells does not exceed --max_cell_count")]
    pub cell_count: bool,
    #[arg(long = "is_ascending", alias = "is-ascending", help = "Check execution counts are in ascending order")]
    pub is_ascending: bool,
    #[arg(long = "has_md", alias = "has-md", help = "Check the notebook has at least one markdown cell")]
    pub has_md: bool,
    #[arg(long = "line_in_cell", alias = "line-in-cell", help = "Check every code cell has fewer lines than --max_line_in_cell")]
    pub line_in_cell: bool,
    #[arg(long = "total_line_in_nb", alias = "total-line-in-nb", help = "Check code cells together have fewer lines than --max_total_line_in_nb")]
    pub total_line_in_nb: bool,
    #[arg(long, help = "Check the notebook executes without error (with declared default parameters)")]
    pub execute: bool,
    #[arg(long = "execute_without_parameters", alias = "execute-without-parameters", help = "Run --execute without injecting parameters")]
    pub execute_without_parameters: bool,

    #[arg(long = "max_cell_count", alias = "max-cell-count", value_name = "N", help = "Maximum number of code cells (default: 20)")]
    pub max_cell_count: Option<usize>,
    #[arg(long = "max_line_in_cell", alias = "max-line-in-cell", value_name = "N", help = "Maximum lines per code cell (default: 300)")]
    pub max_line_in_cell: Option<usize>,
    #[arg(long = "max_total_line_in_nb", alias = "max-total-line-in-nb", value_name = "N", help = "Maximum lines across all code cells (default: 1000)")]
    pub max_total_line_in_nb: Option<usize>,
    #[arg(
        long = "exclude_patterns",
        alias = "exclude-patterns",
        value_name = "GLOB",
        num_args = 1..,
        help = "Exclude notebooks matching these glob patterns (tooling dirs such as .git/ and .ipynb_checkpoints/ are always skipped)"
    )]
    pub exclude_patterns: Vec<String>,

    #[arg(short, long, help = "List every file, including passing ones")]
    pub verbose: bool,
    #[arg(long, value_enum, help = "Output mode: human|json (default: human)")]
    pub output: Option<OutputMode>,
    #[arg(long, help = "Disable colored output")]
    pub no_color: bool,
    #[arg(long, value_name = "N", help = "Number of worker threads (default: one per CPU)")]
    pub jobs: Option<usize>,
    #[arg(long, value_name = "LEVEL", help = "Log level or filter spec (default: warn, env: NBCHECK_LOG)")]
    pub log_level: Option<String>,
    #[arg(long, value_name = "FILE", help = "Path to nbcheck.toml|yaml (default: searched upward)")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Check kinds selected by flags, in canonical order.
    pub fn selected_checks(&self) -> Vec<CheckKind> {
        let flags = [
            (self.cell_count, CheckKind::CellCount),
            (self.is_ascending, CheckKind::IsAscending),
            (self.has_md, CheckKind::HasMarkdown),
            (self.line_in_cell, CheckKind::LineInCell),
            (self.total_line_in_nb, CheckKind::TotalLineInNotebook),
            (self.execute, CheckKind::Execute),
        ];
        flags
            .into_iter()
            .filter_map(|(on, kind)| on.then_some(kind))
            .collect()
    }
}
