//! Report rendering.
//!
//! Supports `human` (default) and `json` outputs. The human form is a
//! banner-framed summary per check followed by an error listing; the JSON
//! form carries per-file verdicts and a top-level summary.

use crate::models::{RunReport, Status};
use owo_colors::{OwoColorize, Style};
use serde::Deserialize;
use serde_json::{json, Map, Value as JsonVal};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_WIDTH: usize = 80;
pub const NO_NOTEBOOKS_NOTICE: &str = "FOUND 0 NOTEBOOKS! EXIT.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
/// Report format.
pub enum OutputMode {
    #[default]
    Human,
    Json,
}

#[derive(Debug, Clone)]
/// Presentation knobs for the human report.
pub struct ReportOptions {
    pub verbose: bool,
    pub color: bool,
    /// Paths are shown relative to this directory when possible.
    pub base_dir: Option<PathBuf>,
    pub width: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            color: false,
            base_dir: None,
            width: DEFAULT_WIDTH,
        }
    }
}

/// Colors only for a human report on a terminal, unless `NO_COLOR` is set
/// or the caller opted out.
pub fn use_colors(mode: OutputMode, no_color: bool) -> bool {
    mode == OutputMode::Human
        && !no_color
        && std::env::var_os("NO_COLOR").is_none()
        && std::io::stdout().is_terminal()
}

/// Terminal width from `COLUMNS`, falling back to 80.
pub fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|c| c.trim().parse::<usize>().ok())
        .filter(|w| *w > 0)
        .unwrap_or(DEFAULT_WIDTH)
}

fn paint(text: &str, color: bool, style: Style) -> String {
    if color {
        text.style(style).to_string()
    } else {
        text.to_string()
    }
}

/// `title` centered in a line of `=`.
pub fn banner(title: &str, width: usize, color: bool) -> String {
    let pad = width.saturating_sub(title.chars().count());
    let left = pad.div_ceil(2);
    let right = pad / 2;
    let line = format!("{}{}{}", "=".repeat(left), title, "=".repeat(right));
    paint(&line, color, Style::new().yellow())
}

/// Prefix for fatal messages on stderr.
pub fn error_prefix() -> String {
    let color = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
    paint("error:", color, Style::new().red().bold())
}

/// Display form of a file key: relative to `base` when it is a prefix.
pub fn display_path(file: &str, base: Option<&Path>) -> String {
    let Some(base) = base else {
        return file.to_string();
    };
    let path = Path::new(file);
    if !path.starts_with(base) {
        return file.to_string();
    }
    match pathdiff::diff_paths(path, base) {
        Some(rel) if !rel.as_os_str().is_empty() => rel.to_string_lossy().to_string(),
        _ => file.to_string(),
    }
}

fn footer(report: &RunReport, elapsed: Duration, opts: &ReportOptions) -> String {
    let s = &report.summary;
    let mut parts: Vec<(String, Style)> = Vec::new();
    if s.passed > 0 {
        parts.push((format!("{} passed, ", s.passed), Style::new().green()));
    }
    if s.failed > 0 {
        parts.push((format!("{} failed, ", s.failed), Style::new().magenta()));
    }
    if s.errors > 0 {
        parts.push((format!("{} error, ", s.errors), Style::new().red()));
    }
    parts.push((
        format!("in {:.2}s", elapsed.as_secs_f64()),
        Style::new().yellow(),
    ));

    let plain: String = parts.iter().map(|(t, _)| t.as_str()).collect();
    let title = format!(" {plain} ");
    if !opts.color {
        return banner(&title, opts.width, false);
    }
    let pad = opts.width.saturating_sub(title.chars().count());
    let colored: String = parts.iter().map(|(t, st)| paint(t, true, *st)).collect();
    let edge = Style::new().yellow();
    format!(
        "{} {} {}",
        paint(&"=".repeat(pad.div_ceil(2)), true, edge),
        colored,
        paint(&"=".repeat(pad / 2), true, edge)
    )
}

/// Render the human report.
pub fn render_human(report: &RunReport, opts: &ReportOptions, elapsed: Duration) -> String {
    let color = opts.color;
    let base = opts.base_dir.as_deref();
    let mut out: Vec<String> = Vec::new();
    out.push(banner(" nbcheck starts! ", opts.width, color));
    out.push(format!(
        "Found {} notebooks, and select {} checks.",
        report.summary.files, report.summary.checks
    ));
    out.push(String::new());

    if report.summary.files == 0 {
        out.push(NO_NOTEBOOKS_NOTICE.to_string());
        out.push(String::new());
        out.push(footer(report, elapsed, opts));
        return out.join("\n");
    }

    out.push(String::new());
    out.push(banner(" summary ", opts.width, color));
    out.push(String::new());
    for run in &report.runs {
        let total = run.results.len();
        let passed = run.passed();
        let ratio_style = if passed == total {
            Style::new().green().bold()
        } else {
            Style::new().red().bold()
        };
        out.push(format!(
            "{} [{}/{}]",
            paint(
                &format!("[CHECKS: {}]:  {}:", run.check.name(), run.check.description()),
                color,
                Style::new().bold()
            ),
            paint(&passed.to_string(), color, ratio_style),
            total
        ));
        if run.count(Status::Fail) > 0 {
            out.push(run.check.failure_hint().to_string());
        }
        for (file, result) in &run.results {
            if result.is_pass() && !opts.verbose {
                continue;
            }
            let style = match result.status {
                Status::Pass => Style::new().green().bold(),
                Status::Fail => Style::new().red().bold(),
                Status::Error => Style::new().red().on_yellow().bold(),
            };
            out.push(format!(
                "  * {}: {}",
                display_path(file, base),
                paint(&result.status.to_string(), color, style)
            ));
            let show_detail = match result.status {
                Status::Fail => true,
                Status::Error => opts.verbose,
                Status::Pass => false,
            };
            if let (true, Some(detail)) = (show_detail, result.detail.as_deref()) {
                out.push(format!("    * {detail}"));
            }
        }
        out.push(String::new());
    }

    if report.summary.errors > 0 {
        out.push(String::new());
        out.push(banner(" errors ", opts.width, color));
        let sep = "-".repeat(opts.width);
        for (check, file, result) in report.errors() {
            out.push(String::new());
            let kind = result.kind.map(|k| format!(" ({k})")).unwrap_or_default();
            out.push(paint(
                &format!("[{}]: {}:{kind}", check.name(), display_path(file, base)),
                color,
                Style::new().bold(),
            ));
            out.push(result.detail.clone().unwrap_or_default());
            out.push(sep.clone());
        }
    }

    out.push(String::new());
    out.push(footer(report, elapsed, opts));
    out.join("\n")
}

/// Compose the JSON report (pure) for printing and tests.
pub fn compose_report_json(report: &RunReport, elapsed: Duration, base: Option<&Path>) -> JsonVal {
    let mut results = Map::new();
    for run in &report.runs {
        let mut files = Map::new();
        for (file, result) in &run.results {
            files.insert(
                display_path(file, base),
                serde_json::to_value(result).unwrap_or(JsonVal::Null),
            );
        }
        results.insert(run.check.name().to_string(), JsonVal::Object(files));
    }
    let mut doc = json!({
        "results": results,
        "summary": report.summary,
        "elapsed_secs": (elapsed.as_secs_f64() * 100.0).round() / 100.0,
    });
    if report.summary.files == 0 {
        doc["notice"] = json!(NO_NOTEBOOKS_NOTICE);
    }
    doc
}

/// Print the report in the requested format.
pub fn print_report(
    report: &RunReport,
    mode: OutputMode,
    opts: &ReportOptions,
    elapsed: Duration,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            let doc = compose_report_json(report, elapsed, opts.base_dir.as_deref());
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }
        OutputMode::Human => println!("{}", render_human(report, opts, elapsed)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::Check;
    use crate::error::CheckError;
    use crate::models::{CheckResult, CheckRun};

    fn sample() -> RunReport {
        let asc = CheckRun {
            check: Check::IsAscending,
            results: [
                ("/w/nbs/a.ipynb".to_string(), CheckResult::pass()),
                (
                    "/w/nbs/b.ipynb".to_string(),
                    CheckResult::fail("execution count 2 follows 3"),
                ),
            ]
            .into_iter()
            .collect(),
        };
        let md = CheckRun {
            check: Check::HasMarkdown,
            results: [
                ("/w/nbs/a.ipynb".to_string(), CheckResult::pass()),
                (
                    "/w/nbs/b.ipynb".to_string(),
                    CheckResult::error(&CheckError::Engine("gone".into())),
                ),
            ]
            .into_iter()
            .collect(),
        };
        RunReport::new(vec![asc, md], 2)
    }

    fn opts(verbose: bool) -> ReportOptions {
        ReportOptions {
            verbose,
            color: false,
            base_dir: Some(PathBuf::from("/w")),
            width: 40,
        }
    }

    #[test]
    fn banner_is_centered() {
        let b = banner(" hi ", 10, false);
        assert_eq!(b, "=== hi ===");
        assert_eq!(banner(" odd ", 10, false), "=== odd ==");
    }

    #[test]
    fn human_report_lists_non_passing_files() {
        let text = render_human(&sample(), &opts(false), Duration::from_millis(1234));
        assert!(text.contains("Found 2 notebooks, and select 2 checks."));
        assert!(text.contains("[CHECKS: is_ascending]:"));
        assert!(text.contains("[1/2]"));
        assert!(text.contains("Some of your notebooks are in the wrong order."));
        assert!(text.contains("  * nbs/b.ipynb: Fail"));
        assert!(text.contains("    * execution count 2 follows 3"));
        assert!(!text.contains("nbs/a.ipynb: Pass"));
        assert!(text.contains("[has_md]: nbs/b.ipynb: (engine)"));
        assert!(text.contains("2 passed, 1 failed, 1 error, in 1.23s"));
    }

    #[test]
    fn verbose_report_lists_every_file() {
        let text = render_human(&sample(), &opts(true), Duration::ZERO);
        assert!(text.contains("  * nbs/a.ipynb: Pass"));
        assert!(text.contains("  * nbs/b.ipynb: Error"));
    }

    #[test]
    fn zero_files_notice() {
        let report = RunReport::new(vec![], 0);
        let text = render_human(&report, &opts(false), Duration::ZERO);
        assert!(text.contains("Found 0 notebooks"));
        assert!(text.contains("FOUND 0 NOTEBOOKS! EXIT."));
        assert!(text.contains("in 0.00s"));
        assert!(!text.contains("summary"));
    }

    #[test]
    fn json_report_shape() {
        let v = compose_report_json(&sample(), Duration::from_millis(500), Some(Path::new("/w")));
        assert_eq!(v["results"]["is_ascending"]["nbs/b.ipynb"]["status"], "fail");
        assert_eq!(v["results"]["has_md"]["nbs/a.ipynb"]["status"], "pass");
        assert_eq!(v["results"]["has_md"]["nbs/b.ipynb"]["kind"], "engine");
        assert_eq!(v["summary"]["failed"], 1);
        assert_eq!(v["summary"]["errors"], 1);
        assert_eq!(v["elapsed_secs"], 0.5);
    }

    #[test]
    fn json_report_carries_zero_notebook_notice() {
        let empty = RunReport::new(
            vec![CheckRun {
                check: Check::HasMarkdown,
                results: Default::default(),
            }],
            0,
        );
        let v = compose_report_json(&empty, Duration::ZERO, None);
        assert_eq!(v["notice"], NO_NOTEBOOKS_NOTICE);
        assert_eq!(v["summary"]["files"], 0);

        let busy = compose_report_json(&sample(), Duration::ZERO, None);
        assert!(busy.get("notice").is_none());
    }

    #[test]
    fn paths_outside_base_stay_absolute() {
        assert_eq!(display_path("/other/x.ipynb", Some(Path::new("/w"))), "/other/x.ipynb");
        assert_eq!(display_path("/w/x.ipynb", None), "/w/x.ipynb");
    }
}
