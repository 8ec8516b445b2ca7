//! Shared data models: the notebook document and check verdicts.

pub mod notebook;

use crate::checks::Check;
use crate::error::CheckError;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Outcome of one check on one file.
pub enum Status {
    Pass,
    Fail,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Pass => "Pass",
            Status::Fail => "Fail",
            Status::Error => "Error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Source of an Error verdict.
pub enum ErrorKind {
    Io,
    Parse,
    Parameter,
    Kernel,
    Execution,
    Engine,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Io => "io",
            ErrorKind::Parse => "parse",
            ErrorKind::Parameter => "parameter",
            ErrorKind::Kernel => "kernel",
            ErrorKind::Execution => "execution",
            ErrorKind::Engine => "engine",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// Verdict plus optional explanation.
pub struct CheckResult {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
}

impl CheckResult {
    pub fn pass() -> Self {
        Self {
            status: Status::Pass,
            detail: None,
            kind: None,
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            status: Status::Fail,
            detail: Some(detail.into()),
            kind: None,
        }
    }

    /// Pass when `ok`, otherwise Fail with the lazily built detail.
    pub fn verdict(ok: bool, detail: impl FnOnce() -> String) -> Self {
        if ok {
            Self::pass()
        } else {
            Self::fail(detail())
        }
    }

    pub fn error(err: &CheckError) -> Self {
        Self {
            status: Status::Error,
            detail: Some(err.to_string()),
            kind: Some(err.kind()),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.status == Status::Pass
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Aggregated counts across every (check, file) pair.
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub files: usize,
    pub checks: usize,
}

impl Summary {
    /// 0 when nothing failed or errored (including the zero-file case).
    pub fn exit_code(&self) -> i32 {
        if self.failed == 0 && self.errors == 0 {
            0
        } else {
            1
        }
    }
}

#[derive(Debug, Clone)]
/// Results of one check across all files, keyed by file path.
pub struct CheckRun {
    pub check: Check,
    pub results: BTreeMap<String, CheckResult>,
}

impl CheckRun {
    pub fn passed(&self) -> usize {
        self.results.values().filter(|r| r.is_pass()).count()
    }

    pub fn count(&self, status: Status) -> usize {
        self.results.values().filter(|r| r.status == status).count()
    }
}

#[derive(Debug, Clone)]
/// Everything the reporter needs: per-check results plus totals.
pub struct RunReport {
    pub runs: Vec<CheckRun>,
    pub summary: Summary,
}

impl RunReport {
    pub fn new(runs: Vec<CheckRun>, files: usize) -> Self {
        let mut summary = Summary {
            files,
            checks: runs.len(),
            ..Summary::default()
        };
        for run in &runs {
            summary.passed += run.count(Status::Pass);
            summary.failed += run.count(Status::Fail);
            summary.errors += run.count(Status::Error);
        }
        Self { runs, summary }
    }

    /// Error verdicts in check order, then file order.
    pub fn errors(&self) -> impl Iterator<Item = (&Check, &str, &CheckResult)> {
        self.runs.iter().flat_map(|run| {
            run.results
                .iter()
                .filter(|(_, r)| r.status == Status::Error)
                .map(move |(file, r)| (&run.check, file.as_str(), r))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(check: Check, results: &[(&str, CheckResult)]) -> CheckRun {
        CheckRun {
            check,
            results: results
                .iter()
                .map(|(f, r)| (f.to_string(), r.clone()))
                .collect(),
        }
    }

    #[test]
    fn summary_counts_and_exit_code() {
        let report = RunReport::new(
            vec![
                run(
                    Check::IsAscending,
                    &[("a", CheckResult::pass()), ("b", CheckResult::fail("x"))],
                ),
                run(
                    Check::HasMarkdown,
                    &[("a", CheckResult::pass()), ("b", CheckResult::pass())],
                ),
            ],
            2,
        );
        assert_eq!(report.summary.passed, 3);
        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.errors, 0);
        assert_eq!(report.summary.checks, 2);
        assert_eq!(report.summary.exit_code(), 1);
    }

    #[test]
    fn errors_alone_also_fail_the_run() {
        let err = CheckError::Engine("missing".into());
        let report = RunReport::new(
            vec![run(Check::HasMarkdown, &[("a", CheckResult::error(&err))])],
            1,
        );
        assert_eq!(report.summary.errors, 1);
        assert_eq!(report.summary.exit_code(), 1);
        let listed: Vec<_> = report.errors().collect();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].1, "a");
        assert_eq!(listed[0].2.kind, Some(ErrorKind::Engine));
    }

    #[test]
    fn empty_report_exits_zero() {
        let report = RunReport::new(vec![run(Check::HasMarkdown, &[])], 0);
        assert_eq!(report.summary, Summary { checks: 1, ..Summary::default() });
        assert_eq!(report.summary.exit_code(), 0);
    }

    #[test]
    fn result_serializes_without_empty_fields() {
        let v = serde_json::to_value(CheckResult::pass()).unwrap();
        assert_eq!(v, serde_json::json!({"status": "pass"}));
        let e = serde_json::to_value(CheckResult::error(&CheckError::Engine("x".into()))).unwrap();
        assert_eq!(e["kind"], "engine");
    }
}
