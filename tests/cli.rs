#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Scratch working directory that stops config discovery at its own root.
fn workdir() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir(dir.path().join(".git")).expect("mark repo root");
    dir
}

fn nbcheck(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("nbcheck").expect("binary should be built");
    cmd.current_dir(cwd).env("NO_COLOR", "1").env_remove("NBCHECK_LOG");
    cmd
}

fn json_report(cmd: &mut Command) -> (i32, serde_json::Value) {
    let output = cmd.arg("--output").arg("json").output().expect("command should run");
    let parsed = serde_json::from_slice(&output.stdout).expect("stdout should be valid JSON");
    (output.status.code().unwrap_or(-1), parsed)
}

/// The single verdict recorded for `check`.
fn only_result<'a>(report: &'a serde_json::Value, check: &str) -> &'a serde_json::Value {
    let files = report["results"][check]
        .as_object()
        .expect("check present in results");
    assert_eq!(files.len(), 1, "{files:?}");
    files.values().next().expect("one file")
}

#[test]
fn zero_notebooks_exits_0() {
    let cwd = workdir();
    let empty = cwd.path().join("empty");
    fs::create_dir(&empty).unwrap();
    nbcheck(cwd.path())
        .arg(&empty)
        .arg("--has_md")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Found 0 notebooks, and select 1 checks."))
        .stdout(predicate::str::contains("FOUND 0 NOTEBOOKS! EXIT."));
}

#[test]
fn zero_notebooks_json_has_notice() {
    let cwd = workdir();
    let empty = cwd.path().join("empty");
    fs::create_dir(&empty).unwrap();
    let (code, report) = json_report(nbcheck(cwd.path()).arg(&empty).arg("--is_ascending"));
    assert_eq!(code, 0);
    assert_eq!(report["notice"], "FOUND 0 NOTEBOOKS! EXIT.");
    assert_eq!(report["summary"]["files"], 0);
    assert_eq!(report["results"]["is_ascending"], serde_json::json!({}));
}

#[test]
fn missing_paths_exits_1() {
    let cwd = workdir();
    nbcheck(cwd.path())
        .arg("--has_md")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no notebook path given"));
}

#[test]
fn no_check_selected_exits_1() {
    let cwd = workdir();
    nbcheck(cwd.path())
        .arg(fixtures_dir().join("passing"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Please select at least one check!"));
}

#[test]
fn passing_notebooks_exit_0() {
    let cwd = workdir();
    nbcheck(cwd.path())
        .arg(fixtures_dir().join("passing"))
        .args([
            "--cell_count",
            "--is_ascending",
            "--has_md",
            "--line_in_cell",
            "--total_line_in_nb",
        ])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("[CHECKS: is_ascending]:"))
        .stdout(predicate::str::contains("[1/1]"))
        .stdout(predicate::str::contains("5 passed, in "));
}

#[test]
fn wrong_order_exits_1() {
    let cwd = workdir();
    nbcheck(cwd.path())
        .arg(fixtures_dir().join("failing").join("wrong_order.ipynb"))
        .arg("--is_ascending")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("wrong_order.ipynb: Fail"))
        .stdout(predicate::str::contains("execution count 2 follows 3"));
}

#[test]
fn json_reports_each_check_separately() {
    let cwd = workdir();
    let (code, report) = json_report(
        nbcheck(cwd.path())
            .arg(fixtures_dir().join("failing").join("wrong_order.ipynb"))
            .args(["--is_ascending", "--has_md"]),
    );
    assert_eq!(code, 1);
    assert_eq!(only_result(&report, "is_ascending")["status"], "fail");
    assert_eq!(only_result(&report, "has_md")["status"], "pass");
    assert_eq!(report["summary"]["passed"], 1);
    assert_eq!(report["summary"]["failed"], 1);
    assert_eq!(report["summary"]["errors"], 0);
}

#[test]
fn limits_are_configurable() {
    let cwd = workdir();
    nbcheck(cwd.path())
        .arg(fixtures_dir().join("passing"))
        .args(["--line_in_cell", "--max_line_in_cell", "2"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("cell 2 has 2 lines (limit 2)"));
}

#[test]
fn exclude_patterns_drop_matching_files() {
    let cwd = workdir();
    nbcheck(cwd.path())
        .arg(fixtures_dir().join("failing"))
        .args(["--is_ascending", "--has_md", "--exclude_patterns", "failing/*"])
        .assert()
        .code(0)
        .stdout(predicate::str::contains("FOUND 0 NOTEBOOKS! EXIT."));

    nbcheck(cwd.path())
        .arg(fixtures_dir().join("failing"))
        .args(["--is_ascending", "--has_md", "--exclude_patterns", "*some_pattern*"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Found 2 notebooks"));
}

#[test]
fn invalid_exclude_pattern_exits_1() {
    let cwd = workdir();
    nbcheck(cwd.path())
        .arg(fixtures_dir().join("failing"))
        .args(["--has_md", "--exclude_patterns", "[oops"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid exclude pattern"));
}

#[test]
fn unparseable_notebook_is_an_error() {
    let cwd = workdir();
    let (code, report) = json_report(
        nbcheck(cwd.path())
            .arg(fixtures_dir().join("broken").join("not_json.ipynb"))
            .arg("--has_md"),
    );
    assert_eq!(code, 1);
    let result = only_result(&report, "has_md");
    assert_eq!(result["status"], "error");
    assert_eq!(result["kind"], "parse");
}

#[test]
fn malformed_default_is_a_parameter_error() {
    let cwd = workdir();
    let (code, report) = json_report(
        nbcheck(cwd.path())
            .arg(fixtures_dir().join("params").join("invalid_default.ipynb"))
            .arg("--execute"),
    );
    assert_eq!(code, 1);
    let result = only_result(&report, "execute");
    assert_eq!(result["kind"], "parameter");
    let detail = result["detail"].as_str().unwrap();
    assert!(detail.contains("`x`"), "{detail}");
    assert!(detail.contains("eval_of_malformed_expression"), "{detail}");
}

#[test]
fn without_parameters_skips_extraction() {
    let cwd = workdir();
    let config = cwd.path().join("engine.toml");
    fs::write(&config, "[execute]\nengine = \"nbcheck-engine-not-installed\"\n").unwrap();
    let (code, report) = json_report(
        nbcheck(cwd.path())
            .arg(fixtures_dir().join("params").join("invalid_default.ipynb"))
            .args(["--execute", "--execute_without_parameters", "--config"])
            .arg(&config),
    );
    assert_eq!(code, 1);
    let result = only_result(&report, "execute");
    assert_eq!(result["kind"], "engine");
    assert!(!result["detail"]
        .as_str()
        .unwrap()
        .contains("eval_of_malformed_expression"));
}

#[test]
fn defaults_without_parameters_cell_is_reported() {
    let cwd = workdir();
    nbcheck(cwd.path())
        .arg(fixtures_dir().join("params").join("defaults_without_parameters_tag.ipynb"))
        .arg("--execute")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("No cell with \"parameters\" tag found!"))
        .stdout(predicate::str::contains("(parameter)"));
}

#[test]
fn config_file_selects_checks() {
    let cwd = workdir();
    fs::write(cwd.path().join("nbcheck.toml"), "checks = [\"has_md\"]\n").unwrap();
    nbcheck(cwd.path())
        .arg(fixtures_dir().join("failing").join("no_markdown.ipynb"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("[CHECKS: has_md]:"))
        .stdout(predicate::str::contains("no markdown cell found"));
}

#[test]
fn help_and_version_exit_0() {
    let cwd = workdir();
    nbcheck(cwd.path())
        .arg("--help")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("--cell_count"))
        .stdout(predicate::str::contains("--exclude_patterns"));
    nbcheck(cwd.path())
        .arg("--version")
        .assert()
        .code(0)
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
