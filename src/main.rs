//! nbcheck CLI binary entry point.
//! Resolves settings, runs the selected checks and prints the report.

use clap::Parser;
use log::{info, warn};
use nbcheck::cli::Cli;
use nbcheck::discover::{collect_notebooks, ExcludeSet};
use nbcheck::execute::papermill::PapermillEngine;
use nbcheck::output::{self, ReportOptions};
use nbcheck::{config, logging, registry, runner};
use std::time::Instant;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version are printed through the error path too.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {:#}", output::error_prefix(), e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    let start = Instant::now();
    let _logger = logging::init_logging(cli.log_level.as_deref())?;
    let cwd = std::env::current_dir()?;

    let settings = config::resolve(&cli, &cwd)?;
    let checks = registry::select(&settings)?;
    let excludes = ExcludeSet::new(settings.exclude_patterns.as_slice())?;

    let files = excludes.apply(collect_notebooks(&settings.paths));
    if files.is_empty() {
        warn!("no notebooks found under the given paths");
    } else {
        info!("found {} notebooks", files.len());
    }

    let engine = PapermillEngine::new(
        settings.engine.command.clone(),
        settings.engine.args.clone(),
    );
    let report = runner::run_checks(&files, &checks, &engine, settings.jobs);

    let opts = ReportOptions {
        verbose: settings.verbose,
        color: output::use_colors(settings.output, settings.no_color),
        base_dir: Some(cwd.canonicalize().unwrap_or(cwd)),
        width: output::terminal_width(),
    };
    output::print_report(&report, settings.output, &opts, start.elapsed())?;
    Ok(report.summary.exit_code())
}
