//! Applies every selected check to every notebook.
//!
//! Files are processed in parallel on a rayon pool; results are keyed by
//! path so the report is identical regardless of scheduling.

use crate::checks::Check;
use crate::execute::Engine;
use crate::models::{CheckResult, CheckRun, RunReport};
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Evaluate `checks` x `files`. Never fails: every problem is recorded as
/// an Error verdict for the (check, file) pair it belongs to.
pub fn run_checks(
    files: &[PathBuf],
    checks: &[Check],
    engine: &dyn Engine,
    jobs: Option<usize>,
) -> RunReport {
    let work = || -> Vec<CheckRun> {
        checks
            .iter()
            .map(|check| {
                debug!("running {} on {} files", check.name(), files.len());
                let results: BTreeMap<String, CheckResult> = files
                    .par_iter()
                    .map(|file| {
                        let result = check.run(file, engine);
                        debug!("{} {}: {}", check.name(), file.display(), result.status);
                        (file.to_string_lossy().to_string(), result)
                    })
                    .collect();
                CheckRun {
                    check: *check,
                    results,
                }
            })
            .collect()
    };

    let runs = match jobs {
        Some(n) => match rayon::ThreadPoolBuilder::new().num_threads(n).build() {
            Ok(pool) => pool.install(work),
            Err(e) => {
                warn!("could not build a {n}-thread pool ({e}); using the default");
                work()
            }
        },
        None => work(),
    };
    RunReport::new(runs, files.len())
}
