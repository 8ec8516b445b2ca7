//! Notebook discovery.
//!
//! Directories are searched recursively for `*.ipynb`, skipping
//! conventional tooling directories. User exclude globs are applied
//! afterwards through [`ExcludeSet`].

use crate::error::ConfigError;
use glob::{glob, Pattern};
use log::{debug, warn};
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

pub const NOTEBOOK_EXTENSION: &str = "ipynb";

fn tooling_dirs_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"/(\.direnv|\.eggs|\.git|\.hg|\.ipynb_checkpoints|\.mypy_cache|\.nox|\.svn|\.tox|\.venv|_build|buck-out|build|dist|venv)/",
        )
        .expect("tooling dirs regex")
    })
}

/// Collect notebooks under `roots`, sorted and de-duplicated.
///
/// Directory roots are walked recursively. File roots are kept when they
/// carry the notebook extension, whether or not they exist; a missing file
/// surfaces later as an Error verdict.
pub fn collect_notebooks(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut found: BTreeSet<PathBuf> = BTreeSet::new();
    for root in roots {
        if root.is_dir() {
            let root = absolutize(root);
            let pattern = format!(
                "{}/**/*.{NOTEBOOK_EXTENSION}",
                Pattern::escape(&root.to_string_lossy())
            );
            let entries = match glob(&pattern) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("cannot search {}: {e}", root.display());
                    continue;
                }
            };
            for entry in entries {
                match entry {
                    Ok(path) if !in_tooling_dir(&root, &path) => {
                        found.insert(path);
                    }
                    Ok(path) => debug!("skipping tooling path {}", path.display()),
                    Err(e) => warn!("skipping unreadable path: {e}"),
                }
            }
        } else if has_notebook_extension(root) {
            found.insert(absolutize(root));
        } else {
            debug!("ignoring non-notebook path {}", root.display());
        }
    }
    found.into_iter().collect()
}

fn has_notebook_extension(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == NOTEBOOK_EXTENSION)
}

// Only the part below `root` is inspected, so a root that itself lives in
// e.g. `build/` is still searched.
fn in_tooling_dir(root: &Path, path: &Path) -> bool {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let rel = format!("/{}", rel.to_string_lossy().replace('\\', "/"));
    tooling_dirs_re().is_match(&rel)
}

fn absolutize(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

#[derive(Debug, Clone)]
struct ExcludePattern {
    anchored: bool,
    components: Vec<Pattern>,
}

impl ExcludePattern {
    fn matches(&self, parts: &[String]) -> bool {
        let n = self.components.len();
        if self.anchored && parts.len() != n {
            return false;
        }
        if parts.len() < n {
            return false;
        }
        parts[parts.len() - n..]
            .iter()
            .zip(&self.components)
            .all(|(part, pat)| pat.matches(part))
    }
}

#[derive(Debug, Clone, Default)]
/// User supplied exclude globs.
///
/// Relative patterns match against the trailing components of a path, so
/// `failed/*` drops `/work/failed/a.ipynb`. Patterns starting with `/` must
/// match the whole path. `**` within a component behaves like `*`.
pub struct ExcludeSet {
    patterns: Vec<ExcludePattern>,
}

impl ExcludeSet {
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Result<Self, ConfigError> {
        let patterns = raw
            .iter()
            .map(|p| compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        let parts: Vec<String> = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().to_string()),
                _ => None,
            })
            .collect();
        self.patterns.iter().any(|p| p.matches(&parts))
    }

    /// Drop every path matched by any pattern.
    pub fn apply(&self, files: Vec<PathBuf>) -> Vec<PathBuf> {
        if self.is_empty() {
            return files;
        }
        files
            .into_iter()
            .filter(|f| {
                let excluded = self.is_excluded(f);
                if excluded {
                    debug!("excluded {}", f.display());
                }
                !excluded
            })
            .collect()
    }
}

fn compile(raw: &str) -> Result<ExcludePattern, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidPattern {
        pattern: raw.to_string(),
        message,
    };
    let normalized = raw.replace('\\', "/");
    let anchored = normalized.starts_with('/');
    let components = normalized
        .split('/')
        .filter(|c| !c.is_empty() && *c != ".")
        .map(|c| {
            let mut c = c.to_string();
            while c.contains("**") {
                c = c.replace("**", "*");
            }
            Pattern::new(&c).map_err(|e| invalid(e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if components.is_empty() {
        return Err(invalid("empty pattern".into()));
    }
    Ok(ExcludePattern {
        anchored,
        components,
    })
}
