//! Parameter extraction for the parameterized execute check.
//!
//! Cells tagged `nbcheck-defaults` declare default parameter values. Their
//! assignments are pulled out by a language translator and evaluated with
//! the restricted literal grammar into a `ParameterBag`.

use crate::error::ParamError;
use crate::execute::literal::parse_literal;
use crate::execute::ParameterBag;
use crate::models::notebook::Notebook;
use log::debug;
use regex::Regex;
use std::sync::OnceLock;

/// Reserved tag marking cells whose assignments declare defaults.
pub const DEFAULTS_TAG: &str = "nbcheck-defaults";
/// Tag the execution engine uses to locate its parameter cell.
pub const PARAMETERS_TAG: &str = "parameters";

#[derive(Debug, Clone, PartialEq, Eq)]
/// A declared parameter with its unevaluated default expression.
pub struct Declaration {
    pub name: String,
    pub raw: String,
}

/// Extracts parameter declarations from a cell written in one language.
pub trait ParameterTranslator: Sync {
    fn language(&self) -> &'static str;
    fn declarations(&self, source: &str) -> Vec<Declaration>;
}

/// Pick a translator by kernel name, then by language.
pub fn translator_for(notebook: &Notebook) -> Option<&'static dyn ParameterTranslator> {
    notebook
        .kernel_name()
        .and_then(translator_named)
        .or_else(|| notebook.language().and_then(translator_named))
}

fn translator_named(name: &str) -> Option<&'static dyn ParameterTranslator> {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("python") || lower == "ipython" || lower == "ipykernel" {
        Some(&PythonTranslator)
    } else {
        None
    }
}

/// Build the parameter bag for `notebook`.
///
/// With no `nbcheck-defaults` cells the bag is empty. Otherwise exactly one
/// cell must carry the engine's `parameters` tag, every declaration must
/// evaluate, and later declarations override earlier ones.
pub fn extract(notebook: &Notebook) -> Result<ParameterBag, ParamError> {
    let defaults: Vec<usize> = notebook
        .cells
        .iter()
        .enumerate()
        .filter(|(_, c)| c.has_tag(DEFAULTS_TAG))
        .map(|(i, _)| i)
        .collect();
    let mut bag = ParameterBag::new();
    if defaults.is_empty() {
        return Ok(bag);
    }

    let tagged = notebook
        .cells
        .iter()
        .filter(|c| c.has_tag(PARAMETERS_TAG))
        .count();
    match tagged {
        1 => {}
        0 => return Err(ParamError::MissingParametersCell),
        n => return Err(ParamError::AmbiguousParametersCell(n)),
    }

    let translator = translator_for(notebook).ok_or_else(|| {
        ParamError::NoTranslator(
            notebook
                .kernel_name()
                .or_else(|| notebook.language())
                .unwrap_or("<unset>")
                .to_string(),
        )
    })?;
    debug!(
        "reading {} default cell(s) as {}",
        defaults.len(),
        translator.language()
    );

    for idx in defaults {
        let source = notebook.cells[idx].text();
        for decl in translator.declarations(&source) {
            let value = parse_literal(&decl.raw).map_err(|source| ParamError::Eval {
                name: decl.name.clone(),
                raw: decl.raw.clone(),
                source,
            })?;
            debug!("parameter {} = {} (cell {})", decl.name, value, idx + 1);
            bag.insert(decl.name, value);
        }
    }
    Ok(bag)
}

/// Python assignments: `name = expr` and `name: annotation = expr`.
pub struct PythonTranslator;

fn assignment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^([A-Za-z_][A-Za-z0-9_]*)\s*(?::\s*[^=]+?)?\s*=\s*(\S.*)$")
            .expect("assignment regex")
    })
}

impl ParameterTranslator for PythonTranslator {
    fn language(&self) -> &'static str {
        "python"
    }

    fn declarations(&self, source: &str) -> Vec<Declaration> {
        logical_lines(source)
            .iter()
            .filter_map(|line| {
                let caps = assignment_re().captures(line.trim())?;
                let raw = caps[2].trim();
                // `x == 1` is a comparison, not an assignment.
                if raw.starts_with('=') {
                    return None;
                }
                Some(Declaration {
                    name: caps[1].to_string(),
                    raw: raw.to_string(),
                })
            })
            .collect()
    }
}

// Splits Python source into logical lines: comments dropped, lines joined
// while brackets are open, inside a triple-quoted string, or after a
// trailing backslash.
fn logical_lines(source: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut depth: usize = 0;
    let mut chars = source.chars().peekable();
    let mut quote: Option<(char, bool)> = None;

    while let Some(c) = chars.next() {
        if let Some((q, triple)) = quote {
            current.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            } else if c == q {
                if !triple {
                    quote = None;
                } else if chars.peek() == Some(&q) {
                    current.push(chars.next().unwrap_or(q));
                    if chars.peek() == Some(&q) {
                        current.push(chars.next().unwrap_or(q));
                        quote = None;
                    }
                }
            } else if c == '\n' && !triple {
                quote = None;
            }
            continue;
        }
        match c {
            '#' => {
                while let Some(&n) = chars.peek() {
                    if n == '\n' {
                        break;
                    }
                    chars.next();
                }
            }
            '\'' | '"' => {
                current.push(c);
                let mut triple = false;
                if chars.peek() == Some(&c) {
                    current.push(c);
                    chars.next();
                    if chars.peek() == Some(&c) {
                        current.push(c);
                        chars.next();
                        triple = true;
                    } else {
                        // Empty string literal.
                        continue;
                    }
                }
                quote = Some((c, triple));
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            '\\' if chars.peek() == Some(&'\n') => {
                chars.next();
                current.push(' ');
            }
            '\n' if depth == 0 => {
                lines.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        lines.push(current);
    }
    lines.retain(|l| !l.trim().is_empty());
    lines
}
