//! Notebook document model.
//!
//! Only the fields the checks consume are modeled; everything else in the
//! nbformat JSON is ignored during deserialization.

use crate::error::CheckError;
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
/// Kind of a cell. Unrecognized kinds are kept but never matched.
pub enum CellType {
    Code,
    Markdown,
    Other(String),
}

impl From<String> for CellType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "code" => CellType::Code,
            "markdown" => CellType::Markdown,
            _ => CellType::Other(s),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CellMetadata {
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
/// One notebook cell.
pub struct Cell {
    pub cell_type: CellType,
    #[serde(default, deserialize_with = "lines_from_source")]
    pub source: Vec<String>,
    /// `None` when the cell was never executed.
    #[serde(default)]
    pub execution_count: Option<i64>,
    #[serde(default)]
    pub metadata: CellMetadata,
}

impl Cell {
    pub fn is_code(&self) -> bool {
        self.cell_type == CellType::Code
    }

    pub fn is_markdown(&self) -> bool {
        self.cell_type == CellType::Markdown
    }

    pub fn line_count(&self) -> usize {
        self.source.len()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.tags.iter().any(|t| t == tag)
    }

    /// Source joined back into a single string.
    pub fn text(&self) -> String {
        self.source.concat()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KernelSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LanguageInfo {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotebookMetadata {
    #[serde(default)]
    pub kernelspec: Option<KernelSpec>,
    #[serde(default)]
    pub language_info: Option<LanguageInfo>,
}

#[derive(Debug, Clone, Deserialize)]
/// A parsed notebook. Built fresh for every evaluation and never mutated.
pub struct Notebook {
    pub cells: Vec<Cell>,
    #[serde(default)]
    pub metadata: NotebookMetadata,
}

impl Notebook {
    /// Read and parse a notebook from disk.
    pub fn load(path: &Path) -> Result<Notebook, CheckError> {
        let data = fs::read_to_string(path).map_err(|source| CheckError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Notebook, CheckError> {
        Ok(serde_json::from_str(data)?)
    }

    pub fn code_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.is_code())
    }

    pub fn markdown_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.is_markdown())
    }

    /// Kernel identifier from `metadata.kernelspec.name`; blank counts as unset.
    pub fn kernel_name(&self) -> Option<&str> {
        self.metadata
            .kernelspec
            .as_ref()
            .and_then(|k| k.name.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Language from the kernelspec, falling back to `language_info`.
    pub fn language(&self) -> Option<&str> {
        self.metadata
            .kernelspec
            .as_ref()
            .and_then(|k| k.language.as_deref())
            .or_else(|| {
                self.metadata
                    .language_info
                    .as_ref()
                    .and_then(|l| l.name.as_deref())
            })
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

// nbformat allows `source` as either a list of lines or one string.
fn lines_from_source<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Source {
        Lines(Vec<String>),
        Text(String),
    }
    Ok(match Source::deserialize(deserializer)? {
        Source::Lines(lines) => lines,
        Source::Text(text) => text.split_inclusive('\n').map(String::from).collect(),
    })
}
