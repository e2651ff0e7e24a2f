//! Paper records extracted from bibliography entries.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ScreenError;

use super::scanner::RawEntry;

/// One bibliography entry, ready for screening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRecord {
    /// Unique citation key.
    pub citekey: String,

    /// Entry type (`article`, `inproceedings`, ...).
    pub entry_type: String,

    /// Title as written in the source.
    pub title: String,

    /// All other fields, verbatim, in source order.
    #[serde(default)]
    pub fields: IndexMap<String, String>,
}

impl PaperRecord {
    /// Create a record with no extra fields.
    pub fn new(citekey: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            citekey: citekey.into(),
            entry_type: "misc".to_string(),
            title: title.into(),
            fields: IndexMap::new(),
        }
    }

    /// Add a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// Look up a field by (case-insensitive) name.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    /// Title with grouping braces removed and whitespace collapsed.
    pub fn display_title(&self) -> String {
        clean_value(&self.title)
    }

    /// Build a record from a scanned entry. Fails if the entry has no title.
    pub fn from_entry(entry: &RawEntry) -> Result<Self, ScreenError> {
        let title = entry
            .fields
            .get("title")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ScreenError::Parse {
                line: entry.line,
                message: format!("entry '{}' has no title", entry.citekey),
            })?;

        let fields = entry
            .fields
            .iter()
            .filter(|(name, _)| name.as_str() != "title")
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Ok(Self {
            citekey: entry.citekey.clone(),
            entry_type: entry.entry_type.clone(),
            title: title.clone(),
            fields,
        })
    }
}

/// Strip BibTeX grouping braces and collapse runs of whitespace.
pub fn clean_value(value: &str) -> String {
    value
        .replace(['{', '}'], "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
