//! Bibliography parsing and paper-record extraction.
//!
//! [`Bibliography::parse`] keeps every entry's verbatim source so the
//! filter can write accepted entries back out unchanged, while
//! [`extract_records`] produces the [`PaperRecord`]s the screener consumes.
//!
//! Malformed entries never abort extraction: each one is recorded as a
//! [`ScreenError::Parse`] issue and skipped.
//!
//! # Example
//!
//! ```
//! use bibscreen::bibliography::extract_records;
//!
//! let extraction = extract_records("@article{a2023, title = {Screening with LLMs}}");
//! assert_eq!(extraction.records.len(), 1);
//! assert_eq!(extraction.records[0].citekey, "a2023");
//! ```

mod record;
mod scanner;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{Result, ScreenError};

pub use record::{clean_value, PaperRecord};
pub use scanner::RawEntry;

use scanner::Block;

/// A parsed bibliography file.
#[derive(Debug, Default)]
pub struct Bibliography {
    /// Entries in source order, first occurrence of each citekey only.
    pub entries: Vec<RawEntry>,
    /// `@string` / `@preamble` blocks, verbatim.
    pub directives: Vec<String>,
    /// Malformed blocks and duplicate citekeys.
    pub issues: Vec<ScreenError>,
}

/// Paper records plus everything that was skipped on the way.
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<PaperRecord>,
    pub issues: Vec<ScreenError>,
}

impl Bibliography {
    /// Parse bibliography text.
    pub fn parse(text: &str) -> Self {
        let output = scanner::scan(text);
        let mut bibliography = Bibliography {
            issues: output.issues,
            ..Default::default()
        };

        let mut seen = HashSet::new();
        for block in output.blocks {
            match block {
                Block::Directive(source) => bibliography.directives.push(source),
                Block::Entry(entry) => {
                    if seen.insert(entry.citekey.clone()) {
                        bibliography.entries.push(entry);
                    } else {
                        bibliography.issues.push(ScreenError::Parse {
                            line: entry.line,
                            message: format!(
                                "duplicate citekey '{}', keeping first occurrence",
                                entry.citekey
                            ),
                        });
                    }
                }
            }
        }

        for issue in &bibliography.issues {
            tracing::warn!("Skipping bibliography block: {}", issue);
        }

        bibliography
    }

    /// Read and parse a bibliography file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ScreenError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::parse(&text))
    }

    /// Find an entry by citekey.
    pub fn get(&self, citekey: &str) -> Option<&RawEntry> {
        self.entries.iter().find(|e| e.citekey == citekey)
    }

    /// Convert entries into paper records, moving scan issues along.
    pub fn into_extraction(self) -> Extraction {
        let mut extraction = Extraction {
            records: Vec::with_capacity(self.entries.len()),
            issues: self.issues,
        };

        for entry in &self.entries {
            match PaperRecord::from_entry(entry) {
                Ok(record) => extraction.records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping entry: {}", e);
                    extraction.issues.push(e);
                }
            }
        }

        extraction
    }
}

/// Extract paper records from bibliography text.
pub fn extract_records(text: &str) -> Extraction {
    Bibliography::parse(text).into_extraction()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
@string{jair = "Journal of AI Research"}

@article{a2023,
  title = {Large Language Models for Screening},
  abstract = {We study...},
  journal = jair,
  year = {2023}
}

@inproceedings{b2023,
  author = {Roe, R.},
  year = 2023
}

@article{a2023,
  title = {Duplicate of the first}
}

@misc{c2023, title = "Third Paper"}
"#;

    #[test]
    fn test_parse_keeps_first_duplicate() {
        let bib = Bibliography::parse(SAMPLE);

        let keys: Vec<_> = bib.entries.iter().map(|e| e.citekey.as_str()).collect();
        assert_eq!(keys, vec!["a2023", "b2023", "c2023"]);
        assert_eq!(bib.directives.len(), 1);
        assert_eq!(bib.issues.len(), 1);
        assert!(bib.issues[0].to_string().contains("duplicate citekey 'a2023'"));
        assert_eq!(
            bib.get("a2023").unwrap().fields["title"],
            "Large Language Models for Screening"
        );
    }

    #[test]
    fn test_extract_records_skips_untitled() {
        let extraction = extract_records(SAMPLE);

        let keys: Vec<_> = extraction.records.iter().map(|r| r.citekey.as_str()).collect();
        assert_eq!(keys, vec!["a2023", "c2023"]);
        // duplicate + missing title
        assert_eq!(extraction.issues.len(), 2);
        assert_eq!(extraction.records[0].field("journal"), Some("jair"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Bibliography::load("/nonexistent/refs.bib").unwrap_err();
        assert!(matches!(err, ScreenError::Io { .. }));
    }
}
