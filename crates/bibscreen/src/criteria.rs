//! Inclusion/exclusion criteria documents.
//!
//! A criteria document is loosely structured markdown:
//!
//! ```text
//! ## Inclusion Criteria
//! - CI1: Uses a large language model
//! - **CI2** - Peer reviewed
//!
//! ## Exclusion Criteria
//! 1. CX1: Not written in English
//! ```
//!
//! Headings switch the polarity of the criteria that follow. Criteria found
//! outside any section take their polarity from the id prefix. Lines indented
//! under a criterion refine it and become part of its description; any other
//! prose is kept as notes so the model still sees it.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScreenError};

/// `- **CI1**: description`, `1. CX2 - description`, `[IC3] description`...
static CRITERION_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<marker>[-*+]|\d+[.)])?\s*(?P<bold>\*\*|__)?(?P<open>\[)?(?P<id>[A-Za-z]{1,4}\d{1,3})\]?(?:\*\*|__)?\s*(?:(?P<sep>[:.)\-–—])\s*|\s+)(?P<desc>\S.*)$",
    )
    .expect("criterion pattern is valid")
});

/// Id and description of a criterion line.
///
/// A bare `GPT4 based tools...` is prose: without a list marker, bold or
/// brackets the id must be followed by an explicit separator.
fn criterion_line(line: &str) -> Option<(String, String)> {
    let caps = CRITERION_LINE.captures(line)?;
    let marked = ["marker", "bold", "open", "sep"]
        .iter()
        .any(|name| caps.name(name).is_some());
    if !marked {
        return None;
    }
    let description = caps["desc"].trim().trim_end_matches("**").trim().to_string();
    Some((caps["id"].to_string(), description))
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Whether a criterion argues for or against including a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Inclusion,
    Exclusion,
}

impl Polarity {
    /// Polarity implied by a section heading, if any.
    fn from_heading(line: &str) -> Option<Self> {
        let lower = line.to_lowercase();
        match (lower.contains("inclusion"), lower.contains("exclusion")) {
            (true, false) => Some(Polarity::Inclusion),
            (false, true) => Some(Polarity::Exclusion),
            _ => None,
        }
    }

    /// Polarity implied by a conventional id prefix (`CI1`, `EC2`, ...).
    fn from_id(id: &str) -> Option<Self> {
        let prefix: String = id
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect::<String>()
            .to_ascii_uppercase();
        match prefix.as_str() {
            "CI" | "IC" | "I" | "INC" => Some(Polarity::Inclusion),
            "CX" | "CE" | "EC" | "E" | "X" | "EXC" => Some(Polarity::Exclusion),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Polarity::Inclusion => "Inclusion",
            Polarity::Exclusion => "Exclusion",
        }
    }
}

/// A single screening criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Short identifier, e.g. `CI1`.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    pub polarity: Polarity,
}

/// The ordered set of criteria for one screening run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaSet {
    criteria: Vec<Criterion>,
    /// Free prose from the document that belongs to no criterion.
    #[serde(default)]
    notes: Vec<String>,
}

impl CriteriaSet {
    /// Build a set from already-parsed criteria.
    ///
    /// Fails if `criteria` is empty. Duplicate ids keep the first occurrence.
    pub fn new(criteria: Vec<Criterion>) -> Result<Self> {
        let mut seen = HashSet::new();
        let criteria: Vec<_> = criteria
            .into_iter()
            .filter(|c| seen.insert(c.id.to_ascii_uppercase()))
            .collect();

        if criteria.is_empty() {
            return Err(ScreenError::Config(
                "criteria document contains no inclusion or exclusion criteria".to_string(),
            ));
        }
        Ok(Self {
            criteria,
            notes: Vec::new(),
        })
    }

    /// Attach free-text notes rendered after the criteria.
    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Parse a criteria document. Unusable lines are logged and skipped.
    pub fn parse(text: &str) -> Result<Self> {
        let parsed = parse_criteria(text);
        for issue in &parsed.issues {
            tracing::warn!("Skipping criterion: {}", issue);
        }
        Ok(Self::new(parsed.criteria)?.with_notes(parsed.notes))
    }

    /// Read and parse a criteria file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| ScreenError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&text)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    /// Find a criterion by id, ignoring case.
    pub fn get(&self, id: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|c| c.id.eq_ignore_ascii_case(id))
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn with_polarity(&self, polarity: Polarity) -> impl Iterator<Item = &Criterion> {
        self.criteria.iter().filter(move |c| c.polarity == polarity)
    }

    /// Render the criteria as a prompt fragment.
    pub fn render(&self) -> String {
        let mut sections = Vec::new();
        for polarity in [Polarity::Inclusion, Polarity::Exclusion] {
            let lines: Vec<_> = self
                .with_polarity(polarity)
                .map(|c| format!("- {}: {}", c.id, c.description.replace('\n', "\n  ")))
                .collect();
            if !lines.is_empty() {
                sections.push(format!("{} criteria:\n{}", polarity.label(), lines.join("\n")));
            }
        }
        if !self.notes.is_empty() {
            sections.push(format!("Notes:\n{}", self.notes.join("\n")));
        }
        sections.join("\n\n")
    }
}

impl fmt::Display for CriteriaSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Result of a line-by-line parse.
#[derive(Debug, Default)]
struct ParsedCriteria {
    criteria: Vec<Criterion>,
    notes: Vec<String>,
    issues: Vec<ScreenError>,
}

/// Line-by-line parse.
fn parse_criteria(text: &str) -> ParsedCriteria {
    let mut parsed = ParsedCriteria::default();
    let mut section: Option<Polarity> = None;
    // Indent of the criterion that indented lines continue, if any.
    let mut open_criterion: Option<usize> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(indent) = open_criterion {
            if indent_of(line) > indent {
                if let Some(last) = parsed.criteria.last_mut() {
                    last.description.push('\n');
                    last.description.push_str(trimmed);
                }
                continue;
            }
        }
        open_criterion = None;

        let is_heading = trimmed.starts_with('#')
            || (trimmed.ends_with(':') && criterion_line(trimmed).is_none());
        if is_heading {
            section = Polarity::from_heading(trimmed).or(if trimmed.starts_with('#') {
                None
            } else {
                section
            });
            continue;
        }

        let Some((id, description)) = criterion_line(line) else {
            parsed.notes.push(trimmed.to_string());
            continue;
        };

        let Some(polarity) = section.or_else(|| Polarity::from_id(&id)) else {
            parsed.issues.push(ScreenError::Parse {
                line: line_no,
                message: format!("criterion '{}' is outside an inclusion/exclusion section", id),
            });
            continue;
        };

        if parsed.criteria.iter().any(|c| c.id.eq_ignore_ascii_case(&id)) {
            parsed.issues.push(ScreenError::Parse {
                line: line_no,
                message: format!("duplicate criterion id '{}', keeping first", id),
            });
            continue;
        }

        parsed.criteria.push(Criterion {
            id,
            description,
            polarity,
        });
        open_criterion = Some(indent_of(line));
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Screening criteria\n\
                       \n\
                       ## Inclusion Criteria\n\
                       - CI1: Uses a large language model\n\
                       - **CI2** - Peer-reviewed publication\n\
                       \n\
                       ## Exclusion Criteria\n\
                       1. CX1: Not written in English\n\
                       2. [CX2] Secondary study or survey\n";

    #[test]
    fn test_parse_sections() {
        let set = CriteriaSet::parse(DOC).unwrap();

        assert_eq!(set.len(), 4);
        let ids: Vec<_> = set.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CI1", "CI2", "CX1", "CX2"]);
        assert_eq!(set.get("ci2").unwrap().description, "Peer-reviewed publication");
        assert_eq!(set.get("CX2").unwrap().polarity, Polarity::Exclusion);
        assert_eq!(set.with_polarity(Polarity::Inclusion).count(), 2);
    }

    #[test]
    fn test_render_prompt_fragment() {
        let set = CriteriaSet::parse(DOC).unwrap();
        let rendered = set.render();

        assert_eq!(
            rendered,
            "Inclusion criteria:\n\
             - CI1: Uses a large language model\n\
             - CI2: Peer-reviewed publication\n\
             \n\
             Exclusion criteria:\n\
             - CX1: Not written in English\n\
             - CX2: Secondary study or survey"
        );
    }

    #[test]
    fn test_polarity_from_id_without_sections() {
        let set = CriteriaSet::parse("CI1: About screening\nCX1: Editorials\nQ1: Unclear").unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("CI1").unwrap().polarity, Polarity::Inclusion);
        assert_eq!(set.get("CX1").unwrap().polarity, Polarity::Exclusion);
    }

    #[test]
    fn test_plain_heading_with_colon() {
        let set = CriteriaSet::parse("Exclusion criteria:\n- R1: Retracted papers").unwrap();
        assert_eq!(set.get("R1").unwrap().polarity, Polarity::Exclusion);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let parsed = parse_criteria("- CI1: first\n- ci1: second");
        assert_eq!(parsed.criteria.len(), 1);
        assert_eq!(parsed.criteria[0].description, "first");
        assert_eq!(parsed.issues.len(), 1);
    }

    #[test]
    fn test_sub_bullets_and_notes_are_rendered() {
        let doc = "## Inclusion Criteria\n\
                   - CI1: Studies that use LLMs\n\
                   \x20 - GPT4 and other decoder models count\n\
                   \x20 - Embedding-only work does not\n\
                   ## Exclusion Criteria\n\
                   - CX1: Not in English\n\
                   \n\
                   Notes:\n\
                   When in doubt, prefer uncertain.\n";
        let set = CriteriaSet::parse(doc).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(
            set.get("CI1").unwrap().description,
            "Studies that use LLMs\n- GPT4 and other decoder models count\n- Embedding-only work does not"
        );
        assert_eq!(set.notes(), ["When in doubt, prefer uncertain."]);
        assert_eq!(
            set.render(),
            "Inclusion criteria:\n\
             - CI1: Studies that use LLMs\n\
             \x20 - GPT4 and other decoder models count\n\
             \x20 - Embedding-only work does not\n\
             \n\
             Exclusion criteria:\n\
             - CX1: Not in English\n\
             \n\
             Notes:\n\
             When in doubt, prefer uncertain."
        );
    }

    #[test]
    fn test_prose_is_not_a_criterion() {
        let set = CriteriaSet::parse("## Inclusion Criteria\nGPT4 based tools are in scope.\n- CI1: Uses LLMs")
            .unwrap();

        let ids: Vec<_> = set.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["CI1"]);
        assert!(set.get("GPT4").is_none());
        assert_eq!(set.notes(), ["GPT4 based tools are in scope."]);
    }

    #[test]
    fn test_no_criteria_is_config_error() {
        let err = CriteriaSet::parse("# Criteria\n\nTo be decided.\n").unwrap_err();
        assert!(matches!(err, ScreenError::Config(_)));

        let err = CriteriaSet::new(vec![]).unwrap_err();
        assert!(matches!(err, ScreenError::Config(_)));
    }
}
