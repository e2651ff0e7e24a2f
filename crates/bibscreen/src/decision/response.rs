//! Decoding model responses into verdicts.
//!
//! The expected response is three labelled lines:
//!
//! ```text
//! Status: accepted
//! Criteria: CI1, CI3
//! Reasoning: Uses an LLM for title/abstract screening.
//! ```
//!
//! Minor deviations are tolerated (markdown bold, bullets, label case,
//! `not-sure` for uncertain, multi-line reasoning, a JSON object instead of
//! lines). Missing or unrecognizable required fields are a
//! [`ScreenError::Validation`]; nothing is ever defaulted.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::criteria::CriteriaSet;
use crate::error::{Result, ScreenError};

use super::decision::{DecisionStatus, Verdict};

/// Leading status word, e.g. `accepted` in `Accepted (meets CI1).`
static STATUS_WORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[\[(`'\x22]*(accepted|accept|included|include|rejected|reject|excluded|exclude|uncertain|not[\s_-]sure|unsure|unclear)\b").unwrap()
});

/// Words shaped like criterion identifiers. Only those naming a criterion in
/// the set are kept; the rest are remarks (`CI1 (uses GPT4)`).
static CRITERION_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z]{1,4}\d{1,3}\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    Status,
    Criteria,
    Reasoning,
}

impl Label {
    fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "status" | "decision" | "verdict" => Some(Label::Status),
            "criteria" | "criterion" | "matched criteria" => Some(Label::Criteria),
            "reasoning" | "reason" | "rationale" | "justification" => Some(Label::Reasoning),
            _ => None,
        }
    }
}

/// Raw field values before validation.
#[derive(Debug, Default)]
struct Fields {
    status: Option<String>,
    criteria: Option<String>,
    reasoning: Option<String>,
}

/// JSON shape some models fall back to.
#[derive(Debug, Deserialize)]
struct JsonVerdict {
    status: String,
    #[serde(default)]
    criteria: CriteriaValue,
    #[serde(default, alias = "rationale", alias = "reason")]
    reasoning: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CriteriaValue {
    One(String),
    Many(Vec<String>),
}

impl Default for CriteriaValue {
    fn default() -> Self {
        CriteriaValue::Many(Vec::new())
    }
}

/// Decode a model response against the criteria it was asked about.
pub fn parse_response(text: &str, criteria: &CriteriaSet) -> Result<Verdict> {
    let fields = match labelled_fields(text) {
        Some(fields) => fields,
        None => json_fields(text).ok_or_else(|| {
            ScreenError::Validation(format!("no status field in response: {}", preview(text)))
        })?,
    };
    validate(fields, criteria)
}

/// Split a line into a known label and its value.
fn split_label(line: &str) -> Option<(Label, String)> {
    let plain = line.replace("**", "").replace("__", "");
    let plain = plain.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '*' | '#' | '>'));
    let (name, value) = plain.split_once(':')?;
    let label = Label::parse(name)?;
    Some((label, value.trim().to_string()))
}

/// Line-format fields. `None` if there is no status line at all.
fn labelled_fields(text: &str) -> Option<Fields> {
    let mut fields = Fields::default();
    let mut current: Option<Label> = None;

    for line in text.lines() {
        match split_label(line) {
            Some((label, value)) => {
                let slot = match label {
                    Label::Status => &mut fields.status,
                    Label::Criteria => &mut fields.criteria,
                    Label::Reasoning => &mut fields.reasoning,
                };
                // First occurrence wins; later repeats are ignored.
                if slot.is_none() {
                    *slot = Some(value);
                    current = Some(label);
                } else {
                    current = None;
                }
            }
            None if current == Some(Label::Reasoning) => {
                if let Some(reasoning) = fields.reasoning.as_mut() {
                    reasoning.push('\n');
                    reasoning.push_str(line);
                }
            }
            None => {}
        }
    }

    fields.status.as_ref()?;
    Some(fields)
}

/// JSON-object fields, possibly inside a markdown code fence.
fn json_fields(text: &str) -> Option<Fields> {
    let json_str = if text.contains("```json") {
        text.split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .unwrap_or(text)
    } else {
        let start = text.find('{')?;
        let end = text.rfind('}')?;
        text.get(start..=end)?
    };

    let parsed: JsonVerdict = serde_json::from_str(json_str).ok()?;
    let criteria = match parsed.criteria {
        CriteriaValue::One(value) => value,
        CriteriaValue::Many(values) => values.join(", "),
    };
    Some(Fields {
        status: Some(parsed.status),
        criteria: Some(criteria),
        reasoning: Some(parsed.reasoning),
    })
}

fn validate(fields: Fields, criteria: &CriteriaSet) -> Result<Verdict> {
    let raw_status = fields.status.unwrap_or_default();
    let status = STATUS_WORD
        .captures(raw_status.trim())
        .and_then(|caps| caps[1].parse::<DecisionStatus>().ok())
        .ok_or_else(|| {
            ScreenError::Validation(format!("unrecognized status '{}'", raw_status.trim()))
        })?;

    let value = fields.criteria.as_deref().unwrap_or_default();
    let mut ids: Vec<String> = Vec::new();
    let mut unknown: Vec<&str> = Vec::new();
    for found in CRITERION_ID.find_iter(value) {
        match criteria.get(found.as_str()) {
            Some(criterion) if !ids.contains(&criterion.id) => ids.push(criterion.id.clone()),
            Some(_) => {}
            None => unknown.push(found.as_str()),
        }
    }

    if ids.is_empty() {
        let bare = value.trim().trim_matches(|c: char| !c.is_ascii_alphanumeric());
        if let [only] = unknown.as_slice() {
            if only.eq_ignore_ascii_case(bare) {
                return Err(ScreenError::Validation(format!(
                    "response cites unknown criterion '{}'",
                    only
                )));
            }
        }
        if status != DecisionStatus::Uncertain {
            return Err(ScreenError::Validation(format!(
                "{} decision cites no criterion",
                status
            )));
        }
    } else if !unknown.is_empty() {
        tracing::debug!("Ignoring non-criterion words in criteria value: {}", unknown.join(", "));
    }

    let reasoning = fields.reasoning.unwrap_or_default().trim().to_string();
    if reasoning.is_empty() {
        return Err(ScreenError::Validation("response has no reasoning".to_string()));
    }

    Ok(Verdict {
        status,
        criteria: ids,
        reasoning,
    })
}

/// First line of a response, shortened for error messages.
fn preview(text: &str) -> String {
    let first = text.trim().lines().next().unwrap_or_default();
    let mut preview: String = first.chars().take(60).collect();
    if first.chars().count() > 60 {
        preview.push_str("...");
    }
    format!("'{}'", preview)
}
