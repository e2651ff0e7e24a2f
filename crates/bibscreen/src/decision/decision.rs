//! Screening decisions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bibliography::PaperRecord;

/// Outcome of screening one paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionStatus {
    /// Meets the criteria; goes into the filtered bibliography.
    Accepted,
    /// Excluded by the criteria.
    Rejected,
    /// Not enough information, or screening failed.
    Uncertain,
}

impl DecisionStatus {
    pub const ALL: [DecisionStatus; 3] = [
        DecisionStatus::Accepted,
        DecisionStatus::Rejected,
        DecisionStatus::Uncertain,
    ];

    /// Value written to reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Accepted => "accepted",
            DecisionStatus::Rejected => "rejected",
            DecisionStatus::Uncertain => "uncertain",
        }
    }

    /// Get a human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            DecisionStatus::Accepted => "Accepted",
            DecisionStatus::Rejected => "Rejected",
            DecisionStatus::Uncertain => "Uncertain",
        }
    }
}

impl fmt::Display for DecisionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecisionStatus {
    type Err = String;

    /// Lenient: accepts common synonyms and the legacy `not-sure`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "accepted" | "accept" | "include" | "included" => Ok(DecisionStatus::Accepted),
            "rejected" | "reject" | "exclude" | "excluded" => Ok(DecisionStatus::Rejected),
            "uncertain" | "not-sure" | "unsure" | "unclear" | "maybe" => {
                Ok(DecisionStatus::Uncertain)
            }
            _ => Err(format!("unrecognized status '{}'", s.trim())),
        }
    }
}

/// A decoded model verdict, before it is bound to a paper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub status: DecisionStatus,
    /// Canonical criterion ids, in the order the model cited them.
    pub criteria: Vec<String>,
    /// Non-empty justification.
    pub reasoning: String,
}

/// The screening decision for one paper. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    citekey: String,
    title: String,
    status: DecisionStatus,
    criteria: Vec<String>,
    reasoning: String,
}

impl Decision {
    /// Bind a verdict to the paper it was produced for.
    pub fn from_verdict(paper: &PaperRecord, verdict: Verdict) -> Self {
        Self {
            citekey: paper.citekey.clone(),
            title: paper.display_title(),
            status: verdict.status,
            criteria: verdict.criteria,
            reasoning: verdict.reasoning,
        }
    }

    /// The decision recorded when screening could not produce a verdict.
    pub fn failed(paper: &PaperRecord, reason: impl fmt::Display) -> Self {
        let mut reasoning = reason.to_string();
        if reasoning.trim().is_empty() {
            reasoning = "Screening failed for an unknown reason".to_string();
        }
        Self {
            citekey: paper.citekey.clone(),
            title: paper.display_title(),
            status: DecisionStatus::Uncertain,
            criteria: Vec::new(),
            reasoning,
        }
    }

    pub fn citekey(&self) -> &str {
        &self.citekey
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn status(&self) -> DecisionStatus {
        self.status
    }

    pub fn criteria(&self) -> &[String] {
        &self.criteria
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn is_accepted(&self) -> bool {
        self.status == DecisionStatus::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_str() {
        assert_eq!("Accepted".parse::<DecisionStatus>(), Ok(DecisionStatus::Accepted));
        assert_eq!(" rejected ".parse::<DecisionStatus>(), Ok(DecisionStatus::Rejected));
        assert_eq!("not-sure".parse::<DecisionStatus>(), Ok(DecisionStatus::Uncertain));
        assert_eq!("Not Sure".parse::<DecisionStatus>(), Ok(DecisionStatus::Uncertain));
        assert_eq!("uncertain".parse::<DecisionStatus>(), Ok(DecisionStatus::Uncertain));
        assert!("pending".parse::<DecisionStatus>().is_err());
    }

    #[test]
    fn test_status_display_roundtrip() {
        for status in DecisionStatus::ALL {
            assert_eq!(status.to_string().parse::<DecisionStatus>(), Ok(status));
        }
    }

    #[test]
    fn test_failed_decision() {
        let paper = PaperRecord::new("a2023", "{A} Title");
        let decision = Decision::failed(&paper, "Screening failed after 3 attempt(s): timeout");

        assert_eq!(decision.citekey(), "a2023");
        assert_eq!(decision.title(), "A Title");
        assert_eq!(decision.status(), DecisionStatus::Uncertain);
        assert!(decision.criteria().is_empty());
        assert!(decision.reasoning().contains("timeout"));
    }

    #[test]
    fn test_failed_decision_never_has_empty_reasoning() {
        let paper = PaperRecord::new("a", "T");
        assert!(!Decision::failed(&paper, "  ").reasoning().is_empty());
    }

    #[test]
    fn test_decision_serializes_lowercase_status() {
        let paper = PaperRecord::new("a", "T");
        let decision = Decision::from_verdict(
            &paper,
            Verdict {
                status: DecisionStatus::Rejected,
                criteria: vec!["CX1".to_string()],
                reasoning: "Out of scope".to_string(),
            },
        );
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["criteria"][0], "CX1");
    }
}
