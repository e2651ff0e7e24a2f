//! Prompt templates for screening requests.

use crate::bibliography::{clean_value, PaperRecord};
use crate::criteria::CriteriaSet;

use super::provider::Prompt;

/// Fields shown to the model besides the title, with their labels.
const PAPER_FIELDS: &[(&str, &str)] = &[
    ("author", "Authors"),
    ("year", "Year"),
    ("journal", "Venue"),
    ("booktitle", "Venue"),
    ("keywords", "Keywords"),
];

/// System prompt for all screening interactions.
pub fn system_prompt() -> &'static str {
    r#"You are a systematic review assistant screening academic papers against explicit inclusion and exclusion criteria.

Guidelines:
- Judge only from the information given; do not invent details about the paper
- Cite the identifier of every criterion that drove your decision
- A paper matching any exclusion criterion is rejected
- When the title and abstract are not enough to decide, answer uncertain
- Use the exact response format requested, with no extra commentary"#
}

/// Build the screening prompt for one paper.
pub fn screening_prompt(paper: &PaperRecord, criteria: &CriteriaSet) -> Prompt {
    let mut details = vec![format!("Title: {}", paper.display_title())];

    let mut venue_seen = false;
    for (field, label) in PAPER_FIELDS {
        if *label == "Venue" && venue_seen {
            continue;
        }
        if let Some(value) = paper.field(field) {
            venue_seen |= *label == "Venue";
            details.push(format!("{}: {}", label, clean_value(value)));
        }
    }

    let abstract_text = paper
        .field("abstract")
        .map(clean_value)
        .unwrap_or_else(|| "No abstract available".to_string());
    details.push(format!("Abstract: {}", abstract_text));

    let user = format!(
        r#"Evaluate the paper based on these criteria:

{}

## Paper
{}

Respond STRICTLY in this format:
Status: [accepted/rejected/uncertain]
Criteria: [comma-separated criterion ids, or not-applicable]
Reasoning: [Brief explanation linking to specific criteria]"#,
        criteria.render(),
        details.join("\n")
    );

    Prompt::new(system_prompt(), user)
}
