//! Property-based tests for extraction, decoding and filtering.
//!
//! Property-based tests verify:
//! 1. **No panics**: the scanner, criteria loader and response decoder accept any input
//! 2. **Determinism**: same input always produces same output
//! 3. **Invariants**: one decision per entry, filter round-trips and idempotence
//!
//! # Running Property Tests
//!
//! ```bash
//! cargo test -p bibscreen --test property_tests
//!
//! # Run with more cases (slower but more thorough)
//! PROPTEST_CASES=10000 cargo test -p bibscreen --test property_tests
//! ```

use proptest::prelude::*;

use bibscreen::{
    extract_records, filter_text, parse_response, Bibliography, CriteriaSet, DecisionEngine,
    DecisionStatus, MockBackend, ReportRow, RetryPolicy, Screener,
};

// =============================================================================
// Test Strategies
// =============================================================================

/// Generate arbitrary text with a bias toward BibTeX punctuation.
fn bibtex_noise() -> impl Strategy<Value = String> {
    "[@{}()\"#=,a-z0-9 \n%]{0,300}"
}

/// Generate a citekey.
fn citekey() -> impl Strategy<Value = String> {
    "[a-z]{1,8}[0-9]{2,4}"
}

/// Generate a field value safe inside braces.
fn field_value() -> impl Strategy<Value = String> {
    "[A-Za-z][A-Za-z0-9 .,:;'-]{0,39}"
}

/// Generate a well-formed bibliography with unique citekeys.
fn bibliography() -> impl Strategy<Value = (Vec<String>, String)> {
    prop::collection::btree_set(citekey(), 1..12).prop_flat_map(|keys| {
        let keys: Vec<String> = keys.into_iter().collect();
        let n = keys.len();
        (
            Just(keys),
            prop::collection::vec((field_value(), field_value(), any::<bool>()), n),
        )
            .prop_map(|(keys, fields)| {
                let text = keys
                    .iter()
                    .zip(fields)
                    .map(|(key, (title, note, quoted))| {
                        if quoted {
                            format!("@article{{{},\n  title = \"{}\",\n  note = {{{}}}\n}}", key, title, note)
                        } else {
                            format!("@misc({}, title = {{{}}}, year = 2023)", key, title)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("\n\n");
                (keys, text)
            })
    })
}

fn status() -> impl Strategy<Value = DecisionStatus> {
    prop_oneof![
        Just(DecisionStatus::Accepted),
        Just(DecisionStatus::Rejected),
        Just(DecisionStatus::Uncertain),
    ]
}

fn criteria() -> CriteriaSet {
    CriteriaSet::parse("## Inclusion\n- CI1: Uses LLMs\n## Exclusion\n- CX1: Not English").unwrap()
}

// =============================================================================
// No-Panic Properties
// =============================================================================

proptest! {
    #[test]
    fn extractor_never_panics(text in bibtex_noise()) {
        let _ = extract_records(&text);
    }

    #[test]
    fn criteria_loader_never_panics(text in "[-#*:A-Za-z0-9 \n.]{0,200}") {
        let _ = CriteriaSet::parse(&text);
    }

    #[test]
    fn response_decoder_never_panics(text in "[A-Za-z0-9:,\\-*#{}\\[\\]\" \n]{0,200}") {
        let _ = parse_response(&text, &criteria());
    }

    #[test]
    fn response_decoder_is_deterministic(text in "[A-Za-z0-9:, \n]{0,120}") {
        let set = criteria();
        let first = parse_response(&text, &set).map_err(|e| e.to_string());
        let second = parse_response(&text, &set).map_err(|e| e.to_string());
        prop_assert_eq!(first, second);
    }
}

// =============================================================================
// Extraction and Screening Invariants
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn well_formed_entries_are_all_extracted((keys, text) in bibliography()) {
        let extraction = extract_records(&text);
        prop_assert!(extraction.issues.is_empty());
        let extracted: Vec<String> = extraction.records.into_iter().map(|r| r.citekey).collect();
        prop_assert_eq!(extracted, keys);
    }

    #[test]
    fn screening_yields_one_decision_per_entry((keys, text) in bibliography()) {
        let screener = Screener::new(DecisionEngine::new(MockBackend::new(), RetryPolicy::none()));
        let run = screener.screen_sources(&text, "- CI1: Uses LLMs").unwrap();

        prop_assert_eq!(run.report.len(), keys.len());
        for (decision, key) in run.report.decisions().iter().zip(&keys) {
            prop_assert_eq!(decision.citekey(), key.as_str());
            prop_assert!(!decision.reasoning().is_empty());
        }
    }

    #[test]
    fn all_accepted_filter_round_trips((keys, text) in bibliography()) {
        let rows: Vec<ReportRow> = keys
            .iter()
            .map(|k| ReportRow::new(k.as_str(), DecisionStatus::Accepted))
            .collect();
        let outcome = filter_text(&rows, &text);

        let original = Bibliography::parse(&text);
        let filtered = Bibliography::parse(&outcome.text);
        let sources = |b: &Bibliography| b.entries.iter().map(|e| e.source.clone()).collect::<Vec<_>>();
        prop_assert_eq!(sources(&filtered), sources(&original));
    }

    #[test]
    fn filter_is_idempotent(
        (keys, text) in bibliography(),
        statuses in prop::collection::vec(status(), 12),
    ) {
        let rows: Vec<ReportRow> = keys
            .iter()
            .zip(statuses)
            .map(|(k, s)| ReportRow::new(k.as_str(), s))
            .collect();

        let first = filter_text(&rows, &text);
        let second = filter_text(&rows, &text);
        prop_assert_eq!(&first.text, &second.text);

        let accepted = rows.iter().filter(|r| r.status == DecisionStatus::Accepted).count();
        prop_assert_eq!(first.kept.len(), accepted);
    }
}
