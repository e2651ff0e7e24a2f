//! Fuzz target for the bibliography scanner.
//!
//! This fuzzer tests that extraction and filtering:
//! 1. Never panic on malformed or non-ASCII input
//! 2. Always resume after a broken entry
//! 3. Only ever emit entries that exist in the input

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use bibscreen::{filter_text, Bibliography, DecisionStatus, ReportRow};

#[derive(Arbitrary, Debug)]
struct Input<'a> {
    text: &'a str,
    accept_all: bool,
}

fuzz_target!(|input: Input<'_>| {
    // Only process reasonable-sized inputs to avoid OOM
    if input.text.len() > 100_000 {
        return;
    }

    let bibliography = Bibliography::parse(input.text);
    let status = if input.accept_all {
        DecisionStatus::Accepted
    } else {
        DecisionStatus::Rejected
    };
    let rows: Vec<ReportRow> = bibliography
        .entries
        .iter()
        .map(|e| ReportRow::new(e.citekey.as_str(), status))
        .collect();

    let outcome = filter_text(&rows, input.text);
    assert!(outcome.join_errors.is_empty());
    assert!(outcome.kept.len() <= bibliography.entries.len());

    let _ = bibliography.into_extraction();
});
