//! Fuzz target for the model response decoder.
//!
//! This fuzzer tests that decoding:
//! 1. Never panics on arbitrary model output
//! 2. Never accepts or rejects without citing a known criterion
//! 3. Never yields empty reasoning

#![no_main]

use libfuzzer_sys::fuzz_target;
use bibscreen::{parse_response, CriteriaSet, DecisionStatus};

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let criteria = match CriteriaSet::parse("- CI1: Inclusion\n- CX1: Exclusion") {
        Ok(criteria) => criteria,
        Err(_) => return,
    };

    if let Ok(verdict) = parse_response(text, &criteria) {
        assert!(!verdict.reasoning.trim().is_empty());
        if verdict.status != DecisionStatus::Uncertain {
            assert!(!verdict.criteria.is_empty());
        }
        for id in &verdict.criteria {
            assert!(criteria.get(id).is_some());
        }
    }
});
