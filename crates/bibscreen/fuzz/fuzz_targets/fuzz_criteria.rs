//! Fuzz target for the criteria loader.
//!
//! Any text either yields a non-empty criteria set or a configuration error.

#![no_main]

use libfuzzer_sys::fuzz_target;
use bibscreen::CriteriaSet;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10_000 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(criteria) = CriteriaSet::parse(text) {
            assert!(!criteria.is_empty());
            let _ = criteria.render();
        }
    }
});
