//! Integration tests for report-driven bibliography filtering.

use bibscreen::{
    filter_text, load_report, read_report, save_report, Bibliography, DecisionStatus,
    FilterOutcome, ReportFormat, ReportRow, ScreenError,
};

const BIBLIOGRAPHY: &str = r#"@preamble{"\newcommand{\noop}[1]{}"}

@article{a2023,
  title     = {First Paper},
  year      = 2023,
}

% a stray comment line between entries
@inproceedings{b2023,
  title = {Second Paper},
  booktitle = "Proc. of X"
}

@Article{c2023,
    Title = {Third {P}aper}}
"#;

fn row(citekey: &str, status: DecisionStatus) -> ReportRow {
    ReportRow::new(citekey, status)
}

fn abc_report() -> Vec<ReportRow> {
    vec![
        row("a2023", DecisionStatus::Accepted),
        row("b2023", DecisionStatus::Rejected),
        row("c2023", DecisionStatus::Accepted),
    ]
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_accepted_entries_only_in_order() {
    let outcome = filter_text(&abc_report(), BIBLIOGRAPHY);

    assert_eq!(outcome.kept, vec!["a2023", "c2023"]);
    assert!(outcome.join_errors.is_empty());
    assert!(outcome.text.contains("@article{a2023,\n  title     = {First Paper},\n  year      = 2023,\n}"));
    assert!(outcome.text.contains("@Article{c2023,\n    Title = {Third {P}aper}}"));
    assert!(!outcome.text.contains("b2023"));
    assert!(outcome.text.find("a2023").unwrap() < outcome.text.find("c2023").unwrap());
}

#[test]
fn test_directives_are_kept_first() {
    let outcome = filter_text(&abc_report(), BIBLIOGRAPHY);
    assert!(outcome.text.starts_with("@preamble{\"\\newcommand{\\noop}[1]{}\"}\n\n@article{a2023"));
    assert!(outcome.text.ends_with("}}\n"));
}

#[test]
fn test_missing_citekey_is_join_error_not_fatal() {
    let mut rows = abc_report();
    rows.insert(1, row("zzz999", DecisionStatus::Accepted));

    let outcome = filter_text(&rows, BIBLIOGRAPHY);

    assert_eq!(outcome.kept, vec!["a2023", "c2023"]);
    assert_eq!(outcome.join_errors.len(), 1);
    assert_eq!(
        outcome.join_errors[0].to_string(),
        "Report citekey 'zzz999' not found in bibliography"
    );
    assert_eq!(outcome.text, filter_text(&abc_report(), BIBLIOGRAPHY).text);
}

#[test]
fn test_entries_missing_from_report_are_dropped() {
    let outcome = filter_text(&[row("b2023", DecisionStatus::Accepted)], BIBLIOGRAPHY);
    assert_eq!(outcome.kept, vec!["b2023"]);
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_all_accepted_round_trips() {
    let bibliography = Bibliography::parse(BIBLIOGRAPHY);
    let rows: Vec<ReportRow> = bibliography
        .entries
        .iter()
        .map(|e| row(&e.citekey, DecisionStatus::Accepted))
        .collect();

    let outcome = filter_text(&rows, BIBLIOGRAPHY);
    let filtered = Bibliography::parse(&outcome.text);

    let sources = |b: &Bibliography| {
        b.entries
            .iter()
            .map(|e| (e.citekey.clone(), e.source.clone(), e.fields.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(sources(&filtered), sources(&bibliography));
    assert_eq!(filtered.directives, bibliography.directives);
}

#[test]
fn test_filter_is_idempotent() {
    let first: FilterOutcome = filter_text(&abc_report(), BIBLIOGRAPHY);
    let second = filter_text(&abc_report(), BIBLIOGRAPHY);
    assert_eq!(first.text, second.text);

    // Filtering the filtered output again changes nothing.
    let third = filter_text(&abc_report(), &first.text);
    assert_eq!(third.text, first.text);
    assert_eq!(third.join_errors.len(), 1);
    assert!(matches!(
        &third.join_errors[0],
        ScreenError::Join { citekey } if citekey == "b2023"
    ));
}

// =============================================================================
// Persisted Reports
// =============================================================================

#[test]
fn test_filter_from_saved_report() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.csv");
    save_report(&path, &abc_report(), ReportFormat::Csv).unwrap();

    let read = load_report(&path).unwrap();
    let outcome = filter_text(&read.rows, BIBLIOGRAPHY);
    assert_eq!(outcome.kept, vec!["a2023", "c2023"]);
}

#[test]
fn test_filter_from_legacy_report() {
    let legacy = "citekey,title,status,criteria,reasoning\n\
                  a2023,First Paper,accepted,\"CI1, CI2\",Fits\n\
                  b2023,Second Paper,not-sure,not-applicable,Unclear\n\
                  c2023,Third Paper,rejected,CX1,Out of scope\n";
    let read = read_report(legacy.as_bytes(), ReportFormat::Csv).unwrap();
    let outcome = filter_text(&read.rows, BIBLIOGRAPHY);

    assert_eq!(outcome.kept, vec!["a2023"]);
}
