//! Extraction, decoding and filtering benchmarks.
//!
//! Measures the in-memory stages of a screening run; the backend call is
//! excluded.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use bibscreen::{
    extract_records, filter_text, parse_response, CriteriaSet, DecisionStatus, ReportRow,
};

/// Generate a synthetic bibliography with the given number of entries.
fn generate_bibliography(entries: usize) -> String {
    let mut data = String::from("@string{jrev = \"Journal of Reviews\"}\n\n");

    for i in 0..entries {
        match i % 3 {
            0 => data.push_str(&format!(
                "@article{{paper{i:05},\n  title = {{Screening {{LLM}} study number {i}}},\n  author = {{Doe, Jane and Roe, Richard}},\n  journal = jrev,\n  year = {year},\n  abstract = {{We evaluate a language model on {i} abstracts and report recall.}}\n}}\n\n",
                year = 2000 + i % 25
            )),
            1 => data.push_str(&format!(
                "@inproceedings(paper{i:05},\n  title = \"Workshop paper \" # {{{i}}},\n  booktitle = {{Proc. of Reviews}},\n  year = 2021\n)\n\n"
            )),
            2 => data.push_str(&format!(
                "@misc{{paper{i:05}, title = {{Preprint {i}}}, note = {{A {{nested}} note}}}}\n\n"
            )),
            _ => unreachable!(),
        }
    }

    data
}

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract_records");

    for entries in [100, 1_000, 10_000].iter() {
        let data = generate_bibliography(*entries);

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("entries", entries), &data, |b, data| {
            b.iter(|| black_box(extract_records(data)))
        });
    }

    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_bibliography");

    for entries in [100, 1_000, 10_000].iter() {
        let data = generate_bibliography(*entries);
        let rows: Vec<ReportRow> = (0..*entries)
            .map(|i| {
                let status = if i % 2 == 0 {
                    DecisionStatus::Accepted
                } else {
                    DecisionStatus::Rejected
                };
                ReportRow::new(format!("paper{:05}", i), status)
            })
            .collect();

        group.throughput(Throughput::Elements(*entries as u64));
        group.bench_with_input(BenchmarkId::new("entries", entries), &data, |b, data| {
            b.iter(|| black_box(filter_text(&rows, data)))
        });
    }

    group.finish();
}

fn bench_parse_response(c: &mut Criterion) {
    let criteria = CriteriaSet::parse(
        "## Inclusion\n- CI1: Uses LLMs\n- CI2: Empirical\n## Exclusion\n- CX1: Not English\n- CX2: Editorial",
    )
    .unwrap();

    let responses = [
        ("line", "Status: accepted\nCriteria: CI1, CI2\nReasoning: Evaluates GPT-4 on abstracts."),
        (
            "markdown",
            "Here is my assessment:\n\n- **Status:** Rejected\n- **Criteria:** cx2\n- **Reasoning:** An editorial.\nNo data is reported.",
        ),
        (
            "json",
            "```json\n{\"status\": \"uncertain\", \"criteria\": [], \"reasoning\": \"No abstract.\"}\n```",
        ),
    ];

    let mut group = c.benchmark_group("parse_response");
    for (name, text) in responses {
        group.bench_function(name, |b| b.iter(|| black_box(parse_response(text, &criteria))));
    }
    group.finish();
}

criterion_group!(benches, bench_extract, bench_filter, bench_parse_response);
criterion_main!(benches);
