//! Status command - show decision counts for an existing report.

use std::path::PathBuf;

use bibscreen::report::criteria_breakdown;
use bibscreen::{load_report, DecisionStatus, StatusCounts};
use colored::Colorize;

pub fn run(
    results: PathBuf,
    json_output: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !results.exists() {
        return Err(format!(
            "Report not found: {}\nRun 'bibscreen screen -o {}' first.",
            results.display(),
            results.display()
        )
        .into());
    }

    let report = load_report(&results)?;
    let counts = StatusCounts::from_statuses(report.rows.iter().map(|r| r.status));
    let criteria = criteria_breakdown(report.rows.iter().map(|r| r.criteria.as_slice()));

    if json_output {
        let status = serde_json::json!({
            "file": results.display().to_string(),
            "total": counts.total(),
            "counts": counts,
            "percentages": {
                "accepted": counts.percent(DecisionStatus::Accepted),
                "rejected": counts.percent(DecisionStatus::Rejected),
                "uncertain": counts.percent(DecisionStatus::Uncertain),
            },
            "criteria": criteria,
            "skipped_rows": report.issues.len(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Screening status for".cyan().bold(),
        results.display().to_string().white()
    );
    println!();

    // Acceptance bar
    let total = counts.total();
    let bar_width = 30;
    let filled = if total == 0 {
        0
    } else {
        (counts.accepted as f64 / total as f64 * bar_width as f64).round() as usize
    };
    let bar: String = "█".repeat(filled) + &"░".repeat(bar_width - filled);
    println!(
        "Accepted: {} {}/{} ({:.1}%)",
        bar.green(),
        counts.accepted.to_string().white().bold(),
        total,
        counts.percent(DecisionStatus::Accepted)
    );
    println!();

    println!("{}", "Decisions:".yellow().bold());
    println!(
        "  Accepted:  {} ({:.1}%)",
        counts.accepted.to_string().green(),
        counts.percent(DecisionStatus::Accepted)
    );
    println!(
        "  Rejected:  {} ({:.1}%)",
        counts.rejected.to_string().red(),
        counts.percent(DecisionStatus::Rejected)
    );
    println!(
        "  Uncertain: {} ({:.1}%)",
        counts.uncertain.to_string().yellow(),
        counts.percent(DecisionStatus::Uncertain)
    );
    println!();

    if !criteria.is_empty() {
        println!("{}", "Criteria breakdown:".yellow().bold());
        for (id, count) in &criteria {
            println!("  {:8} {}", id, count);
        }
        println!();
    }

    if verbose {
        let uncertain: Vec<_> = report
            .rows
            .iter()
            .filter(|r| r.status == DecisionStatus::Uncertain)
            .collect();
        if !uncertain.is_empty() {
            println!("{}", "Needs manual review:".yellow().bold());
            for row in uncertain {
                println!("  {:20} {}", row.citekey.white(), row.reasoning.dimmed());
            }
            println!();
        }
    }

    if !report.issues.is_empty() {
        println!(
            "{} {} rows could not be read",
            "Warning:".yellow().bold(),
            report.issues.len()
        );
    }

    Ok(())
}
