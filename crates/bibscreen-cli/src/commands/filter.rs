//! Filter command - write accepted entries to a new bibliography.

use std::fs;
use std::path::PathBuf;

use bibscreen::{filter_report, load_report};
use colored::Colorize;

pub fn run(
    input: PathBuf,
    results: PathBuf,
    output: PathBuf,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("File not found: {}", input.display()).into());
    }
    if !results.exists() {
        return Err(format!(
            "Report not found: {}\nRun 'bibscreen screen -i {}' first.",
            results.display(),
            input.display()
        )
        .into());
    }

    let bibliography_text = fs::read_to_string(&input)?;
    let report = load_report(&results)?;
    let outcome = filter_report(&report, &bibliography_text);

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&output, &outcome.text)?;

    println!(
        "{} {} of {} report rows",
        "Kept".green().bold(),
        outcome.kept.len().to_string().white().bold(),
        report.rows.len()
    );

    if verbose {
        for citekey in &outcome.kept {
            println!("  {}", citekey);
        }
    }

    if !outcome.join_errors.is_empty() {
        println!(
            "{} {} report rows did not match the bibliography",
            "Warning:".yellow().bold(),
            outcome.join_errors.len()
        );
        for err in &outcome.join_errors {
            println!("  {}", err.to_string().yellow());
        }
    }

    let skipped = report.issues.len() + outcome.issues.len();
    if skipped > 0 {
        println!(
            "{} {} malformed rows or entries were skipped (see log)",
            "Warning:".yellow().bold(),
            skipped
        );
    }

    println!(
        "{} {}",
        "Saved to".green().bold(),
        output.display().to_string().white()
    );

    Ok(())
}
