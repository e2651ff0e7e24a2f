//! Screen command - screen a bibliography and write the report.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bibscreen::{
    AnthropicBackend, DecisionStatus, LlmBackend, LlmConfig, MockBackend, OllamaBackend,
    OpenAIBackend, RetryPolicy, ScreeningConfig, Screener,
};
use colored::Colorize;

use crate::cli::LlmProviderChoice;

pub struct ScreenArgs {
    pub input: PathBuf,
    pub criteria: PathBuf,
    pub output: PathBuf,
    pub llm: LlmProviderChoice,
    pub model: Option<String>,
    pub concurrency: usize,
    pub max_attempts: usize,
    pub summary: Option<PathBuf>,
}

pub fn run(args: ScreenArgs) -> Result<(), Box<dyn std::error::Error>> {
    let bibliography_text = read_input(&args.input)?;
    let criteria_text = read_input(&args.criteria)?;

    if args.max_attempts == 0 {
        return Err("--max-attempts must be at least 1".into());
    }

    let backend = create_backend(&args.llm, args.model)?;
    let config = ScreeningConfig::default()
        .with_retry(RetryPolicy::default().with_max_attempts(args.max_attempts))
        .with_concurrency(args.concurrency);

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = interrupt.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        eprintln!("Interrupt received, finishing entries in progress...");
    })?;

    println!(
        "{} {} {} {} {}",
        "Screening".cyan().bold(),
        args.input.display().to_string().white(),
        "with".cyan(),
        backend.name().white(),
        format!("({})", backend.model()).dimmed()
    );

    let screener = Screener::from_config(backend, &config).with_interrupt(interrupt);
    let run = screener.screen_sources(&bibliography_text, &criteria_text)?;

    run.report.save(&args.output)?;
    run.summary.log();

    if let Some(path) = &args.summary {
        run.summary.save(path)?;
    }

    println!();
    println!("{}", "Decisions:".yellow().bold());
    let counts = run.summary.counts;
    for status in DecisionStatus::ALL {
        let count = format!("{}", counts.get(status));
        let count = match status {
            DecisionStatus::Accepted => count.green(),
            DecisionStatus::Rejected => count.red(),
            DecisionStatus::Uncertain => count.yellow(),
        };
        println!(
            "  {:10} {} ({:.1}%)",
            format!("{}:", status.label()),
            count,
            counts.percent(status)
        );
    }
    if run.summary.skipped_entries > 0 {
        println!(
            "  {:10} {}",
            "Skipped:",
            run.summary.skipped_entries.to_string().magenta()
        );
    }

    println!();
    println!(
        "{} {}",
        "Saved to".green().bold(),
        args.output.display().to_string().white()
    );
    if let Some(path) = &args.summary {
        println!(
            "{} {}",
            "Summary written to".green().bold(),
            path.display().to_string().white()
        );
    }

    if counts.accepted > 0 {
        println!(
            "Run {} to extract accepted entries",
            format!(
                "bibscreen filter -i {} -r {}",
                args.input.display(),
                args.output.display()
            )
            .cyan()
            .bold()
        );
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }
    Ok(fs::read_to_string(path)?)
}

/// Build the backend for the chosen provider; `model` overrides the
/// provider's environment variable.
fn create_backend(
    llm: &LlmProviderChoice,
    model: Option<String>,
) -> Result<Arc<dyn LlmBackend>, Box<dyn std::error::Error>> {
    let backend: Arc<dyn LlmBackend> = match llm {
        LlmProviderChoice::OpenAI => Arc::new(OpenAIBackend::from_env(model)?),
        LlmProviderChoice::Anthropic => Arc::new(AnthropicBackend::from_env(model)?),
        LlmProviderChoice::Ollama => Arc::new(OllamaBackend::from_env(model)?),
        LlmProviderChoice::Mock => {
            let backend = MockBackend::new();
            Arc::new(match model {
                Some(model) => backend.with_config(LlmConfig::for_model(model)),
                None => backend,
            })
        }
    };
    Ok(backend)
}
