//! Bibscreen CLI - LLM-assisted screening of bibliography entries.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "info,bibscreen=debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Screen {
            input,
            criteria,
            output,
            llm,
            model,
            concurrency,
            max_attempts,
            summary,
        } => commands::screen::run(commands::screen::ScreenArgs {
            input,
            criteria,
            output,
            llm,
            model,
            concurrency,
            max_attempts,
            summary,
        }),

        Commands::Filter {
            input,
            results,
            output,
        } => commands::filter::run(input, results, output, cli.verbose),

        Commands::Status { results, json } => commands::status::run(results, json, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
