//! Specboard - turn a PDF technical specification into a GitHub backlog.
//!
//! Reads the document, asks the model for implementation cards, creates
//! the issues, and places them on the configured project board.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use specboard::core::{load_env_file, Settings};
use specboard::{
    BoardFields, GeminiProvider, GitHubIssues, GitHubProjects, PdfExtractor, Pipeline,
    PipelineError, RunOptions, RunSummary, Synthesizer,
};

/// Turn a PDF technical specification into GitHub issues and board items
#[derive(Parser)]
#[command(name = "specboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the specification PDF
    #[arg(value_name = "PDF", value_parser = existing_file)]
    pdf: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Generate and print cards without creating issues
    #[arg(long)]
    dry_run: bool,

    /// Do not send existing issues to the model
    #[arg(long)]
    ignore_existing: bool,

    /// Load configuration from this file instead of ./.env
    #[arg(long, value_name = "PATH")]
    env_file: Option<PathBuf>,
}

/// Accept only paths naming an existing regular file.
fn existing_file(value: &str) -> std::result::Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.exists() {
        return Err(format!("file not found: {}", value));
    }
    if !path.is_file() {
        return Err(format!("not a file: {}", value));
    }
    Ok(path)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    load_env_file(cli.env_file.as_deref())?;
    let settings = Settings::from_env().context("Configuration is incomplete")?;

    let mut provider = GeminiProvider::new(settings.model.api_key.clone());
    if let Some(model) = &settings.model.model {
        provider = provider.with_model(model.clone());
    }
    if let Some(url) = &settings.model.base_url {
        provider = provider.with_base_url(url.clone());
    }

    let github = &settings.github;
    let tracker =
        GitHubIssues::new(github.token.clone(), github.owner.clone(), github.repo.clone());
    let board = GitHubProjects::new(
        github.token.clone(),
        github.owner.clone(),
        github.repo.clone(),
        github.project_id.clone(),
    );

    let pipeline = Pipeline::new(
        Box::new(PdfExtractor::new()),
        Synthesizer::new(Box::new(provider)),
        Box::new(tracker),
        Box::new(board),
        settings.labels.clone(),
        BoardFields::from(github),
    )
    .with_options(RunOptions { dry_run: cli.dry_run, use_existing: !cli.ignore_existing });

    println!("Processing {}\n", cli.pdf.display());

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new()?;

    match rt.block_on(pipeline.run(&cli.pdf)) {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(PipelineError::NoCards) => {
            println!("No cards generated: nothing new to add from this document.");
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Print the cards, created issues, and totals.
fn print_summary(summary: &RunSummary) {
    println!("Cards:");
    for (index, card) in summary.cards.iter().enumerate() {
        match card.parent_index {
            Some(parent) => {
                println!("  {:>3}. {} (parent: {})", index, card.short_display(), parent);
            }
            None => println!("  {:>3}. {}", index, card.short_display()),
        }
    }

    if !summary.issues.is_empty() {
        println!("\nIssues:");
        for issue in &summary.issues {
            println!("  #{} {}", issue.number, issue.url);
        }
    }

    println!("\n{}", summary.to_summary_string());
}
