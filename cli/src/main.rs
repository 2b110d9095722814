//! sharpseq: interactive SharpCap sequence generator
//!
//! Takes no arguments. Asks for an output file name and the observing plan,
//! then writes the `.scs` script in one go.

mod logging;
mod prompt;

use anyhow::{Context, Result};
use clap::Parser;
use prompt::PromptInput;
use sharpseq_sequencer::{generate, Catalog, CsvCatalog, FileSink, GeneratorConfig, InputProvider, CONFIG_FILE_NAME};
use std::path::Path;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sharpseq")]
#[command(about = "Generate SharpCap imaging sequences", long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {}

fn main() -> ExitCode {
    // Any argument is a usage error; clap exits with status 2
    let _cli = Cli::parse();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Session aborted: {:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let config = GeneratorConfig::load(Path::new(CONFIG_FILE_NAME)).context("failed to load configuration")?;
    let _log_guard = logging::init(&config)?;

    let stdin = std::io::stdin();
    let mut input = PromptInput::new(stdin.lock(), std::io::stdout());

    let file_name = input.ask_parsed("Set filename", |answer| {
        let name = answer.trim();
        if name.is_empty() {
            Err("File name must not be empty".to_string())
        } else {
            Ok(name.to_string())
        }
    })?;
    let path = config.output_path(&file_name);

    let catalog = config
        .catalog_path
        .as_ref()
        .map(|p| CsvCatalog::new(p).with_listing(config.catalog_listing_path.clone()));
    let catalog: Option<&dyn Catalog> = catalog.as_ref().map(|c| c as &dyn Catalog);

    let mut sink = FileSink::new(&path);
    let outcome = generate(&mut input, &config, catalog, &mut sink)
        .with_context(|| format!("no sequence written to {}", path.display()))?;

    for target in &outcome.targets {
        tracing::info!(
            "{} ({}): {} frames",
            target.name,
            target.filter.label(),
            target.block.total_frames
        );
    }
    println!("Sequence file generated!");
    Ok(())
}
