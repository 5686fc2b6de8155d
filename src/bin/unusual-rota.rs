#![forbid(unsafe_code)]
use anyhow::Result;
use clap::Parser;
use rotacal::{
    cli::{init_logging, report, OutputArgs},
    config::OnCallConfig,
    notification::ConsoleNotifier,
    pipeline::run_on_call,
};
use std::path::PathBuf;

/// Rota par jours d'astreinte (`jour, nom, remarque`) avec jours de récupération
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Fichier de rota (.csv, .xls, .xlsx)
    #[arg(default_value = "unusual1.xlsx")]
    filename: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = OnCallConfig::unusual()?;
    let summary = run_on_call(&config, &cli.output.run_options(cli.filename), &ConsoleNotifier)?;
    report(&summary);
    Ok(())
}
