#![forbid(unsafe_code)]
use anyhow::Result;
use clap::Parser;
use rotacal::{
    cli::{init_logging, report, OutputArgs},
    config::RotaConfig,
    notification::ConsoleNotifier,
    pipeline::run_table,
};
use std::path::PathBuf;

/// Rota à une colonne `On-Call` : un calendrier par personne
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Fichier de rota (.csv, .xls, .xlsx)
    #[arg(default_value = "simple_rota.csv")]
    filename: PathBuf,

    #[command(flatten)]
    output: OutputArgs,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = RotaConfig::simple()?;
    let summary = run_table(&config, &cli.output.run_options(cli.filename), &ConsoleNotifier)?;
    report(&summary);
    Ok(())
}
