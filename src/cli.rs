//! Morceaux partagés par les binaires.

use crate::oncall::RowIssue;
use crate::pipeline::{RunOptions, RunSummary};
use clap::Args;
use std::path::PathBuf;

/// Arguments communs après le nom du fichier de rota.
#[derive(Args, Debug)]
pub struct OutputArgs {
    /// Répertoire de sortie (créé si absent)
    #[arg(default_value = "generated")]
    pub directory: PathBuf,

    /// Index de la feuille du classeur
    #[arg(long, default_value_t = 0)]
    pub sheet: usize,
}

impl OutputArgs {
    pub fn run_options(self, input: PathBuf) -> RunOptions {
        RunOptions {
            input,
            sheet: self.sheet,
            out_dir: self.directory,
        }
    }
}

/// Logs sur stderr ; `RUST_LOG` remplace le niveau `info` par défaut.
#[cfg(feature = "logging")]
pub fn init_logging() {
    use tracing_subscriber::{fmt::Subscriber, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(not(feature = "logging"))]
pub fn init_logging() {}

/// Résumé lisible d'une exécution.
pub fn report(summary: &RunSummary) {
    for issue in &summary.issues {
        match issue {
            RowIssue::Unparseable { row, record } => {
                eprintln!("Weird row [{row}]: {}", record.join(", "));
            }
            RowIssue::Duplicate {
                row,
                day,
                kept,
                discarded,
            } => {
                eprintln!("Duplicate [{row}]: {day} kept {kept}, discarded {discarded}");
            }
        }
    }
    println!("{} calendar(s) written", summary.calendars.len());
}
