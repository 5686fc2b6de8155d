//! Une exécution complète : lecture, regroupement, snapshot, calendriers.
//!
//! Toute l'entrée est lue et validée avant la première écriture.

use crate::calendar::{table_calendar, write_calendar, EmitContext};
use crate::config::{OnCallConfig, RotaConfig};
use crate::grouping::group_rows;
use crate::io::{open_source, table_rows};
use crate::model::Layout;
use crate::notification::{EntrantNotifier, NewEntrant};
use crate::oncall::{group_on_call, on_call_calendar, RowIssue};
use crate::shift::ShiftResolver;
use crate::storage::{track, CsvSnapshotStore};
use anyhow::Context;
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub input: PathBuf,
    pub sheet: usize,
    pub out_dir: PathBuf,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub calendars: Vec<PathBuf>,
    pub new_entrants: Vec<NewEntrant>,
    /// Lignes écartées (rota par jours uniquement).
    pub issues: Vec<RowIssue>,
}

pub fn run_table(
    config: &RotaConfig,
    opts: &RunOptions,
    notifier: &dyn EntrantNotifier,
) -> anyhow::Result<RunSummary> {
    let resolver = ShiftResolver::new(config.roles.clone());
    let mut source = open_source(&opts.input, opts.sheet)
        .with_context(|| format!("opening {}", opts.input.display()))?;
    let grouping = group_rows(table_rows(source.as_mut()), &resolver, config.layout)
        .with_context(|| format!("reading {}", opts.input.display()))?;

    ensure_dir(&opts.out_dir)?;
    let store = CsvSnapshotStore::open(&opts.out_dir, config.layout);
    let new_entrants = track(&store, grouping.counts(), notifier)?;

    let ctx = EmitContext {
        resolver: &resolver,
        title: &config.title,
        location: &config.location,
        timezone: config.timezone,
        stamp: Utc::now(),
    };
    let mut calendars = Vec::with_capacity(grouping.buckets.len());
    for (key, bucket) in &grouping.buckets {
        let doc = table_calendar(key, bucket, &ctx)?;
        calendars.push(write_calendar(&opts.out_dir, key, &doc)?);
    }

    Ok(RunSummary {
        calendars,
        new_entrants,
        issues: Vec::new(),
    })
}

pub fn run_on_call(
    config: &OnCallConfig,
    opts: &RunOptions,
    notifier: &dyn EntrantNotifier,
) -> anyhow::Result<RunSummary> {
    let resolver = ShiftResolver::new(config.roles.clone());
    let mut source = open_source(&opts.input, opts.sheet)
        .with_context(|| format!("opening {}", opts.input.display()))?;
    let rota = group_on_call(source.records(), config)
        .with_context(|| format!("reading {}", opts.input.display()))?;

    ensure_dir(&opts.out_dir)?;
    let store = CsvSnapshotStore::open(&opts.out_dir, Layout::PerPerson);
    let new_entrants = track(&store, rota.counts(&config.window), notifier)?;

    let ctx = EmitContext {
        resolver: &resolver,
        title: &config.title,
        location: &config.location,
        timezone: config.timezone,
        stamp: Utc::now(),
    };
    let mut calendars = Vec::with_capacity(rota.buckets.len());
    for (key, days) in &rota.buckets {
        let doc = on_call_calendar(key, days, &config.window, &ctx)?;
        calendars.push(write_calendar(&opts.out_dir, key, &doc)?);
    }

    Ok(RunSummary {
        calendars,
        new_entrants,
        issues: rota.issues,
    })
}

fn ensure_dir(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating output directory {}", dir.display()))
}
