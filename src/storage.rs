//! Suivi des changements entre deux exécutions (`last_names.csv`).

use crate::model::{BucketKey, Layout};
use crate::notification::{EntrantNotifier, NewEntrant};
use anyhow::Context;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub const SNAPSHOT_FILE: &str = "last_names.csv";

/// Nombre de lignes par bucket.
pub type Snapshot = BTreeMap<BucketKey, usize>;

pub trait Storage {
    /// Snapshot précédent ; vide s'il n'existe pas encore.
    fn load(&self) -> anyhow::Result<Snapshot>;
    /// Remplace le snapshot de manière atomique.
    fn persist(&self, snapshot: &Snapshot) -> anyhow::Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct JobRecord {
    name: String,
    job: String,
    number: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct NameRecord {
    name: String,
    number: usize,
}

pub struct CsvSnapshotStore {
    path: PathBuf,
    layout: Layout,
}

impl CsvSnapshotStore {
    /// Snapshot `last_names.csv` dans `dir`.
    pub fn open<P: AsRef<Path>>(dir: P, layout: Layout) -> Self {
        Self {
            path: dir.as_ref().join(SNAPSHOT_FILE),
            layout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for CsvSnapshotStore {
    fn load(&self) -> anyhow::Result<Snapshot> {
        let mut out = Snapshot::new();
        if !self.path.exists() {
            return Ok(out);
        }
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        match self.layout {
            Layout::PerPersonJob => {
                for rec in rdr.deserialize::<JobRecord>() {
                    let rec = rec.with_context(|| format!("parsing {}", self.path.display()))?;
                    out.insert(BucketKey::new(rec.name, Some(rec.job)), rec.number);
                }
            }
            Layout::PerPerson => {
                for rec in rdr.deserialize::<NameRecord>() {
                    let rec = rec.with_context(|| format!("parsing {}", self.path.display()))?;
                    out.insert(BucketKey::new(rec.name, None), rec.number);
                }
            }
        }
        Ok(out)
    }

    fn persist(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        {
            let mut w = WriterBuilder::new().has_headers(false).from_writer(&mut tmp);
            match self.layout {
                Layout::PerPersonJob => {
                    w.write_record(["name", "job", "number"])?;
                    for (key, &number) in snapshot {
                        w.serialize(JobRecord {
                            name: key.person.clone(),
                            job: key.job.clone().unwrap_or_default(),
                            number,
                        })?;
                    }
                }
                Layout::PerPerson => {
                    w.write_record(["name", "number"])?;
                    for (key, &number) in snapshot {
                        w.serialize(NameRecord {
                            name: key.person.clone(),
                            number,
                        })?;
                    }
                }
            }
            w.flush()?;
        }
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .with_context(|| format!("atomic rename to {}", self.path.display()))?;
        Ok(())
    }
}

/// Résultat de la comparaison avec le snapshot précédent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub new_entrants: Vec<NewEntrant>,
    /// Toujours égal aux comptes courants.
    pub updated: Snapshot,
}

/// Partie pure : toute clé absente de `prior` est nouvelle, quel que soit son compte.
pub fn reconcile(prior: &Snapshot, current: Snapshot) -> Reconciliation {
    let new_entrants = current
        .iter()
        .filter(|(key, _)| !prior.contains_key(*key))
        .map(|(key, &rows)| NewEntrant {
            key: key.clone(),
            rows,
        })
        .collect();
    Reconciliation {
        new_entrants,
        updated: current,
    }
}

/// Charge, compare, annonce puis réécrit le snapshot.
pub fn track(
    store: &dyn Storage,
    current: Snapshot,
    notifier: &dyn EntrantNotifier,
) -> anyhow::Result<Vec<NewEntrant>> {
    let prior = store.load()?;
    let Reconciliation {
        new_entrants,
        updated,
    } = reconcile(&prior, current);
    for entrant in &new_entrants {
        notifier.notify(entrant);
    }
    store.persist(&updated)?;
    Ok(new_entrants)
}
