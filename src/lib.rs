#![forbid(unsafe_code)]
//! Rotacal : tableaux de gardes (CSV/Excel) vers calendriers iCalendar.
//!
//! - Une colonne `Date` puis une colonne par rôle, ou des lignes `jour, nom`.
//! - Un fichier `.ics` par personne (et par poste), plus un calendrier `All`.
//! - Snapshot `last_names.csv` pour signaler les nouveaux noms d'une exécution à l'autre.
//! - Heures locales, fuseau attaché à l'écriture.

pub mod calendar;
pub mod cli;
pub mod config;
pub mod date;
pub mod grouping;
pub mod io;
pub mod model;
pub mod notification;
pub mod oncall;
pub mod pipeline;
pub mod shift;
pub mod storage;

pub use calendar::{table_calendar, write_calendar, CalendarDoc, EmitContext, EventSpec};
pub use config::{OnCallConfig, RoleRule, RoleTable, RotaConfig, Timing};
pub use date::{parse_date, DateFormatError};
pub use grouping::{group_rows, Bucket, Grouping, GroupingError};
pub use io::{open_source, table_rows, CsvSource, RowSource, SourceError, SpreadsheetSource};
pub use model::{BucketKey, Layout, Row};
pub use notification::{CollectingNotifier, ConsoleNotifier, EntrantNotifier, NewEntrant};
pub use pipeline::{run_on_call, run_table, RunOptions, RunSummary};
pub use shift::{ResolvedShift, ShiftEnd, ShiftError, ShiftResolver, ShiftStart};
pub use storage::{reconcile, track, CsvSnapshotStore, Reconciliation, Snapshot, Storage};
