use crate::date::DateFormatError;
use crate::io::SourceError;
use crate::model::{BucketKey, SharedRow};
use crate::shift::ShiftError;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GroupingError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("row {row}: missing Date column")]
    MissingDate { row: usize },
    #[error("row {row}: {source}")]
    Date {
        row: usize,
        #[source]
        source: DateFormatError,
    },
    #[error(transparent)]
    Shift(#[from] ShiftError),
    #[error("row {row}: person name \"All\" is reserved for the combined calendar")]
    ReservedName { row: usize },
}

/// Lignes d'un rôle pour une personne, dans l'ordre du fichier.
#[derive(Debug, Clone)]
pub struct RoleRows {
    pub role: String,
    pub rows: Vec<SharedRow>,
}

#[derive(Debug, Clone)]
pub enum Bucket {
    /// Rôles d'un même poste pour une personne.
    Person(Vec<RoleRows>),
    /// Toutes les lignes, une seule fois chacune.
    Combined(Vec<SharedRow>),
}

impl Bucket {
    pub fn row_count(&self) -> usize {
        match self {
            Bucket::Person(roles) => roles.iter().map(|r| r.rows.len()).sum(),
            Bucket::Combined(rows) => rows.len(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Grouping {
    /// (personne, rôle) → lignes.
    pub by_role: BTreeMap<(String, String), Vec<SharedRow>>,
    /// (personne, poste) → rôles et lignes, plus le bucket combiné.
    pub buckets: BTreeMap<BucketKey, Bucket>,
    pub row_count: usize,
}

impl Grouping {
    pub fn counts(&self) -> BTreeMap<BucketKey, usize> {
        self.buckets
            .iter()
            .map(|(key, bucket)| (key.clone(), bucket.row_count()))
            .collect()
    }
}
