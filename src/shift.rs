use crate::config::{RoleRule, RoleTable, Timing};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShiftError {
    #[error("unknown role: {0} (column missing from the role table)")]
    UnknownRole(String),
    #[error("date overflow while resolving {0}")]
    DateOverflow(String),
}

/// Début d'un créneau, en heure locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftStart {
    /// Événement sur la journée entière.
    Date(NaiveDate),
    At(NaiveDateTime),
}

/// Fin d'un créneau : durée ou instant explicite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftEnd {
    Duration(Duration),
    At(NaiveDateTime),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedShift {
    pub start: ShiftStart,
    pub end: ShiftEnd,
}

/// Calcule les horaires concrets à partir d'une table de rôles figée.
#[derive(Debug, Clone)]
pub struct ShiftResolver {
    roles: RoleTable,
}

impl ShiftResolver {
    pub fn new(roles: RoleTable) -> Self {
        Self { roles }
    }

    pub fn roles(&self) -> &RoleTable {
        &self.roles
    }

    pub fn rule(&self, role: &str) -> Result<&RoleRule, ShiftError> {
        self.roles
            .get(role)
            .ok_or_else(|| ShiftError::UnknownRole(role.to_string()))
    }

    /// Poste de rattachement : le parent s'il existe, sinon le rôle lui-même.
    pub fn job_for<'a>(&'a self, role: &'a str) -> Result<&'a str, ShiftError> {
        let rule = self.rule(role)?;
        Ok(rule.parent.as_deref().unwrap_or(role))
    }

    pub fn resolve(&self, role: &str, date: NaiveDate) -> Result<ResolvedShift, ShiftError> {
        let shift = match self.rule(role)?.timing {
            Timing::AllDay { duration } => ResolvedShift {
                start: ShiftStart::Date(date),
                end: ShiftEnd::Duration(duration),
            },
            Timing::Fixed { start, duration } => ResolvedShift {
                start: ShiftStart::At(date.and_time(start)),
                end: ShiftEnd::Duration(duration),
            },
            Timing::Span { start, end } => {
                let (start_dt, end_dt) = span_datetimes(date, start, end)
                    .ok_or_else(|| ShiftError::DateOverflow(role.to_string()))?;
                ResolvedShift {
                    start: ShiftStart::At(start_dt),
                    end: ShiftEnd::At(end_dt),
                }
            }
        };
        Ok(shift)
    }
}

/// Une fin égale ou antérieure au début tombe le lendemain, jamais une durée nulle.
fn span_datetimes(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let end_date = if end > start { date } else { date.succ_opt()? };
    Some((date.and_time(start), end_date.and_time(end)))
}
