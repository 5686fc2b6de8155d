//! Rota par jours d'astreinte : une ligne `jour, nom, remarque` par garde,
//! avec report de l'année et du mois d'une ligne à l'autre.

use crate::calendar::{CalendarDoc, EmitContext};
use crate::config::{NameRules, OnCallConfig, Window, LIEU, ON_CALL};
use crate::date::{DateFormatError, DateParts};
use crate::io::{Record, SourceError};
use crate::model::{BucketKey, Layout};
use crate::shift::ShiftError;
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnCallDay {
    pub day: NaiveDate,
    pub name: String,
    pub additional: String,
}

/// Ligne écartée sans arrêter l'exécution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowIssue {
    Unparseable { row: usize, record: Record },
    /// Le premier nom saisi pour ce jour est conservé.
    Duplicate {
        row: usize,
        day: NaiveDate,
        kept: String,
        discarded: String,
    },
}

#[derive(Debug, Default)]
pub struct OnCallRota {
    /// Jours dans l'ordre de première apparition.
    pub days: Vec<OnCallDay>,
    pub buckets: BTreeMap<BucketKey, Vec<OnCallDay>>,
    pub issues: Vec<RowIssue>,
}

impl OnCallRota {
    /// Nombre de gardes par bucket dans la fenêtre de diffusion.
    pub fn counts(&self, window: &Window) -> BTreeMap<BucketKey, usize> {
        self.buckets
            .iter()
            .map(|(key, days)| {
                let n = days.iter().filter(|d| window.contains(d.day)).count();
                (key.clone(), n)
            })
            .collect()
    }
}

/// Curseur de date : un jour seul ne revient jamais en arrière.
#[derive(Debug, Clone, Copy)]
pub struct DayCursor {
    current: NaiveDate,
}

impl DayCursor {
    pub fn new(start: NaiveDate) -> Self {
        Self { current: start }
    }

    pub fn current(&self) -> NaiveDate {
        self.current
    }

    pub fn advance(&mut self, raw: &str) -> Result<NaiveDate, DateFormatError> {
        let err = || DateFormatError(raw.to_string());
        let default = self.defaults().ok_or_else(err)?;
        let parts = DateParts::scan(raw.trim()).ok_or_else(err)?;
        let day = match parts.day {
            Some(d) if parts.is_bare_day() => next_occurrence(self.current, d),
            _ => parts.resolve(Some(default)),
        }
        .ok_or_else(err)?;
        if day < self.current {
            tracing::warn!(%raw, from = %self.current, to = %day, "day cursor moved backwards");
        }
        self.current = day;
        Ok(day)
    }

    /// Au 31 décembre, les valeurs par défaut passent en janvier suivant.
    fn defaults(&self) -> Option<NaiveDate> {
        if self.current.month() == 12 && self.current.day() == 31 {
            NaiveDate::from_ymd_opt(self.current.year() + 1, 1, 1)
        } else {
            Some(self.current)
        }
    }
}

/// Premier `day` du mois, à partir du mois de `floor`, qui ne le précède pas.
fn next_occurrence(floor: NaiveDate, day: u32) -> Option<NaiveDate> {
    let (mut year, mut month) = (floor.year(), floor.month());
    for _ in 0..=12 {
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            if date >= floor {
                return Some(date);
            }
        }
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    None
}

/// Majuscules, annotations retirées, orthographe corrigée.
pub fn normalize_name(raw: &str, rules: &NameRules) -> String {
    let mut canonical = raw.to_uppercase().trim().to_string();
    for pattern in &rules.annotations {
        if let Some(group) = pattern.captures(&canonical).and_then(|c| c.get(1)) {
            canonical = group.as_str().trim().to_string();
        }
    }
    match rules.corrections.get(&canonical) {
        Some(fixed) => fixed.clone(),
        None => canonical,
    }
}

pub fn group_on_call<I>(records: I, config: &OnCallConfig) -> Result<OnCallRota, SourceError>
where
    I: IntoIterator<Item = Result<Record, SourceError>>,
{
    let mut rota = OnCallRota::default();
    let mut seen: HashMap<NaiveDate, usize> = HashMap::new();
    let mut cursor = DayCursor::new(config.start_day);

    for (index, rec) in records.into_iter().enumerate() {
        let record = rec?;
        let row = index + 1;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let raw_day = record.first().map(String::as_str).unwrap_or_default();
        let day = match cursor.advance(raw_day) {
            Ok(day) => day,
            Err(err) => {
                tracing::warn!(row, error = %err, "skipping unparseable rota row");
                rota.issues.push(RowIssue::Unparseable { row, record });
                continue;
            }
        };

        let name = record.get(1).map(|s| s.trim()).unwrap_or_default();
        if name.is_empty() {
            continue;
        }
        let name = normalize_name(name, &config.names);
        let additional = record.get(2).map(|s| s.trim()).unwrap_or_default();

        if let Some(&pos) = seen.get(&day) {
            let kept = rota.days[pos].name.clone();
            tracing::warn!(row, %day, %kept, discarded = %name, "duplicate on-call day");
            rota.issues.push(RowIssue::Duplicate {
                row,
                day,
                kept,
                discarded: name,
            });
            continue;
        }
        seen.insert(day, rota.days.len());
        rota.days.push(OnCallDay {
            day,
            name,
            additional: additional.to_string(),
        });
    }

    for entry in &rota.days {
        rota.buckets
            .entry(BucketKey::for_layout(Layout::PerPerson, entry.name.as_str(), ON_CALL))
            .or_default()
            .push(entry.clone());
    }
    rota.buckets
        .insert(BucketKey::all(Layout::PerPerson), rota.days.clone());

    tracing::debug!(
        days = rota.days.len(),
        issues = rota.issues.len(),
        "grouped on-call days"
    );
    Ok(rota)
}

/// Jours de repos autour d'une garde.
///
/// Samedi : la veille. Lundi à jeudi et dimanche : le lendemain. Vendredi : aucun.
pub fn lieu_days(day: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
    match day.weekday() {
        Weekday::Sat => (day.pred_opt(), None),
        Weekday::Fri => (None, None),
        _ => (None, day.succ_opt()),
    }
}

fn on_call_text(role: &str, name: &str, additional: &str) -> String {
    let mut text = role.to_string();
    if !name.is_empty() {
        text.push_str(": ");
        text.push_str(name);
    }
    if !additional.is_empty() {
        text.push_str(" (");
        text.push_str(additional);
        text.push(')');
    }
    text
}

/// Gardes de la fenêtre et repos associés ; le nom n'apparaît que dans le
/// calendrier combiné.
pub fn on_call_calendar(
    key: &BucketKey,
    days: &[OnCallDay],
    window: &Window,
    ctx: &EmitContext<'_>,
) -> Result<CalendarDoc, ShiftError> {
    let mut events = Vec::new();
    for entry in days.iter().filter(|d| window.contains(d.day)) {
        let name = if key.is_all() { entry.name.as_str() } else { "" };
        let (before, after) = lieu_days(entry.day);
        if let Some(rest) = before {
            events.push(ctx.event(LIEU, rest, on_call_text(LIEU, name, ""))?);
        }
        events.push(ctx.event(
            ON_CALL,
            entry.day,
            on_call_text(ON_CALL, name, &entry.additional),
        )?);
        if let Some(rest) = after {
            events.push(ctx.event(LIEU, rest, on_call_text(LIEU, name, ""))?);
        }
    }
    Ok(ctx.calendar(key, events))
}
