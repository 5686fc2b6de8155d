//! Construction des événements et écriture des fichiers `.ics`.

use crate::grouping::Bucket;
use crate::model::{BucketKey, Row};
use crate::shift::{ShiftEnd, ShiftError, ShiftResolver, ShiftStart};
use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Événement prêt à sérialiser.
#[derive(Debug, Clone, PartialEq)]
pub struct EventSpec {
    pub summary: String,
    pub description: String,
    pub start: ShiftStart,
    pub end: ShiftEnd,
    pub stamp: DateTime<Utc>,
    pub location: String,
    pub uid: Uuid,
}

#[derive(Debug, Clone)]
pub struct CalendarDoc {
    pub name: String,
    pub timezone: Tz,
    pub events: Vec<EventSpec>,
}

/// Ce qui est commun à tous les événements d'une exécution.
#[derive(Debug, Clone, Copy)]
pub struct EmitContext<'a> {
    pub resolver: &'a ShiftResolver,
    pub title: &'a str,
    pub location: &'a str,
    pub timezone: Tz,
    /// Horodatage de génération, identique pour tout le lot.
    pub stamp: DateTime<Utc>,
}

impl EmitContext<'_> {
    /// Un événement pour `role` le jour `date`, titre et description identiques.
    pub fn event(&self, role: &str, date: NaiveDate, text: String) -> Result<EventSpec, ShiftError> {
        let shift = self.resolver.resolve(role, date)?;
        Ok(EventSpec {
            summary: text.clone(),
            description: text,
            start: shift.start,
            end: shift.end,
            stamp: self.stamp,
            location: self.location.to_string(),
            uid: Uuid::new_v4(),
        })
    }

    pub fn calendar(&self, key: &BucketKey, events: Vec<EventSpec>) -> CalendarDoc {
        CalendarDoc {
            name: format!("{} for {}", self.title, key),
            timezone: self.timezone,
            events,
        }
    }
}

/// `"<role>: <person> with <rôle: personne, ...>"`, colonnes dans l'ordre du
/// fichier, sans la date ni la colonne du sujet ; les cellules vides sont omises.
pub fn describe(role: &str, person: &str, row: &Row) -> String {
    let excluded = [role];
    let peers: Vec<String> = row
        .others(&excluded)
        .filter(|(_, who)| !who.is_empty())
        .map(|(r, who)| format!("{r}: {who}"))
        .collect();
    if peers.is_empty() {
        format!("{role}: {person}")
    } else {
        format!("{role}: {person} with {}", peers.join(", "))
    }
}

/// Calendrier d'un bucket du tableau : un événement par ligne, ou par
/// (ligne, rôle occupé) pour le bucket combiné.
pub fn table_calendar(
    key: &BucketKey,
    bucket: &Bucket,
    ctx: &EmitContext<'_>,
) -> Result<CalendarDoc, ShiftError> {
    let mut events = Vec::new();
    match bucket {
        Bucket::Person(roles) => {
            for entry in roles {
                for dated in &entry.rows {
                    let text = describe(&entry.role, &key.person, &dated.row);
                    events.push(ctx.event(&entry.role, dated.date, text)?);
                }
            }
        }
        Bucket::Combined(rows) => {
            for dated in rows {
                for (role, person) in dated.row.roles().filter(|(_, p)| !p.is_empty()) {
                    let text = describe(role, person, &dated.row);
                    events.push(ctx.event(role, dated.date, text)?);
                }
            }
        }
    }
    Ok(ctx.calendar(key, events))
}

pub fn to_ical(doc: &CalendarDoc) -> Calendar {
    let tzid = doc.timezone.name();
    let mut cal = Calendar::new();
    cal.name(&doc.name);
    for spec in &doc.events {
        let mut event = Event::new();
        event
            .summary(&spec.summary)
            .description(&spec.description)
            .location(&spec.location)
            .uid(&spec.uid.to_string())
            .timestamp(spec.stamp);
        match spec.start {
            ShiftStart::Date(date) => event.starts(date),
            ShiftStart::At(at) => event.starts(local(at, tzid)),
        };
        match spec.end {
            ShiftEnd::Duration(d) => event.add_property("DURATION", ical_duration(d)),
            ShiftEnd::At(at) => event.ends(local(at, tzid)),
        };
        cal.push(event.done());
    }
    cal.done()
}

fn local(at: NaiveDateTime, tzid: &str) -> CalendarDateTime {
    CalendarDateTime::WithTimezone {
        date_time: at,
        tzid: tzid.to_string(),
    }
}

/// Durée au format RFC 5545 (`P1D`, `PT12H`, `PT12H30M`).
pub fn ical_duration(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    let (days, rem) = (secs / 86_400, secs % 86_400);
    let mut out = String::from("P");
    if days > 0 {
        let _ = write!(out, "{days}D");
    }
    if rem > 0 {
        out.push('T');
        let (h, m, s) = (rem / 3_600, rem % 3_600 / 60, rem % 60);
        if h > 0 {
            let _ = write!(out, "{h}H");
        }
        if m > 0 {
            let _ = write!(out, "{m}M");
        }
        if s > 0 {
            let _ = write!(out, "{s}S");
        }
    }
    if out == "P" {
        out.push_str("T0S");
    }
    out
}

/// Écrit `doc` dans `dir/<nom du bucket>`.
pub fn write_calendar<P: AsRef<Path>>(dir: P, key: &BucketKey, doc: &CalendarDoc) -> anyhow::Result<PathBuf> {
    let path = dir.as_ref().join(key.file_name());
    fs::write(&path, to_ical(doc).to_string())
        .with_context(|| format!("writing calendar {}", path.display()))?;
    tracing::info!(path = %path.display(), events = doc.events.len(), "calendar written");
    Ok(path)
}
