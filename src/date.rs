//! Lecture des dates du tableau.
//!
//! Les formats fixes sont essayés dans l'ordre, puis un analyseur générique
//! (jour avant mois) sert de dernier recours.

use chrono::{Datelike, NaiveDate};
use thiserror::Error;

/// Formats essayés avant l'analyseur générique.
pub const DATE_FORMATS: [&str; 4] = ["%d/%m/%Y", "%d/%m/%y", "%Y/%m/%d", "%Y-%m-%d"];

const PLAUSIBLE_YEARS: std::ops::RangeInclusive<i32> = 1900..=2200;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

const WEEKDAYS: [&str; 7] = ["mon", "tue", "wed", "thu", "fri", "sat", "sun"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised date format: {0:?}")]
pub struct DateFormatError(pub String);

/// Convertit une date du tableau, sans valeur par défaut.
pub fn parse_date(raw: &str) -> Result<NaiveDate, DateFormatError> {
    let s = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            if PLAUSIBLE_YEARS.contains(&date.year()) {
                return Ok(date);
            }
        }
    }
    let parts = DateParts::scan(s).ok_or_else(|| DateFormatError(raw.to_string()))?;
    parts
        .resolve(None)
        .ok_or_else(|| DateFormatError(raw.to_string()))
}

/// Analyse générique où l'année et le mois manquants viennent de `default`.
pub fn parse_date_with_default(raw: &str, default: NaiveDate) -> Result<NaiveDate, DateFormatError> {
    let parts = DateParts::scan(raw.trim()).ok_or_else(|| DateFormatError(raw.to_string()))?;
    parts
        .resolve(Some(default))
        .ok_or_else(|| DateFormatError(raw.to_string()))
}

/// Champs reconnus par l'analyseur générique.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct DateParts {
    pub(crate) day: Option<u32>,
    pub(crate) month: Option<u32>,
    pub(crate) year: Option<i32>,
}

impl DateParts {
    pub(crate) fn scan(s: &str) -> Option<Self> {
        let s = strip_time_of_day(s);
        let mut numbers: Vec<&str> = Vec::new();
        let mut month_name = None;

        for token in s
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            if token.chars().all(|c| c.is_ascii_digit()) {
                numbers.push(token);
                continue;
            }
            if let Some(n) = strip_ordinal(token) {
                numbers.push(n);
                continue;
            }
            let lower = token.to_ascii_lowercase();
            if lower.len() < 3 {
                return None;
            }
            if let Some(m) = MONTHS.iter().position(|m| lower.starts_with(m)) {
                if month_name.replace(m as u32 + 1).is_some() {
                    return None;
                }
                continue;
            }
            if WEEKDAYS.iter().any(|w| lower.starts_with(w)) {
                continue;
            }
            return None;
        }

        let mut parts = DateParts {
            month: month_name,
            ..DateParts::default()
        };

        match (month_name, numbers.as_slice()) {
            (None, [y, m, d]) if y.len() == 4 => {
                parts.year = Some(y.parse().ok()?);
                parts.month = Some(m.parse().ok()?);
                parts.day = Some(d.parse().ok()?);
            }
            (None, [d, m, y]) => {
                parts.day = Some(d.parse().ok()?);
                parts.month = Some(m.parse().ok()?);
                parts.year = Some(expand_year(y)?);
            }
            (None, [d, m]) => {
                parts.day = Some(d.parse().ok()?);
                parts.month = Some(m.parse().ok()?);
            }
            (None, [d]) => {
                parts.day = Some(d.parse().ok()?);
            }
            (Some(_), [y, d]) if y.len() == 4 => {
                parts.year = Some(y.parse().ok()?);
                parts.day = Some(d.parse().ok()?);
            }
            (Some(_), [d, y]) => {
                parts.day = Some(d.parse().ok()?);
                parts.year = Some(expand_year(y)?);
            }
            (Some(_), [d]) => {
                parts.day = Some(d.parse().ok()?);
            }
            (Some(_), []) => {}
            _ => return None,
        }
        Some(parts)
    }

    /// Complète les champs manquants avec `default` puis valide la date.
    pub(crate) fn resolve(&self, default: Option<NaiveDate>) -> Option<NaiveDate> {
        let year = self.year.or_else(|| default.map(|d| d.year()))?;
        let month = self.month.or_else(|| default.map(|d| d.month()))?;
        let day = self.day.or_else(|| default.map(|d| d.day()))?;
        if !PLAUSIBLE_YEARS.contains(&year) {
            return None;
        }
        NaiveDate::from_ymd_opt(year, month, day)
    }

    pub(crate) fn is_bare_day(&self) -> bool {
        self.day.is_some() && self.month.is_none() && self.year.is_none()
    }
}

fn strip_ordinal(token: &str) -> Option<&str> {
    let lower = token.to_ascii_lowercase();
    ["st", "nd", "rd", "th"].iter().find_map(|suffix| {
        let digits = lower.strip_suffix(suffix)?;
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            Some(&token[..digits.len()])
        } else {
            None
        }
    })
}

fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    match raw.len() {
        2 => Some(2000 + year),
        4 => Some(year),
        _ => None,
    }
}

/// Ignore une éventuelle heure (`2020-04-01T08:00:00`, `01/04/2020 08:00`).
fn strip_time_of_day(s: &str) -> &str {
    let Some(colon) = s.find(':') else {
        return s;
    };
    let head = &s[..colon];
    match head.rfind(|c: char| c == 'T' || c == 't' || c.is_whitespace()) {
        Some(cut) => &s[..cut],
        None => s,
    }
}
