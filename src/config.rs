//! Configuration statique des rotas : horaires par rôle, présentation des
//! calendriers et règles propres au rota par jours d'astreinte.

use crate::model::Layout;
use chrono::{Duration, NaiveDate, NaiveTime};
use chrono_tz::Tz;
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("role name cannot be empty")]
    EmptyRole,
    #[error("role {0}: duration must be positive")]
    NonPositiveDuration(String),
    #[error("role {0}: parent role cannot be empty")]
    EmptyParent(String),
    #[error("duplicate role: {0}")]
    DuplicateRole(String),
    #[error("invalid annotation pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("invalid date {0:04}-{1:02}-{2:02}")]
    InvalidDate(i32, u32, u32),
    #[error("reporting window must end after it starts")]
    EmptyWindow,
}

/// Horaire d'un rôle. Durée et heure de fin s'excluent par construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    /// Journée entière, sans heure de début.
    AllDay { duration: Duration },
    /// Début fixe puis durée.
    Fixed { start: NaiveTime, duration: Duration },
    /// Début et fin ; une fin avant (ou égale au) début passe au lendemain.
    Span { start: NaiveTime, end: NaiveTime },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRule {
    pub name: String,
    pub timing: Timing,
    /// Poste de rattachement (ex. `Night SHO` sous `SHO`) ; n'influe pas sur l'horaire.
    pub parent: Option<String>,
}

impl RoleRule {
    pub fn all_day<N: Into<String>>(name: N, duration: Duration) -> Self {
        Self::new(name, Timing::AllDay { duration })
    }

    pub fn fixed<N: Into<String>>(name: N, start: NaiveTime, duration: Duration) -> Self {
        Self::new(name, Timing::Fixed { start, duration })
    }

    pub fn span<N: Into<String>>(name: N, start: NaiveTime, end: NaiveTime) -> Self {
        Self::new(name, Timing::Span { start, end })
    }

    fn new<N: Into<String>>(name: N, timing: Timing) -> Self {
        Self {
            name: name.into(),
            timing,
            parent: None,
        }
    }

    pub fn under<P: Into<String>>(mut self, parent: P) -> Self {
        self.parent = Some(parent.into());
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyRole);
        }
        match self.timing {
            Timing::AllDay { duration } | Timing::Fixed { duration, .. }
                if duration <= Duration::zero() =>
            {
                return Err(ConfigError::NonPositiveDuration(self.name.clone()));
            }
            _ => {}
        }
        if self.parent.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(ConfigError::EmptyParent(self.name.clone()));
        }
        Ok(())
    }
}

/// Table immuable des rôles, indexée par nom de colonne.
#[derive(Debug, Clone, Default)]
pub struct RoleTable {
    rules: BTreeMap<String, RoleRule>,
}

impl RoleTable {
    pub fn new<I: IntoIterator<Item = RoleRule>>(rules: I) -> Result<Self, ConfigError> {
        let mut table = BTreeMap::new();
        for rule in rules {
            rule.validate()?;
            if table.contains_key(&rule.name) {
                return Err(ConfigError::DuplicateRole(rule.name));
            }
            table.insert(rule.name.clone(), rule);
        }
        Ok(Self { rules: table })
    }

    pub fn get(&self, role: &str) -> Option<&RoleRule> {
        self.rules.get(role)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Rota en lignes/colonnes (`Date` + une colonne par rôle).
#[derive(Debug, Clone)]
pub struct RotaConfig {
    pub title: String,
    pub layout: Layout,
    pub roles: RoleTable,
    pub location: String,
    pub timezone: Tz,
}

impl RotaConfig {
    /// Une seule colonne `On-Call`, garde de 12 h à partir de 8 h.
    pub fn simple() -> Result<Self, ConfigError> {
        Ok(Self {
            title: "Simple Rota".into(),
            layout: Layout::PerPerson,
            roles: RoleTable::new([RoleRule::fixed(
                "On-Call",
                hm(8, 0),
                Duration::hours(12),
            )])?,
            location: DEFAULT_LOCATION.into(),
            timezone: chrono_tz::Europe::London,
        })
    }

    /// Jours et nuits SHO/SpR, consultant à la journée.
    pub fn multi() -> Result<Self, ConfigError> {
        Ok(Self {
            title: "Multi rota".into(),
            layout: Layout::PerPersonJob,
            roles: RoleTable::new([
                RoleRule::span("SHO", hm(8, 0), hm(20, 30)),
                RoleRule::span("SpR", hm(8, 0), hm(20, 30)),
                RoleRule::all_day("Consultant", Duration::days(1)),
                RoleRule::span("Night SHO", hm(20, 0), hm(8, 30)).under("SHO"),
                RoleRule::span("Night SpR", hm(20, 0), hm(8, 30)).under("SpR"),
            ])?,
            location: DEFAULT_LOCATION.into(),
            timezone: chrono_tz::Europe::London,
        })
    }
}

pub const DEFAULT_LOCATION: &str = "At work";

/// Rôle d'astreinte du rota par jours.
pub const ON_CALL: &str = "On-Call";
/// Repos compensateur.
pub const LIEU: &str = "Lieu";

/// Normalisation des noms saisis à la main.
#[derive(Debug, Clone, Default)]
pub struct NameRules {
    /// Clés et valeurs en majuscules.
    pub corrections: BTreeMap<String, String>,
    /// Le premier groupe capturé remplace le nom quand le motif correspond.
    pub annotations: Vec<Regex>,
}

impl NameRules {
    pub fn new<C, K, V, P>(corrections: C, annotations: P) -> Result<Self, ConfigError>
    where
        C: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        let corrections: BTreeMap<String, String> = corrections
            .into_iter()
            .map(|(k, v)| {
                (
                    k.as_ref().trim().to_uppercase(),
                    v.as_ref().trim().to_uppercase(),
                )
            })
            .collect();
        let annotations: Vec<Regex> = annotations
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<_, _>>()?;
        Ok(Self {
            corrections,
            annotations,
        })
    }
}

/// Intervalle de dates `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Window {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ConfigError> {
        if to <= from {
            return Err(ConfigError::EmptyWindow);
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day < self.to
    }
}

/// Rota par jours d'astreinte (`jour, nom, remarque`), sans en-tête.
#[derive(Debug, Clone)]
pub struct OnCallConfig {
    pub title: String,
    pub roles: RoleTable,
    pub names: NameRules,
    pub window: Window,
    /// Point de départ du report année/mois.
    pub start_day: NaiveDate,
    pub location: String,
    pub timezone: Tz,
}

impl OnCallConfig {
    pub fn unusual() -> Result<Self, ConfigError> {
        Ok(Self {
            title: "Unusual-1 on-call rota".into(),
            roles: RoleTable::new([
                RoleRule::all_day(ON_CALL, Duration::days(1)),
                RoleRule::all_day(LIEU, Duration::days(1)),
            ])?,
            names: NameRules::new(
                std::iter::empty::<(&str, &str)>(),
                [r"^(.+?)\s*\(.*\)$", r"^(.+?)\s*\*+$"],
            )?,
            window: Window::new(ymd(2017, 12, 6)?, ymd(2018, 3, 7)?)?,
            start_day: ymd(2016, 1, 1)?,
            location: DEFAULT_LOCATION.into(),
            timezone: chrono_tz::Europe::London,
        })
    }
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default()
}

fn ymd(y: i32, m: u32, d: u32) -> Result<NaiveDate, ConfigError> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or(ConfigError::InvalidDate(y, m, d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        let multi = RotaConfig::multi().unwrap();
        assert_eq!(multi.roles.len(), 5);
        assert_eq!(
            multi.roles.get("Night SHO").and_then(|r| r.parent.as_deref()),
            Some("SHO")
        );
        assert_eq!(RotaConfig::simple().unwrap().layout, Layout::PerPerson);
        let unusual = OnCallConfig::unusual().unwrap();
        assert!(unusual.window.contains(NaiveDate::from_ymd_opt(2017, 12, 6).unwrap()));
        assert!(!unusual.window.contains(NaiveDate::from_ymd_opt(2018, 3, 7).unwrap()));
    }

    #[test]
    fn rejects_bad_rules() {
        let zero = RoleRule::fixed("SHO", hm(8, 0), Duration::zero());
        assert!(matches!(
            RoleTable::new([zero]),
            Err(ConfigError::NonPositiveDuration(_))
        ));
        let dup = [
            RoleRule::all_day("SHO", Duration::days(1)),
            RoleRule::all_day("SHO", Duration::days(1)),
        ];
        assert!(matches!(RoleTable::new(dup), Err(ConfigError::DuplicateRole(_))));
        let orphan = RoleRule::all_day("SHO", Duration::days(1)).under(" ");
        assert!(matches!(RoleTable::new([orphan]), Err(ConfigError::EmptyParent(_))));
    }

    #[test]
    fn name_rules_compile_patterns() {
        assert!(matches!(
            NameRules::new([("a", "b")], ["("]),
            Err(ConfigError::Pattern(_))
        ));
        let rules = NameRules::new([("smyth", "Smith ")], Vec::<&str>::new()).unwrap();
        assert_eq!(rules.corrections.get("SMYTH").map(String::as_str), Some("SMITH"));
    }
}
