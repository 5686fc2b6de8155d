use chrono::NaiveDate;
use std::fmt;
use std::rc::Rc;

/// Nom du champ date dans un tableau de gardes.
pub const DATE_FIELD: &str = "Date";

/// Personne synthétique qui regroupe toutes les lignes.
pub const ALL: &str = "All";

/// Ligne brute du tableau : champs ordonnés comme les colonnes d'origine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    fields: Vec<(String, String)>,
}

impl Row {
    pub fn new<I, K, V>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Valeur brute de la colonne `Date`.
    pub fn date(&self) -> Option<&str> {
        self.get(DATE_FIELD)
    }

    /// Toutes les colonnes de rôle (hors `Date`), dans l'ordre du fichier.
    pub fn roles(&self) -> impl Iterator<Item = (&str, &str)> {
        self.others(&[])
    }

    /// Colonnes de rôle hors `Date` et hors `excluded`, dans l'ordre du fichier.
    pub fn others<'a>(
        &'a self,
        excluded: &'a [&'a str],
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.fields
            .iter()
            .filter(move |(k, _)| k != DATE_FIELD && !excluded.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Ligne dont la date a déjà été résolue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatedRow {
    pub index: usize,
    pub date: NaiveDate,
    pub row: Row,
}

pub type SharedRow = Rc<DatedRow>;

/// Façon de découper les calendriers et le snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Un calendrier par personne (`rota_<person>.ics`, snapshot `name,number`).
    PerPerson,
    /// Un calendrier par couple personne/poste (`rota_<job>_<person>.ics`).
    PerPersonJob,
}

/// Clé d'un bucket : personne et, selon la disposition, poste.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketKey {
    pub person: String,
    pub job: Option<String>,
}

impl BucketKey {
    pub fn new<P: Into<String>>(person: P, job: Option<String>) -> Self {
        Self {
            person: person.into(),
            job,
        }
    }

    pub fn for_layout<P: Into<String>, J: Into<String>>(layout: Layout, person: P, job: J) -> Self {
        match layout {
            Layout::PerPerson => Self::new(person, None),
            Layout::PerPersonJob => Self::new(person, Some(job.into())),
        }
    }

    /// Clé du calendrier combiné.
    pub fn all(layout: Layout) -> Self {
        Self::for_layout(layout, ALL, ALL)
    }

    pub fn is_all(&self) -> bool {
        self.person == ALL
    }

    pub fn file_name(&self) -> String {
        match &self.job {
            Some(job) => format!("rota_{}_{}.ics", job, self.person),
            None => format!("rota_{}.ics", self.person),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.job {
            Some(job) => write!(f, "{} ({})", self.person, job),
            None => f.write_str(&self.person),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Row {
        Row::new([
            ("Date", "01/04/2020"),
            ("SHO", "Alice"),
            ("SpR", "Bob"),
            ("Consultant", "Dr C"),
        ])
    }

    #[test]
    fn others_keeps_column_order_and_skips_date() {
        let row = sample();
        let others: Vec<_> = row.others(&["SpR"]).collect();
        assert_eq!(others, vec![("SHO", "Alice"), ("Consultant", "Dr C")]);
        assert_eq!(row.roles().count(), 3);
        assert_eq!(row.date(), Some("01/04/2020"));
    }

    #[test]
    fn file_names_follow_layout() {
        let multi = BucketKey::for_layout(Layout::PerPersonJob, "Alice", "SHO");
        assert_eq!(multi.file_name(), "rota_SHO_Alice.ics");
        let simple = BucketKey::for_layout(Layout::PerPerson, "Alice", "On-Call");
        assert_eq!(simple.file_name(), "rota_Alice.ics");
        assert_eq!(BucketKey::all(Layout::PerPersonJob).file_name(), "rota_All_All.ics");
    }
}
