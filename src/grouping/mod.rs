mod types;

pub use types::{Bucket, Grouping, GroupingError, RoleRows};

use crate::date::parse_date;
use crate::io::SourceError;
use crate::model::{BucketKey, DatedRow, Layout, Row, ALL};
use crate::shift::ShiftResolver;
use std::rc::Rc;

/// Regroupe les lignes par (personne, rôle) puis par (personne, poste).
///
/// Une seule passe. Les dates et les colonnes de rôle sont validées au fil de
/// la lecture : la première erreur arrête tout. Une cellule vide n'affecte
/// personne.
pub fn group_rows<I>(
    rows: I,
    resolver: &ShiftResolver,
    layout: Layout,
) -> Result<Grouping, GroupingError>
where
    I: IntoIterator<Item = Result<Row, SourceError>>,
{
    let mut grouping = Grouping::default();
    let mut all = Vec::new();

    for (index, row) in rows.into_iter().enumerate() {
        let row = row?;
        let line = index + 1;
        let raw = row.date().ok_or(GroupingError::MissingDate { row: line })?;
        let date = parse_date(raw).map_err(|source| GroupingError::Date { row: line, source })?;

        for (role, person) in row.roles() {
            resolver.rule(role)?;
            if person == ALL {
                return Err(GroupingError::ReservedName { row: line });
            }
        }

        let shared = Rc::new(DatedRow { index, date, row });
        for (role, person) in shared.row.roles() {
            if person.is_empty() {
                continue;
            }
            grouping
                .by_role
                .entry((person.to_string(), role.to_string()))
                .or_default()
                .push(Rc::clone(&shared));
        }
        all.push(shared);
    }

    for ((person, role), rows) in &grouping.by_role {
        let job = resolver.job_for(role)?;
        let key = BucketKey::for_layout(layout, person.as_str(), job);
        if let Bucket::Person(roles) = grouping
            .buckets
            .entry(key)
            .or_insert_with(|| Bucket::Person(Vec::new()))
        {
            roles.push(RoleRows {
                role: role.clone(),
                rows: rows.clone(),
            });
        }
    }

    grouping.row_count = all.len();
    grouping
        .buckets
        .insert(BucketKey::all(layout), Bucket::Combined(all));

    tracing::debug!(
        rows = grouping.row_count,
        buckets = grouping.buckets.len(),
        "grouped rota rows"
    );
    Ok(grouping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RotaConfig;
    use crate::shift::ShiftError;

    fn rows(data: &[&[(&str, &str)]]) -> Vec<Result<Row, SourceError>> {
        data.iter().map(|r| Ok(Row::new(r.iter().copied()))).collect()
    }

    fn multi() -> ShiftResolver {
        ShiftResolver::new(RotaConfig::multi().unwrap().roles)
    }

    #[test]
    fn night_roles_fold_into_their_job() {
        let input = rows(&[
            &[("Date", "01/04/2020"), ("SHO", "Alice"), ("Night SHO", "Bob")],
            &[("Date", "02/04/2020"), ("SHO", "Bob"), ("Night SHO", "Alice")],
        ]);
        let g = group_rows(input, &multi(), Layout::PerPersonJob).unwrap();

        let alice = BucketKey::new("Alice", Some("SHO".into()));
        let Some(Bucket::Person(roles)) = g.buckets.get(&alice) else {
            panic!("missing Alice bucket");
        };
        let names: Vec<_> = roles.iter().map(|r| r.role.as_str()).collect();
        assert_eq!(names, vec!["Night SHO", "SHO"]);
        assert_eq!(g.buckets[&alice].row_count(), 2);
        assert_eq!(g.counts()[&BucketKey::all(Layout::PerPersonJob)], 2);
        assert_eq!(g.buckets.len(), 3);
    }

    #[test]
    fn role_buckets_cover_every_cell() {
        let input = rows(&[
            &[("Date", "01/04/2020"), ("SHO", "Alice"), ("SpR", "Bob"), ("Consultant", "Dr C")],
            &[("Date", "02/04/2020"), ("SHO", "Alice"), ("SpR", "Carol"), ("Consultant", "Dr C")],
            &[("Date", "03/04/2020"), ("SHO", "Dan"), ("SpR", "Bob"), ("Consultant", "Dr D")],
        ]);
        let g = group_rows(input, &multi(), Layout::PerPersonJob).unwrap();
        let total: usize = g.by_role.values().map(Vec::len).sum();
        assert_eq!(total, 3 * 3);
        let alice = &g.by_role[&("Alice".to_string(), "SHO".to_string())];
        let order: Vec<_> = alice.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn blank_cells_assign_nobody() {
        let input = rows(&[&[("Date", "01/04/2020"), ("SHO", "Alice"), ("SpR", "")]]);
        let g = group_rows(input, &multi(), Layout::PerPersonJob).unwrap();
        assert_eq!(g.by_role.len(), 1);
    }

    #[test]
    fn per_person_layout_drops_the_job() {
        let resolver = ShiftResolver::new(RotaConfig::simple().unwrap().roles);
        let input = rows(&[
            &[("Date", "01/04/2020"), ("On-Call", "Alice")],
            &[("Date", "02/04/2020"), ("On-Call", "Alice")],
        ]);
        let g = group_rows(input, &resolver, Layout::PerPerson).unwrap();
        let counts = g.counts();
        assert_eq!(counts[&BucketKey::new("Alice", None)], 2);
        assert_eq!(counts[&BucketKey::new("All", None)], 2);
    }

    #[test]
    fn unknown_column_fails_fast() {
        let input = rows(&[&[("Date", "01/04/2020"), ("Registrar", "Alice")]]);
        let err = group_rows(input, &multi(), Layout::PerPersonJob).unwrap_err();
        assert!(matches!(
            err,
            GroupingError::Shift(ShiftError::UnknownRole(ref r)) if r == "Registrar"
        ));
    }

    #[test]
    fn bad_date_is_fatal_with_row_number() {
        let input = rows(&[
            &[("Date", "01/04/2020"), ("SHO", "Alice")],
            &[("Date", "someday"), ("SHO", "Alice")],
        ]);
        let err = group_rows(input, &multi(), Layout::PerPersonJob).unwrap_err();
        assert!(matches!(err, GroupingError::Date { row: 2, .. }));
        assert_eq!(err.to_string(), "row 2: unrecognised date format: \"someday\"");
    }

    #[test]
    fn reserved_name_is_rejected() {
        let input = rows(&[&[("Date", "01/04/2020"), ("SHO", "All")]]);
        assert!(matches!(
            group_rows(input, &multi(), Layout::PerPersonJob),
            Err(GroupingError::ReservedName { row: 1 })
        ));
    }
}
