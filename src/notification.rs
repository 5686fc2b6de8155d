use crate::model::BucketKey;
use std::cell::RefCell;

/// Personne (ou couple personne/poste) absente du snapshot précédent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntrant {
    pub key: BucketKey,
    pub rows: usize,
}

impl NewEntrant {
    pub fn message(&self) -> String {
        format!("New name in rota: {} with {} rows", self.key, self.rows)
    }
}

/// Permet de choisir où partent les annonces (console, tests, etc.).
pub trait EntrantNotifier {
    fn notify(&self, entrant: &NewEntrant);
}

/// Écrit l'annonce sur la sortie standard.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl EntrantNotifier for ConsoleNotifier {
    fn notify(&self, entrant: &NewEntrant) {
        tracing::info!(person = %entrant.key.person, rows = entrant.rows, "new roster entrant");
        println!("{}", entrant.message());
    }
}

/// Garde les annonces en mémoire.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    seen: RefCell<Vec<NewEntrant>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<NewEntrant> {
        self.seen.take()
    }
}

impl EntrantNotifier for CollectingNotifier {
    fn notify(&self, entrant: &NewEntrant) {
        self.seen.borrow_mut().push(entrant.clone());
    }
}
