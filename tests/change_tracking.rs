#![forbid(unsafe_code)]
use rotacal::{
    reconcile, run_on_call, run_table, track, BucketKey, CollectingNotifier, CsvSnapshotStore,
    Layout, OnCallConfig, RotaConfig, RunOptions, Snapshot, Storage,
};
use std::fs;
use tempfile::tempdir;

fn key(person: &str, job: &str) -> BucketKey {
    BucketKey::new(person, Some(job.to_string()))
}

#[test]
fn new_entrants_are_reported_against_the_stored_snapshot() {
    let dir = tempdir().unwrap();
    let store = CsvSnapshotStore::open(dir.path(), Layout::PerPersonJob);
    store
        .persist(&Snapshot::from([(key("Alice", "SHO"), 3)]))
        .unwrap();

    let current = Snapshot::from([(key("Alice", "SHO"), 5), (key("Carol", "SpR"), 1)]);
    let notifier = CollectingNotifier::new();
    let fresh = track(&store, current.clone(), &notifier).unwrap();

    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].key, key("Carol", "SpR"));
    assert_eq!(fresh[0].rows, 1);
    assert_eq!(notifier.take(), fresh);
    assert_eq!(store.load().unwrap(), current);
}

#[test]
fn tracking_twice_is_quiet_and_stable() {
    let dir = tempdir().unwrap();
    let store = CsvSnapshotStore::open(dir.path(), Layout::PerPersonJob);
    let current = Snapshot::from([(key("Alice", "SHO"), 5), (key("Bob", "SpR"), 2)]);

    let first = track(&store, current.clone(), &CollectingNotifier::new()).unwrap();
    let after_first = fs::read(store.path()).unwrap();
    let second = track(&store, current.clone(), &CollectingNotifier::new()).unwrap();
    let after_second = fs::read(store.path()).unwrap();

    assert_eq!(first.len(), 2);
    assert!(second.is_empty());
    assert_eq!(after_first, after_second);
    assert!(reconcile(&store.load().unwrap(), current).new_entrants.is_empty());
}

#[test]
fn rerunning_the_same_rota_reports_nobody() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("multi.csv");
    fs::write(
        &input,
        "Date,SHO,SpR,Consultant,Night SHO,Night SpR\n\
         01/04/2020,Alice,Bob,Dr C,Dan,Eve\n\
         2020/04/02,Dan,Eve,Dr C,Alice,Bob\n",
    )
    .unwrap();
    let opts = RunOptions {
        input,
        sheet: 0,
        out_dir: dir.path().join("generated"),
    };
    let config = RotaConfig::multi().unwrap();

    let first = run_table(&config, &opts, &CollectingNotifier::new()).unwrap();
    let snapshot = fs::read_to_string(opts.out_dir.join("last_names.csv")).unwrap();
    let second = run_table(&config, &opts, &CollectingNotifier::new()).unwrap();

    // Alice, Bob, Dan, Eve regroupés sur leur poste, Dr C, puis All
    assert_eq!(first.new_entrants.len(), 6);
    assert!(second.new_entrants.is_empty());
    assert_eq!(
        snapshot,
        fs::read_to_string(opts.out_dir.join("last_names.csv")).unwrap()
    );
    assert!(snapshot.contains("Alice,SHO,2\n"));
    assert!(snapshot.contains("Dr C,Consultant,2\n"));
}

#[test]
fn on_call_rota_counts_only_the_window() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("unusual.csv");
    fs::write(
        &input,
        "Day,Name,Notes\n\
         5 Dec 2017,Jones,\n\
         6,jones (am),\n\
         6,Smith,clash\n\
         9,Smith,bleep 42\n\
         7 Mar 2018,Smith,\n",
    )
    .unwrap();
    let out = dir.path().join("generated");
    let opts = RunOptions {
        input,
        sheet: 0,
        out_dir: out.clone(),
    };
    let mut config = OnCallConfig::unusual().unwrap();
    config.start_day = chrono::NaiveDate::from_ymd_opt(2017, 11, 1).unwrap();

    let summary = run_on_call(&config, &opts, &CollectingNotifier::new()).unwrap();
    assert_eq!(summary.issues.len(), 2);
    assert_eq!(summary.calendars.len(), 3);
    let snapshot = fs::read_to_string(out.join("last_names.csv")).unwrap();
    assert_eq!(snapshot, "name,number\nAll,2\nJONES,1\nSMITH,1\n");

    let smith = fs::read_to_string(out.join("rota_SMITH.ics")).unwrap();
    assert!(smith.contains("SUMMARY:On-Call (bleep 42)"));
    assert!(smith.contains("SUMMARY:Lieu"));
    assert!(smith.contains("VALUE=DATE"));
    assert!(smith.contains("DURATION:P1D"));
}
