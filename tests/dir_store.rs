use std::{collections::BTreeMap, fs, path::Path};

use chrono::{DateTime, NaiveDate};
use tempfile::TempDir;

use agent_trends::{
    agent::AgentRecord,
    core::roster::Roster,
    engine::tracker::{DeltaEngine, EngineError},
    persist::{PersistError, SnapshotStore, fs::DirSnapshotStore},
    types::{SnapshotDate, SubsetLabel},
};

fn day(d: u32) -> SnapshotDate {
    NaiveDate::from_ymd_opt(2024, 1, d).expect("date")
}

fn record(id: &str) -> AgentRecord {
    AgentRecord::new(id)
        .with_last_seen(DateTime::from_timestamp(1_704_067_200, 0).expect("ts"))
        .with_attribute("platform", "LINUX")
        .with_attribute("groups", serde_json::json!(["web", "prod"]))
}

fn roster(d: u32, ids: &[&str]) -> Roster {
    Roster::from_records(day(d), ids.iter().map(|id| record(id))).expect("roster")
}

/// Every file under `root`, keyed by relative path.
fn snapshot_files(root: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut out = BTreeMap::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).expect("read dir") {
            let path = entry.expect("entry").path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(root).expect("prefix").display().to_string();
                out.insert(rel, fs::read(&path).expect("read file"));
            }
        }
    }
    out
}

#[test]
fn layout_uses_one_directory_per_date() {
    let tmp = TempDir::new().expect("tmp");
    let mut store = DirSnapshotStore::open(tmp.path()).expect("open");
    store.write_roster(&roster(1, &["b", "a"])).expect("write");
    store.write_roster(&roster(2, &["b", "c"])).expect("write");

    let mut engine = DeltaEngine::new(store);
    engine.compute_latest(true).expect("compute");

    let files = snapshot_files(tmp.path());
    let names: Vec<&str> = files.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "2024-01-01/agents.json",
            "2024-01-01/new.json",
            "2024-01-01/stats.json",
            "2024-01-01/unlinked.json",
            "2024-01-02/agents.json",
            "2024-01-02/new.json",
            "2024-01-02/stats.json",
            "2024-01-02/unlinked.json",
            "stats.json",
        ]
    );
    assert!(files.values().all(|bytes| bytes.ends_with(b"\n")));

    let first = String::from_utf8(files["2024-01-01/agents.json"].clone()).expect("utf8");
    let a = first.find("\"id\": \"a\"").expect("a present");
    let b = first.find("\"id\": \"b\"").expect("b present");
    assert!(a < b, "roster file must be sorted by id");
}

#[test]
fn malformed_and_incomplete_entries_are_ignored() {
    let tmp = TempDir::new().expect("tmp");
    let mut store = DirSnapshotStore::open(tmp.path()).expect("open");
    store.write_roster(&roster(3, &["a"])).expect("write");

    fs::create_dir(tmp.path().join("2024-1-4")).expect("mkdir");
    fs::write(tmp.path().join("2024-1-4/agents.json"), "[]").expect("write");
    fs::create_dir(tmp.path().join(".cache")).expect("mkdir");
    fs::create_dir(tmp.path().join("notes")).expect("mkdir");
    fs::create_dir(tmp.path().join("2024-01-05")).expect("mkdir");
    fs::write(tmp.path().join("2024-01-06"), "not a directory").expect("write");

    assert_eq!(store.list_available_dates().expect("dates"), vec![day(3)]);
}

#[test]
fn missing_root_is_an_empty_store() {
    let tmp = TempDir::new().expect("tmp");
    let root = tmp.path().join("data");
    let store = DirSnapshotStore::open(&root).expect("open");
    fs::remove_dir(&root).expect("remove");

    assert!(store.list_available_dates().expect("dates").is_empty());
    let err = DeltaEngine::new(store).compute_latest(false).unwrap_err();
    assert!(matches!(err, EngineError::EmptyStore));
}

#[test]
fn read_roster_round_trips_and_reports_missing_dates() {
    let tmp = TempDir::new().expect("tmp");
    let mut store = DirSnapshotStore::open(tmp.path()).expect("open");
    let original = roster(1, &["x", "y"]);
    store.write_roster(&original).expect("write");

    assert_eq!(store.read_roster(day(1)).expect("read"), original);
    let err = store.read_roster(day(2)).unwrap_err();
    assert!(matches!(err, PersistError::RosterNotFound(d) if d == day(2)));
}

#[test]
fn recompute_all_is_byte_for_byte_idempotent() {
    let tmp = TempDir::new().expect("tmp");
    let mut store = DirSnapshotStore::open(tmp.path()).expect("open");
    store.write_roster(&roster(1, &["a", "b", "c", "d"])).expect("write");
    store.write_roster(&roster(2, &["c", "d", "e"])).expect("write");
    store.write_roster(&roster(3, &["a", "e", "f", "g"])).expect("write");

    let mut engine = DeltaEngine::new(store);
    let first_series = engine.compute_latest(true).expect("first");
    let first_files = snapshot_files(engine.store().root());

    let second_series = engine.compute_latest(true).expect("second");
    let store = engine.into_store();
    let second_files = snapshot_files(store.root());

    assert_eq!(store.root(), tmp.path());
    assert_eq!(first_series, second_series);
    assert_eq!(first_files, second_files);
}

#[test]
fn series_is_rebuilt_after_its_artifact_is_lost() {
    let tmp = TempDir::new().expect("tmp");
    let mut store = DirSnapshotStore::open(tmp.path()).expect("open");
    store.write_roster(&roster(1, &["a"])).expect("write");
    store.write_roster(&roster(2, &["a", "b"])).expect("write");

    let mut engine = DeltaEngine::new(store);
    let expected = engine.compute_latest(true).expect("compute");

    fs::remove_file(engine.store().series_path()).expect("remove");
    assert!(engine.store().read_series().expect("read").is_none());

    let rebuilt = engine.series().expect("rebuild");
    assert_eq!(rebuilt, expected);
    assert!(engine.store().series_path().is_file());
}

#[test]
fn corrupted_series_is_replaced_by_the_next_run() {
    let tmp = TempDir::new().expect("tmp");
    let mut store = DirSnapshotStore::open(tmp.path()).expect("open");
    store.write_roster(&roster(1, &["a"])).expect("write");
    fs::write(store.series_path(), "{ not json").expect("corrupt");

    assert!(matches!(store.read_series(), Err(PersistError::Serde(_))));

    let mut engine = DeltaEngine::new(store);
    let series = engine.compute_latest(false).expect("compute");
    assert_eq!(engine.store().read_series().expect("read"), Some(series));
}

#[test]
fn unsupported_series_version_is_rejected() {
    let tmp = TempDir::new().expect("tmp");
    let store = DirSnapshotStore::open(tmp.path()).expect("open");
    fs::write(store.series_path(), r#"{"format_version": 99, "series": []}"#).expect("write");

    assert!(matches!(store.read_series(), Err(PersistError::UnsupportedFormat(99))));
}

#[test]
fn subsets_overwrite_previous_content() {
    let tmp = TempDir::new().expect("tmp");
    let mut store = DirSnapshotStore::open(tmp.path()).expect("open");

    store
        .write_subset(day(1), SubsetLabel::New, &[record("a"), record("b")])
        .expect("write");
    store.write_subset(day(1), SubsetLabel::New, &[record("c")]).expect("rewrite");

    let got = store.read_subset(day(1), SubsetLabel::New).expect("read").expect("present");
    assert_eq!(got, vec![record("c")]);
    assert!(store.read_subset(day(1), SubsetLabel::Unlinked).expect("read").is_none());
    // a subset alone does not make a date available
    assert!(store.list_available_dates().expect("dates").is_empty());
}
