use std::io::Write;

use learnapp::explorer::engine::ExplorationEngine;
use learnapp::explorer::strategy::ExplorationStrategy;
use learnapp::observe::observer::NullObserver;
use learnapp::persist::records::{DiscoveryOrigin, StoredRecord};
use learnapp::persist::store::{JsonlStore, PersistError, load_records};
use learnapp::provider::clock::ManualClock;
use learnapp::provider::scripted::ScriptedApp;
use learnapp::report::run_record::RunRecord;

mod common;
use common::{explore_fixture, fixture};

fn explore_to_file(name: &str, path: &std::path::Path) {
    let mut app = ScriptedApp::from_yaml_str(&fixture(name)).unwrap();
    let package = app.package().to_string();
    let clock = ManualClock::new();
    let mut store = JsonlStore::create(path).unwrap();
    let observer = NullObserver;

    let mut engine = ExplorationEngine::new(
        ExplorationStrategy::default(),
        &mut app,
        &clock,
        &mut store,
        &observer,
    );
    engine.run(&package).unwrap();
}

// ============================================================================
// JSON-lines store
// ============================================================================

#[test]
fn jsonl_store_matches_memory_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");
    explore_to_file("cycle.yaml", &path);

    let from_file = load_records(&path).unwrap();
    let in_memory = explore_fixture("cycle.yaml", ExplorationStrategy::default());

    let count = |records: &[StoredRecord], want: fn(&StoredRecord) -> bool| records.iter().filter(|r| want(r)).count();
    assert_eq!(
        count(&from_file, |r| matches!(r, StoredRecord::Screen(_))),
        in_memory.store.screens.len()
    );
    assert_eq!(
        count(&from_file, |r| matches!(r, StoredRecord::Element(_))),
        in_memory.store.elements.len()
    );
    assert_eq!(
        count(&from_file, |r| matches!(r, StoredRecord::Edge(_))),
        in_memory.store.edges.len()
    );
    assert!(matches!(from_file.last(), Some(StoredRecord::Session(_))));
}

#[test]
fn records_are_written_as_tagged_json_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");
    explore_to_file("two_screens.yaml", &path);

    let content = std::fs::read_to_string(&path).unwrap();
    let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(first["record"], "screen");
    assert_eq!(first["depth"], 0);
    assert!(content.lines().any(|l| l.contains("\"record\":\"edge\"")));
    assert!(content.lines().last().unwrap().contains("\"record\":\"session\""));
}

#[test]
fn create_truncates_an_existing_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.jsonl");
    explore_to_file("two_screens.yaml", &path);
    let first = load_records(&path).unwrap().len();
    explore_to_file("two_screens.yaml", &path);

    assert_eq!(load_records(&path).unwrap().len(), first);
}

#[test]
fn load_reports_the_offending_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file).unwrap();
    writeln!(file, "{{\"record\":\"bogus\"}}").unwrap();

    match load_records(file.path()) {
        Err(PersistError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn load_missing_file_is_an_io_error() {
    let err = load_records(std::path::Path::new("no/such/run.jsonl")).unwrap_err();
    assert!(matches!(err, PersistError::Io { .. }));
    assert!(err.to_string().contains("no/such/run.jsonl"));
}

// ============================================================================
// RunRecord
// ============================================================================

#[test]
fn run_record_rebuilds_the_graph() {
    let out = explore_fixture("chain.yaml", ExplorationStrategy::default());
    let run = RunRecord::from_records(out.store.records());

    let graph = run.to_graph();
    assert_eq!(graph.screen_count(), out.graph.screen_count());
    assert_eq!(graph.edges(), out.graph.edges());
    assert_eq!(run.summary.as_ref(), Some(&out.summary));
}

#[test]
fn interrupted_run_has_no_summary_and_drops_dangling_edges() {
    let out = explore_fixture("two_screens.yaml", ExplorationStrategy::default());
    let records: Vec<StoredRecord> = out
        .store
        .records()
        .into_iter()
        .filter(|r| !matches!(r, StoredRecord::Session(_)))
        .filter(|r| !matches!(r, StoredRecord::Screen(s) if s.depth == 1))
        .collect();

    let run = RunRecord::from_records(records);
    assert!(run.summary.is_none());
    assert_eq!(run.edges.len(), 1);
    let graph = run.to_graph();
    assert_eq!(graph.screen_count(), 1);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn element_labels_cover_every_origin() {
    let out = explore_fixture("overlay_menu.yaml", ExplorationStrategy::default());
    let run = RunRecord::from_records(out.store.records());
    let labels = run.element_labels();

    for record in &out.store.elements {
        assert_eq!(labels.get(&record.element.fingerprint), Some(&record.element.display_name()));
    }
    assert!(run.elements.iter().any(|r| r.origin == DiscoveryOrigin::Overlay));
}
