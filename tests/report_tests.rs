use learnapp::explorer::nav_graph::{NavigationGraph, ScreenNode};
use learnapp::explorer::session::{ExplorationSession, TerminationReason};
use learnapp::explorer::strategy::ExplorationStrategy;
use learnapp::report::console::format_console_summary;
use learnapp::report::graph::{dedupe_edges, to_dot};
use learnapp::report::run_record::RunRecord;
use learnapp::state::fingerprint::{ElementFingerprint, ScreenFingerprint};

mod common;
use common::explore_fixture;

// ============================================================================
// Helper builders
// ============================================================================

fn screen(hex: &str, depth: usize, at: u64) -> ScreenNode {
    ScreenNode {
        fingerprint: ScreenFingerprint::from_hex(hex),
        package: "com.example".into(),
        depth,
        element_count: 3,
        discovered_at_ms: at,
    }
}

fn sample_graph() -> NavigationGraph {
    let mut graph = NavigationGraph::new();
    graph.add_screen(screen("aaaaaaaaaaaaaaaa", 0, 0));
    graph.add_screen(screen("bbbbbbbbbbbbbbbb", 1, 10));
    let (a, b) = (ScreenFingerprint::from_hex("aaaaaaaaaaaaaaaa"), ScreenFingerprint::from_hex("bbbbbbbbbbbbbbbb"));
    let open = ElementFingerprint::from_hex("0101010101");
    let back = ElementFingerprint::from_hex("0202020202");
    graph.add_edge(&a, &open, &b, 10).unwrap();
    graph.add_edge(&b, &back, &a, 20).unwrap();
    graph.add_edge(&a, &open, &b, 30).unwrap();
    graph
}

// ============================================================================
// Console summary
// ============================================================================

#[test]
fn console_summary_lists_counts_and_result() {
    let graph = sample_graph();
    let mut session = ExplorationSession::start("com.example", 0);
    session.screens_discovered = 2;
    session.edges_recorded = 3;
    session.interactions = 4;
    session.interaction_failures = 1;
    session.dangerous_skipped = 2;
    let summary = session.finalize(TerminationReason::Completed, 12_500);

    let text = format_console_summary(&summary, &graph);
    assert!(text.starts_with("=== Exploration: com.example ==="));
    assert!(text.contains("Screens:    2"));
    assert!(text.contains("Edges:      3 recorded, 2 distinct"));
    assert!(text.contains("Clicks:     4 (1 failed)"));
    assert!(text.contains("(2 dangerous skipped)"));
    assert!(text.contains("=== Result: completed in 12.5s ==="));
}

#[test]
fn console_summary_orders_screens_by_depth() {
    let graph = sample_graph();
    let summary = ExplorationSession::start("com.example", 0).finalize(TerminationReason::TimedOut, 1_000);

    let text = format_console_summary(&summary, &graph);
    let root = text.find("[0] aaaaaaaaaa").expect("root line");
    let child = text.find("[1] bbbbbbbbbb").expect("child line");
    assert!(root < child);
    assert!(text.contains("[0] aaaaaaaaaa  3 elements, 2 outgoing"));
    assert!(text.contains("timed out (partial)"));
}

#[test]
fn console_summary_of_scripted_run() {
    let out = explore_fixture("two_screens.yaml", ExplorationStrategy::default());
    let text = format_console_summary(&out.summary, &out.graph);

    assert!(text.contains("=== Exploration: com.example.notes ==="));
    assert!(text.contains("Screens:    2 (max depth 1)"));
    assert!(text.contains("=== Result: completed"));
}

// ============================================================================
// Graph export
// ============================================================================

#[test]
fn dedupe_collapses_repeated_traversals() {
    let graph = sample_graph();
    let edges = dedupe_edges(graph.edges());

    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].count, 2);
    assert_eq!(edges[0].first_traversed_ms, 10);
}

#[test]
fn dot_export_labels_edges() {
    let graph = sample_graph();
    let dot = to_dot(&graph, |fp| {
        (fp == &ElementFingerprint::from_hex("0101010101")).then(|| "Open \"details\"".to_string())
    });

    assert!(dot.starts_with("digraph navigation {\n"));
    assert!(dot.ends_with("}\n"));
    assert!(dot.contains("\"aaaaaaaaaa\" [label=\"aaaaaaaaaa\\ndepth 0 | 3 elements\"];"));
    assert!(dot.contains("\"aaaaaaaaaa\" -> \"bbbbbbbbbb\" [label=\"Open \\\"details\\\" (x2)\"];"));
    // Unnamed elements fall back to their short fingerprint.
    assert!(dot.contains("\"bbbbbbbbbb\" -> \"aaaaaaaaaa\" [label=\"0202020202\"];"));
}

#[test]
fn dot_export_of_recorded_run_uses_element_names() {
    let out = explore_fixture("cycle.yaml", ExplorationStrategy::default());
    let run = RunRecord::from_records(out.store.records());
    let labels = run.element_labels();

    let dot = to_dot(&run.to_graph(), |fp| labels.get(fp).cloned());
    assert_eq!(dot.matches(" -> ").count(), dedupe_edges(out.graph.edges()).len());
    assert!(!dot.contains("[label=\"\"]"));
}
