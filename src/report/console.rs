use crate::explorer::nav_graph::NavigationGraph;
use crate::explorer::session::{ExplorationSummary, TerminationReason};
use crate::report::graph::dedupe_edges;

// ============================================================================
// Console summary
// ============================================================================

/// Format an exploration summary for terminal output.
///
/// Produces output like:
/// ```text
/// === Exploration: com.example.app ===
///
/// Screens:    3 (max depth 2)
/// Elements:   14 (2 dangerous skipped)
/// Edges:      4 recorded, 3 distinct
/// Clicks:     9 (1 failed)
/// Abandoned:  1 branch(es), 0 external exit(s)
///
///   [0] 3f9a01c2d4  6 elements, 2 outgoing
///   [1] 77be0a41f0  5 elements, 1 outgoing
///
/// === Result: completed in 12.5s ===
/// ```
pub fn format_console_summary(summary: &ExplorationSummary, graph: &NavigationGraph) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Exploration: {} ===\n\n", summary.package));

    let distinct = dedupe_edges(graph.edges()).len();
    out.push_str(&format!(
        "Screens:    {} (max depth {})\n",
        summary.screens_discovered, summary.max_depth_reached
    ));
    out.push_str(&format!(
        "Elements:   {} ({} dangerous skipped)\n",
        summary.elements_discovered, summary.dangerous_skipped
    ));
    out.push_str(&format!(
        "Edges:      {} recorded, {} distinct\n",
        summary.edges_recorded, distinct
    ));
    out.push_str(&format!(
        "Clicks:     {} ({} failed)\n",
        summary.interactions, summary.interaction_failures
    ));
    out.push_str(&format!(
        "Abandoned:  {} branch(es), {} external exit(s)\n",
        summary.branches_abandoned, summary.external_exits
    ));

    if graph.screen_count() > 0 {
        out.push('\n');
        let mut screens: Vec<_> = graph.screens().iter().collect();
        screens.sort_by_key(|s| (s.depth, s.discovered_at_ms));
        for screen in screens {
            out.push_str(&format!(
                "  [{}] {}  {} elements, {} outgoing\n",
                screen.depth,
                screen.fingerprint.short(),
                screen.element_count,
                graph.outgoing(&screen.fingerprint).count()
            ));
        }
    }

    let result = match summary.termination {
        TerminationReason::Completed => "completed",
        TerminationReason::TimedOut => "timed out (partial)",
        TerminationReason::ScreenLimit => "screen limit reached (partial)",
    };
    out.push_str(&format!(
        "\n=== Result: {} in {:.1}s ===\n",
        result,
        summary.elapsed_ms as f64 / 1000.0
    ));

    out
}
