use std::collections::HashMap;

use crate::explorer::nav_graph::{NavigationEdge, NavigationGraph};
use crate::state::fingerprint::{ElementFingerprint, ScreenFingerprint};

// ============================================================================
// Edge deduplication
// ============================================================================

/// A distinct (from, element, to) transition and how often it was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeFrequency {
    pub from: ScreenFingerprint,
    pub element: ElementFingerprint,
    pub to: ScreenFingerprint,
    pub count: usize,
    pub first_traversed_ms: u64,
}

/// Collapse repeated traversals, keeping first-seen order.
pub fn dedupe_edges(edges: &[NavigationEdge]) -> Vec<EdgeFrequency> {
    let mut out: Vec<EdgeFrequency> = Vec::new();
    let mut seen: HashMap<(&ScreenFingerprint, &ElementFingerprint, &ScreenFingerprint), usize> = HashMap::new();

    for edge in edges {
        let key = (&edge.from, &edge.element, &edge.to);
        match seen.get(&key) {
            Some(&idx) => out[idx].count += 1,
            None => {
                seen.insert(key, out.len());
                out.push(EdgeFrequency {
                    from: edge.from.clone(),
                    element: edge.element.clone(),
                    to: edge.to.clone(),
                    count: 1,
                    first_traversed_ms: edge.traversed_at_ms,
                });
            }
        }
    }
    out
}

// ============================================================================
// Graphviz export
// ============================================================================

/// Render the graph as Graphviz DOT.
///
/// `label_of` names an element for edge labels; unnamed elements fall back to
/// their short fingerprint.
pub fn to_dot<F>(graph: &NavigationGraph, label_of: F) -> String
where
    F: Fn(&ElementFingerprint) -> Option<String>,
{
    let mut out = String::from("digraph navigation {\n");
    out.push_str("  rankdir=LR;\n");
    out.push_str("  node [shape=box, fontname=\"monospace\"];\n");

    for screen in graph.screens() {
        out.push_str(&format!(
            "  \"{}\" [label=\"{}\\ndepth {} | {} elements\"];\n",
            screen.fingerprint.short(),
            screen.fingerprint.short(),
            screen.depth,
            screen.element_count
        ));
    }

    for edge in dedupe_edges(graph.edges()) {
        let name = label_of(&edge.element).unwrap_or_else(|| edge.element.short().to_string());
        let label = if edge.count > 1 {
            format!("{} (x{})", name, edge.count)
        } else {
            name
        };
        out.push_str(&format!(
            "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
            edge.from.short(),
            edge.to.short(),
            escape_dot(&label)
        ));
    }

    out.push_str("}\n");
    out
}

fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(from: &str, element: &str, to: &str, at: u64) -> NavigationEdge {
        NavigationEdge {
            from: ScreenFingerprint::from_hex(from),
            element: ElementFingerprint::from_hex(element),
            to: ScreenFingerprint::from_hex(to),
            traversed_at_ms: at,
        }
    }

    #[test]
    fn dedupe_counts_repeats_in_first_seen_order() {
        let edges = vec![
            edge("aa", "e1", "bb", 10),
            edge("bb", "e2", "aa", 20),
            edge("aa", "e1", "bb", 30),
        ];
        let deduped = dedupe_edges(&edges);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].count, 2);
        assert_eq!(deduped[0].first_traversed_ms, 10);
        assert_eq!(deduped[1].count, 1);
    }

    #[test]
    fn escape_quotes_in_labels() {
        assert_eq!(escape_dot("say \"hi\""), "say \\\"hi\\\"");
    }
}
