use std::collections::HashMap;

use crate::explorer::nav_graph::{NavigationEdge, NavigationGraph, ScreenNode};
use crate::explorer::session::ExplorationSummary;
use crate::persist::records::{ElementRecord, StoredRecord};
use crate::state::fingerprint::ElementFingerprint;

/// A persisted run, regrouped by record kind.
#[derive(Debug, Clone, Default)]
pub struct RunRecord {
    pub screens: Vec<ScreenNode>,
    pub elements: Vec<ElementRecord>,
    pub edges: Vec<NavigationEdge>,
    /// Missing when the run was interrupted before finishing.
    pub summary: Option<ExplorationSummary>,
}

impl RunRecord {
    pub fn from_records(records: Vec<StoredRecord>) -> Self {
        let mut run = RunRecord::default();
        for record in records {
            match record {
                StoredRecord::Screen(screen) => run.screens.push(screen),
                StoredRecord::Element(element) => run.elements.push(element),
                StoredRecord::Edge(edge) => run.edges.push(edge),
                StoredRecord::Session(summary) => run.summary = Some(summary),
            }
        }
        run
    }

    /// Rebuild the navigation graph. Edges with an unknown endpoint are
    /// skipped with a warning.
    pub fn to_graph(&self) -> NavigationGraph {
        let mut graph = NavigationGraph::new();
        for screen in &self.screens {
            graph.add_screen(screen.clone());
        }
        for edge in &self.edges {
            if let Err(e) = graph.add_edge(&edge.from, &edge.element, &edge.to, edge.traversed_at_ms) {
                eprintln!("Warning: skipping edge: {}", e);
            }
        }
        graph
    }

    /// Display names of every recorded element, first registration wins.
    pub fn element_labels(&self) -> HashMap<ElementFingerprint, String> {
        let mut labels = HashMap::new();
        for record in &self.elements {
            labels
                .entry(record.element.fingerprint.clone())
                .or_insert_with(|| record.element.display_name());
        }
        labels
    }
}
