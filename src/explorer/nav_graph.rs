use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::explorer::error::ExplorerError;
use crate::state::fingerprint::{ElementFingerprint, ScreenFingerprint};

// ============================================================================
// Navigation graph data model
// ============================================================================

/// A screen reached during exploration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenNode {
    pub fingerprint: ScreenFingerprint,

    pub package: String,

    /// Number of hops from the start screen
    pub depth: usize,

    pub element_count: usize,

    /// Session clock when first captured
    pub discovered_at_ms: u64,
}

/// Directed edge: clicking `element` on `from` led to `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavigationEdge {
    pub from: ScreenFingerprint,
    pub element: ElementFingerprint,
    pub to: ScreenFingerprint,
    pub traversed_at_ms: u64,
}

/// Append-only graph of discovered screens and transitions.
///
/// Duplicate edges are kept: how often a transition was taken is useful when
/// diagnosing a run. Consumers deduplicate (see `report::graph`).
#[derive(Debug, Clone, Default)]
pub struct NavigationGraph {
    screens: Vec<ScreenNode>,
    index: HashMap<ScreenFingerprint, usize>,
    edges: Vec<NavigationEdge>,
}

impl NavigationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reachable screen. Returns `false` if it was already known;
    /// the first registration wins.
    pub fn add_screen(&mut self, node: ScreenNode) -> bool {
        if self.index.contains_key(&node.fingerprint) {
            return false;
        }
        self.index.insert(node.fingerprint.clone(), self.screens.len());
        self.screens.push(node);
        true
    }

    /// Record a transition. Both endpoints must already be registered.
    pub fn add_edge(
        &mut self,
        from: &ScreenFingerprint,
        element: &ElementFingerprint,
        to: &ScreenFingerprint,
        traversed_at_ms: u64,
    ) -> Result<&NavigationEdge, ExplorerError> {
        for endpoint in [from, to] {
            if !self.contains(endpoint) {
                return Err(ExplorerError::UnknownScreen(endpoint.clone()));
            }
        }
        self.edges.push(NavigationEdge {
            from: from.clone(),
            element: element.clone(),
            to: to.clone(),
            traversed_at_ms,
        });
        Ok(&self.edges[self.edges.len() - 1])
    }

    pub fn contains(&self, fingerprint: &ScreenFingerprint) -> bool {
        self.index.contains_key(fingerprint)
    }

    pub fn screen(&self, fingerprint: &ScreenFingerprint) -> Option<&ScreenNode> {
        self.index.get(fingerprint).map(|i| &self.screens[*i])
    }

    /// Screens in discovery order.
    pub fn screens(&self) -> &[ScreenNode] {
        &self.screens
    }

    pub fn edges(&self) -> &[NavigationEdge] {
        &self.edges
    }

    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn outgoing<'a>(&'a self, from: &'a ScreenFingerprint) -> impl Iterator<Item = &'a NavigationEdge> {
        self.edges.iter().filter(move |e| &e.from == from)
    }
}
