use serde::{Deserialize, Serialize};

use crate::explorer::nav_graph::{NavigationEdge, ScreenNode};
use crate::explorer::session::ExplorationSummary;
use crate::state::fingerprint::ScreenFingerprint;
use crate::state::state_model::ElementInfo;

/// How an element came to be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryOrigin {
    /// Found when the screen was first scanned.
    Screen,
    /// Listed in a popup opened by an expandable control.
    Overlay,
    /// Revealed in place by an expandable control.
    Revealed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementRecord {
    pub screen: ScreenFingerprint,
    pub origin: DiscoveryOrigin,
    pub element: ElementInfo,
}

/// One line of a persisted run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum StoredRecord {
    Screen(ScreenNode),
    Element(ElementRecord),
    Edge(NavigationEdge),
    Session(ExplorationSummary),
}
