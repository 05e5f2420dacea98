use serde::{Deserialize, Serialize};

use crate::state::fingerprint::{ElementFingerprint, ScreenFingerprint};
use crate::tree::elements::ElementClass;
use crate::tree::node_model::{Bounds, ElementRef, WindowKind};

/// One interactive element found while scanning a screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementInfo {
    pub fingerprint: ElementFingerprint,
    /// Where the element lived in the snapshot it was scanned from.
    pub target: ElementRef,
    pub class_name: String,
    pub label: Option<String>,
    pub resource_id: Option<String>,
    pub bounds: Bounds,
    pub clickable: bool,
    pub class: ElementClass,
    /// Destructive action (delete, logout, uninstall...). Never clicked.
    pub dangerous: bool,
    pub window_kind: WindowKind,
    pub expanded: Option<bool>,
}

impl ElementInfo {
    /// Label for logs and reports.
    pub fn display_name(&self) -> String {
        self.label
            .clone()
            .or_else(|| self.resource_id.clone())
            .unwrap_or_else(|| self.class_name.rsplit('.').next().unwrap_or("").to_string())
    }
}

/// Immutable capture of one screen.
///
/// Two captures are equal when their fingerprints are equal; the element
/// list and timestamp do not take part in the comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenState {
    pub fingerprint: ScreenFingerprint,
    pub package: String,
    /// Interactive elements in tree order.
    pub elements: Vec<ElementInfo>,
    /// Ids of the windows that make up the screen, bottom-most first.
    pub window_ids: Vec<u32>,
    /// Session clock at capture time.
    pub captured_at_ms: u64,
}

impl PartialEq for ScreenState {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for ScreenState {}

impl ScreenState {
    pub fn window_count(&self) -> usize {
        self.window_ids.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn element(&self, fingerprint: &ElementFingerprint) -> Option<&ElementInfo> {
        self.elements.iter().find(|e| &e.fingerprint == fingerprint)
    }

    pub fn elements_in_windows<'a>(&'a self, window_ids: &'a [u32]) -> impl Iterator<Item = &'a ElementInfo> {
        self.elements
            .iter()
            .filter(move |e| window_ids.contains(&e.target.window_id))
    }
}
