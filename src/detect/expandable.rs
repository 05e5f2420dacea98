use serde::{Deserialize, Serialize};

use crate::state::diff::diff_elements;
use crate::state::state_model::{ElementInfo, ScreenState};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionType {
    /// Opens a new window: dropdown popup, overflow menu.
    Overlay,
    /// Reveals content inside the current window: expandable group, drawer.
    InPlace,
    /// Probably leads to a new screen ("See all").
    Navigation,
    None,
}

/// Verdict of the expandable-control detector for one element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpansionInfo {
    pub is_expandable: bool,
    pub expansion_type: ExpansionType,
    pub confidence: f32,
    pub reason: String,
}

impl ExpansionInfo {
    pub fn none() -> Self {
        Self {
            is_expandable: false,
            expansion_type: ExpansionType::None,
            confidence: 0.0,
            reason: "no expansion signals".into(),
        }
    }
}

const CHEVRONS: &[char] = &['▼', '▾', '⌄', '›', '▸', '⌵'];

/// Estimate whether interacting with `element` reveals hidden content.
///
/// Each matching signal adds its weight; the expansion type follows the
/// heaviest signal. The element counts as expandable only when the capped
/// confidence reaches `threshold`.
pub fn detect_expansion(element: &ElementInfo, threshold: f32) -> ExpansionInfo {
    let class = element.class_name.to_lowercase();
    let label = element.label.as_deref().unwrap_or("").to_lowercase();
    let id = element
        .resource_id
        .as_deref()
        .map(|id| id.rsplit('/').next().unwrap_or(id).to_lowercase())
        .unwrap_or_default();

    let mut signals: Vec<(f32, ExpansionType, &str)> = Vec::new();

    if class.contains("spinner") || class.contains("dropdown") || class.contains("autocompletetextview") {
        signals.push((0.6, ExpansionType::Overlay, "dropdown class"));
    }
    if element.expanded.is_some() {
        signals.push((0.6, ExpansionType::InPlace, "expand/collapse state"));
    }
    if label.contains("more options") {
        signals.push((0.5, ExpansionType::Overlay, "overflow menu"));
    }
    if label.contains("navigation drawer") || label.contains("open drawer") || label == "open menu" {
        signals.push((0.5, ExpansionType::InPlace, "navigation drawer"));
    }
    if element.label.as_deref().map(|l| l.contains(CHEVRONS)).unwrap_or(false) {
        signals.push((0.3, ExpansionType::InPlace, "chevron glyph"));
    }
    if ["see all", "show all", "view all"].iter().any(|k| label.contains(k)) {
        signals.push((0.25, ExpansionType::Navigation, "see-all wording"));
    } else if label.contains("show more") || label.split_whitespace().any(|w| w == "expand" || w == "more") {
        signals.push((0.25, ExpansionType::InPlace, "expand wording"));
    }
    if ["dropdown", "spinner", "overflow", "menu", "expand", "more"]
        .iter()
        .any(|k| id.contains(k))
    {
        signals.push((0.3, ExpansionType::Overlay, "resource id"));
    }

    if signals.is_empty() {
        return ExpansionInfo::none();
    }

    let confidence = signals.iter().map(|(w, _, _)| w).sum::<f32>().min(1.0);
    let (_, expansion_type, _) = signals
        .iter()
        .fold(signals[0], |best, s| if s.0 > best.0 { *s } else { best });
    let reason = signals
        .iter()
        .map(|(_, _, why)| *why)
        .collect::<Vec<_>>()
        .join(", ");

    ExpansionInfo {
        is_expandable: confidence >= threshold,
        expansion_type,
        confidence,
        reason,
    }
}

// ============================================================================
// Effect classification
// ============================================================================

/// Observed effect of interacting with an expandable control.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpansionEffect {
    /// New windows appeared on top of the screen.
    Overlay { window_ids: Vec<u32> },
    /// The same window grew; `revealed` are the new elements.
    InPlace { revealed: Vec<ElementInfo> },
    /// Same window set, different screen.
    Navigated,
    /// Nothing detectable happened.
    NoChange,
}

/// Four-way classification of a before/after pair around one interaction.
pub fn classify_effect(before: &ScreenState, after: &ScreenState) -> ExpansionEffect {
    let new_windows: Vec<u32> = after
        .window_ids
        .iter()
        .filter(|id| !before.window_ids.contains(id))
        .copied()
        .collect();

    if after.package == before.package
        && after.window_count() > before.window_count()
        && !new_windows.is_empty()
    {
        return ExpansionEffect::Overlay { window_ids: new_windows };
    }

    if after.fingerprint == before.fingerprint {
        return ExpansionEffect::NoChange;
    }

    let same_windows = new_windows.is_empty() && after.window_count() == before.window_count();
    if same_windows && after.package == before.package && after.element_count() > before.element_count() {
        let diff = diff_elements(before, after);
        // The original screen must still be mostly there.
        if diff.unchanged.len() * 2 >= before.element_count() && !diff.added.is_empty() {
            return ExpansionEffect::InPlace { revealed: diff.added };
        }
    }

    ExpansionEffect::Navigated
}
