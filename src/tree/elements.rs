use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::state::fingerprint::element_fingerprint;
use crate::state::state_model::ElementInfo;
use crate::tree::danger::DangerPolicy;
use crate::tree::node_model::{AccessibilityNode, NodeVisit, UiSnapshot};

/// Coarse role of an interactive element, in exploration priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementClass {
    Button,
    Tab,
    MenuItem,
    ListItem,
    Toggle,
    Container,
    Input,
    BackNavigation,
}

impl ElementClass {
    /// Lower explores first: primary actionable controls before generic containers.
    pub fn priority(&self) -> u8 {
        match self {
            ElementClass::Button => 0,
            ElementClass::Tab => 1,
            ElementClass::MenuItem => 2,
            ElementClass::ListItem => 3,
            ElementClass::Toggle => 4,
            ElementClass::Container => 5,
            ElementClass::Input => 6,
            ElementClass::BackNavigation => 7,
        }
    }

    /// Whether the engine may click an element of this class while exploring.
    pub fn is_explorable(&self) -> bool {
        !matches!(self, ElementClass::Input | ElementClass::BackNavigation)
    }
}

const BACK_LABELS: &[&str] = &["navigate up", "back", "go back", "up"];

pub fn is_back_navigation(node: &AccessibilityNode) -> bool {
    let label = node.label().unwrap_or_default().to_lowercase();
    if BACK_LABELS.contains(&label.as_str()) {
        return true;
    }
    node.resource_id
        .as_deref()
        .map(|id| id.ends_with("/up") || id.ends_with("action_bar_up") || id.ends_with("/back_button"))
        .unwrap_or(false)
}

pub fn classify_node(node: &AccessibilityNode) -> ElementClass {
    let class = node.short_class().to_lowercase();

    if is_back_navigation(node) {
        return ElementClass::BackNavigation;
    }
    if node.editable || class.contains("edittext") {
        return ElementClass::Input;
    }
    if node.checkable
        || class.contains("switch")
        || class.contains("checkbox")
        || class.contains("radiobutton")
        || class.contains("togglebutton")
    {
        return ElementClass::Toggle;
    }
    if class.contains("button") || class.contains("spinner") || class == "chip" {
        return ElementClass::Button;
    }
    if class.contains("tab") || class.contains("bottomnavigationitem") || class.contains("navigationbaritem") {
        return ElementClass::Tab;
    }
    if class.contains("menuitem") || class.contains("actionmenuitemview") {
        return ElementClass::MenuItem;
    }
    if node.clickable && node.label().is_some() && class.contains("textview") {
        // Clickable text reads as a link-style button.
        return ElementClass::Button;
    }
    if node.clickable && (class.contains("layout") || class.contains("viewgroup") || class.contains("cardview")) {
        return if node.label().is_some() || node.children.iter().any(|c| c.label().is_some()) {
            ElementClass::ListItem
        } else {
            ElementClass::Container
        };
    }
    ElementClass::Container
}

/// Label for a node, falling back to its first labelled descendant
/// (list rows usually carry their text on a child TextView).
fn effective_label(node: &AccessibilityNode) -> Option<String> {
    node.label().or_else(|| {
        node.children.iter().find_map(effective_label)
    })
}

/// Enumerate every visible, enabled, interactive element of the snapshot.
///
/// Elements are returned in tree order; use [`exploration_order`] to obtain
/// the traversal order. Element fingerprints disambiguate identical controls
/// by their occurrence index, so inserting unrelated siblings does not change
/// the identity of existing elements.
pub fn enumerate_elements(snapshot: &UiSnapshot, danger: &dyn DangerPolicy) -> Vec<ElementInfo> {
    let mut occurrences: HashMap<String, usize> = HashMap::new();

    snapshot
        .visit_nodes()
        .into_iter()
        .filter(|v| v.node.is_interactive() && v.node.enabled && v.node.is_visible())
        .map(|v| {
            let occurrence_key = format!(
                "{}|{}|{}|{}",
                v.window.kind.as_str(),
                v.node.class_name,
                v.node.resource_id.as_deref().unwrap_or(""),
                effective_label(v.node).unwrap_or_default()
            );
            let slot = occurrences.entry(occurrence_key).or_insert(0);
            let occurrence = *slot;
            *slot += 1;
            to_element(&v, occurrence, danger)
        })
        .collect()
}

fn to_element(visit: &NodeVisit<'_>, occurrence: usize, danger: &dyn DangerPolicy) -> ElementInfo {
    let node = visit.node;
    let label = effective_label(node);
    let mut element = ElementInfo {
        fingerprint: element_fingerprint(visit.window.kind, node, label.as_deref(), occurrence),
        target: visit.element_ref(),
        class_name: node.class_name.clone(),
        label,
        resource_id: node.resource_id.clone(),
        bounds: node.bounds,
        clickable: node.clickable,
        class: classify_node(node),
        dangerous: false,
        window_kind: visit.window.kind,
        expanded: node.expanded,
    };
    element.dangerous = danger.is_dangerous(&element);
    element
}

/// Sort elements into the fixed traversal order: class priority, then
/// top-to-bottom, left-to-right, then tree address.
pub fn exploration_order(elements: &mut [ElementInfo]) {
    elements.sort_by(compare_for_exploration);
}

pub fn compare_for_exploration(a: &ElementInfo, b: &ElementInfo) -> Ordering {
    a.class
        .priority()
        .cmp(&b.class.priority())
        .then(a.bounds.top.cmp(&b.bounds.top))
        .then(a.bounds.left.cmp(&b.bounds.left))
        .then(a.target.window_id.cmp(&b.target.window_id))
        .then(a.target.path.cmp(&b.target.path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_common_widgets() {
        assert_eq!(classify_node(&AccessibilityNode::new("android.widget.Button").clickable()), ElementClass::Button);
        assert_eq!(
            classify_node(&AccessibilityNode::new("android.widget.ImageButton").with_description("Navigate up").clickable()),
            ElementClass::BackNavigation
        );
        let mut field = AccessibilityNode::new("android.widget.EditText");
        field.editable = true;
        assert_eq!(classify_node(&field), ElementClass::Input);

        let mut switch = AccessibilityNode::new("android.widget.Switch");
        switch.checkable = true;
        assert_eq!(classify_node(&switch), ElementClass::Toggle);

        let row = AccessibilityNode::new("android.widget.LinearLayout")
            .clickable()
            .with_children(vec![AccessibilityNode::new("android.widget.TextView").with_text("Inbox")]);
        assert_eq!(classify_node(&row), ElementClass::ListItem);

        let bare = AccessibilityNode::new("android.widget.FrameLayout").clickable();
        assert_eq!(classify_node(&bare), ElementClass::Container);
    }

    #[test]
    fn priority_puts_buttons_before_containers() {
        assert!(ElementClass::Button.priority() < ElementClass::ListItem.priority());
        assert!(ElementClass::ListItem.priority() < ElementClass::Container.priority());
        assert!(!ElementClass::Input.is_explorable());
        assert!(!ElementClass::BackNavigation.is_explorable());
    }
}
