use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// Geometry
// ============================================================================

/// Screen-space rectangle of a node, in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Bounds {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    /// Zero-area nodes are off-screen or collapsed and never explored.
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
}

// ============================================================================
// Accessibility tree
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Application,
    Dialog,
    Overlay,
    InputMethod,
    System,
}

impl WindowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowKind::Application => "application",
            WindowKind::Dialog => "dialog",
            WindowKind::Overlay => "overlay",
            WindowKind::InputMethod => "input_method",
            WindowKind::System => "system",
        }
    }

    /// Keyboards and the status bar are not part of the app's screen.
    pub fn belongs_to_screen(&self) -> bool {
        !matches!(self, WindowKind::InputMethod | WindowKind::System)
    }
}

/// One node of the platform accessibility tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityNode {
    #[serde(rename = "class", default)]
    pub class_name: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(rename = "desc", default)]
    pub content_description: Option<String>,
    #[serde(rename = "id", default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub bounds: Bounds,
    #[serde(default)]
    pub clickable: bool,
    #[serde(default)]
    pub long_clickable: bool,
    #[serde(default)]
    pub checkable: bool,
    #[serde(default)]
    pub checked: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub password: bool,
    #[serde(default)]
    pub scrollable: bool,
    /// Expand/collapse state, when the node exposes one.
    #[serde(default)]
    pub expanded: Option<bool>,
    #[serde(default)]
    pub children: Vec<AccessibilityNode>,
}

fn default_true() -> bool {
    true
}

impl Default for AccessibilityNode {
    fn default() -> Self {
        Self {
            class_name: String::new(),
            text: None,
            content_description: None,
            resource_id: None,
            hint: None,
            bounds: Bounds::default(),
            clickable: false,
            long_clickable: false,
            checkable: false,
            checked: false,
            enabled: true,
            editable: false,
            password: false,
            scrollable: false,
            expanded: None,
            children: Vec::new(),
        }
    }
}

impl AccessibilityNode {
    pub fn new(class_name: &str) -> Self {
        Self {
            class_name: class_name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_description(mut self, desc: &str) -> Self {
        self.content_description = Some(desc.to_string());
        self
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_children(mut self, children: Vec<AccessibilityNode>) -> Self {
        self.children = children;
        self
    }

    pub fn clickable(mut self) -> Self {
        self.clickable = true;
        self
    }

    /// Human-facing label: visible text, then content description, then hint.
    pub fn label(&self) -> Option<String> {
        [&self.text, &self.content_description, &self.hint]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Class name without its package, e.g. `Button` for `android.widget.Button`.
    pub fn short_class(&self) -> &str {
        self.class_name
            .rsplit('.')
            .next()
            .unwrap_or(self.class_name.as_str())
    }

    pub fn is_interactive(&self) -> bool {
        self.clickable || self.long_clickable || self.checkable || self.editable
    }

    pub fn is_visible(&self) -> bool {
        !self.bounds.is_empty()
    }

    pub fn node_at(&self, path: &[usize]) -> Option<&AccessibilityNode> {
        match path.split_first() {
            None => Some(self),
            Some((first, rest)) => self.children.get(*first)?.node_at(rest),
        }
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_size()).sum::<usize>()
    }
}

// ============================================================================
// Windows and snapshots
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiWindow {
    pub id: u32,
    pub kind: WindowKind,
    /// Owning package when it differs from the foreground app
    /// (e.g. the system permission controller).
    #[serde(default)]
    pub package: Option<String>,
    pub root: AccessibilityNode,
}

/// Full read of the accessibility tree: every window, bottom-most first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSnapshot {
    pub package: String,
    pub windows: Vec<UiWindow>,
}

/// A node reached during a pre-order walk, with its address.
#[derive(Debug, Clone)]
pub struct NodeVisit<'a> {
    pub window: &'a UiWindow,
    pub path: Vec<usize>,
    pub depth: usize,
    pub node: &'a AccessibilityNode,
}

impl<'a> NodeVisit<'a> {
    pub fn element_ref(&self) -> ElementRef {
        ElementRef {
            window_id: self.window.id,
            path: self.path.clone(),
        }
    }
}

impl UiSnapshot {
    /// Windows that make up the app's screen (keyboards and system bars excluded).
    pub fn screen_windows(&self) -> impl Iterator<Item = &UiWindow> {
        self.windows.iter().filter(|w| w.kind.belongs_to_screen())
    }

    pub fn window_count(&self) -> usize {
        self.screen_windows().count()
    }

    pub fn window_package<'s>(&'s self, window: &'s UiWindow) -> &'s str {
        window.package.as_deref().unwrap_or(self.package.as_str())
    }

    pub fn find(&self, target: &ElementRef) -> Option<&AccessibilityNode> {
        self.windows
            .iter()
            .find(|w| w.id == target.window_id)?
            .root
            .node_at(&target.path)
    }

    /// Pre-order walk over every node of every screen window.
    pub fn visit_nodes(&self) -> Vec<NodeVisit<'_>> {
        let mut out = Vec::new();
        for window in self.screen_windows() {
            let mut path = Vec::new();
            collect(window, &window.root, &mut path, 0, &mut out);
        }
        out
    }
}

fn collect<'a>(
    window: &'a UiWindow,
    node: &'a AccessibilityNode,
    path: &mut Vec<usize>,
    depth: usize,
    out: &mut Vec<NodeVisit<'a>>,
) {
    out.push(NodeVisit {
        window,
        path: path.clone(),
        depth,
        node,
    });
    for (i, child) in node.children.iter().enumerate() {
        path.push(i);
        collect(window, child, path, depth + 1, out);
        path.pop();
    }
}

/// Address of a node inside a snapshot, used as the click target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    pub window_id: u32,
    pub path: Vec<usize>,
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = self
            .path
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join("/");
        write!(f, "w{}:/{}", self.window_id, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_prefers_text_then_description() {
        let node = AccessibilityNode::new("android.widget.ImageButton").with_description("More options");
        assert_eq!(node.label().as_deref(), Some("More options"));

        let node = node.with_text("  ");
        assert_eq!(node.label().as_deref(), Some("More options"), "blank text is skipped");

        let node = node.with_text("Menu");
        assert_eq!(node.label().as_deref(), Some("Menu"));
    }

    #[test]
    fn node_at_follows_child_indices() {
        let root = AccessibilityNode::new("FrameLayout").with_children(vec![
            AccessibilityNode::new("LinearLayout")
                .with_children(vec![AccessibilityNode::new("Button").with_text("OK")]),
        ]);
        assert_eq!(root.node_at(&[0, 0]).and_then(|n| n.label()).as_deref(), Some("OK"));
        assert!(root.node_at(&[1]).is_none());
        assert_eq!(root.subtree_size(), 3);
    }

    #[test]
    fn short_class_strips_package() {
        assert_eq!(AccessibilityNode::new("android.widget.Spinner").short_class(), "Spinner");
        assert_eq!(AccessibilityNode::new("Spinner").short_class(), "Spinner");
    }
}
