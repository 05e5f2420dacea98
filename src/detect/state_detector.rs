use serde::{Deserialize, Serialize};

use crate::tree::elements::is_back_navigation;
use crate::tree::node_model::{ElementRef, NodeVisit, UiSnapshot, WindowKind};

// ============================================================================
// Verdict model
// ============================================================================

/// Transient or blocking UI states the engine must handle before exploring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenCondition {
    Login,
    Permission,
    Dialog,
    Loading,
    Error,
    Tutorial,
    Empty,
}

impl ScreenCondition {
    /// Evaluation order. The first positive detector wins.
    pub const PRIORITY: [ScreenCondition; 7] = [
        ScreenCondition::Login,
        ScreenCondition::Permission,
        ScreenCondition::Dialog,
        ScreenCondition::Loading,
        ScreenCondition::Error,
        ScreenCondition::Tutorial,
        ScreenCondition::Empty,
    ];

    pub fn recommended_action(&self) -> RecommendedAction {
        match self {
            ScreenCondition::Login | ScreenCondition::Permission => RecommendedAction::PauseForUser,
            ScreenCondition::Loading => RecommendedAction::WaitAndRetry,
            ScreenCondition::Dialog | ScreenCondition::Tutorial | ScreenCondition::Error => {
                RecommendedAction::SkipScreen
            }
            ScreenCondition::Empty => RecommendedAction::Continue,
        }
    }

    fn threshold(&self) -> f32 {
        match self {
            ScreenCondition::Login => 0.7,
            ScreenCondition::Permission => 0.7,
            ScreenCondition::Dialog => 0.6,
            ScreenCondition::Loading => 0.7,
            ScreenCondition::Error => 0.7,
            ScreenCondition::Tutorial => 0.6,
            ScreenCondition::Empty => 0.6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    /// Blocking state: wait (bounded) for the user to resolve it.
    PauseForUser,
    /// Re-read the tree after a delay, a bounded number of times.
    WaitAndRetry,
    /// Try to dismiss the screen (dismiss button or back), then re-classify.
    /// The branch is abandoned if the state survives the retry limit.
    SkipScreen,
    /// Nothing to handle; explore normally.
    Continue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StateVerdict {
    pub condition: ScreenCondition,
    pub action: RecommendedAction,
    pub confidence: f32,
    pub signals: Vec<String>,
    /// Control that dismisses the state (e.g. "Skip", "Cancel"), if found.
    pub dismiss_target: Option<ElementRef>,
}

// ============================================================================
// Shared facts
// ============================================================================

/// Per-snapshot facts every detector reads, gathered in one walk.
struct ScreenFacts<'a> {
    snapshot: &'a UiSnapshot,
    nodes: Vec<NodeVisit<'a>>,
    /// Lowercased labels of all nodes, in tree order.
    texts: Vec<String>,
    /// Lowercased resource ids (entry part after `/`).
    ids: Vec<String>,
    /// Clickable, enabled, visible nodes that are not back navigation.
    actionable: usize,
}

impl<'a> ScreenFacts<'a> {
    fn gather(snapshot: &'a UiSnapshot) -> Self {
        let nodes = snapshot.visit_nodes();
        let texts = nodes
            .iter()
            .filter_map(|v| v.node.label())
            .map(|l| l.to_lowercase())
            .collect();
        let ids = nodes
            .iter()
            .filter_map(|v| v.node.resource_id.as_deref())
            .map(|id| id.to_lowercase())
            .collect();
        let actionable = nodes
            .iter()
            .filter(|v| {
                (v.node.clickable || v.node.editable || v.node.checkable)
                    && v.node.enabled
                    && v.node.is_visible()
                    && !is_back_navigation(v.node)
            })
            .count();

        Self {
            snapshot,
            nodes,
            texts,
            ids,
            actionable,
        }
    }

    fn any_text(&self, needles: &[&str]) -> Option<String> {
        self.texts
            .iter()
            .find(|t| needles.iter().any(|n| t.contains(n)))
            .cloned()
    }

    /// First text containing `word` as a whole word.
    fn any_word(&self, word: &str) -> Option<String> {
        self.texts
            .iter()
            .find(|t| t.split(|c: char| !c.is_alphanumeric()).any(|w| w == word))
            .cloned()
    }

    fn any_id(&self, needles: &[&str]) -> Option<String> {
        self.ids
            .iter()
            .find(|id| needles.iter().any(|n| id.contains(n)))
            .cloned()
    }

    /// First clickable node whose label equals one of `labels`, in label order.
    fn button_labelled(&self, labels: &[&str]) -> Option<ElementRef> {
        labels.iter().find_map(|wanted| {
            self.nodes
                .iter()
                .filter(|v| v.node.clickable && v.node.enabled)
                .find(|v| {
                    v.node
                        .label()
                        .map(|l| l.trim().to_lowercase() == *wanted)
                        .unwrap_or(false)
                })
                .map(|v| v.element_ref())
        })
    }

    fn has_class(&self, needle: &str) -> bool {
        self.nodes
            .iter()
            .any(|v| v.node.class_name.to_lowercase().contains(needle))
    }
}

/// Accumulates weighted signals, each counted once.
struct Score {
    total: f32,
    signals: Vec<String>,
}

impl Score {
    fn new() -> Self {
        Self {
            total: 0.0,
            signals: Vec::new(),
        }
    }

    fn add(&mut self, weight: f32, signal: impl Into<String>) {
        self.total += weight;
        self.signals.push(signal.into());
    }

    fn add_if(&mut self, hit: Option<String>, weight: f32, kind: &str) {
        if let Some(what) = hit {
            self.add(weight, format!("{}:{}", kind, what));
        }
    }
}

// ============================================================================
// Detectors
// ============================================================================

/// Run one detector. Returns `None` when the state is not present.
pub fn detect(condition: ScreenCondition, snapshot: &UiSnapshot) -> Option<StateVerdict> {
    let facts = ScreenFacts::gather(snapshot);
    detect_with(condition, &facts)
}

/// Run every detector in priority order and return the first positive verdict.
pub fn classify_state(snapshot: &UiSnapshot) -> Option<StateVerdict> {
    let facts = ScreenFacts::gather(snapshot);
    ScreenCondition::PRIORITY
        .iter()
        .find_map(|c| detect_with(*c, &facts))
}

fn detect_with(condition: ScreenCondition, facts: &ScreenFacts<'_>) -> Option<StateVerdict> {
    let (score, dismiss_target) = match condition {
        ScreenCondition::Login => (score_login(facts), None),
        ScreenCondition::Permission => (score_permission(facts), None),
        ScreenCondition::Dialog => (
            score_dialog(facts),
            facts.button_labelled(&["cancel", "not now", "no thanks", "close", "dismiss", "later", "no"]),
        ),
        ScreenCondition::Loading => (score_loading(facts), None),
        ScreenCondition::Error => (score_error(facts), None),
        ScreenCondition::Tutorial => (
            score_tutorial(facts),
            facts.button_labelled(&["skip", "got it", "done", "close", "no thanks"]),
        ),
        ScreenCondition::Empty => (score_empty(facts), None),
    };

    if score.total < condition.threshold() {
        return None;
    }

    Some(StateVerdict {
        condition,
        action: condition.recommended_action(),
        confidence: score.total.clamp(0.0, 1.0),
        signals: score.signals,
        dismiss_target,
    })
}

fn score_login(facts: &ScreenFacts<'_>) -> Score {
    let mut score = Score::new();

    if facts.nodes.iter().any(|v| v.node.password) {
        score.add(0.5, "password_field");
    }
    let identity_field = facts.nodes.iter().any(|v| {
        v.node.editable
            && v.node
                .label()
                .map(|l| {
                    let l = l.to_lowercase();
                    ["email", "username", "user name", "phone"].iter().any(|k| l.contains(k))
                })
                .unwrap_or(false)
    });
    if identity_field {
        score.add(0.2, "identity_field");
    }
    score.add_if(facts.any_text(&["log in", "login", "sign in", "signin"]), 0.4, "label");
    score.add_if(facts.any_id(&["login", "signin", "sign_in"]), 0.2, "id");
    score.add_if(facts.any_text(&["forgot password"]), 0.2, "label");
    score
}

fn score_permission(facts: &ScreenFacts<'_>) -> Score {
    let mut score = Score::new();

    let controller = facts.snapshot.screen_windows().find(|w| {
        let pkg = facts.snapshot.window_package(w);
        pkg.contains("permissioncontroller") || pkg.contains("packageinstaller")
    });
    if let Some(w) = controller {
        score.add(0.7, format!("package:{}", facts.snapshot.window_package(w)));
    }
    score.add_if(facts.any_id(&["permission_allow", "permission_deny"]), 0.5, "id");
    if facts
        .button_labelled(&["allow", "deny", "don't allow", "while using the app", "only this time"])
        .is_some()
    {
        score.add(0.3, "permission_buttons");
    }
    let asks_access = facts
        .texts
        .iter()
        .any(|t| t.contains("allow") && t.contains("to access"));
    if asks_access {
        score.add(0.2, "access_prompt");
    }
    score
}

fn score_dialog(facts: &ScreenFacts<'_>) -> Score {
    let mut score = Score::new();

    if facts.snapshot.screen_windows().any(|w| w.kind == WindowKind::Dialog) {
        score.add(0.6, "dialog_window");
    }
    if facts.has_class("alertdialog") || facts.has_class("dialog") {
        score.add(0.4, "dialog_class");
    }
    score.add_if(
        facts.any_id(&["android:id/button1", "android:id/button2", "alerttitle", "android:id/message"]),
        0.3,
        "id",
    );
    score
}

fn score_loading(facts: &ScreenFacts<'_>) -> Score {
    let mut score = Score::new();

    if facts.has_class("progressbar") {
        score.add(0.5, "progress_bar");
    }
    score.add_if(facts.any_text(&["loading", "please wait"]), 0.4, "label");
    if facts.actionable == 0 {
        score.add(0.3, "no_actionable_elements");
    }
    score
}

fn score_error(facts: &ScreenFacts<'_>) -> Score {
    let mut score = Score::new();

    let phrase = facts.any_text(&[
        "something went wrong",
        "an error occurred",
        "no internet",
        "no connection",
        "connection failed",
        "unable to load",
        "failed to load",
    ]);
    match phrase {
        Some(text) => score.add(0.5, format!("label:{}", text)),
        // A bare "error" word ("Error reporting") only reaches the
        // threshold together with a retry button.
        None => score.add_if(facts.any_word("error"), 0.4, "word"),
    }
    if facts.button_labelled(&["retry", "try again"]).is_some() {
        score.add(0.3, "retry_button");
    }
    score.add_if(facts.any_id(&["error"]), 0.2, "id");
    score
}

fn score_tutorial(facts: &ScreenFacts<'_>) -> Score {
    let mut score = Score::new();

    score.add_if(
        facts.any_id(&["onboarding", "tutorial", "walkthrough", "intro", "coach"]),
        0.4,
        "id",
    );
    if facts.button_labelled(&["skip"]).is_some() {
        score.add(0.4, "skip_button");
    }
    if facts.button_labelled(&["got it"]).is_some() {
        score.add(0.3, "got_it_button");
    }
    if facts.button_labelled(&["next", "get started"]).is_some() {
        score.add(0.2, "next_button");
    }
    if facts.has_class("pageindicator") || facts.has_class("viewpager") {
        score.add(0.2, "pager");
    }
    score
}

fn score_empty(facts: &ScreenFacts<'_>) -> Score {
    let mut score = Score::new();

    if facts.actionable == 0 {
        score.add(0.6, "no_actionable_elements");
    }
    score.add_if(
        facts.any_text(&["no items", "nothing here", "no results", "no data", "it's empty", "empty"]),
        0.4,
        "label",
    );
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node_model::{AccessibilityNode, Bounds, UiWindow};

    fn visible(node: AccessibilityNode) -> AccessibilityNode {
        node.with_bounds(Bounds::new(0, 0, 100, 100))
    }

    fn single_window(root: AccessibilityNode) -> UiSnapshot {
        UiSnapshot {
            package: "com.example".into(),
            windows: vec![UiWindow {
                id: 1,
                kind: WindowKind::Application,
                package: None,
                root,
            }],
        }
    }

    #[test]
    fn priority_order_is_fixed() {
        assert_eq!(ScreenCondition::PRIORITY[0], ScreenCondition::Login);
        assert_eq!(ScreenCondition::PRIORITY[6], ScreenCondition::Empty);
    }

    #[test]
    fn plain_screen_has_no_verdict() {
        let snap = single_window(visible(AccessibilityNode::new("FrameLayout")).with_children(vec![
            visible(AccessibilityNode::new("android.widget.Button").with_text("Settings").clickable()),
            visible(AccessibilityNode::new("android.widget.Button").with_text("Profile").clickable()),
        ]));
        assert_eq!(classify_state(&snap), None);
    }

    #[test]
    fn tutorial_offers_skip_as_dismiss_target() {
        let snap = single_window(
            visible(AccessibilityNode::new("FrameLayout").with_id("com.example:id/onboarding_root")).with_children(vec![
                visible(AccessibilityNode::new("android.widget.TextView").with_text("Welcome!")),
                visible(AccessibilityNode::new("android.widget.Button").with_text("Skip").clickable()),
            ]),
        );
        let verdict = classify_state(&snap).expect("tutorial verdict");
        assert_eq!(verdict.condition, ScreenCondition::Tutorial);
        assert_eq!(verdict.action, RecommendedAction::SkipScreen);
        assert_eq!(
            verdict.dismiss_target,
            Some(ElementRef { window_id: 1, path: vec![1] })
        );
    }
}
