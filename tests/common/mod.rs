#![allow(dead_code)]

use learnapp::explorer::engine::ExplorationEngine;
use learnapp::explorer::nav_graph::NavigationGraph;
use learnapp::explorer::session::ExplorationSummary;
use learnapp::explorer::strategy::ExplorationStrategy;
use learnapp::observe::events::ExplorationEvent;
use learnapp::observe::observer::RecordingObserver;
use learnapp::persist::records::DiscoveryOrigin;
use learnapp::persist::store::MemoryStore;
use learnapp::provider::clock::ManualClock;
use learnapp::provider::scripted::ScriptedApp;
use learnapp::tree::node_model::{AccessibilityNode, Bounds, UiSnapshot, UiWindow, WindowKind};

pub fn fixture(name: &str) -> String {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("fixture {}: {}", path.display(), e))
}

/// Everything a test may want to look at after a scripted run.
pub struct Outcome {
    pub summary: ExplorationSummary,
    pub graph: NavigationGraph,
    pub store: MemoryStore,
    pub app: ScriptedApp,
    pub events: Vec<ExplorationEvent>,
    pub elapsed_ms: u64,
}

impl Outcome {
    pub fn event_count(&self, name: &str) -> usize {
        self.events.iter().filter(|e| e.name() == name).count()
    }

    pub fn elements_from(&self, origin: DiscoveryOrigin) -> Vec<String> {
        self.store
            .elements
            .iter()
            .filter(|r| r.origin == origin)
            .map(|r| r.element.display_name())
            .collect()
    }
}

/// Explore a fixture app on simulated time.
pub fn explore_fixture(name: &str, strategy: ExplorationStrategy) -> Outcome {
    let mut app = ScriptedApp::from_yaml_str(&fixture(name)).expect("valid fixture");
    let package = app.package().to_string();
    let clock = ManualClock::new();
    let mut store = MemoryStore::new();
    let observer = RecordingObserver::new();

    let (summary, graph) = {
        let mut engine = ExplorationEngine::new(strategy, &mut app, &clock, &mut store, &observer);
        let summary = engine.run(&package).expect("exploration runs");
        (summary, engine.graph().clone())
    };

    Outcome {
        summary,
        graph,
        store,
        app,
        events: observer.events(),
        elapsed_ms: learnapp::provider::clock::Clock::now(&clock).as_millis() as u64,
    }
}

// ============================================================================
// Snapshot builders
// ============================================================================

pub fn row(top: i32) -> Bounds {
    Bounds::new(0, top, 1080, top + 120)
}

pub fn button(text: &str, top: i32) -> AccessibilityNode {
    AccessibilityNode::new("android.widget.Button")
        .with_text(text)
        .with_bounds(row(top))
        .clickable()
}

pub fn label(text: &str, top: i32) -> AccessibilityNode {
    AccessibilityNode::new("android.widget.TextView")
        .with_text(text)
        .with_bounds(row(top))
}

pub fn frame(children: Vec<AccessibilityNode>) -> AccessibilityNode {
    AccessibilityNode::new("android.widget.FrameLayout")
        .with_bounds(Bounds::new(0, 0, 1080, 1920))
        .with_children(children)
}

pub fn window(id: u32, kind: WindowKind, root: AccessibilityNode) -> UiWindow {
    UiWindow {
        id,
        kind,
        package: None,
        root,
    }
}

pub fn snapshot(package: &str, windows: Vec<UiWindow>) -> UiSnapshot {
    UiSnapshot {
        package: package.to_string(),
        windows,
    }
}

pub fn app_screen(root: AccessibilityNode) -> UiSnapshot {
    snapshot("com.example", vec![window(1, WindowKind::Application, root)])
}
