use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::provider::accessibility::{AccessibilityProvider, InteractionError};
use crate::tree::node_model::{AccessibilityNode, Bounds, ElementRef, UiSnapshot, UiWindow, WindowKind};

// ============================================================================
// Script model (YAML / JSON)
// ============================================================================

/// Declarative description of a simulated app.
///
/// ```yaml
/// package: com.example.notes
/// start: home
/// screens:
///   home:
///     root:
///       class: android.widget.FrameLayout
///       children:
///         - class: android.widget.Button
///           text: Settings
///           clickable: true
///           on_click: { action: navigate, screen: settings }
///   settings:
///     root: { class: android.widget.FrameLayout }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppScript {
    pub package: String,
    pub start: String,
    pub screens: BTreeMap<String, ScreenSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenSpec {
    pub root: NodeSpec,
    /// Extra windows stacked above the main one (dialogs, permission prompts).
    #[serde(default)]
    pub dialogs: Vec<DialogSpec>,
    /// After this many reads the screen turns into `becomes`
    /// (a spinner finishing, a user completing a login).
    #[serde(default)]
    pub after_reads: Option<u32>,
    #[serde(default)]
    pub becomes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogSpec {
    #[serde(default = "default_dialog_kind")]
    pub kind: WindowKind,
    #[serde(default)]
    pub package: Option<String>,
    pub root: NodeSpec,
}

fn default_dialog_kind() -> WindowKind {
    WindowKind::Dialog
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(rename = "class", default = "default_class")]
    pub class_name: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub clickable: bool,
    #[serde(default)]
    pub long_clickable: bool,
    #[serde(default)]
    pub checkable: bool,
    #[serde(default)]
    pub editable: bool,
    #[serde(default)]
    pub password: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub expanded: Option<bool>,
    #[serde(default)]
    pub bounds: Option<Bounds>,
    #[serde(default)]
    pub children: Vec<NodeSpec>,
    #[serde(default)]
    pub on_click: Option<ClickEffect>,
}

fn default_class() -> String {
    "android.view.View".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClickEffect {
    /// Push another screen.
    Navigate { screen: String },
    /// Open a popup window listing `items`; any click or back closes it.
    Overlay { items: Vec<NodeSpec> },
    /// Toggle `items` in as siblings right after the clicked node.
    Reveal { items: Vec<NodeSpec> },
    /// Hand off to another app.
    Leave { package: String },
    Back,
    /// The platform refuses the click.
    Reject {
        #[serde(default)]
        reason: Option<String>,
    },
}

#[derive(Debug)]
pub enum ScriptError {
    Io { path: String, source: std::io::Error },
    Yaml(serde_yaml::Error),
    Json(serde_json::Error),
    UnknownScreen { referenced_by: String, screen: String },
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Io { path, source } => write!(f, "Cannot read app script '{}': {}", path, source),
            ScriptError::Yaml(e) => write!(f, "Invalid YAML app script: {}", e),
            ScriptError::Json(e) => write!(f, "Invalid JSON app script: {}", e),
            ScriptError::UnknownScreen { referenced_by, screen } => {
                write!(f, "'{}' references unknown screen '{}'", referenced_by, screen)
            }
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScriptError::Io { source, .. } => Some(source),
            ScriptError::Yaml(e) => Some(e),
            ScriptError::Json(e) => Some(e),
            ScriptError::UnknownScreen { .. } => None,
        }
    }
}

impl AppScript {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ScriptError> {
        let script: AppScript = serde_yaml::from_str(yaml).map_err(ScriptError::Yaml)?;
        script.validate()?;
        Ok(script)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ScriptError> {
        let script: AppScript = serde_json::from_str(json).map_err(ScriptError::Json)?;
        script.validate()?;
        Ok(script)
    }

    /// Load `.json` files as JSON and everything else as YAML.
    pub fn from_path(path: &Path) -> Result<Self, ScriptError> {
        let content = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Every referenced screen must exist.
    pub fn validate(&self) -> Result<(), ScriptError> {
        self.require(&self.start, "start")?;

        for (name, screen) in &self.screens {
            if let Some(next) = &screen.becomes {
                self.require(next, name)?;
            }
            let mut targets = Vec::new();
            collect_targets(&screen.root, &mut targets);
            for dialog in &screen.dialogs {
                collect_targets(&dialog.root, &mut targets);
            }
            for target in targets {
                self.require(&target, name)?;
            }
        }
        Ok(())
    }

    fn require(&self, screen: &str, referenced_by: &str) -> Result<(), ScriptError> {
        if self.screens.contains_key(screen) {
            Ok(())
        } else {
            Err(ScriptError::UnknownScreen {
                referenced_by: referenced_by.to_string(),
                screen: screen.to_string(),
            })
        }
    }
}

fn collect_targets(node: &NodeSpec, out: &mut Vec<String>) {
    match &node.on_click {
        Some(ClickEffect::Navigate { screen }) => out.push(screen.clone()),
        Some(ClickEffect::Overlay { items }) | Some(ClickEffect::Reveal { items }) => {
            for item in items {
                collect_targets(item, out);
            }
        }
        _ => {}
    }
    for child in &node.children {
        collect_targets(child, out);
    }
}

// ============================================================================
// Simulator
// ============================================================================

const ROW_HEIGHT: i32 = 120;
const SCREEN_WIDTH: i32 = 1080;
const MAIN_WINDOW: u32 = 1;
const FIRST_DIALOG_WINDOW: u32 = 2;
const FIRST_OVERLAY_WINDOW: u32 = 100;
pub const LAUNCHER_PACKAGE: &str = "com.android.launcher3";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    Screen(String),
    External(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Layer {
    Main,
    Dialog(usize),
    Overlay(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Step {
    Child(usize),
    Revealed(usize),
}

#[derive(Debug, Clone)]
struct Origin {
    layer: Layer,
    steps: Vec<Step>,
}

struct Rendered {
    snapshot: UiSnapshot,
    origins: HashMap<ElementRef, Origin>,
}

/// Deterministic in-process app driven by an [`AppScript`].
///
/// Keeps a back stack, open overlays and revealed groups, and counts every
/// read, click and back so tests can assert on how the engine drove it.
pub struct ScriptedApp {
    script: AppScript,
    stack: Vec<Location>,
    overlays: Vec<Vec<NodeSpec>>,
    revealed: HashSet<(String, Layer, Vec<Step>)>,
    reads_on_screen: u32,
    reads: u32,
    backs: u32,
    click_log: Vec<String>,
    reads_by_screen: HashMap<String, u32>,
    entries: HashMap<String, u32>,
}

impl ScriptedApp {
    pub fn new(script: AppScript) -> Self {
        let start = script.start.clone();
        let mut app = Self {
            script,
            stack: Vec::new(),
            overlays: Vec::new(),
            revealed: HashSet::new(),
            reads_on_screen: 0,
            reads: 0,
            backs: 0,
            click_log: Vec::new(),
            reads_by_screen: HashMap::new(),
            entries: HashMap::new(),
        };
        app.enter(Location::Screen(start));
        app
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ScriptError> {
        Ok(Self::new(AppScript::from_yaml_str(yaml)?))
    }

    pub fn package(&self) -> &str {
        &self.script.package
    }

    /// Name of the screen on top of the back stack, if inside the app.
    pub fn current_screen(&self) -> Option<&str> {
        match self.stack.last() {
            Some(Location::Screen(name)) => Some(name),
            _ => None,
        }
    }

    pub fn screen_names(&self) -> Vec<&str> {
        self.script.screens.keys().map(String::as_str).collect()
    }

    pub fn click_count(&self) -> usize {
        self.click_log.len()
    }

    pub fn back_count(&self) -> u32 {
        self.backs
    }

    pub fn read_count(&self) -> u32 {
        self.reads
    }

    /// Labels (or classes) of every clicked node, in order.
    pub fn clicked_labels(&self) -> &[String] {
        &self.click_log
    }

    pub fn reads_of(&self, screen: &str) -> u32 {
        self.reads_by_screen.get(screen).copied().unwrap_or(0)
    }

    /// How many times a screen was navigated to (the start screen counts once).
    pub fn entries_of(&self, screen: &str) -> u32 {
        self.entries.get(screen).copied().unwrap_or(0)
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    fn enter(&mut self, location: Location) {
        if let Location::Screen(name) = &location {
            *self.entries.entry(name.clone()).or_insert(0) += 1;
        }
        self.stack.push(location);
        self.overlays.clear();
        self.reads_on_screen = 0;
    }

    fn go_back(&mut self) {
        if self.overlays.pop().is_some() {
            return;
        }
        if self.stack.len() > 1 {
            self.stack.pop();
        } else {
            self.stack.clear();
            self.stack.push(Location::External(LAUNCHER_PACKAGE.to_string()));
        }
        self.reads_on_screen = 0;
    }

    /// Apply a pending `after_reads` transition for the current screen.
    fn tick(&mut self) {
        let Some(Location::Screen(name)) = self.stack.last().cloned() else {
            return;
        };
        self.reads_on_screen += 1;

        let Some(spec) = self.script.screens.get(&name) else {
            return;
        };
        if let (Some(limit), Some(next)) = (spec.after_reads, spec.becomes.clone()) {
            if self.reads_on_screen > limit {
                self.stack.pop();
                self.enter(Location::Screen(next));
                self.reads_on_screen = 1;
            }
        }
    }

    fn render(&self) -> Rendered {
        let mut origins = HashMap::new();

        let name = match self.stack.last() {
            Some(Location::Screen(name)) => name.clone(),
            Some(Location::External(package)) => return external_snapshot(package),
            None => return external_snapshot(LAUNCHER_PACKAGE),
        };
        let Some(spec) = self.script.screens.get(&name) else {
            return external_snapshot(LAUNCHER_PACKAGE);
        };

        let mut row = 0;
        let mut windows = Vec::new();

        let mut ctx = RenderCtx {
            app: self,
            screen: &name,
            window_id: MAIN_WINDOW,
            layer: Layer::Main,
            row: &mut row,
            origins: &mut origins,
        };
        let root = ctx.render(&spec.root, &mut Vec::new(), &mut Vec::new());
        windows.push(UiWindow {
            id: MAIN_WINDOW,
            kind: WindowKind::Application,
            package: None,
            root,
        });

        for (i, dialog) in spec.dialogs.iter().enumerate() {
            let id = FIRST_DIALOG_WINDOW + i as u32;
            let mut ctx = RenderCtx {
                app: self,
                screen: &name,
                window_id: id,
                layer: Layer::Dialog(i),
                row: &mut row,
                origins: &mut origins,
            };
            let root = ctx.render(&dialog.root, &mut Vec::new(), &mut Vec::new());
            windows.push(UiWindow {
                id,
                kind: dialog.kind,
                package: dialog.package.clone(),
                root,
            });
        }

        for (i, items) in self.overlays.iter().enumerate() {
            let id = FIRST_OVERLAY_WINDOW + i as u32;
            let mut ctx = RenderCtx {
                app: self,
                screen: &name,
                window_id: id,
                layer: Layer::Overlay(i),
                row: &mut row,
                origins: &mut origins,
            };
            let mut children = Vec::new();
            for (j, item) in items.iter().enumerate() {
                children.push(ctx.render(item, &mut vec![Step::Child(j)], &mut vec![j]));
            }
            let top = ROW_HEIGHT * 2;
            windows.push(UiWindow {
                id,
                kind: WindowKind::Overlay,
                package: None,
                root: AccessibilityNode::new("android.widget.ListView")
                    .with_bounds(Bounds::new(SCREEN_WIDTH / 2, top, SCREEN_WIDTH, top + ROW_HEIGHT * items.len().max(1) as i32))
                    .with_children(children),
            });
        }

        Rendered {
            snapshot: UiSnapshot {
                package: self.script.package.clone(),
                windows,
            },
            origins,
        }
    }

    fn spec_node(&self, origin: &Origin) -> Option<&NodeSpec> {
        let name = self.current_screen()?;
        let screen = self.script.screens.get(name)?;

        let (mut node, steps) = match origin.layer {
            Layer::Main => (&screen.root, &origin.steps[..]),
            Layer::Dialog(i) => (&screen.dialogs.get(i)?.root, &origin.steps[..]),
            Layer::Overlay(i) => {
                let (first, rest) = origin.steps.split_first()?;
                let Step::Child(j) = first else {
                    return None;
                };
                (self.overlays.get(i)?.get(*j)?, rest)
            }
        };

        for step in steps {
            node = match step {
                Step::Child(i) => node.children.get(*i)?,
                Step::Revealed(j) => match &node.on_click {
                    Some(ClickEffect::Reveal { items }) => items.get(*j)?,
                    _ => return None,
                },
            };
        }
        Some(node)
    }
}

fn external_snapshot(package: &str) -> Rendered {
    Rendered {
        snapshot: UiSnapshot {
            package: package.to_string(),
            windows: vec![UiWindow {
                id: MAIN_WINDOW,
                kind: WindowKind::Application,
                package: None,
                root: AccessibilityNode::new("android.widget.FrameLayout")
                    .with_text(package)
                    .with_bounds(Bounds::new(0, 0, SCREEN_WIDTH, ROW_HEIGHT * 16)),
            }],
        },
        origins: HashMap::new(),
    }
}

struct RenderCtx<'a> {
    app: &'a ScriptedApp,
    screen: &'a str,
    window_id: u32,
    layer: Layer,
    row: &'a mut i32,
    origins: &'a mut HashMap<ElementRef, Origin>,
}

impl RenderCtx<'_> {
    fn is_revealed(&self, steps: &[Step]) -> bool {
        self.app
            .revealed
            .contains(&(self.screen.to_string(), self.layer, steps.to_vec()))
    }

    fn render(&mut self, spec: &NodeSpec, steps: &mut Vec<Step>, path: &mut Vec<usize>) -> AccessibilityNode {
        let bounds = spec.bounds.unwrap_or_else(|| {
            let top = *self.row * ROW_HEIGHT;
            *self.row += 1;
            Bounds::new(0, top, SCREEN_WIDTH, top + ROW_HEIGHT)
        });

        self.origins.insert(
            ElementRef {
                window_id: self.window_id,
                path: path.clone(),
            },
            Origin {
                layer: self.layer,
                steps: steps.clone(),
            },
        );

        let mut children = Vec::new();
        for (i, child) in spec.children.iter().enumerate() {
            steps.push(Step::Child(i));

            path.push(children.len());
            children.push(self.render(child, steps, path));
            path.pop();

            if let Some(ClickEffect::Reveal { items }) = &child.on_click {
                if self.is_revealed(steps) {
                    for (j, item) in items.iter().enumerate() {
                        steps.push(Step::Revealed(j));
                        path.push(children.len());
                        children.push(self.render(item, steps, path));
                        path.pop();
                        steps.pop();
                    }
                }
            }

            steps.pop();
        }

        let expanded = match &spec.on_click {
            Some(ClickEffect::Reveal { .. }) => Some(self.is_revealed(steps)),
            _ => spec.expanded,
        };

        AccessibilityNode {
            class_name: spec.class_name.clone(),
            text: spec.text.clone(),
            content_description: spec.desc.clone(),
            resource_id: spec.id.clone(),
            hint: spec.hint.clone(),
            bounds,
            clickable: spec.clickable,
            long_clickable: spec.long_clickable,
            checkable: spec.checkable,
            checked: false,
            enabled: spec.enabled,
            editable: spec.editable,
            password: spec.password,
            scrollable: false,
            expanded,
            children,
        }
    }
}

impl AccessibilityProvider for ScriptedApp {
    fn current_tree(&mut self) -> Result<UiSnapshot, InteractionError> {
        self.tick();
        self.reads += 1;
        if let Some(name) = self.current_screen().map(str::to_string) {
            *self.reads_by_screen.entry(name).or_insert(0) += 1;
        }
        Ok(self.render().snapshot)
    }

    fn perform_click(&mut self, target: &ElementRef) -> Result<(), InteractionError> {
        let rendered = self.render();
        let origin = rendered
            .origins
            .get(target)
            .cloned()
            .ok_or_else(|| InteractionError::ElementNotFound(target.clone()))?;
        let node = rendered
            .snapshot
            .find(target)
            .ok_or_else(|| InteractionError::ElementNotFound(target.clone()))?;

        if !node.enabled {
            return Err(InteractionError::Rejected {
                action: "click".into(),
                reason: format!("{} is disabled", target),
            });
        }

        let effect = self.spec_node(&origin).and_then(|n| n.on_click.clone());
        if let Some(ClickEffect::Reject { reason }) = &effect {
            return Err(InteractionError::Rejected {
                action: "click".into(),
                reason: reason.clone().unwrap_or_else(|| "refused by app".into()),
            });
        }

        self.click_log
            .push(node.label().unwrap_or_else(|| node.class_name.clone()));

        let from_overlay = matches!(origin.layer, Layer::Overlay(_));
        if from_overlay {
            self.overlays.clear();
        }

        match effect {
            None | Some(ClickEffect::Reject { .. }) => {}
            Some(ClickEffect::Navigate { screen }) => self.enter(Location::Screen(screen)),
            Some(ClickEffect::Overlay { items }) => self.overlays.push(items),
            Some(ClickEffect::Reveal { .. }) => {
                if let Some(name) = self.current_screen().map(str::to_string) {
                    let key = (name, origin.layer, origin.steps.clone());
                    if !self.revealed.remove(&key) {
                        self.revealed.insert(key);
                    }
                }
            }
            Some(ClickEffect::Leave { package }) => self.enter(Location::External(package)),
            Some(ClickEffect::Back) => self.go_back(),
        }
        Ok(())
    }

    fn perform_back(&mut self) -> Result<(), InteractionError> {
        self.backs += 1;
        self.go_back();
        Ok(())
    }
}
