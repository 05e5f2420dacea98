use std::collections::VecDeque;
use std::time::Duration;

use crate::detect::expandable::{ExpansionEffect, classify_effect, detect_expansion};
use crate::detect::state_detector::{RecommendedAction, ScreenCondition, classify_state};
use crate::explorer::click_tracker::ClickTracker;
use crate::explorer::error::ExplorerError;
use crate::explorer::nav_graph::{NavigationGraph, ScreenNode};
use crate::explorer::session::{EngineState, ExplorationSession, ExplorationSummary, TerminationReason};
use crate::explorer::strategy::ExplorationStrategy;
use crate::observe::events::ExplorationEvent;
use crate::observe::observer::ExplorationObserver;
use crate::persist::records::{DiscoveryOrigin, ElementRecord};
use crate::persist::store::ExplorationStore;
use crate::provider::accessibility::{AccessibilityProvider, InteractionError};
use crate::provider::clock::Clock;
use crate::state::fingerprint::ScreenFingerprint;
use crate::state::state_builder::build_state;
use crate::state::state_model::{ElementInfo, ScreenState};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::TraceEvent;
use crate::tree::danger::{DangerPolicy, KeywordDangerPolicy};
use crate::tree::elements::{ElementClass, exploration_order};
use crate::tree::node_model::UiSnapshot;

/// One level of the depth-first traversal.
#[derive(Debug)]
struct Frame {
    /// Identity the screen was registered under.
    fingerprint: ScreenFingerprint,
    /// What the live screen looks like now (differs after an in-place expansion).
    expected: ScreenFingerprint,
    depth: usize,
    remaining: VecDeque<ElementInfo>,
}

impl Frame {
    fn shows(&self, fingerprint: &ScreenFingerprint) -> bool {
        &self.expected == fingerprint || &self.fingerprint == fingerprint
    }

    /// Drop leading candidates that were already clicked (possibly while the
    /// same screen was visited through another path).
    fn prune(&mut self, tracker: &ClickTracker) {
        while let Some(next) = self.remaining.front() {
            if tracker.was_clicked(&self.fingerprint, &next.fingerprint) {
                self.remaining.pop_front();
            } else {
                break;
            }
        }
    }
}

/// A fresh tree read and the state built from it.
struct Capture {
    snapshot: UiSnapshot,
    state: ScreenState,
}

enum Resolution {
    /// No blocking state left. `via_back` is set when a dismissal fell back to
    /// the back action, so the landing screen is not a reliable edge target.
    Ready { capture: Capture, via_back: bool },
    Abandoned { reason: String },
}

/// Depth-first explorer of a single app.
///
/// Drives the provider through an explicit stack of frames, one per screen
/// being explored. The session clock is checked before every interaction;
/// when the budget runs out the traversal unwinds and everything found so far
/// is returned as a valid, partial result.
pub struct ExplorationEngine<'a> {
    strategy: ExplorationStrategy,
    provider: &'a mut dyn AccessibilityProvider,
    clock: &'a dyn Clock,
    store: &'a mut dyn ExplorationStore,
    observer: &'a dyn ExplorationObserver,
    danger: Box<dyn DangerPolicy + 'a>,
    tracer: Option<&'a TraceLogger>,

    package: String,
    state: EngineState,
    step: u64,
    origin: Duration,
    session: ExplorationSession,
    graph: NavigationGraph,
    tracker: ClickTracker,
}

impl<'a> ExplorationEngine<'a> {
    pub fn new(
        strategy: ExplorationStrategy,
        provider: &'a mut dyn AccessibilityProvider,
        clock: &'a dyn Clock,
        store: &'a mut dyn ExplorationStore,
        observer: &'a dyn ExplorationObserver,
    ) -> Self {
        Self {
            strategy,
            provider,
            clock,
            store,
            observer,
            danger: Box::new(KeywordDangerPolicy::default()),
            tracer: None,
            package: String::new(),
            state: EngineState::Idle,
            step: 0,
            origin: Duration::ZERO,
            session: ExplorationSession::start("", 0),
            graph: NavigationGraph::new(),
            tracker: ClickTracker::new(),
        }
    }

    pub fn with_danger_policy(mut self, policy: Box<dyn DangerPolicy + 'a>) -> Self {
        self.danger = policy;
        self
    }

    pub fn with_tracer(mut self, tracer: &'a TraceLogger) -> Self {
        self.tracer = Some(tracer);
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn graph(&self) -> &NavigationGraph {
        &self.graph
    }

    pub fn click_tracker(&self) -> &ClickTracker {
        &self.tracker
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Explore `target_package` starting from whatever screen is showing.
    ///
    /// Only a failure to read the very first tree is an error; everything
    /// after that degrades to skipping the affected element or branch.
    pub fn run(&mut self, target_package: &str) -> Result<ExplorationSummary, ExplorerError> {
        self.strategy.validate()?;

        self.package = target_package.to_string();
        self.step = 0;
        self.origin = self.clock.now();
        self.session = ExplorationSession::start(target_package, 0);
        self.graph = NavigationGraph::new();
        self.tracker = ClickTracker::new();

        self.observer.on_event(&ExplorationEvent::SessionStarted {
            package: target_package.to_string(),
        });
        self.set_state(EngineState::Exploring);

        let first = self.capture().map_err(ExplorerError::InitialCapture)?;
        let mut stack: Vec<Frame> = Vec::new();

        match self.resolve_conditions(first) {
            Resolution::Ready { capture, .. } if capture.state.package == self.package => {
                self.enter_screen(&mut stack, capture.state, 0);
            }
            Resolution::Ready { capture, .. } => {
                let reason = format!("start screen belongs to {}", capture.state.package);
                self.abandon(None, reason);
            }
            Resolution::Abandoned { reason } => self.abandon(None, reason),
        }

        let termination = self.explore(&mut stack);
        Ok(self.finish(termination))
    }

    fn finish(&mut self, termination: TerminationReason) -> ExplorationSummary {
        self.set_state(match termination {
            TerminationReason::TimedOut => EngineState::TimedOut,
            TerminationReason::Completed | TerminationReason::ScreenLimit => EngineState::Completed,
        });

        let session = std::mem::replace(&mut self.session, ExplorationSession::start("", 0));
        let summary = session.finalize(termination, self.elapsed_ms());

        if let Err(e) = self.store.save_session(&summary) {
            eprintln!("Warning: failed to persist session summary: {}", e);
        }

        let event = match termination {
            TerminationReason::TimedOut => ExplorationEvent::SessionTimedOut {
                summary: summary.clone(),
            },
            _ => ExplorationEvent::SessionCompleted {
                summary: summary.clone(),
            },
        };
        self.observer.on_event(&event);
        self.log(self.trace("finished").with_detail(format!("{:?}", termination)));

        summary
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    fn explore(&mut self, stack: &mut Vec<Frame>) -> TerminationReason {
        loop {
            if self.time_exceeded() {
                self.log(self.trace("time_budget_exhausted"));
                return TerminationReason::TimedOut;
            }

            let Some(top) = stack.last_mut() else {
                return TerminationReason::Completed;
            };
            top.prune(&self.tracker);

            if top.remaining.is_empty() {
                let finished = stack.pop();
                if let Some(frame) = finished {
                    self.log(self.trace("screen_exhausted").with_screen(frame.fingerprint.short()));
                }
                if !stack.is_empty() {
                    self.backtrack();
                }
                continue;
            }

            // Only stop for the limit while there is still something to click.
            if self.graph.screen_count() >= self.strategy.max_screens {
                self.log(self.trace("screen_limit_reached"));
                return TerminationReason::ScreenLimit;
            }

            let frames_before = stack.len();
            let current = self.ensure_on_top(stack);
            if stack.len() != frames_before {
                continue;
            }
            let Some(current) = current else {
                continue;
            };

            let Some(element) = stack.last_mut().and_then(|f| f.remaining.pop_front()) else {
                continue;
            };
            self.interact(stack, current, element);
        }
    }

    /// Make sure the live screen is the top frame's screen, reading a fresh
    /// tree. A back action that overshot onto an ancestor frame unwinds the
    /// stack to it; otherwise presses back up to the retry limit before
    /// abandoning the top frame.
    fn ensure_on_top(&mut self, stack: &mut Vec<Frame>) -> Option<Capture> {
        let mut backs = 0;

        loop {
            if stack.is_empty() {
                return None;
            }

            match self.capture() {
                Ok(capture) => {
                    let fp = capture.state.fingerprint.clone();
                    let top = stack.len() - 1;

                    if stack[top].shows(&fp) {
                        stack[top].expected = fp;
                        self.set_state(EngineState::Exploring);
                        return Some(capture);
                    }

                    if let Some(idx) = stack[..top].iter().rposition(|f| f.shows(&fp)) {
                        while stack.len() > idx + 1 {
                            if let Some(mut frame) = stack.pop() {
                                frame.prune(&self.tracker);
                                if frame.remaining.is_empty() {
                                    self.log(self.trace("returned_to_ancestor").with_screen(frame.fingerprint.short()));
                                } else {
                                    self.abandon(Some(frame.fingerprint), "navigated back to an ancestor screen".into());
                                }
                            }
                        }
                        if let Some(frame) = stack.last_mut() {
                            frame.expected = fp;
                        }
                        self.set_state(EngineState::Exploring);
                        return Some(capture);
                    }

                    self.log(
                        self.trace("off_screen")
                            .with_screen(fp.short())
                            .with_detail(format!("expected {}", stack[top].expected.short())),
                    );
                }
                Err(e) => {
                    eprintln!("Warning: tree read failed: {}", e);
                    self.log(self.trace("read_failed").with_detail(e.to_string()));
                }
            }

            if backs >= self.strategy.backtrack_retry_limit {
                if let Some(frame) = stack.pop() {
                    self.abandon(Some(frame.fingerprint), "could not return to screen".into());
                }
                backs = 0;
                continue;
            }

            self.set_state(EngineState::Backtracking);
            self.press_back();
            backs += 1;
        }
    }

    fn interact(&mut self, stack: &mut Vec<Frame>, current: Capture, element: ElementInfo) {
        let Some(frame) = stack.last() else {
            return;
        };
        let frame_fp = frame.fingerprint.clone();

        // Element addresses shift between reads; click what is on screen now.
        let Some(live) = current.state.element(&element.fingerprint).cloned() else {
            self.tracker.mark_clicked(&frame_fp, &element.fingerprint);
            self.log(
                self.trace("element_vanished")
                    .with_screen(frame_fp.short())
                    .with_element(element.display_name()),
            );
            return;
        };
        if live.dangerous {
            self.tracker.mark_clicked(&frame_fp, &live.fingerprint);
            return;
        }

        let expansion = detect_expansion(&live, self.strategy.expandable_threshold);
        self.session.interactions += 1;

        let clicked = self.provider.perform_click(&live.target);
        self.tracker.mark_clicked(&frame_fp, &live.fingerprint);
        if let Err(e) = clicked {
            self.interaction_failed(&frame_fp, &live, e);
            return;
        }

        if expansion.is_expandable {
            self.log(
                self.trace("expand")
                    .with_screen(frame_fp.short())
                    .with_element(live.display_name())
                    .with_detail(format!(
                        "{:?} {:.2} ({})",
                        expansion.expansion_type, expansion.confidence, expansion.reason
                    )),
            );
            self.clock.sleep(self.strategy.expansion_settle_delay);
            self.after_expansion(stack, current, &live);
        } else {
            self.log(
                self.trace("click")
                    .with_screen(frame_fp.short())
                    .with_element(live.display_name()),
            );
            self.clock.sleep(self.strategy.settle_delay);
            match self.capture() {
                Ok(after) => self.handle_outcome(stack, &live, after),
                Err(e) => {
                    eprintln!("Warning: tree read after click failed: {}", e);
                    self.log(self.trace("read_failed").with_detail(e.to_string()));
                }
            }
        }
    }

    /// Classify what an expandable control did and handle each case.
    fn after_expansion(&mut self, stack: &mut Vec<Frame>, before: Capture, element: &ElementInfo) {
        let after = match self.capture() {
            Ok(after) => after,
            Err(e) => {
                eprintln!("Warning: tree read after expansion failed: {}", e);
                return;
            }
        };
        let Some(frame_fp) = stack.last().map(|f| f.fingerprint.clone()) else {
            return;
        };

        match classify_effect(&before.state, &after.state) {
            ExpansionEffect::Overlay { window_ids } => {
                let items: Vec<ElementInfo> = after.state.elements_in_windows(&window_ids).cloned().collect();
                for item in &items {
                    self.register_element(&frame_fp, item, DiscoveryOrigin::Overlay);
                }
                self.log(
                    self.trace("overlay_registered")
                        .with_screen(frame_fp.short())
                        .with_detail(format!("{} elements in {} window(s)", items.len(), window_ids.len())),
                );

                self.press_back();
                match self.capture() {
                    Ok(restored) if restored.state.fingerprint == before.state.fingerprint => {
                        self.log(self.trace("overlay_dismissed").with_screen(frame_fp.short()));
                    }
                    Ok(restored) => {
                        self.log(
                            self.trace("overlay_not_dismissed")
                                .with_screen(restored.state.fingerprint.short()),
                        );
                    }
                    Err(e) => eprintln!("Warning: tree read after overlay dismissal failed: {}", e),
                }
            }
            ExpansionEffect::InPlace { revealed } => {
                for item in &revealed {
                    self.register_element(&frame_fp, item, DiscoveryOrigin::Revealed);
                }
                let added = self.candidates(&frame_fp, revealed);
                if let Some(frame) = stack.last_mut() {
                    let mut remaining: Vec<ElementInfo> = frame.remaining.drain(..).chain(added).collect();
                    exploration_order(&mut remaining);
                    frame.remaining = remaining.into();
                    frame.expected = after.state.fingerprint.clone();
                }
                self.log(self.trace("revealed_in_place").with_screen(frame_fp.short()));
            }
            ExpansionEffect::Navigated => self.handle_outcome(stack, element, after),
            ExpansionEffect::NoChange => {
                self.log(
                    self.trace("expansion_no_change")
                        .with_screen(frame_fp.short())
                        .with_element(element.display_name()),
                );
            }
        }
    }

    /// Decide what a click led to: nothing, a known screen, or a new one.
    fn handle_outcome(&mut self, stack: &mut Vec<Frame>, element: &ElementInfo, after: Capture) {
        let Some((frame_fp, depth)) = stack.last().map(|f| (f.fingerprint.clone(), f.depth)) else {
            return;
        };

        if after.state.package != self.package {
            self.external_exit(&after.state.package);
            return;
        }

        let (capture, via_back) = match self.resolve_conditions(after) {
            Resolution::Ready { capture, via_back } => (capture, via_back),
            Resolution::Abandoned { reason } => {
                self.abandon(None, reason);
                return;
            }
        };
        let fp = capture.state.fingerprint.clone();

        if stack.last().map(|f| f.shows(&fp)).unwrap_or(false) {
            self.log(
                self.trace("no_navigation")
                    .with_screen(frame_fp.short())
                    .with_element(element.display_name()),
            );
            return;
        }
        if capture.state.package != self.package {
            self.external_exit(&capture.state.package);
            return;
        }
        if via_back {
            self.log(self.trace("landed_after_back_dismissal").with_screen(fp.short()));
            return;
        }

        if self.graph.contains(&fp) {
            // No recursion; return so the current screen's remaining
            // candidates are still explored. Landing is verified on the next
            // iteration.
            self.record_edge(&frame_fp, element, &fp);
            self.log(self.trace("known_screen").with_screen(fp.short()));
            self.press_back();
            return;
        }

        self.enter_screen(stack, capture.state, depth + 1);
        self.record_edge(&frame_fp, element, &fp);
    }

    // ========================================================================
    // Transient and blocking states
    // ========================================================================

    /// Run the state detectors until the screen is explorable or the branch
    /// has to be given up.
    fn resolve_conditions(&mut self, capture: Capture) -> Resolution {
        let mut capture = capture;
        let mut loading_retries = 0;
        let mut dismissals = 0;
        let mut via_back = false;

        loop {
            let Some(verdict) = classify_state(&capture.snapshot) else {
                return Resolution::Ready { capture, via_back };
            };
            if self.time_exceeded() {
                return Resolution::Abandoned {
                    reason: format!("time budget ran out on {:?} screen", verdict.condition),
                };
            }

            self.log(
                self.trace("state_detected")
                    .with_screen(capture.state.fingerprint.short())
                    .with_detail(format!(
                        "{:?} {:.2} [{}]",
                        verdict.condition,
                        verdict.confidence,
                        verdict.signals.join(", ")
                    )),
            );

            match verdict.action {
                RecommendedAction::Continue => return Resolution::Ready { capture, via_back },
                RecommendedAction::WaitAndRetry => {
                    if loading_retries >= self.strategy.loading_retry_limit {
                        return Resolution::Abandoned {
                            reason: format!("still loading after {} retries", loading_retries),
                        };
                    }
                    loading_retries += 1;
                    self.clock.sleep(self.strategy.loading_retry_delay);
                }
                RecommendedAction::SkipScreen => {
                    if dismissals >= self.strategy.dismiss_retry_limit {
                        return Resolution::Abandoned {
                            reason: format!("{:?} not dismissed after {} attempts", verdict.condition, dismissals),
                        };
                    }
                    dismissals += 1;

                    // Dismiss buttons go through the same danger check as
                    // every other click.
                    let target = verdict
                        .dismiss_target
                        .as_ref()
                        .and_then(|t| capture.state.elements.iter().find(|e| &e.target == t))
                        .cloned();
                    let clicked = match target {
                        Some(element) if element.dangerous => {
                            self.log(
                                self.trace("dismiss_target_dangerous")
                                    .with_screen(capture.state.fingerprint.short())
                                    .with_element(element.display_name()),
                            );
                            false
                        }
                        Some(element) => self.provider.perform_click(&element.target).is_ok(),
                        None => false,
                    };
                    if !clicked {
                        via_back = true;
                        if let Err(e) = self.provider.perform_back() {
                            self.log(self.trace("dismiss_failed").with_detail(e.to_string()));
                        }
                    }
                    self.clock.sleep(self.strategy.settle_delay);
                }
                RecommendedAction::PauseForUser => match self.await_user(verdict.condition) {
                    Some(resumed) => {
                        capture = resumed;
                        continue;
                    }
                    None => {
                        return Resolution::Abandoned {
                            reason: format!("{:?} not resolved by the user", verdict.condition),
                        };
                    }
                },
            }

            capture = match self.capture() {
                Ok(c) => c,
                Err(e) => {
                    return Resolution::Abandoned {
                        reason: format!("tree read failed: {}", e),
                    };
                }
            };
        }
    }

    /// Poll until the blocking state disappears or the pause times out.
    fn await_user(&mut self, condition: ScreenCondition) -> Option<Capture> {
        self.set_state(EngineState::Paused);
        self.observer.on_event(&ExplorationEvent::Paused {
            condition,
            timeout_ms: self.strategy.pause_timeout.as_millis() as u64,
        });

        let deadline = self.clock.now() + self.strategy.pause_timeout;
        while self.clock.now() < deadline && !self.time_exceeded() {
            self.clock.sleep(self.strategy.pause_poll_interval);

            match self.capture() {
                Ok(capture) => {
                    let still_blocked = classify_state(&capture.snapshot)
                        .map(|v| v.condition == condition)
                        .unwrap_or(false);
                    if !still_blocked {
                        self.set_state(EngineState::Exploring);
                        self.observer.on_event(&ExplorationEvent::Resumed { condition });
                        return Some(capture);
                    }
                }
                Err(e) => eprintln!("Warning: tree read while paused failed: {}", e),
            }
        }

        self.set_state(EngineState::Exploring);
        None
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a newly discovered screen and push its frame.
    fn enter_screen(&mut self, stack: &mut Vec<Frame>, state: ScreenState, depth: usize) {
        let fp = state.fingerprint.clone();
        let node = ScreenNode {
            fingerprint: fp.clone(),
            package: state.package.clone(),
            depth,
            element_count: state.element_count(),
            discovered_at_ms: state.captured_at_ms,
        };
        if !self.graph.add_screen(node.clone()) {
            return;
        }

        self.session.screens_discovered += 1;
        self.session.enter_depth(depth);
        if let Err(e) = self.store.save_screen(&node) {
            eprintln!("Warning: failed to persist screen {}: {}", fp.short(), e);
        }
        self.observer.on_event(&ExplorationEvent::ScreenDiscovered {
            screen: fp.clone(),
            depth,
            element_count: state.element_count(),
        });
        self.log(
            self.trace("screen_discovered")
                .with_screen(fp.short())
                .with_detail(format!("depth {}, {} elements", depth, state.element_count())),
        );

        for element in &state.elements {
            self.register_element(&fp, element, DiscoveryOrigin::Screen);
        }

        let mut remaining = self.candidates(&fp, state.elements);
        if depth >= self.strategy.max_depth {
            self.log(self.trace("depth_limit").with_screen(fp.short()));
            remaining.clear();
        }

        stack.push(Frame {
            fingerprint: fp.clone(),
            expected: fp,
            depth,
            remaining,
        });
    }

    /// Filter and order the elements the engine may click on a screen.
    fn candidates(&mut self, screen: &ScreenFingerprint, elements: Vec<ElementInfo>) -> VecDeque<ElementInfo> {
        let mut elements = elements;
        exploration_order(&mut elements);

        let mut out = VecDeque::new();
        for element in elements {
            if element.dangerous {
                self.session.dangerous_skipped += 1;
                self.observer.on_event(&ExplorationEvent::DangerousSkipped {
                    screen: screen.clone(),
                    label: element.display_name(),
                });
                self.log(
                    self.trace("dangerous_skipped")
                        .with_screen(screen.short())
                        .with_element(element.display_name()),
                );
                continue;
            }
            match element.class {
                ElementClass::BackNavigation => {
                    // Covered by backtracking.
                    self.tracker.mark_clicked(screen, &element.fingerprint);
                    continue;
                }
                ElementClass::Input => continue,
                _ => {}
            }
            if !element.clickable || out.len() >= self.strategy.max_elements_per_screen {
                continue;
            }
            out.push_back(element);
        }
        out
    }

    fn register_element(&mut self, screen: &ScreenFingerprint, element: &ElementInfo, origin: DiscoveryOrigin) {
        self.session.elements_discovered += 1;

        let record = ElementRecord {
            screen: screen.clone(),
            origin,
            element: element.clone(),
        };
        if let Err(e) = self.store.save_element(&record) {
            eprintln!("Warning: failed to persist element '{}': {}", element.display_name(), e);
        }
        self.observer.on_event(&ExplorationEvent::ElementDiscovered {
            screen: screen.clone(),
            element: element.fingerprint.clone(),
            label: element.display_name(),
            origin,
        });
    }

    fn record_edge(&mut self, from: &ScreenFingerprint, element: &ElementInfo, to: &ScreenFingerprint) {
        let at = self.elapsed_ms();
        let edge = match self.graph.add_edge(from, &element.fingerprint, to, at) {
            Ok(edge) => edge.clone(),
            Err(e) => {
                eprintln!("Warning: edge not recorded: {}", e);
                return;
            }
        };

        self.session.edges_recorded += 1;
        if let Err(e) = self.store.save_edge(&edge) {
            eprintln!("Warning: failed to persist edge: {}", e);
        }
        self.log(
            self.trace("edge")
                .with_screen(format!("{} -> {}", from.short(), to.short()))
                .with_element(element.display_name()),
        );
    }

    // ========================================================================
    // Failure bookkeeping
    // ========================================================================

    fn interaction_failed(&mut self, screen: &ScreenFingerprint, element: &ElementInfo, error: InteractionError) {
        self.session.interaction_failures += 1;
        eprintln!(
            "Warning: click on '{}' failed: {}",
            element.display_name(),
            error
        );
        self.observer.on_event(&ExplorationEvent::InteractionFailed {
            screen: screen.clone(),
            label: element.display_name(),
            error: error.to_string(),
        });
        self.log(
            self.trace("interaction_failed")
                .with_screen(screen.short())
                .with_element(element.display_name())
                .with_detail(error.to_string()),
        );
    }

    fn abandon(&mut self, screen: Option<ScreenFingerprint>, reason: String) {
        self.session.branches_abandoned += 1;
        let mut event = self.trace("branch_abandoned").with_detail(&reason);
        if let Some(fp) = &screen {
            event = event.with_screen(fp.short());
        }
        self.log(event);
        self.observer
            .on_event(&ExplorationEvent::BranchAbandoned { screen, reason });
    }

    fn external_exit(&mut self, package: &str) {
        self.session.external_exits += 1;
        self.log(self.trace("left_target_package").with_detail(package));
    }

    // ========================================================================
    // Provider and clock helpers
    // ========================================================================

    fn capture(&mut self) -> Result<Capture, InteractionError> {
        let snapshot = self.provider.current_tree()?;
        let state = build_state(&snapshot, self.danger.as_ref(), self.elapsed_ms());
        Ok(Capture { snapshot, state })
    }

    fn backtrack(&mut self) {
        self.set_state(EngineState::Backtracking);
        self.press_back();
    }

    fn press_back(&mut self) {
        if let Err(e) = self.provider.perform_back() {
            eprintln!("Warning: back action failed: {}", e);
            self.log(self.trace("back_failed").with_detail(e.to_string()));
        }
        self.clock.sleep(self.strategy.backtrack_delay);
    }

    fn elapsed(&self) -> Duration {
        self.clock.now().saturating_sub(self.origin)
    }

    fn elapsed_ms(&self) -> u64 {
        self.elapsed().as_millis() as u64
    }

    fn time_exceeded(&self) -> bool {
        self.elapsed() > self.strategy.max_duration
    }

    fn set_state(&mut self, next: EngineState) {
        if self.state != next {
            let from = self.state;
            self.state = next;
            self.log(self.trace("state").with_detail(format!("{:?} -> {:?}", from, next)));
        }
    }

    fn trace(&self, decision: &str) -> TraceEvent {
        TraceEvent::now(self.step, self.state, decision)
    }

    fn log(&mut self, event: TraceEvent) {
        self.step += 1;
        if let Some(tracer) = self.tracer {
            tracer.log(&event);
        }
    }
}
