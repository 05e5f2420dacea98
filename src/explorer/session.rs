use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    Idle,
    Exploring,
    /// Waiting for the user to resolve a login or permission screen.
    Paused,
    Backtracking,
    Completed,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Every reachable element was tried.
    Completed,
    /// The time ceiling was hit; results are partial.
    TimedOut,
    /// The screen limit was hit; results are partial.
    ScreenLimit,
}

/// Mutable counters of a running session.
#[derive(Debug, Clone)]
pub struct ExplorationSession {
    pub package: String,
    pub started_at_ms: u64,
    pub current_depth: usize,
    pub max_depth_reached: usize,
    pub screens_discovered: usize,
    pub elements_discovered: usize,
    pub edges_recorded: usize,
    pub dangerous_skipped: usize,
    pub interactions: usize,
    pub interaction_failures: usize,
    pub branches_abandoned: usize,
    pub external_exits: usize,
}

impl ExplorationSession {
    pub fn start(package: &str, started_at_ms: u64) -> Self {
        Self {
            package: package.to_string(),
            started_at_ms,
            current_depth: 0,
            max_depth_reached: 0,
            screens_discovered: 0,
            elements_discovered: 0,
            edges_recorded: 0,
            dangerous_skipped: 0,
            interactions: 0,
            interaction_failures: 0,
            branches_abandoned: 0,
            external_exits: 0,
        }
    }

    pub fn enter_depth(&mut self, depth: usize) {
        self.current_depth = depth;
        self.max_depth_reached = self.max_depth_reached.max(depth);
    }

    /// Close the session. Consumes it, so a finalized session cannot change.
    pub fn finalize(self, termination: TerminationReason, now_ms: u64) -> ExplorationSummary {
        ExplorationSummary {
            package: self.package,
            termination,
            elapsed_ms: now_ms.saturating_sub(self.started_at_ms),
            screens_discovered: self.screens_discovered,
            elements_discovered: self.elements_discovered,
            edges_recorded: self.edges_recorded,
            dangerous_skipped: self.dangerous_skipped,
            interactions: self.interactions,
            interaction_failures: self.interaction_failures,
            branches_abandoned: self.branches_abandoned,
            external_exits: self.external_exits,
            max_depth_reached: self.max_depth_reached,
        }
    }
}

/// Final, immutable result of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationSummary {
    pub package: String,
    pub termination: TerminationReason,
    pub elapsed_ms: u64,
    pub screens_discovered: usize,
    pub elements_discovered: usize,
    pub edges_recorded: usize,
    pub dangerous_skipped: usize,
    pub interactions: usize,
    pub interaction_failures: usize,
    pub branches_abandoned: usize,
    pub external_exits: usize,
    pub max_depth_reached: usize,
}
