use serde::Serialize;

use crate::detect::state_detector::ScreenCondition;
use crate::explorer::session::ExplorationSummary;
use crate::persist::records::DiscoveryOrigin;
use crate::state::fingerprint::{ElementFingerprint, ScreenFingerprint};

/// Progress events for UI overlays and remote listeners.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExplorationEvent {
    SessionStarted {
        package: String,
    },
    ScreenDiscovered {
        screen: ScreenFingerprint,
        depth: usize,
        element_count: usize,
    },
    ElementDiscovered {
        screen: ScreenFingerprint,
        element: ElementFingerprint,
        label: String,
        origin: DiscoveryOrigin,
    },
    DangerousSkipped {
        screen: ScreenFingerprint,
        label: String,
    },
    /// A blocking state needs the user (log in, grant a permission).
    Paused {
        condition: ScreenCondition,
        timeout_ms: u64,
    },
    Resumed {
        condition: ScreenCondition,
    },
    BranchAbandoned {
        screen: Option<ScreenFingerprint>,
        reason: String,
    },
    InteractionFailed {
        screen: ScreenFingerprint,
        label: String,
        error: String,
    },
    SessionCompleted {
        summary: ExplorationSummary,
    },
    SessionTimedOut {
        summary: ExplorationSummary,
    },
}

impl ExplorationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ExplorationEvent::SessionStarted { .. } => "session_started",
            ExplorationEvent::ScreenDiscovered { .. } => "screen_discovered",
            ExplorationEvent::ElementDiscovered { .. } => "element_discovered",
            ExplorationEvent::DangerousSkipped { .. } => "dangerous_skipped",
            ExplorationEvent::Paused { .. } => "paused",
            ExplorationEvent::Resumed { .. } => "resumed",
            ExplorationEvent::BranchAbandoned { .. } => "branch_abandoned",
            ExplorationEvent::InteractionFailed { .. } => "interaction_failed",
            ExplorationEvent::SessionCompleted { .. } => "session_completed",
            ExplorationEvent::SessionTimedOut { .. } => "session_timed_out",
        }
    }
}
