use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::explorer::error::ExplorerError;

// ============================================================================
// Exploration strategy
// ============================================================================

/// Traversal limits and timing for one exploration session.
///
/// Every delay and threshold is operational tuning, not structure, so all of
/// them live here instead of in the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorationStrategy {
    /// Deepest screen level explored; the start screen is depth 0 (default 10)
    pub max_depth: usize,

    /// Session time ceiling (default 5 minutes)
    pub max_duration: Duration,

    /// Wait after each click for transitions and animations (default 1s)
    pub settle_delay: Duration,

    /// Wait after each back action (default 500ms)
    pub backtrack_delay: Duration,

    /// Wait after clicking an expandable control (default 500ms)
    pub expansion_settle_delay: Duration,

    /// Minimum expansion confidence to run the expansion protocol (default 0.65)
    pub expandable_threshold: f32,

    /// Re-reads of a loading screen before giving up on it (default 3)
    pub loading_retry_limit: u32,

    /// Wait between loading re-reads (default 1s)
    pub loading_retry_delay: Duration,

    /// Dismissal attempts for dialogs, tutorials and error screens (default 3)
    pub dismiss_retry_limit: u32,

    /// How long a login/permission pause waits for the user (default 60s)
    pub pause_timeout: Duration,

    /// Re-read interval while paused (default 2s)
    pub pause_poll_interval: Duration,

    /// Stop after this many distinct screens (default 200)
    pub max_screens: usize,

    /// Clickable candidates considered per screen (default 100)
    pub max_elements_per_screen: usize,

    /// Extra back presses when a backtrack lands on the wrong screen (default 3)
    pub backtrack_retry_limit: u32,
}

impl Default for ExplorationStrategy {
    fn default() -> Self {
        Self {
            max_depth: 10,
            max_duration: Duration::from_secs(300),
            settle_delay: Duration::from_millis(1000),
            backtrack_delay: Duration::from_millis(500),
            expansion_settle_delay: Duration::from_millis(500),
            expandable_threshold: 0.65,
            loading_retry_limit: 3,
            loading_retry_delay: Duration::from_millis(1000),
            dismiss_retry_limit: 3,
            pause_timeout: Duration::from_secs(60),
            pause_poll_interval: Duration::from_secs(2),
            max_screens: 200,
            max_elements_per_screen: 100,
            backtrack_retry_limit: 3,
        }
    }
}

impl ExplorationStrategy {
    pub fn validate(&self) -> Result<(), ExplorerError> {
        if !(0.0..=1.0).contains(&self.expandable_threshold) {
            return Err(ExplorerError::InvalidStrategy(format!(
                "expandable_threshold must be within 0.0..=1.0, got {}",
                self.expandable_threshold
            )));
        }
        if self.pause_poll_interval.is_zero() && !self.pause_timeout.is_zero() {
            return Err(ExplorerError::InvalidStrategy(
                "pause_poll_interval must be positive when pause_timeout is set".into(),
            ));
        }
        if self.max_screens == 0 {
            return Err(ExplorerError::InvalidStrategy("max_screens must be at least 1".into()));
        }
        Ok(())
    }
}
