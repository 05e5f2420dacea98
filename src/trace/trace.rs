use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::explorer::session::EngineState;

/// One engine decision, written as a JSON line.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,
    pub step: u64,

    pub engine_state: String,

    pub screen: Option<String>,
    pub element: Option<String>,

    pub decision: String,
    pub detail: Option<String>,
}

impl TraceEvent {
    pub fn now(step: u64, state: EngineState, decision: impl ToString) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            step,
            engine_state: format!("{:?}", state),
            screen: None,
            element: None,
            decision: decision.to_string(),
            detail: None,
        }
    }

    pub fn with_screen(mut self, screen: impl ToString) -> Self {
        self.screen = Some(screen.to_string());
        self
    }

    pub fn with_element(mut self, element: impl ToString) -> Self {
        self.element = Some(element.to_string());
        self
    }

    pub fn with_detail(mut self, detail: impl ToString) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}
