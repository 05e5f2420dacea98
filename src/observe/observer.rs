use std::sync::Mutex;
use std::time::Duration;

use crate::observe::events::ExplorationEvent;

/// Receives progress events. Must not fail or block exploration for long.
pub trait ExplorationObserver {
    fn on_event(&self, event: &ExplorationEvent);
}

pub struct NullObserver;

impl ExplorationObserver for NullObserver {
    fn on_event(&self, _event: &ExplorationEvent) {}
}

/// Human-readable progress on stderr.
///
/// Verbosity 0 prints only pauses and the final result, 1 adds screens and
/// abandoned branches, 2 adds every element.
pub struct ConsoleObserver {
    pub verbose: u8,
}

impl ExplorationObserver for ConsoleObserver {
    fn on_event(&self, event: &ExplorationEvent) {
        match event {
            ExplorationEvent::SessionStarted { package } => {
                if self.verbose > 0 {
                    eprintln!("Exploring {}...", package);
                }
            }
            ExplorationEvent::ScreenDiscovered {
                screen,
                depth,
                element_count,
            } => {
                if self.verbose > 0 {
                    eprintln!("  [{}] screen {} ({} elements)", depth, screen.short(), element_count);
                }
            }
            ExplorationEvent::ElementDiscovered { label, origin, .. } => {
                if self.verbose > 1 {
                    eprintln!("      + {} ({:?})", label, origin);
                }
            }
            ExplorationEvent::DangerousSkipped { label, .. } => {
                if self.verbose > 1 {
                    eprintln!("      ! skipped dangerous '{}'", label);
                }
            }
            ExplorationEvent::Paused { condition, timeout_ms } => {
                eprintln!(
                    "Paused: {:?} screen needs user action (waiting up to {}s)",
                    condition,
                    timeout_ms / 1000
                );
            }
            ExplorationEvent::Resumed { condition } => {
                eprintln!("Resumed after {:?}", condition);
            }
            ExplorationEvent::BranchAbandoned { reason, .. } => {
                if self.verbose > 0 {
                    eprintln!("  branch abandoned: {}", reason);
                }
            }
            ExplorationEvent::InteractionFailed { label, error, .. } => {
                if self.verbose > 0 {
                    eprintln!("  click on '{}' failed: {}", label, error);
                }
            }
            ExplorationEvent::SessionCompleted { summary } => {
                eprintln!(
                    "Exploration completed: {} screens, {} elements in {:.1}s",
                    summary.screens_discovered,
                    summary.elements_discovered,
                    summary.elapsed_ms as f64 / 1000.0
                );
            }
            ExplorationEvent::SessionTimedOut { summary } => {
                eprintln!(
                    "Exploration timed out: {} screens, {} elements in {:.1}s",
                    summary.screens_discovered,
                    summary.elements_discovered,
                    summary.elapsed_ms as f64 / 1000.0
                );
            }
        }
    }
}

/// Keeps every event. Used by tests and by callers that post-process a run.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ExplorationEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExplorationEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self, name: &str) -> usize {
        self.events().iter().filter(|e| e.name() == name).count()
    }
}

impl ExplorationObserver for RecordingObserver {
    fn on_event(&self, event: &ExplorationEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(e) => eprintln!("Warning: event recorder lock poisoned: {}", e),
        }
    }
}

/// Posts every event as JSON to a remote progress endpoint.
///
/// Delivery is best effort: failures are reported once per event on stderr
/// and never interrupt exploration.
pub struct HttpObserver {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpObserver {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ExplorationObserver for HttpObserver {
    fn on_event(&self, event: &ExplorationEvent) {
        let result = self
            .client
            .post(&self.endpoint)
            .json(event)
            .send()
            .and_then(|r| r.error_for_status());

        if let Err(e) = result {
            eprintln!("Warning: could not deliver {} event to {}: {}", event.name(), self.endpoint, e);
        }
    }
}

/// Fans events out to several observers in order.
pub struct ObserverSet<'a> {
    observers: Vec<&'a dyn ExplorationObserver>,
}

impl<'a> ObserverSet<'a> {
    pub fn new(observers: Vec<&'a dyn ExplorationObserver>) -> Self {
        Self { observers }
    }
}

impl ExplorationObserver for ObserverSet<'_> {
    fn on_event(&self, event: &ExplorationEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
