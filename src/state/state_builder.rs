use crate::state::fingerprint::screen_fingerprint;
use crate::state::state_model::ScreenState;
use crate::tree::danger::DangerPolicy;
use crate::tree::elements::enumerate_elements;
use crate::tree::node_model::UiSnapshot;

/// Turn a raw tree read into a `ScreenState`.
pub fn build_state(snapshot: &UiSnapshot, danger: &dyn DangerPolicy, captured_at_ms: u64) -> ScreenState {
    ScreenState {
        fingerprint: screen_fingerprint(snapshot),
        package: snapshot.package.clone(),
        elements: enumerate_elements(snapshot, danger),
        window_ids: snapshot.screen_windows().map(|w| w.id).collect(),
        captured_at_ms,
    }
}
