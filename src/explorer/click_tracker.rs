use std::collections::{HashMap, HashSet};

use crate::state::fingerprint::{ElementFingerprint, ScreenFingerprint};

/// Which elements have already been attempted on which screen.
///
/// Owned by one session; there is no way to unmark a pair. This is what
/// keeps cyclic apps (A -> B -> A) from recursing forever.
#[derive(Debug, Default)]
pub struct ClickTracker {
    clicked: HashMap<ScreenFingerprint, HashSet<ElementFingerprint>>,
}

impl ClickTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn was_clicked(&self, screen: &ScreenFingerprint, element: &ElementFingerprint) -> bool {
        self.clicked
            .get(screen)
            .map(|set| set.contains(element))
            .unwrap_or(false)
    }

    /// Returns `true` if the pair was not marked before. Marking twice is a no-op.
    pub fn mark_clicked(&mut self, screen: &ScreenFingerprint, element: &ElementFingerprint) -> bool {
        self.clicked
            .entry(screen.clone())
            .or_default()
            .insert(element.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_are_per_screen() {
        let mut tracker = ClickTracker::new();
        let home = ScreenFingerprint::from_hex("aa");
        let settings = ScreenFingerprint::from_hex("bb");
        let button = ElementFingerprint::from_hex("01");

        assert!(!tracker.was_clicked(&home, &button));
        assert!(tracker.mark_clicked(&home, &button));
        assert!(tracker.was_clicked(&home, &button));
        assert!(!tracker.was_clicked(&settings, &button));

        assert!(!tracker.mark_clicked(&home, &button), "second mark is a no-op");
    }
}
