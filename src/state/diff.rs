use std::collections::HashSet;

use crate::state::state_model::{ElementInfo, ScreenState};

#[derive(Debug)]
pub struct ElementDiff {
    pub added: Vec<ElementInfo>,
    pub removed: Vec<ElementInfo>,
    pub unchanged: Vec<ElementInfo>,
}

/// Compare two captures by element fingerprint. Results keep tree order.
pub fn diff_elements(before: &ScreenState, after: &ScreenState) -> ElementDiff {
    let before_ids: HashSet<_> = before.elements.iter().map(|e| &e.fingerprint).collect();
    let after_ids: HashSet<_> = after.elements.iter().map(|e| &e.fingerprint).collect();

    let added = after
        .elements
        .iter()
        .filter(|e| !before_ids.contains(&e.fingerprint))
        .cloned()
        .collect();

    let removed = before
        .elements
        .iter()
        .filter(|e| !after_ids.contains(&e.fingerprint))
        .cloned()
        .collect();

    let unchanged = after
        .elements
        .iter()
        .filter(|e| before_ids.contains(&e.fingerprint))
        .cloned()
        .collect();

    ElementDiff {
        added,
        removed,
        unchanged,
    }
}
