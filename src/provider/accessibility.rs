use std::fmt;

use crate::tree::node_model::{ElementRef, UiSnapshot};

/// Platform side of exploration: reads the live tree and injects gestures.
///
/// Every call is a fresh interaction with the device; nothing is cached.
pub trait AccessibilityProvider {
    fn current_tree(&mut self) -> Result<UiSnapshot, InteractionError>;

    fn perform_click(&mut self, target: &ElementRef) -> Result<(), InteractionError>;

    fn perform_back(&mut self) -> Result<(), InteractionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum InteractionError {
    /// The app or OS denied the action (window gone, service disconnected).
    Unavailable { action: String, reason: String },

    /// The addressed node is not in the current tree.
    ElementNotFound(ElementRef),

    /// The node exists but refused the gesture.
    Rejected { action: String, reason: String },
}

impl fmt::Display for InteractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InteractionError::Unavailable { action, reason } => {
                write!(f, "{} unavailable: {}", action, reason)
            }
            InteractionError::ElementNotFound(target) => {
                write!(f, "Element {} not found in current tree", target)
            }
            InteractionError::Rejected { action, reason } => {
                write!(f, "{} rejected: {}", action, reason)
            }
        }
    }
}

impl std::error::Error for InteractionError {}
