use std::fmt;

use crate::provider::accessibility::InteractionError;
use crate::state::fingerprint::ScreenFingerprint;

#[derive(Debug)]
pub enum ExplorerError {
    /// The first tree read failed, so no session could start.
    InitialCapture(InteractionError),

    /// Strategy values that make exploration meaningless.
    InvalidStrategy(String),

    /// An edge referenced a screen that was never captured.
    UnknownScreen(ScreenFingerprint),
}

impl fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExplorerError::InitialCapture(e) => {
                write!(f, "Could not read the initial screen: {}", e)
            }
            ExplorerError::InvalidStrategy(msg) => {
                write!(f, "Invalid exploration strategy: {}", msg)
            }
            ExplorerError::UnknownScreen(fp) => {
                write!(f, "Screen {} was never captured", fp.short())
            }
        }
    }
}

impl std::error::Error for ExplorerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExplorerError::InitialCapture(e) => Some(e),
            _ => None,
        }
    }
}
