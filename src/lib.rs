//! Depth-first exploration of an app's UI through its accessibility tree.
//!
//! The engine (`explorer::engine`) reads node trees from an
//! `AccessibilityProvider`, fingerprints each screen, clicks every safe
//! element once and records the resulting navigation graph.

pub mod cli;
pub mod detect;
pub mod explorer;
pub mod observe;
pub mod persist;
pub mod provider;
pub mod report;
pub mod state;
pub mod trace;
pub mod tree;
