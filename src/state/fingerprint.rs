use std::fmt;

use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};

use crate::state::normalize::stable_text;
use crate::tree::node_model::{AccessibilityNode, UiSnapshot, WindowKind};

/// Structural identity of a screen.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScreenFingerprint(String);

/// Identity of an element, independent of the screen it sits on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementFingerprint(String);

macro_rules! fingerprint_impl {
    ($name:ident) => {
        impl $name {
            pub fn from_hex(hex: impl Into<String>) -> Self {
                Self(hex.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// First ten hex digits, enough to tell screens apart in logs.
            pub fn short(&self) -> &str {
                &self.0[..self.0.len().min(10)]
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

fingerprint_impl!(ScreenFingerprint);
fingerprint_impl!(ElementFingerprint);

/// Hash the structural signature of every screen window.
///
/// Covers the package, each window's kind, and for every node in pre-order
/// its depth, class, resource id, and stable text/description. Volatile text
/// (clocks, counters) is skipped so a ticking clock does not create a new
/// screen. Deterministic and O(number of nodes).
pub fn screen_fingerprint(snapshot: &UiSnapshot) -> ScreenFingerprint {
    let mut hasher = Sha1::new();
    hasher.update(snapshot.package.as_bytes());

    for window in snapshot.screen_windows() {
        hasher.update(b"\x1ewindow:");
        hasher.update(window.kind.as_str().as_bytes());
        hash_node(&mut hasher, &window.root, 0);
    }

    ScreenFingerprint(format!("{:x}", hasher.finalize()))
}

fn hash_node(hasher: &mut Sha1, node: &AccessibilityNode, depth: usize) {
    let text = node.text.as_deref().and_then(stable_text).unwrap_or_default();
    let desc = node
        .content_description
        .as_deref()
        .and_then(stable_text)
        .unwrap_or_default();

    hasher.update(
        format!(
            "\x1f{}|{}|{}|{}|{}",
            depth,
            node.class_name,
            node.resource_id.as_deref().unwrap_or(""),
            text,
            desc
        )
        .as_bytes(),
    );

    for child in &node.children {
        hash_node(hasher, child, depth + 1);
    }
}

/// Hash an element's own identity: class, resource id, stable label, the
/// kind of window it lives in, and its occurrence index among otherwise
/// identical elements.
pub fn element_fingerprint(
    window_kind: WindowKind,
    node: &AccessibilityNode,
    label: Option<&str>,
    occurrence: usize,
) -> ElementFingerprint {
    let mut hasher = Sha1::new();
    hasher.update(
        format!(
            "{}|{}|{}|{}|{}",
            window_kind.as_str(),
            node.class_name,
            node.resource_id.as_deref().unwrap_or(""),
            label.and_then(stable_text).unwrap_or_default(),
            occurrence
        )
        .as_bytes(),
    );
    ElementFingerprint(format!("{:x}", hasher.finalize()))
}
