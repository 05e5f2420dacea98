use crate::state::state_model::ElementInfo;

/// Decides whether an element's action is destructive or irreversible.
///
/// Dangerous elements are registered like any other element but never
/// clicked by the engine.
pub trait DangerPolicy {
    fn is_dangerous(&self, element: &ElementInfo) -> bool;
}

pub const DEFAULT_DANGER_KEYWORDS: &[&str] = &[
    "delete",
    "remove",
    "log out",
    "logout",
    "sign out",
    "signout",
    "uninstall",
    "reset",
    "factory reset",
    "erase",
    "wipe",
    "clear data",
    "clear all",
    "deactivate",
    "close account",
    "unsubscribe",
    "purchase",
    "buy",
    "pay",
    "send",
    "call",
];

/// Matches whole words or phrases of the label and resource id against a
/// keyword list. `"send"` matches "Send message" and `btn_send` but not
/// "Sender settings".
#[derive(Debug, Clone)]
pub struct KeywordDangerPolicy {
    keywords: Vec<Vec<String>>,
}

impl Default for KeywordDangerPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DANGER_KEYWORDS.iter().copied())
    }
}

impl KeywordDangerPolicy {
    pub fn new<'a>(keywords: impl IntoIterator<Item = &'a str>) -> Self {
        let keywords = keywords
            .into_iter()
            .map(tokenize)
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// Default keywords plus caller-supplied extras.
    pub fn with_extra(extra: &[String]) -> Self {
        Self::new(
            DEFAULT_DANGER_KEYWORDS
                .iter()
                .copied()
                .chain(extra.iter().map(String::as_str)),
        )
    }

    fn matches(&self, text: &str) -> bool {
        let tokens = tokenize(text);
        self.keywords
            .iter()
            .any(|phrase| tokens.windows(phrase.len()).any(|w| w == phrase.as_slice()))
    }
}

impl DangerPolicy for KeywordDangerPolicy {
    fn is_dangerous(&self, element: &ElementInfo) -> bool {
        let label_hit = element.label.as_deref().map(|l| self.matches(l)).unwrap_or(false);
        let id_hit = element
            .resource_id
            .as_deref()
            .map(|id| self.matches(id.rsplit('/').next().unwrap_or(id)))
            .unwrap_or(false);
        label_hit || id_hit
    }
}

/// Lowercase alphanumeric tokens; `_`, `-` and punctuation split words.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Policy that never flags anything. Useful for apps explored in a sandbox.
pub struct AllowAll;

impl DangerPolicy for AllowAll {
    fn is_dangerous(&self, _element: &ElementInfo) -> bool {
        false
    }
}
