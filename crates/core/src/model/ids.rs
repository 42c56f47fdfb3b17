use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a quiz item within one quiz.
///
/// Ids arrive as model-authored text (`"q1"`, `"q2"`, ...) and are treated as
/// opaque strings; the normalizer assigns positional ids when none are given.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Creates a new `ItemId` from any string-ish value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds the positional id used when an item carries none (`q1`, `q2`, ...).
    #[must_use]
    pub fn positional(position: usize) -> Self {
        Self(format!("q{position}"))
    }

    /// Returns the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ItemId({})", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_display() {
        let id = ItemId::new("q7");
        assert_eq!(id.to_string(), "q7");
    }

    #[test]
    fn positional_id_is_one_based() {
        assert_eq!(ItemId::positional(1), ItemId::new("q1"));
        assert_eq!(ItemId::positional(12), ItemId::new("q12"));
    }
}
