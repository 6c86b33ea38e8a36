use serde::{Deserialize, Serialize};

/// Substring that marks a property as a per-year population attribute.
pub const DEFAULT_ATTRIBUTE_MARKER: &str = "Pop";

/// Name of one year's population field on a feature, e.g. `Pop_2015`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeKey(String);

impl AttributeKey {
    pub fn new(name: impl Into<String>) -> Self {
        AttributeKey(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text after the first `_`, used as the year label. Empty when the key
    /// carries no suffix.
    pub fn year(&self) -> &str {
        self.0.split('_').nth(1).unwrap_or("")
    }
}

pub fn is_attribute_name(name: &str, marker: &str) -> bool {
    name.contains(marker)
}

impl std::fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttributeKey {
    fn from(value: &str) -> Self {
        AttributeKey::new(value)
    }
}

impl From<String> for AttributeKey {
    fn from(value: String) -> Self {
        AttributeKey(value)
    }
}

impl AsRef<str> for AttributeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
