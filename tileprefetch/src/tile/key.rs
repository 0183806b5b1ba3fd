use std::fmt;

/// Opaque identifier for one map tile.
///
/// Keys compare by value and carry no ordering of their own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey(String);

impl TileKey {
    /// Creates a key from any string-like value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the key and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TileKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TileKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for TileKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}
