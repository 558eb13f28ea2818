use serde::{Deserialize, Serialize};
use std::fmt;

pub const DELIMITER: char = '/';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid prefix {0:?}: must be empty or end with '/'")]
pub struct InvalidPrefix(pub String);

/// Listing position inside a bucket.
///
/// Either empty (the bucket root) or a string ending with `/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Prefix(String);

impl Prefix {
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Accepts only strings that already satisfy the prefix invariant
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidPrefix> {
        let value = value.into();
        if value.is_empty() || value.ends_with(DELIMITER) {
            Ok(Self(value))
        } else {
            Err(InvalidPrefix(value))
        }
    }

    /// Lenient constructor for user-typed paths: `docs` and `/docs/` both become `docs/`
    pub fn directory(path: &str) -> Self {
        let trimmed = path.trim().trim_matches(DELIMITER);
        if trimmed.is_empty() {
            Self::root()
        } else {
            Self(format!("{}{}", trimmed, DELIMITER))
        }
    }

    /// Build from path segments; no segments yields the root
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        let mut path = String::new();
        for segment in segments {
            path.push_str(segment);
            path.push(DELIMITER);
        }
        Self(path)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Non-empty path segments, in order
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(DELIMITER).filter(|segment| !segment.is_empty())
    }

    /// Object key for `name` placed directly under this prefix
    pub fn join_key(&self, name: &str) -> String {
        format!("{}{}", self.0, name)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Prefix {
    type Error = InvalidPrefix;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Prefix> for String {
    fn from(prefix: Prefix) -> Self {
        prefix.0
    }
}

impl From<FolderPrefix> for Prefix {
    fn from(folder: FolderPrefix) -> Self {
        Self(folder.0)
    }
}

/// Common prefix returned by a delimited listing: a virtual folder.
/// Always non-empty and ending with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FolderPrefix(String);

impl FolderPrefix {
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidPrefix> {
        let value = value.into();
        if value.ends_with(DELIMITER) {
            Ok(Self(value))
        } else {
            Err(InvalidPrefix(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name relative to `parent`, without the trailing delimiter
    pub fn label(&self, parent: &Prefix) -> &str {
        self.0
            .strip_prefix(parent.as_str())
            .unwrap_or(&self.0)
            .trim_end_matches(DELIMITER)
    }
}

impl fmt::Display for FolderPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FolderPrefix {
    type Error = InvalidPrefix;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FolderPrefix> for String {
    fn from(folder: FolderPrefix) -> Self {
        folder.0
    }
}
