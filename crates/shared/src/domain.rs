use std::fmt;

use serde::{Deserialize, Serialize};

pub const MAX_INITIALS_CHARS: usize = 3;

/// Sign-off initials, always upper-case and at most three characters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Initials(String);

impl Initials {
    pub fn new(raw: &str) -> Self {
        Self(normalize_initials(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Initials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Initials {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Upper-cases `raw` and keeps its first three characters.
///
/// Upper-casing is per character, so this equals upper-casing the first
/// three input characters and truncating again, which keeps the transform
/// idempotent even for characters that expand (`ß` -> `SS`).
pub fn normalize_initials(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_uppercase)
        .take(MAX_INITIALS_CHARS)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Success,
    Error,
}

impl StatusKind {
    pub fn is_success(self) -> bool {
        self == StatusKind::Success
    }
}
