use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_NAME_CHARS: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("player name is empty")]
    Empty,
    #[error("player name too long (len={len}, max={max})")]
    TooLong { len: usize, max: usize },
}

/// A player name that passed the entry gate: trimmed, 1 to 12 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        let trimmed = raw.trim();
        let len = trimmed.chars().count();
        if len == 0 {
            return Err(NameError::Empty);
        }
        if len > MAX_NAME_CHARS {
            return Err(NameError::TooLong {
                len,
                max: MAX_NAME_CHARS,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Stand-in name for headless and editor runs.
    pub fn guest() -> Self {
        Self("Guest".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlayerName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlayerName> for String {
    fn from(name: PlayerName) -> Self {
        name.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
