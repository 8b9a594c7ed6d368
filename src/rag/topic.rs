use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::errors::RagError;

/// Canonical cache/storage key for a topic: trimmed, lowercased, every
/// whitespace run replaced by a single `_`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicKey(String);

impl TopicKey {
    pub fn normalize(raw: &str) -> Result<Self, RagError> {
        let key = raw
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("_");

        if key.is_empty() {
            return Err(RagError::InvalidTopic(raw.to_string()));
        }
        Ok(Self(key))
    }

    /// Wrap a key read back from storage, where it was already normalized.
    pub(crate) fn from_stored(key: String) -> Self {
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A topic as the caller spelled it, plus its canonical key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    name: String,
    key: TopicKey,
}

impl Topic {
    pub fn parse(raw: &str) -> Result<Self, RagError> {
        let key = TopicKey::normalize(raw)?;
        Ok(Self {
            name: raw.trim().to_string(),
            key,
        })
    }

    /// Spelling handed to the text source.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &TopicKey {
        &self.key
    }
}
