//! Ordered list of levels

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, LevelError};
use crate::platform::ContentHandle;

/// One registered level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEntry {
    #[serde(default)]
    pub id: Option<String>,
    /// `None` means the entry was registered without content (a config error
    /// reported when the level is loaded)
    #[serde(default)]
    pub content: Option<ContentHandle>,
}

impl LevelEntry {
    pub fn new(id: impl Into<String>, content: ContentHandle) -> Self {
        Self {
            id: Some(id.into()),
            content: Some(content),
        }
    }

    pub fn anonymous(content: ContentHandle) -> Self {
        Self {
            id: None,
            content: Some(content),
        }
    }

    /// Name given to the instantiated level
    pub fn instance_name(&self, index: usize) -> String {
        match self.id.as_deref() {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("Level_{index}"),
        }
    }
}

/// Immutable, ordered level list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelCatalog {
    entries: Vec<LevelEntry>,
}

impl LevelCatalog {
    /// Build a catalog; ids must be unique when present
    pub fn new(entries: Vec<LevelEntry>) -> Result<Self, LevelError> {
        for (i, entry) in entries.iter().enumerate() {
            if let Some(id) = entry.id.as_deref() {
                if entries[..i].iter().any(|e| e.id.as_deref() == Some(id)) {
                    return Err(LevelError::DuplicateId { id: id.to_string() });
                }
            }
        }
        Ok(Self { entries })
    }

    /// Parse a JSON array of entries
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let entries: Vec<LevelEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries)?)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LevelEntry> {
        self.entries.get(index)
    }

    /// Clamp into `[0, len)`; `None` for an empty catalog
    pub fn clamp(&self, index: usize) -> Option<usize> {
        if self.entries.is_empty() {
            None
        } else {
            Some(index.min(self.entries.len() - 1))
        }
    }

    pub fn position_of(&self, id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.id.as_deref() == Some(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &LevelEntry> {
        self.entries.iter()
    }
}
