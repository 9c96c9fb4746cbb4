//! Progress persistence
//!
//! Features:
//! - Last played level index and the "has seen intro" flag
//! - Versioned JSON envelope on disk
//! - Write to tmp then rename, previous save kept as backup
//! - Corruption detection with fallback to the backup

pub mod file;

use serde::{Deserialize, Serialize};

pub use file::JsonFileStore;

/// Current save format version
pub const SAVE_VERSION: u32 = 1;

/// Everything persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    #[serde(default)]
    pub last_level_index: Option<usize>,
    #[serde(default)]
    pub has_seen_intro: bool,
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            version: SAVE_VERSION,
            last_level_index: None,
            has_seen_intro: false,
        }
    }
}

/// Storage for level progress. Writes are fire-and-forget.
pub trait ProgressStore {
    fn read_last_level_index(&self) -> Option<usize>;
    fn write_last_level_index(&mut self, index: usize);
    fn clear_last_level_index(&mut self);
    fn has_seen_intro(&self) -> bool;
    fn set_seen_intro(&mut self, seen: bool);
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: SaveData,
    writes: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: SaveData) -> Self {
        Self { data, writes: 0 }
    }

    pub fn data(&self) -> &SaveData {
        &self.data
    }

    /// Number of mutating calls received
    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl ProgressStore for MemoryStore {
    fn read_last_level_index(&self) -> Option<usize> {
        self.data.last_level_index
    }

    fn write_last_level_index(&mut self, index: usize) {
        self.data.last_level_index = Some(index);
        self.writes += 1;
    }

    fn clear_last_level_index(&mut self) {
        self.data.last_level_index = None;
        self.writes += 1;
    }

    fn has_seen_intro(&self) -> bool {
        self.data.has_seen_intro
    }

    fn set_seen_intro(&mut self, seen: bool) {
        self.data.has_seen_intro = seen;
        self.writes += 1;
    }
}
