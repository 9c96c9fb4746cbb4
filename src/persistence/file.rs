//! JSON file store with backup rotation

use std::fs;
use std::path::{Path, PathBuf};

use super::{ProgressStore, SAVE_VERSION, SaveData};
use crate::error::PersistenceError;

/// `ProgressStore` backed by a JSON file
///
/// Every write is flushed immediately: tmp file first, then the previous save
/// becomes `<name>.bak` and the tmp file is renamed over the save.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    data: SaveData,
}

impl JsonFileStore {
    /// Open a save file. A missing file starts fresh; a corrupt one falls back
    /// to the backup, then to a fresh save.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match read_save(&path) {
            Ok(Some(data)) => {
                log::info!("[Persistence] Loaded {}", path.display());
                data
            }
            Ok(None) => {
                log::info!("[Persistence] No save at {}, starting fresh", path.display());
                SaveData::default()
            }
            Err(e) => {
                log::warn!("[Persistence] Save {} unreadable: {e}", path.display());
                match read_save(&backup_path(&path)) {
                    Ok(Some(data)) => {
                        log::info!("[Persistence] Recovered from backup");
                        data
                    }
                    _ => SaveData::default(),
                }
            }
        };
        Self { path, data }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &SaveData {
        &self.data
    }

    /// Write the current data to disk
    pub fn flush(&self) -> Result<(), PersistenceError> {
        let json = serde_json::to_string_pretty(&self.data)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|source| io_error(&tmp, source))?;
        if self.path.exists() {
            let bak = backup_path(&self.path);
            fs::copy(&self.path, &bak).map_err(|source| io_error(&bak, source))?;
        }
        fs::rename(&tmp, &self.path).map_err(|source| io_error(&self.path, source))?;
        Ok(())
    }

    fn flush_or_log(&self) {
        if let Err(e) = self.flush() {
            log::error!("[Persistence] Failed to save {}: {e}", self.path.display());
        }
    }
}

impl ProgressStore for JsonFileStore {
    fn read_last_level_index(&self) -> Option<usize> {
        self.data.last_level_index
    }

    fn write_last_level_index(&mut self, index: usize) {
        self.data.last_level_index = Some(index);
        self.flush_or_log();
    }

    fn clear_last_level_index(&mut self) {
        self.data.last_level_index = None;
        self.flush_or_log();
    }

    fn has_seen_intro(&self) -> bool {
        self.data.has_seen_intro
    }

    fn set_seen_intro(&mut self, seen: bool) {
        self.data.has_seen_intro = seen;
        self.flush_or_log();
    }
}

fn backup_path(path: &Path) -> PathBuf {
    path.with_extension("bak")
}

fn io_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn read_save(path: &Path) -> Result<Option<SaveData>, PersistenceError> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => return Err(io_error(path, source)),
    };
    let data: SaveData = serde_json::from_str(&json)?;
    if data.version != SAVE_VERSION {
        return Err(PersistenceError::UnsupportedVersion(data.version));
    }
    Ok(Some(data))
}
