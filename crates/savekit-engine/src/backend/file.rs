use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use savekit_schema::save_data::SaveData;

use super::{validate_slot, SaveBackend};
use crate::config::SaveConfig;
use crate::SaveError;

/// Replace every character that is not alphanumeric, `_` or `-` with `_`.
pub fn sanitize_slot_name(slot: &str) -> String {
    slot.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect()
}

/// One JSON object per slot at `<dir>/<sanitized slot>.<extension>`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    extension: String,
    pretty: bool,
}

impl FileBackend {
    /// Backend over `dir`, created if missing. Writes indented `.json` files.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, SaveError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| SaveError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self {
            dir,
            extension: "json".to_owned(),
            pretty: true,
        })
    }

    pub fn from_config(config: &SaveConfig) -> Result<Self, SaveError> {
        let mut backend = Self::new(&config.saves_dir)?;
        backend.extension = config.extension.trim_start_matches('.').to_owned();
        backend.pretty = config.pretty;
        Ok(backend)
    }

    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", sanitize_slot_name(slot), self.extension))
    }
}

impl SaveBackend for FileBackend {
    fn save(&mut self, slot: &str, data: &SaveData) -> Result<(), SaveError> {
        validate_slot(slot)?;
        let path = self.slot_path(slot);
        let text = if self.pretty {
            serde_json::to_string_pretty(data)
        } else {
            serde_json::to_string(data)
        }
        .map_err(|source| SaveError::Json {
            path: path.clone(),
            source,
        })?;

        fs::write(&path, text).map_err(|source| SaveError::Io {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(slot = %slot, path = %path.display(), entries = data.len(), "slot written");
        Ok(())
    }

    fn load(&self, slot: &str) -> Result<SaveData, SaveError> {
        validate_slot(slot)?;
        let path = self.slot_path(slot);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(slot = %slot, path = %path.display(), "save file not found -- loading empty snapshot");
                return Ok(SaveData::new());
            }
            Err(source) => return Err(SaveError::Io { path, source }),
        };

        let data: SaveData = serde_json::from_str(&text).map_err(|source| SaveError::Json {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(slot = %slot, path = %path.display(), entries = data.len(), "slot read");
        Ok(data)
    }

    fn has_save(&self, slot: &str) -> bool {
        !slot.is_empty() && self.slot_path(slot).is_file()
    }

    fn delete_save(&mut self, slot: &str) -> Result<bool, SaveError> {
        validate_slot(slot)?;
        let path = self.slot_path(slot);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(slot = %slot, path = %path.display(), "save file not found for deletion");
                Ok(false)
            }
            Err(source) => Err(SaveError::Io { path, source }),
        }
    }

    fn save_slots(&self) -> Result<Vec<String>, SaveError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(SaveError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut slots = Vec::new();
        for entry in read_dir {
            let path = entry
                .map_err(|source| SaveError::Io {
                    path: self.dir.clone(),
                    source,
                })?
                .path();
            let matches_ext = path.extension().is_some_and(|ext| ext == self.extension.as_str());
            if !(matches_ext && path.is_file()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                slots.push(stem.to_owned());
            }
        }
        slots.sort();
        Ok(slots)
    }
}
