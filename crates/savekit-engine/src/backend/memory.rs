use std::collections::BTreeMap;

use savekit_schema::save_data::SaveData;

use super::{validate_slot, SaveBackend};
use crate::SaveError;

/// In-process slot store. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    slots: BTreeMap<String, SaveData>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow a stored snapshot without cloning it.
    pub fn slot(&self, slot: &str) -> Option<&SaveData> {
        self.slots.get(slot)
    }
}

impl SaveBackend for MemoryBackend {
    fn save(&mut self, slot: &str, data: &SaveData) -> Result<(), SaveError> {
        validate_slot(slot)?;
        self.slots.insert(slot.to_owned(), data.clone());
        Ok(())
    }

    fn load(&self, slot: &str) -> Result<SaveData, SaveError> {
        validate_slot(slot)?;
        match self.slots.get(slot) {
            Some(data) => Ok(data.clone()),
            None => {
                tracing::warn!(slot = %slot, "slot not found -- loading empty snapshot");
                Ok(SaveData::new())
            }
        }
    }

    fn has_save(&self, slot: &str) -> bool {
        self.slots.contains_key(slot)
    }

    fn delete_save(&mut self, slot: &str) -> Result<bool, SaveError> {
        validate_slot(slot)?;
        Ok(self.slots.remove(slot).is_some())
    }

    fn save_slots(&self) -> Result<Vec<String>, SaveError> {
        Ok(self.slots.keys().cloned().collect())
    }
}
