//! Storage backends for save slots.
//!
//! A backend persists whole [`SaveData`] snapshots by slot name. Errors from
//! a backend abort the save or load that triggered them.

mod file;
mod memory;

pub use file::{sanitize_slot_name, FileBackend};
pub use memory::MemoryBackend;

use savekit_schema::save_data::SaveData;

use crate::SaveError;

/// Persistent storage for named snapshots.
pub trait SaveBackend {
    /// Store `data` under `slot`, replacing any previous snapshot.
    fn save(&mut self, slot: &str, data: &SaveData) -> Result<(), SaveError>;

    /// Read the snapshot of `slot`. A slot that was never saved loads as an
    /// empty snapshot.
    fn load(&self, slot: &str) -> Result<SaveData, SaveError>;

    fn has_save(&self, slot: &str) -> bool;

    /// Remove `slot`. Returns `false` if there was nothing to delete.
    fn delete_save(&mut self, slot: &str) -> Result<bool, SaveError>;

    /// Names of all stored slots, sorted.
    fn save_slots(&self) -> Result<Vec<String>, SaveError>;
}

impl<B: SaveBackend + ?Sized> SaveBackend for Box<B> {
    fn save(&mut self, slot: &str, data: &SaveData) -> Result<(), SaveError> {
        (**self).save(slot, data)
    }

    fn load(&self, slot: &str) -> Result<SaveData, SaveError> {
        (**self).load(slot)
    }

    fn has_save(&self, slot: &str) -> bool {
        (**self).has_save(slot)
    }

    fn delete_save(&mut self, slot: &str) -> Result<bool, SaveError> {
        (**self).delete_save(slot)
    }

    fn save_slots(&self) -> Result<Vec<String>, SaveError> {
        (**self).save_slots()
    }
}

/// Reject empty slot names.
pub fn validate_slot(slot: &str) -> Result<(), SaveError> {
    if slot.is_empty() {
        Err(SaveError::InvalidSlotName)
    } else {
        Ok(())
    }
}
