//! The save/load orchestrator.
//!
//! Saving walks every identified object, every attached component and every
//! discovered save entry, and stores the converted field value under
//! `"{id}.{Component}.{key}"`. Loading resolves each entry by its primary key
//! first and its aliases second, in declared order, and leaves fields with no
//! stored value untouched.
//!
//! Failures local to one field are logged and counted in the returned report.
//! Only backend failures and invalid slot names abort the whole operation.

use serde_json::Value as JsonValue;

use savekit_convert::facade::Converters;
use savekit_schema::entry::FieldEntry;
use savekit_schema::reflect::Component;
use savekit_schema::save_data::{full_key, SaveData};
use savekit_schema::SchemaError;

use crate::backend::{validate_slot, SaveBackend};
use crate::context::SaveContext;
use crate::object::ObjectSource;
use crate::SaveError;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Summary of one [`SaveManager::save`] or [`SaveManager::capture`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Objects with an id whose components were walked.
    pub objects_saved: usize,
    /// Objects skipped for lacking an id.
    pub objects_skipped: usize,
    pub entries_written: usize,
    /// Full keys of fields that could not be read or converted.
    pub failed_fields: Vec<String>,
    /// [`SaveData::content_hash`] of the captured snapshot. Equal hashes
    /// mean nothing changed between two saves.
    pub content_hash: String,
}

/// Summary of one [`SaveManager::load`] or [`SaveManager::apply`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub objects_loaded: usize,
    pub objects_skipped: usize,
    /// Fields assigned from the snapshot, including those found via alias.
    pub fields_loaded: usize,
    /// Subset of `fields_loaded` resolved through an alias key.
    pub fields_via_alias: usize,
    /// Fields with neither key nor alias in the snapshot. Left untouched.
    pub fields_missing: usize,
    /// Full keys of fields whose stored value could not be applied.
    pub failed_fields: Vec<String>,
}

// ---------------------------------------------------------------------------
// SaveManager
// ---------------------------------------------------------------------------

/// Drives capture and restore of object state through a [`SaveBackend`].
#[derive(Debug)]
pub struct SaveManager<B: SaveBackend> {
    backend: B,
    context: SaveContext,
}

impl<B: SaveBackend> SaveManager<B> {
    /// Manager with a fresh [`SaveContext`].
    pub fn new(backend: B) -> Self {
        Self::with_context(backend, SaveContext::new())
    }

    pub fn with_context(backend: B, context: SaveContext) -> Self {
        Self { backend, context }
    }

    /// Capture every identified object and store the snapshot under `slot`.
    ///
    /// # Errors
    ///
    /// [`SaveError::InvalidSlotName`] for an empty slot, or whatever the
    /// backend reports. Per-field failures are not errors.
    pub fn save<S: ObjectSource + ?Sized>(&mut self, slot: &str, objects: &S) -> Result<SaveReport, SaveError> {
        validate_slot(slot)?;
        let (data, report) = self.capture(objects);
        self.backend.save(slot, &data)?;
        tracing::info!(
            slot = %slot,
            objects = report.objects_saved,
            entries = report.entries_written,
            failed = report.failed_fields.len(),
            hash = %report.content_hash,
            "game saved"
        );
        Ok(report)
    }

    /// Load `slot` and apply it to `objects`.
    ///
    /// # Errors
    ///
    /// [`SaveError::InvalidSlotName`] for an empty slot, or whatever the
    /// backend reports. A slot that was never saved applies nothing.
    pub fn load<S: ObjectSource + ?Sized>(&mut self, slot: &str, objects: &mut S) -> Result<LoadReport, SaveError> {
        validate_slot(slot)?;
        let data = self.backend.load(slot)?;
        let report = self.apply(&data, objects);
        tracing::info!(
            slot = %slot,
            objects = report.objects_loaded,
            fields = report.fields_loaded,
            via_alias = report.fields_via_alias,
            missing = report.fields_missing,
            failed = report.failed_fields.len(),
            "game loaded"
        );
        Ok(report)
    }

    /// Build a snapshot of `objects` without touching the backend.
    pub fn capture<S: ObjectSource + ?Sized>(&mut self, objects: &S) -> (SaveData, SaveReport) {
        let mut data = SaveData::new();
        let mut report = SaveReport::default();

        for object in objects.save_objects() {
            let Some(id) = &object.id else {
                tracing::debug!(object = %object.name, "object has no save id -- skipping");
                report.objects_skipped += 1;
                continue;
            };
            report.objects_saved += 1;

            for component in object.components() {
                let ty = component.component_type();
                let entries = self.context.entries_for(&ty);
                let converters = self.context.converters().converters();

                for entry in entries.values() {
                    let key = full_key(id.as_str(), ty.name(), &entry.key);
                    let written = capture_field(&converters, entry, &**component)
                        .and_then(|json| data.set_value(key.clone(), json));
                    match written {
                        Ok(()) => report.entries_written += 1,
                        Err(e) => {
                            tracing::warn!(
                                key = %key,
                                field = entry.field_name,
                                error = %e,
                                "failed to save field -- skipping"
                            );
                            report.failed_fields.push(key);
                        }
                    }
                }
            }
        }

        report.content_hash = data.content_hash();
        (data, report)
    }

    /// Restore `objects` from `data`. Objects without an id are skipped.
    pub fn apply<S: ObjectSource + ?Sized>(&mut self, data: &SaveData, objects: &mut S) -> LoadReport {
        let mut report = LoadReport::default();

        for object in objects.save_objects_mut() {
            let Some(id) = object.id.clone() else {
                tracing::debug!(object = %object.name, "object has no save id -- skipping");
                report.objects_skipped += 1;
                continue;
            };
            report.objects_loaded += 1;

            for component in object.components_mut() {
                let ty = component.component_type();
                let entries = self.context.entries_for(&ty);
                let converters = self.context.converters().converters();

                for entry in entries.values() {
                    let Some((found_key, json, via_alias)) = resolve(data, id.as_str(), ty.name(), entry) else {
                        report.fields_missing += 1;
                        continue;
                    };
                    match apply_field(&converters, entry, json, &mut **component) {
                        Ok(()) => {
                            report.fields_loaded += 1;
                            if via_alias {
                                tracing::debug!(key = %found_key, field = entry.field_name, "field resolved via alias");
                                report.fields_via_alias += 1;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(
                                key = %found_key,
                                field = entry.field_name,
                                error = %e,
                                "failed to load field -- leaving it unchanged"
                            );
                            report.failed_fields.push(found_key);
                        }
                    }
                }
            }
        }

        report
    }

    pub fn has_save(&self, slot: &str) -> bool {
        self.backend.has_save(slot)
    }

    pub fn delete_save(&mut self, slot: &str) -> Result<bool, SaveError> {
        let deleted = self.backend.delete_save(slot)?;
        if deleted {
            tracing::info!(slot = %slot, "save deleted");
        }
        Ok(deleted)
    }

    pub fn save_slots(&self) -> Result<Vec<String>, SaveError> {
        self.backend.save_slots()
    }

    /// Swap the storage backend, returning the previous one.
    pub fn set_backend(&mut self, backend: B) -> B {
        std::mem::replace(&mut self.backend, backend)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn context(&self) -> &SaveContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut SaveContext {
        &mut self.context
    }
}

// ---------------------------------------------------------------------------
// Field steps
// ---------------------------------------------------------------------------

/// Read the field and convert it by its declared type.
fn capture_field(
    converters: &Converters<'_>,
    entry: &FieldEntry,
    component: &dyn Component,
) -> Result<JsonValue, SchemaError> {
    let value = entry.get_value(component)?;
    Ok(converters.to_json_value(&value, &entry.field_type)?)
}

/// Assign the stored value, skipping conversion when it already fits.
fn apply_field(
    converters: &Converters<'_>,
    entry: &FieldEntry,
    json: &JsonValue,
    component: &mut dyn Component,
) -> Result<(), SchemaError> {
    let value = match converters.try_assign(json, &entry.field_type) {
        Some(value) => value,
        None => converters.from_json_value(json, &entry.field_type)?,
    };
    entry.set_value(component, value)
}

/// The stored value for `entry`: primary key first, then the first alias
/// present. The flag is true when an alias matched.
fn resolve<'d>(
    data: &'d SaveData,
    id: &str,
    component: &str,
    entry: &FieldEntry,
) -> Option<(String, &'d JsonValue, bool)> {
    let primary = full_key(id, component, &entry.key);
    if let Some(json) = data.get_raw(&primary) {
        return Some((primary, json, false));
    }
    entry.aliases.iter().find_map(|alias| {
        let key = full_key(id, component, alias);
        data.get_raw(&key).map(|json| (key, json, true))
    })
}
