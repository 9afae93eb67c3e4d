//! The explicit save context: converter registry plus entry discovery.
//!
//! Everything that would otherwise be process-wide state lives here and is
//! handed to the orchestrator. Build a fresh context per test for isolation.

use std::sync::Arc;

use savekit_convert::registry::ConverterRegistry;
use savekit_schema::discovery::SaveEntryDiscovery;
use savekit_schema::entry::SaveEntries;
use savekit_schema::reflect::ComponentType;

/// Owns the converter registry and the per-type save entry cache.
///
/// Not synchronized. Share across threads by wrapping the owning
/// [`SaveManager`](crate::manager::SaveManager) in a lock.
#[derive(Debug)]
pub struct SaveContext {
    converters: ConverterRegistry,
    discovery: SaveEntryDiscovery,
}

impl SaveContext {
    /// Built-in converters, already initialized, and no generated registries.
    pub fn new() -> Self {
        Self::with_parts(ConverterRegistry::with_builtins(), SaveEntryDiscovery::new())
    }

    /// Use a prepared registry and discovery. An uninitialized registry is
    /// initialized here.
    pub fn with_parts(mut converters: ConverterRegistry, discovery: SaveEntryDiscovery) -> Self {
        if !converters.is_initialized() {
            let count = converters.initialize();
            tracing::debug!(converters = count, "converter registry initialized");
        }
        Self {
            converters,
            discovery,
        }
    }

    pub fn converters(&self) -> &ConverterRegistry {
        &self.converters
    }

    /// Mutable registry access. Cached entries are dropped because field
    /// support may change with the converter set.
    pub fn converters_mut(&mut self) -> &mut ConverterRegistry {
        self.discovery.clear_cache();
        &mut self.converters
    }

    pub fn discovery(&self) -> &SaveEntryDiscovery {
        &self.discovery
    }

    pub fn discovery_mut(&mut self) -> &mut SaveEntryDiscovery {
        &mut self.discovery
    }

    /// Cached save entries of `ty`.
    pub fn entries_for(&mut self, ty: &ComponentType) -> Arc<SaveEntries> {
        self.discovery.get_save_entries(ty, &self.converters)
    }

    /// Drop all registered converters, registries and cached entries, then
    /// reinstall the built-in converters.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for SaveContext {
    fn default() -> Self {
        Self::new()
    }
}
