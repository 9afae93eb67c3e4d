//! Save entry discovery.
//!
//! Given a component type, discovery produces its [`SaveEntries`]. Two
//! strategies exist, tried in order:
//!
//! 1. **Generated registries.** The first registered
//!    [`GeneratedSaveRegistry`] that handles the exact type populates the
//!    entries. Later registries claiming the same type are never consulted.
//! 2. **Reflective scan.** Every field of the type's description that
//!    carries a save marker and whose declared type is supported by the
//!    converter registry becomes a reflective entry. Unsupported fields are
//!    logged and skipped.
//!
//! Results are cached per `TypeId` until [`SaveEntryDiscovery::clear_cache`].

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use savekit_convert::registry::ConverterRegistry;

use crate::entry::{FieldEntry, SaveEntries};
use crate::reflect::{ComponentType, GeneratedEntries};
use crate::SchemaError;

// ---------------------------------------------------------------------------
// Generated registries
// ---------------------------------------------------------------------------

/// A precomputed table of save entries for a set of component types.
pub trait GeneratedSaveRegistry: Send + Sync {
    /// Identity used to deduplicate registrations.
    fn name(&self) -> &str;

    /// Whether this registry has entries for exactly this type.
    fn handles_type(&self, id: TypeId) -> bool;

    fn handled_types(&self) -> Vec<ComponentType>;

    /// Insert the entries of `ty` into `entries`.
    fn register_save_entries(&self, ty: &ComponentType, entries: &mut SaveEntries) -> Result<(), SchemaError>;
}

type RegisterFn = fn(&mut SaveEntries);

/// A [`GeneratedSaveRegistry`] assembled from [`GeneratedEntries`] types.
#[derive(Clone)]
pub struct StaticSaveRegistry {
    name: String,
    handlers: Vec<(ComponentType, RegisterFn)>,
}

impl StaticSaveRegistry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handlers: Vec::new(),
        }
    }

    /// Add a type. Adding the same type twice keeps the first handler.
    pub fn with<T: GeneratedEntries>(mut self) -> Self {
        let ty = T::describe();
        if !self.handlers.iter().any(|(known, _)| *known == ty) {
            self.handlers.push((ty, T::register_entries));
        }
        self
    }
}

impl GeneratedSaveRegistry for StaticSaveRegistry {
    fn name(&self) -> &str {
        &self.name
    }

    fn handles_type(&self, id: TypeId) -> bool {
        self.handlers.iter().any(|(ty, _)| ty.id() == id)
    }

    fn handled_types(&self) -> Vec<ComponentType> {
        self.handlers.iter().map(|(ty, _)| *ty).collect()
    }

    fn register_save_entries(&self, ty: &ComponentType, entries: &mut SaveEntries) -> Result<(), SchemaError> {
        let (_, register) = self
            .handlers
            .iter()
            .find(|(known, _)| known == ty)
            .ok_or_else(|| SchemaError::UnhandledType {
                registry: self.name.clone(),
                component: ty.name().to_owned(),
            })?;
        register(entries);
        Ok(())
    }
}

impl fmt::Debug for StaticSaveRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSaveRegistry")
            .field("name", &self.name)
            .field("types", &self.handlers.iter().map(|(ty, _)| ty.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Constructor for a registry, the unit of bulk installation.
pub type RegistryCtor = fn() -> Result<Box<dyn GeneratedSaveRegistry>, SchemaError>;

// ---------------------------------------------------------------------------
// SaveEntryDiscovery
// ---------------------------------------------------------------------------

/// Per-type save entry lookup with a process-lifetime cache.
#[derive(Default)]
pub struct SaveEntryDiscovery {
    registries: Vec<Box<dyn GeneratedSaveRegistry>>,
    cache: HashMap<TypeId, Arc<SaveEntries>>,
    builds: usize,
}

impl SaveEntryDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries for `ty`, built on first request and cached afterwards.
    pub fn get_save_entries(&mut self, ty: &ComponentType, converters: &ConverterRegistry) -> Arc<SaveEntries> {
        if let Some(cached) = self.cache.get(&ty.id()) {
            return Arc::clone(cached);
        }

        let entries = Arc::new(self.build_entries(ty, converters));
        self.builds += 1;
        self.cache.insert(ty.id(), Arc::clone(&entries));
        entries
    }

    fn build_entries(&self, ty: &ComponentType, converters: &ConverterRegistry) -> SaveEntries {
        if let Some(registry) = self.registries.iter().find(|r| r.handles_type(ty.id())) {
            let mut entries = SaveEntries::new();
            match registry.register_save_entries(ty, &mut entries) {
                Ok(()) => {
                    tracing::debug!(
                        component = %ty,
                        registry = %registry.name(),
                        entries = entries.len(),
                        "save entries from generated registry"
                    );
                    return entries;
                }
                Err(e) => {
                    tracing::warn!(
                        component = %ty,
                        registry = %registry.name(),
                        error = %e,
                        "generated registry failed -- falling back to reflection"
                    );
                }
            }
        }
        scan_fields(ty, converters)
    }

    /// Whether a generated registry claims `ty`.
    pub fn has_registry_for(&self, ty: &ComponentType) -> bool {
        self.registries.iter().any(|r| r.handles_type(ty.id()))
    }

    /// Add a generated registry. Returns `false` if one with the same name
    /// is already registered.
    pub fn register_registry(&mut self, registry: impl GeneratedSaveRegistry + 'static) -> bool {
        self.register_boxed(Box::new(registry))
    }

    fn register_boxed(&mut self, registry: Box<dyn GeneratedSaveRegistry>) -> bool {
        if self.registries.iter().any(|r| r.name() == registry.name()) {
            tracing::debug!(registry = %registry.name(), "registry already registered");
            return false;
        }
        self.registries.push(registry);
        true
    }

    /// Construct and register each registry. Constructors that fail are
    /// logged and skipped. Returns how many were added.
    pub fn install_registries(&mut self, ctors: &[RegistryCtor]) -> usize {
        let mut added = 0;
        for ctor in ctors {
            match ctor() {
                Ok(registry) => {
                    if self.register_boxed(registry) {
                        added += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to instantiate save registry -- skipping");
                }
            }
        }
        added
    }

    /// Names of the registered generated registries, in lookup order.
    pub fn registries(&self) -> Vec<&str> {
        self.registries.iter().map(|r| r.name()).collect()
    }

    /// Remove all generated registries and invalidate the cache.
    pub fn clear_registries(&mut self) {
        self.registries.clear();
        self.cache.clear();
    }

    /// Drop every cached result.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cached_types(&self) -> Vec<TypeId> {
        self.cache.keys().copied().collect()
    }

    /// How many times entries were built rather than served from cache.
    pub fn scan_count(&self) -> usize {
        self.builds
    }
}

impl fmt::Debug for SaveEntryDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaveEntryDiscovery")
            .field("registries", &self.registries())
            .field("cached", &self.cache.len())
            .field("builds", &self.builds)
            .finish()
    }
}

/// Reflective fallback: one entry per saved, supported field.
fn scan_fields(ty: &ComponentType, converters: &ConverterRegistry) -> SaveEntries {
    let mut entries = SaveEntries::new();
    for (field, attr) in ty.saved_fields() {
        if !converters.is_supported(&field.field_type) {
            tracing::warn!(
                component = %ty,
                field = %field.name,
                field_type = %field.field_type,
                "unsupported field type -- field will not be saved"
            );
            continue;
        }
        let entry = FieldEntry::reflective(attr, *ty, field.name, field.field_type);
        entries.insert(entry.key.clone(), entry);
    }
    tracing::debug!(component = %ty, entries = entries.len(), "save entries from reflection");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflect::Reflected;
    use savekit_convert::math::Color;

    #[derive(Debug, Clone, PartialEq)]
    struct Sigil;
    savekit_convert::save_struct!(Sigil);

    #[derive(Debug, Clone)]
    struct Banner {
        tint: Color,
        sigil: Sigil,
        sigils: Vec<Sigil>,
        motto: String,
    }

    crate::save_component!(Banner {
        tint: Color => save(),
        sigil: Sigil => save(),
        sigils: Vec<Sigil> => save(),
        motto: String => save("text"),
    });

    #[test]
    fn reflective_scan_skips_unsupported_fields() {
        let converters = ConverterRegistry::with_builtins();
        let mut discovery = SaveEntryDiscovery::new();
        let entries = discovery.get_save_entries(&Banner::describe(), &converters);
        assert_eq!(entries.keys().collect::<Vec<_>>(), ["text", "tint"]);
        assert!(entries.values().all(|e| !e.is_direct()));
    }

    #[test]
    fn generated_registry_is_preferred() {
        let converters = ConverterRegistry::with_builtins();
        let mut discovery = SaveEntryDiscovery::new();
        discovery.register_registry(StaticSaveRegistry::new("gen").with::<Banner>());
        assert!(discovery.has_registry_for(&Banner::describe()));

        let entries = discovery.get_save_entries(&Banner::describe(), &converters);
        assert_eq!(entries.len(), 4);
        assert!(entries.values().all(FieldEntry::is_direct));
    }

    #[test]
    fn duplicate_registry_names_are_ignored() {
        let mut discovery = SaveEntryDiscovery::new();
        assert!(discovery.register_registry(StaticSaveRegistry::new("gen")));
        assert!(!discovery.register_registry(StaticSaveRegistry::new("gen").with::<Banner>()));
        assert_eq!(discovery.registries(), ["gen"]);
        assert!(!discovery.has_registry_for(&Banner::describe()));
    }

    #[test]
    fn install_skips_failing_constructors() {
        fn good() -> Result<Box<dyn GeneratedSaveRegistry>, SchemaError> {
            Ok(Box::new(StaticSaveRegistry::new("good").with::<Banner>()))
        }
        fn bad() -> Result<Box<dyn GeneratedSaveRegistry>, SchemaError> {
            Err(SchemaError::Instantiation {
                name: "bad".into(),
                details: "missing constructor".into(),
            })
        }

        let mut discovery = SaveEntryDiscovery::new();
        assert_eq!(discovery.install_registries(&[bad, good, good]), 1);
        assert_eq!(discovery.registries(), ["good"]);
    }

    #[test]
    fn clear_registries_also_clears_cache() {
        let converters = ConverterRegistry::with_builtins();
        let mut discovery = SaveEntryDiscovery::new();
        discovery.register_registry(StaticSaveRegistry::new("gen").with::<Banner>());
        discovery.get_save_entries(&Banner::describe(), &converters);
        assert_eq!(discovery.cached_types(), [TypeId::of::<Banner>()]);

        discovery.clear_registries();
        assert!(discovery.cached_types().is_empty());
        let entries = discovery.get_save_entries(&Banner::describe(), &converters);
        assert_eq!(entries.len(), 2);
        assert_eq!(discovery.scan_count(), 2);
    }
}
