//! Converter registry: `TypeId` -> converter.
//!
//! The registry is an explicit context value rather than a process-wide
//! singleton. Population is lazy and idempotent: [`ConverterRegistry::initialize`]
//! walks the registered catalogs once and is a no-op afterwards until
//! [`ConverterRegistry::clear_converters`] resets it.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::builtin::BuiltinConverters;
use crate::converter::{ConverterCatalog, DynConverter, ValueConverter};
use crate::facade::Converters;
use crate::value::FieldType;

/// Maps each target type to exactly one converter.
pub struct ConverterRegistry {
    converters: HashMap<TypeId, Arc<dyn DynConverter>>,
    catalogs: Vec<Box<dyn ConverterCatalog>>,
    initialized: bool,
}

impl ConverterRegistry {
    /// Uninitialized registry that will populate from the built-in catalog.
    pub fn new() -> Self {
        Self::with_catalogs(vec![Box::new(BuiltinConverters)])
    }

    /// Uninitialized registry with no catalogs at all.
    pub fn empty() -> Self {
        Self::with_catalogs(Vec::new())
    }

    /// Uninitialized registry over the given catalogs.
    pub fn with_catalogs(catalogs: Vec<Box<dyn ConverterCatalog>>) -> Self {
        Self {
            converters: HashMap::new(),
            catalogs,
            initialized: false,
        }
    }

    /// Registry populated with the built-in converters.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.initialize();
        registry
    }

    /// Add a catalog. It is picked up by the next [`initialize`](Self::initialize)
    /// call; an already initialized registry is not re-populated.
    pub fn add_catalog(&mut self, catalog: impl ConverterCatalog + 'static) {
        self.catalogs.push(Box::new(catalog));
    }

    /// Populate from all catalogs. Returns the number of converters
    /// registered by this call (zero when already initialized).
    ///
    /// A catalog that cannot enumerate its factories, or a factory that
    /// fails to construct, is logged and skipped.
    pub fn initialize(&mut self) -> usize {
        if self.initialized {
            return 0;
        }

        let mut created = Vec::new();
        for catalog in &self.catalogs {
            let factories = match catalog.factories() {
                Ok(factories) => factories,
                Err(e) => {
                    tracing::warn!(catalog = %catalog.name(), error = %e, "skipping converter catalog");
                    continue;
                }
            };
            for factory in factories {
                match factory.instantiate() {
                    Ok(converter) => created.push(converter),
                    Err(e) => {
                        tracing::warn!(
                            catalog = %catalog.name(),
                            converter = %factory.name,
                            error = %e,
                            "failed to instantiate converter"
                        );
                    }
                }
            }
        }

        let mut count = 0;
        for converter in created {
            if self.register_dyn(converter) {
                count += 1;
            }
        }
        self.initialized = true;
        tracing::debug!(registered = count, total = self.converters.len(), "converter registry initialized");
        count
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Register a typed converter. Re-registering a type overwrites the
    /// previous converter. See [`register_dyn`](Self::register_dyn).
    pub fn register_converter<C: ValueConverter>(&mut self, converter: C) -> bool {
        self.register_dyn(Arc::new(converter))
    }

    /// Register an already erased converter, overwriting any previous one.
    ///
    /// Only struct and enum targets are accepted. Primitives, strings,
    /// arrays and lists always take the generic route, so a converter for
    /// them is logged and rejected. Returns whether it was stored.
    pub fn register_dyn(&mut self, converter: Arc<dyn DynConverter>) -> bool {
        let target = converter.target_type();
        if target.type_id().is_none() {
            tracing::warn!(
                ty = %target,
                "converters apply to struct and enum types only -- skipping"
            );
            return false;
        }
        let id = converter.target_id();
        if self.converters.insert(id, converter).is_some() {
            tracing::debug!(ty = %target, "replaced existing converter registration");
        }
        true
    }

    /// Exact-type lookup.
    pub fn get_converter(&self, id: TypeId) -> Option<&Arc<dyn DynConverter>> {
        self.converters.get(&id)
    }

    /// Lookup by declared type. Only struct and enum types can carry one.
    pub fn converter_for(&self, ty: &FieldType) -> Option<&Arc<dyn DynConverter>> {
        ty.type_id().and_then(|id| self.get_converter(id))
    }

    pub fn has_converter(&self, id: TypeId) -> bool {
        self.converters.contains_key(&id)
    }

    /// Declared types of every registered converter, sorted by name.
    pub fn supported_types(&self) -> Vec<FieldType> {
        let mut types: Vec<FieldType> = self.converters.values().map(|c| c.target_type()).collect();
        types.sort_by_key(FieldType::name);
        types
    }

    /// Whether values of `ty` can be converted.
    ///
    /// Primitives, strings and enums always are; struct types need a
    /// converter; arrays and lists are supported iff their element is.
    pub fn is_supported(&self, ty: &FieldType) -> bool {
        match ty {
            FieldType::Primitive(_) | FieldType::String | FieldType::Enum(_) => true,
            FieldType::Struct(s) => self.has_converter(s.id),
            FieldType::Array(elem) | FieldType::List(elem) => self.is_supported(elem),
        }
    }

    /// Drop all converters and mark the registry uninitialized.
    pub fn clear_converters(&mut self) {
        self.converters.clear();
        self.initialized = false;
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Conversion façade over this registry.
    pub fn converters(&self) -> Converters<'_> {
        Converters::new(self)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.converters.values().map(|c| c.target_name()).collect();
        names.sort();
        f.debug_struct("ConverterRegistry")
            .field("converters", &names)
            .field("catalogs", &self.catalogs.iter().map(|c| c.name().to_owned()).collect::<Vec<_>>())
            .field("initialized", &self.initialized)
            .finish()
    }
}
