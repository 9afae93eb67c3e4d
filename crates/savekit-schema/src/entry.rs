//! Field registry entries.
//!
//! A [`FieldEntry`] binds one saved field of one component type to its save
//! key, its load aliases and an accessor. The accessor is either a pair of
//! direct closures produced by generated code, or a reflective handle that
//! goes through [`Component::get_field`] / [`Component::set_field`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use savekit_convert::value::{FieldType, SaveValue, Value};

use crate::reflect::{Component, ComponentType, SaveAttr};
use crate::SchemaError;

/// Save key -> entry, for one component type.
pub type SaveEntries = BTreeMap<String, FieldEntry>;

pub type Getter = Arc<dyn Fn(&dyn Component) -> Result<Value, SchemaError> + Send + Sync>;
pub type Setter = Arc<dyn Fn(&mut dyn Component, Value) -> Result<(), SchemaError> + Send + Sync>;

/// Reflective handle: the owning type and the field's source name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHandle {
    pub owner: ComponentType,
    pub field_name: &'static str,
}

/// How a field is read and written.
#[derive(Clone)]
pub enum FieldAccessor {
    /// Closures bound at discovery time.
    Direct { get: Getter, set: Setter },
    /// By-name access through the component's reflection surface.
    Reflective(FieldHandle),
}

impl fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldAccessor::Direct { .. } => f.write_str("Direct"),
            FieldAccessor::Reflective(handle) => f.debug_tuple("Reflective").field(handle).finish(),
        }
    }
}

/// One saveable field.
#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub key: String,
    pub aliases: Vec<String>,
    pub owner: ComponentType,
    pub field_name: &'static str,
    pub field_type: FieldType,
    accessor: FieldAccessor,
}

impl FieldEntry {
    /// Entry with direct accessors for field `field_name` of `C`.
    pub fn direct<C: Component, T: SaveValue>(
        attr: SaveAttr,
        owner: ComponentType,
        field_name: &'static str,
        get: fn(&C) -> T,
        set: fn(&mut C, T),
    ) -> Self {
        let getter: Getter = Arc::new(move |component: &dyn Component| {
            let typed = component
                .as_any()
                .downcast_ref::<C>()
                .ok_or_else(|| owner_mismatch(owner, component))?;
            Ok(get(typed).into_value())
        });
        let setter: Setter = Arc::new(move |component: &mut dyn Component, value: Value| {
            let found = component.component_type();
            let typed = component
                .as_any_mut()
                .downcast_mut::<C>()
                .ok_or_else(|| SchemaError::OwnerMismatch {
                    expected: owner.name().to_owned(),
                    found: found.name().to_owned(),
                })?;
            set(typed, T::from_value(value)?);
            Ok(())
        });

        Self {
            key: attr.effective_key(field_name).to_owned(),
            aliases: attr.aliases.iter().map(|a| (*a).to_owned()).collect(),
            owner,
            field_name,
            field_type: T::field_type(),
            accessor: FieldAccessor::Direct {
                get: getter,
                set: setter,
            },
        }
    }

    /// Entry that reads and writes through the component's reflection.
    pub fn reflective(attr: SaveAttr, owner: ComponentType, field_name: &'static str, field_type: FieldType) -> Self {
        Self {
            key: attr.effective_key(field_name).to_owned(),
            aliases: attr.aliases.iter().map(|a| (*a).to_owned()).collect(),
            owner,
            field_name,
            field_type,
            accessor: FieldAccessor::Reflective(FieldHandle { owner, field_name }),
        }
    }

    pub fn accessor(&self) -> &FieldAccessor {
        &self.accessor
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.accessor, FieldAccessor::Direct { .. })
    }

    /// Read the field from `owner`.
    ///
    /// # Errors
    ///
    /// [`SchemaError::OwnerMismatch`] when `owner` is not of this entry's
    /// type, [`SchemaError::UnknownField`] when reflection does not know the
    /// field.
    pub fn get_value(&self, owner: &dyn Component) -> Result<Value, SchemaError> {
        match &self.accessor {
            FieldAccessor::Direct { get, .. } => get(owner),
            FieldAccessor::Reflective(handle) => {
                check_owner(handle.owner, owner)?;
                owner
                    .get_field(handle.field_name)
                    .ok_or_else(|| SchemaError::UnknownField {
                        component: handle.owner.name().to_owned(),
                        field: handle.field_name.to_owned(),
                    })
            }
        }
    }

    /// Write the field on `owner`.
    pub fn set_value(&self, owner: &mut dyn Component, value: Value) -> Result<(), SchemaError> {
        match &self.accessor {
            FieldAccessor::Direct { set, .. } => set(owner, value),
            FieldAccessor::Reflective(handle) => {
                check_owner(handle.owner, owner)?;
                owner.set_field(handle.field_name, value)
            }
        }
    }

    /// True when `candidate` is the key or one of the aliases. Case-sensitive.
    pub fn matches_key(&self, candidate: &str) -> bool {
        self.key == candidate || self.aliases.iter().any(|a| a == candidate)
    }
}

fn owner_mismatch(expected: ComponentType, found: &dyn Component) -> SchemaError {
    SchemaError::OwnerMismatch {
        expected: expected.name().to_owned(),
        found: found.component_type().name().to_owned(),
    }
}

fn check_owner(expected: ComponentType, found: &dyn Component) -> Result<(), SchemaError> {
    if found.component_type() == expected {
        Ok(())
    } else {
        Err(owner_mismatch(expected, found))
    }
}
