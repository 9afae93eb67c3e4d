//! Component reflection surface.
//!
//! Saveable components describe their fields through [`ComponentType`]: a
//! `TypeId`, a display name and a list of [`FieldInfo`]s. Fields that carry
//! a [`SaveAttr`] are persisted. The [`Component`] trait gives by-name field
//! access, which the reflective discovery path uses; the
//! [`GeneratedEntries`] trait produces direct accessors for the generated
//! path.
//!
//! [`save_component!`](crate::save_component) implements all three traits
//! for a plain struct:
//!
//! ```
//! use savekit_schema::prelude::*;
//!
//! #[derive(Debug, Clone, Default)]
//! struct Stats {
//!     health: i32,
//!     pos: Vector3,
//!     label: String,
//! }
//!
//! savekit_schema::save_component!(Stats {
//!     health: i32 => save("health", "hp"),
//!     pos: Vector3 => save(),
//!     label: String,
//! });
//!
//! let ty = Stats::describe();
//! assert_eq!(ty.name(), "Stats");
//! assert_eq!(ty.saved_fields().count(), 2);
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use savekit_convert::value::{FieldType, SaveValue, Value};

use crate::entry::SaveEntries;
use crate::SchemaError;

// ---------------------------------------------------------------------------
// SaveAttr
// ---------------------------------------------------------------------------

/// The "save" marker on a field: an optional explicit key plus aliases
/// accepted on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SaveAttr {
    pub key: Option<&'static str>,
    pub aliases: &'static [&'static str],
}

impl SaveAttr {
    /// Marker with no explicit key; the field name is used.
    pub const fn new() -> Self {
        Self {
            key: None,
            aliases: &[],
        }
    }

    pub const fn with_key(key: &'static str, aliases: &'static [&'static str]) -> Self {
        Self {
            key: Some(key),
            aliases,
        }
    }

    /// The explicit key when non-empty, otherwise `field_name`.
    pub fn effective_key(&self, field_name: &'static str) -> &'static str {
        match self.key {
            Some(key) if !key.is_empty() => key,
            _ => field_name,
        }
    }
}

// ---------------------------------------------------------------------------
// FieldInfo / ComponentType
// ---------------------------------------------------------------------------

/// One reflected field of a component.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub field_type: FieldType,
    pub save: Option<SaveAttr>,
}

impl FieldInfo {
    pub fn of<T: SaveValue>(name: &'static str, save: Option<SaveAttr>) -> Self {
        Self {
            name,
            field_type: T::field_type(),
            save,
        }
    }
}

/// Runtime description of a component type. Equality and hashing use the
/// `TypeId` only.
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    fields: fn() -> Vec<FieldInfo>,
}

impl ComponentType {
    pub fn new<T: Any>(name: &'static str, fields: fn() -> Vec<FieldInfo>) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
            fields,
        }
    }

    /// Description of a reflected type.
    pub fn of<T: Reflected>() -> Self {
        T::describe()
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The type name used in fully-qualified save keys.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// All reflected fields in declaration order.
    pub fn fields(&self) -> Vec<FieldInfo> {
        (self.fields)()
    }

    /// Fields carrying a save marker, in declaration order.
    pub fn saved_fields(&self) -> impl Iterator<Item = (FieldInfo, SaveAttr)> {
        self.fields()
            .into_iter()
            .filter_map(|f| f.save.map(|attr| (f, attr)))
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.name)
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A saveable component attached to a trackable object.
pub trait Component: Any + Send + Sync {
    fn component_type(&self) -> ComponentType;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Read a reflected field by its source name.
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Write a reflected field by its source name.
    ///
    /// # Errors
    ///
    /// [`SchemaError::UnknownField`] for names the type does not reflect,
    /// [`SchemaError::Conversion`] when `value` does not fit the field.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), SchemaError>;
}

impl dyn Component {
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.component_type().name())
    }
}

/// Static access to a component's description.
pub trait Reflected: Component + Sized {
    fn describe() -> ComponentType;
}

/// Build-time table of direct accessors for a component type.
pub trait GeneratedEntries: Reflected {
    /// Insert one entry per saved field, in declaration order.
    fn register_entries(entries: &mut SaveEntries);
}

// ---------------------------------------------------------------------------
// Macros
// ---------------------------------------------------------------------------

#[doc(hidden)]
#[macro_export]
macro_rules! __save_attr {
    () => {
        ::std::option::Option::<$crate::reflect::SaveAttr>::None
    };
    (save()) => {
        ::std::option::Option::Some($crate::reflect::SaveAttr::new())
    };
    (save($key:literal $(, $alias:literal)*)) => {
        ::std::option::Option::Some($crate::reflect::SaveAttr::with_key($key, &[$($alias),*]))
    };
}

/// Implement [`Reflected`], [`Component`] and [`GeneratedEntries`] for a
/// struct.
///
/// Each listed field is reflected; `=> save(..)` marks it for saving.
/// `save()` keys the field by its name, `save("key", "alias", ..)` sets an
/// explicit key followed by load aliases (an empty key keeps the field
/// name). Listed field types must implement `SaveValue` and `Clone`.
#[macro_export]
macro_rules! save_component {
    ($ty:ident { $($field:ident : $fty:ty $(=> save($($attr:literal),* $(,)?))?),* $(,)? }) => {
        impl $crate::reflect::Reflected for $ty {
            fn describe() -> $crate::reflect::ComponentType {
                fn fields() -> ::std::vec::Vec<$crate::reflect::FieldInfo> {
                    ::std::vec![$(
                        $crate::reflect::FieldInfo::of::<$fty>(
                            stringify!($field),
                            $crate::__save_attr!($(save($($attr),*))?),
                        )
                    ),*]
                }
                $crate::reflect::ComponentType::new::<$ty>(stringify!($ty), fields)
            }
        }

        impl $crate::reflect::Component for $ty {
            fn component_type(&self) -> $crate::reflect::ComponentType {
                <$ty as $crate::reflect::Reflected>::describe()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn get_field(&self, name: &str) -> ::std::option::Option<$crate::savekit_convert::value::Value> {
                match name {
                    $(stringify!($field) => ::std::option::Option::Some(
                        <$fty as $crate::savekit_convert::value::SaveValue>::into_value(
                            ::std::clone::Clone::clone(&self.$field),
                        ),
                    ),)*
                    _ => ::std::option::Option::None,
                }
            }

            fn set_field(
                &mut self,
                name: &str,
                value: $crate::savekit_convert::value::Value,
            ) -> ::std::result::Result<(), $crate::SchemaError> {
                match name {
                    $(stringify!($field) => {
                        self.$field = <$fty as $crate::savekit_convert::value::SaveValue>::from_value(value)?;
                        ::std::result::Result::Ok(())
                    })*
                    _ => {
                        let _ = value;
                        ::std::result::Result::Err($crate::SchemaError::UnknownField {
                            component: stringify!($ty).to_owned(),
                            field: name.to_owned(),
                        })
                    }
                }
            }
        }

        impl $crate::reflect::GeneratedEntries for $ty {
            #[allow(unused_variables)]
            fn register_entries(entries: &mut $crate::entry::SaveEntries) {
                let owner = <$ty as $crate::reflect::Reflected>::describe();
                $(
                    if let ::std::option::Option::Some(attr) = $crate::__save_attr!($(save($($attr),*))?) {
                        let entry = $crate::entry::FieldEntry::direct::<$ty, $fty>(
                            attr,
                            owner,
                            stringify!($field),
                            |c: &$ty| ::std::clone::Clone::clone(&c.$field),
                            |c: &mut $ty, v: $fty| c.$field = v,
                        );
                        entries.insert(entry.key.clone(), entry);
                    }
                )*
            }
        }
    };
}
