//! Dynamic value model shared by the conversion engine.
//!
//! Field values travel through the engine as [`Value`], a closed tagged
//! variant, while their declared types are described by [`FieldType`]. The
//! [`SaveValue`] trait bridges concrete Rust types to both: it reports the
//! declared type of a field and moves values in and out of the dynamic form.
//!
//! Fixed-shape struct types (vectors, colors, user structs) are carried as
//! type-erased [`DynStruct`] payloads and keyed by their Rust `TypeId`, which
//! is also the key of the converter registry.

use std::any::{Any, TypeId};
use std::fmt;

use crate::ConversionError;

// ---------------------------------------------------------------------------
// StructValue -- type-erased struct payload
// ---------------------------------------------------------------------------

/// Object-safe view of a struct value stored inside [`Value::Struct`].
///
/// Implemented automatically for every `Clone + PartialEq + Debug` type, so
/// user types never implement it by hand.
pub trait StructValue: Any + Send + Sync {
    /// Upcast for downcasting back to the concrete type.
    fn as_any(&self) -> &dyn Any;
    /// Clone into a fresh box.
    fn clone_boxed(&self) -> Box<dyn StructValue>;
    /// Equality against another erased value of possibly different type.
    fn eq_dyn(&self, other: &dyn StructValue) -> bool;
    /// `Debug` formatting of the concrete value.
    fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T> StructValue for T
where
    T: Any + Send + Sync + Clone + PartialEq + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn StructValue> {
        Box::new(self.clone())
    }

    fn eq_dyn(&self, other: &dyn StructValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn fmt_debug(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Owned, clonable, comparable box around a [`StructValue`].
pub struct DynStruct {
    inner: Box<dyn StructValue>,
    type_id: TypeId,
}

impl DynStruct {
    /// Box a concrete struct value.
    pub fn new<T: StructValue>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_id: TypeId::of::<T>(),
        }
    }

    /// The `TypeId` of the boxed value.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Borrow the payload as `T` if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.as_ref().as_any().downcast_ref::<T>()
    }

    /// Whether the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl Clone for DynStruct {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.as_ref().clone_boxed(),
            type_id: self.type_id,
        }
    }
}

impl PartialEq for DynStruct {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.inner.as_ref().eq_dyn(other.inner.as_ref())
    }
}

impl fmt::Debug for DynStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.inner.as_ref().fmt_debug(f)
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A native field value in dynamic form.
///
/// Arrays and lists share [`Value::Seq`]; the declared [`FieldType`] decides
/// which container the value is written back into.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Every integer primitive up to `i64`.
    Int(i64),
    /// `f32` and `f64` fields.
    Float(f64),
    Char(char),
    String(String),
    /// An enum value, identified by its variant name.
    Enum(String),
    Seq(Vec<Value>),
    Struct(DynStruct),
}

impl Value {
    /// Wrap a struct value.
    pub fn from_struct<T: StructValue>(value: T) -> Self {
        Value::Struct(DynStruct::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow the struct payload as `T`.
    pub fn struct_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Value::Struct(s) => s.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Take the struct payload out as `T`.
    pub fn into_struct<T: Any + Clone>(self) -> Result<T, ConversionError> {
        match &self {
            Value::Struct(s) => s.downcast_ref::<T>().cloned().ok_or_else(|| {
                ConversionError::mismatch(short_type_name::<T>(), &self)
            }),
            _ => Err(ConversionError::mismatch(short_type_name::<T>(), &self)),
        }
    }

    /// Short label of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
            Value::Seq(_) => "sequence",
            Value::Struct(_) => "struct",
        }
    }

    /// Numeric view of scalar variants.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }
}

/// Last path segment of `std::any::type_name::<T>()`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

// ---------------------------------------------------------------------------
// FieldType
// ---------------------------------------------------------------------------

/// Scalar types with a direct JSON mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    F32,
    F64,
    Char,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Char => "char",
        }
    }

    /// Inclusive range of integer primitives, `None` for the rest.
    pub fn int_range(self) -> Option<(i64, i64)> {
        match self {
            Primitive::I8 => Some((i8::MIN.into(), i8::MAX.into())),
            Primitive::I16 => Some((i16::MIN.into(), i16::MAX.into())),
            Primitive::I32 => Some((i32::MIN.into(), i32::MAX.into())),
            Primitive::I64 => Some((i64::MIN, i64::MAX)),
            Primitive::U8 => Some((0, u8::MAX.into())),
            Primitive::U16 => Some((0, u16::MAX.into())),
            Primitive::U32 => Some((0, u32::MAX.into())),
            _ => None,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, Primitive::F32 | Primitive::F64)
    }
}

/// Identity of a struct type handled by a converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StructType {
    pub id: TypeId,
    pub name: &'static str,
}

impl StructType {
    pub fn of<T: Any>(name: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
        }
    }
}

/// Identity and variant list of a fieldless enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumType {
    pub id: TypeId,
    pub name: &'static str,
    /// Variant names in declaration order; the index is the numeric value.
    pub variants: &'static [&'static str],
}

impl EnumType {
    pub fn of<T: Any>(name: &'static str, variants: &'static [&'static str]) -> Self {
        Self {
            id: TypeId::of::<T>(),
            name,
            variants,
        }
    }

    /// Case-insensitive variant lookup.
    pub fn variant_named(&self, name: &str) -> Option<&'static str> {
        let name = name.trim();
        self.variants
            .iter()
            .copied()
            .find(|v| v.eq_ignore_ascii_case(name))
    }

    pub fn variant_at(&self, index: i64) -> Option<&'static str> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.variants.get(i).copied())
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.variants.iter().position(|v| *v == name)
    }
}

/// Declared type of a saveable field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Primitive(Primitive),
    String,
    Enum(EnumType),
    Struct(StructType),
    /// Fixed-size sequence (`Box<[T]>`).
    Array(Box<FieldType>),
    /// Growable sequence (`Vec<T>`).
    List(Box<FieldType>),
}

impl FieldType {
    /// The declared type of `T`.
    pub fn of<T: SaveValue>() -> Self {
        T::field_type()
    }

    /// Registry key for types that can carry a converter.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            FieldType::Struct(s) => Some(s.id),
            FieldType::Enum(e) => Some(e.id),
            _ => None,
        }
    }

    /// Element type of arrays and lists.
    pub fn element_type(&self) -> Option<&FieldType> {
        match self {
            FieldType::Array(elem) | FieldType::List(elem) => Some(elem),
            _ => None,
        }
    }

    /// Human-readable name, e.g. `Vector3[]` or `List<i32>`.
    pub fn name(&self) -> String {
        match self {
            FieldType::Primitive(p) => p.name().to_owned(),
            FieldType::String => "String".to_owned(),
            FieldType::Enum(e) => e.name.to_owned(),
            FieldType::Struct(s) => s.name.to_owned(),
            FieldType::Array(elem) => format!("{}[]", elem.name()),
            FieldType::List(elem) => format!("List<{}>", elem.name()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

// ---------------------------------------------------------------------------
// SaveValue
// ---------------------------------------------------------------------------

/// A Rust type that can live in a saveable field.
///
/// Struct types opt in with [`save_struct!`](crate::save_struct) and enums
/// with [`save_enum!`](crate::save_enum).
pub trait SaveValue: Sized + 'static {
    /// The declared type reported to discovery and the converters.
    fn field_type() -> FieldType;

    /// Move the value into dynamic form.
    fn into_value(self) -> Value;

    /// Rebuild the value from dynamic form.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::TypeMismatch`] when the variant does not
    /// match, or [`ConversionError::OutOfRange`] for integer overflow.
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

macro_rules! int_save_value {
    ($($ty:ty => $prim:ident),* $(,)?) => {$(
        impl SaveValue for $ty {
            fn field_type() -> FieldType {
                FieldType::Primitive(Primitive::$prim)
            }

            fn into_value(self) -> Value {
                Value::Int(i64::from(self))
            }

            fn from_value(value: Value) -> Result<Self, ConversionError> {
                match value {
                    Value::Int(i) => <$ty>::try_from(i).map_err(|_| ConversionError::OutOfRange {
                        value: i.to_string(),
                        target: stringify!($ty).to_owned(),
                    }),
                    other => Err(ConversionError::mismatch(stringify!($ty), &other)),
                }
            }
        }
    )*};
}

int_save_value! {
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
}

impl SaveValue for f32 {
    fn field_type() -> FieldType {
        FieldType::Primitive(Primitive::F32)
    }

    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(f) => Ok(f as f32),
            Value::Int(i) => Ok(i as f32),
            other => Err(ConversionError::mismatch("f32", &other)),
        }
    }
}

impl SaveValue for f64 {
    fn field_type() -> FieldType {
        FieldType::Primitive(Primitive::F64)
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(ConversionError::mismatch("f64", &other)),
        }
    }
}

impl SaveValue for bool {
    fn field_type() -> FieldType {
        FieldType::Primitive(Primitive::Bool)
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(ConversionError::mismatch("bool", &other)),
        }
    }
}

impl SaveValue for char {
    fn field_type() -> FieldType {
        FieldType::Primitive(Primitive::Char)
    }

    fn into_value(self) -> Value {
        Value::Char(self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Char(c) => Ok(c),
            other => Err(ConversionError::mismatch("char", &other)),
        }
    }
}

impl SaveValue for String {
    fn field_type() -> FieldType {
        FieldType::String
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::String(s) => Ok(s),
            Value::Null => Ok(String::new()),
            other => Err(ConversionError::mismatch("String", &other)),
        }
    }
}

fn seq_from_value<T: SaveValue>(value: Value, label: &str) -> Result<Vec<T>, ConversionError> {
    match value {
        Value::Seq(items) => items.into_iter().map(T::from_value).collect(),
        Value::Null => Ok(Vec::new()),
        other => Err(ConversionError::mismatch(label, &other)),
    }
}

impl<T: SaveValue> SaveValue for Vec<T> {
    fn field_type() -> FieldType {
        FieldType::List(Box::new(T::field_type()))
    }

    fn into_value(self) -> Value {
        Value::Seq(self.into_iter().map(T::into_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        seq_from_value(value, "List")
    }
}

impl<T: SaveValue> SaveValue for Box<[T]> {
    fn field_type() -> FieldType {
        FieldType::Array(Box::new(T::field_type()))
    }

    fn into_value(self) -> Value {
        Value::Seq(self.into_vec().into_iter().map(T::into_value).collect())
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        seq_from_value(value, "Array").map(Vec::into_boxed_slice)
    }
}

// ---------------------------------------------------------------------------
// Declaration macros
// ---------------------------------------------------------------------------

/// Implement [`SaveValue`] for struct types that are handled by a converter.
///
/// ```
/// #[derive(Debug, Clone, PartialEq)]
/// struct Tint(f32);
/// savekit_convert::save_struct!(Tint);
///
/// use savekit_convert::value::{FieldType, SaveValue};
/// assert!(matches!(Tint::field_type(), FieldType::Struct(s) if s.name == "Tint"));
/// ```
#[macro_export]
macro_rules! save_struct {
    ($($ty:ident),+ $(,)?) => {$(
        impl $crate::value::SaveValue for $ty {
            fn field_type() -> $crate::value::FieldType {
                $crate::value::FieldType::Struct($crate::value::StructType::of::<$ty>(stringify!($ty)))
            }

            fn into_value(self) -> $crate::value::Value {
                $crate::value::Value::from_struct(self)
            }

            fn from_value(value: $crate::value::Value) -> ::std::result::Result<Self, $crate::ConversionError> {
                value.into_struct::<$ty>()
            }
        }
    )+};
}

/// Implement [`SaveValue`] for a fieldless enum.
///
/// The variant list fixes the numeric value of each variant (its index).
#[macro_export]
macro_rules! save_enum {
    ($ty:ident { $($variant:ident),+ $(,)? }) => {
        impl $crate::value::SaveValue for $ty {
            fn field_type() -> $crate::value::FieldType {
                $crate::value::FieldType::Enum($crate::value::EnumType::of::<$ty>(
                    stringify!($ty),
                    &[$(stringify!($variant)),+],
                ))
            }

            fn into_value(self) -> $crate::value::Value {
                let name = match self {
                    $($ty::$variant => stringify!($variant),)+
                };
                $crate::value::Value::Enum(name.to_owned())
            }

            fn from_value(value: $crate::value::Value) -> ::std::result::Result<Self, $crate::ConversionError> {
                match &value {
                    $crate::value::Value::Enum(name) | $crate::value::Value::String(name) => {
                        match name.as_str() {
                            $(stringify!($variant) => Ok($ty::$variant),)+
                            _ => Err($crate::ConversionError::UnknownVariant {
                                enum_name: stringify!($ty).to_owned(),
                                variant: name.clone(),
                            }),
                        }
                    }
                    other => Err($crate::ConversionError::mismatch(stringify!($ty), other)),
                }
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
