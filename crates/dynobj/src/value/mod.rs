// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Erased values.
//!
//! [`Value`] owns its storage and releases it on drop. [`ValueRef`] is a
//! borrowed view that can never outlive, or free, the storage it points to.
//! Conversions return a [`Converted`], which is either a view into the
//! source or a freshly allocated value.

mod convert;
mod dynamic;

pub use dynamic::DynamicValue;

use crate::types::{
    storage_as, Kind, ListError, Reflect, Storage, TypeDescriptor, TypeKind,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type EntryIter<'a> = Box<dyn Iterator<Item = (ValueRef<'a>, ValueRef<'a>)> + 'a>;

/// Errors raised by the conversion engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The target type has no zero value to convert into
    NoZeroValue { to: String },

    /// No direct rule applied and the structural fallback failed
    FallbackFailed {
        from: String,
        to: String,
        reason: &'static str,
    },

    /// A converted element was rejected by the target container
    Container(ListError),
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoZeroValue { to } => write!(f, "Type '{}' has no zero value", to),
            Self::FallbackFailed { from, to, reason } => {
                write!(f, "Cannot convert '{}' to '{}': {}", from, to, reason)
            }
            Self::Container(e) => write!(f, "Container conversion failed: {}", e),
        }
    }
}

impl std::error::Error for ConversionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Container(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ListError> for ConversionError {
    fn from(e: ListError) -> Self {
        Self::Container(e)
    }
}

/// Owned erased value.
pub struct Value {
    ty: Arc<TypeDescriptor>,
    storage: Box<Storage>,
}

impl Value {
    pub(crate) fn from_parts(ty: Arc<TypeDescriptor>, storage: Box<Storage>) -> Self {
        Self { ty, storage }
    }

    pub(crate) fn with_type<T: Any + Send + Sync>(ty: Arc<TypeDescriptor>, value: T) -> Self {
        debug_assert!(ty.is::<T>(), "descriptor '{}' paired with foreign value", ty.name());
        Self::from_parts(ty, Box::new(value))
    }

    pub fn from_native<T: Reflect>(value: T) -> Self {
        Self::with_type(TypeDescriptor::of::<T>(), value)
    }

    /// The unit value (`v`).
    pub fn void() -> Self {
        Self::from_native(())
    }

    /// Wrap `inner` in a dynamic (`m`) value.
    pub fn dynamic(inner: Value) -> Self {
        Self::from_native(inner)
    }

    /// Zero value of `ty`, if it has one.
    pub fn initialize(ty: &Arc<TypeDescriptor>) -> Option<Self> {
        ty.initialize()
            .map(|storage| Self::from_parts(ty.clone(), storage))
    }

    pub fn type_descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    pub fn kind(&self) -> Kind {
        self.ty.kind()
    }

    pub fn signature(&self) -> &str {
        self.ty.signature()
    }

    pub fn view(&self) -> ValueRef<'_> {
        ValueRef::new(&self.ty, &*self.storage)
    }

    pub(crate) fn storage(&self) -> &Storage {
        &*self.storage
    }

    pub(crate) fn storage_mut(&mut self) -> &mut Storage {
        &mut *self.storage
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.storage.downcast_ref::<T>()
    }

    /// Take the native value out, or get `self` back if it is not a `T`.
    pub fn into_native<T: Any>(self) -> Result<T, Value> {
        let Self { ty, storage } = self;
        match storage.downcast::<T>() {
            Ok(native) => Ok(*native),
            Err(storage) => Err(Self::from_parts(ty, storage)),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        self.view().as_int()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.view().as_bool()
    }

    pub fn as_float(&self) -> Option<f64> {
        self.view().as_float()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.view().as_str()
    }

    /// Element count of a list or map.
    pub fn len(&self) -> Option<usize> {
        self.view().len()
    }

    pub fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }

    pub fn elements(&self) -> Option<Box<dyn Iterator<Item = ValueRef<'_>> + '_>> {
        self.view().elements()
    }

    pub fn entries(&self) -> Option<EntryIter<'_>> {
        self.view().entries()
    }

    /// Append to a list. The value must already have the element type.
    pub fn push_back(&mut self, value: Value) -> Result<(), ListError> {
        match self.ty.type_kind() {
            TypeKind::List(list) => list.push_back(&mut *self.storage, value),
            _ => Err(ListError::NotAContainer {
                signature: self.ty.signature().to_string(),
            }),
        }
    }

    /// Insert into a map. Key and value must already have the map's types.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), ListError> {
        match self.ty.type_kind() {
            TypeKind::Map(map) => map.insert(&mut *self.storage, key, value),
            _ => Err(ListError::NotAContainer {
                signature: self.ty.signature().to_string(),
            }),
        }
    }

    pub fn convert<'b>(
        &'b self,
        target: &'b Arc<TypeDescriptor>,
    ) -> Result<Converted<'b>, ConversionError> {
        self.view().convert(target)
    }

    pub fn convert_copy(&self, target: &Arc<TypeDescriptor>) -> Result<Value, ConversionError> {
        self.view().convert_copy(target)
    }

    pub fn to_dynamic(&self) -> Option<DynamicValue> {
        self.view().to_dynamic()
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        self.view().to_owned_value()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.view() == other.view()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.view(), f)
    }
}

/// Non-owning view of an erased value.
#[derive(Clone, Copy)]
pub struct ValueRef<'a> {
    ty: &'a Arc<TypeDescriptor>,
    storage: &'a Storage,
}

impl<'a> ValueRef<'a> {
    pub(crate) fn new(ty: &'a Arc<TypeDescriptor>, storage: &'a Storage) -> Self {
        Self { ty, storage }
    }

    pub fn type_descriptor(&self) -> &'a Arc<TypeDescriptor> {
        self.ty
    }

    pub fn kind(&self) -> Kind {
        self.ty.kind()
    }

    pub fn signature(&self) -> &'a str {
        self.ty.signature()
    }

    pub fn storage(&self) -> &'a Storage {
        self.storage
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        self.storage.downcast_ref::<T>()
    }

    /// Integer content, `None` if not an integer or out of `i64` range.
    pub fn as_int(&self) -> Option<i64> {
        match self.ty.type_kind() {
            TypeKind::Int(int) => i64::try_from(int.get(self.storage)).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.ty.type_kind() {
            TypeKind::Int(int) if int.is_bool() => Some(int.get(self.storage) != 0),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.ty.type_kind() {
            TypeKind::Float(float) => Some(float.get(self.storage)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&'a str> {
        match self.ty.type_kind() {
            TypeKind::String(string) => Some(string.as_str(self.storage)),
            _ => None,
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self.ty.type_kind() {
            TypeKind::List(list) => Some(list.len(self.storage)),
            TypeKind::Map(map) => Some(map.len(self.storage)),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> Option<bool> {
        self.len().map(|len| len == 0)
    }

    /// Element views of a list; each call starts a new pass.
    pub fn elements(&self) -> Option<Box<dyn Iterator<Item = ValueRef<'a>> + 'a>> {
        match self.ty.type_kind() {
            TypeKind::List(list) => Some(list.iter(self.storage)),
            _ => None,
        }
    }

    /// Key/value views of a map.
    pub fn entries(&self) -> Option<EntryIter<'a>> {
        match self.ty.type_kind() {
            TypeKind::Map(map) => Some(map.iter(self.storage)),
            _ => None,
        }
    }

    /// Content of a dynamic (`m`) value.
    pub fn dynamic_inner(&self) -> Option<ValueRef<'a>> {
        match self.ty.type_kind() {
            TypeKind::Dynamic => Some(storage_as::<Value>(self.storage).view()),
            _ => None,
        }
    }

    /// Deep copy into an owned value.
    pub fn to_owned_value(&self) -> Value {
        Value::from_parts(self.ty.clone(), self.ty.clone_storage(self.storage))
    }

    /// Convert to `target`, borrowing from the source when possible.
    pub fn convert<'b>(
        self,
        target: &'b Arc<TypeDescriptor>,
    ) -> Result<Converted<'b>, ConversionError>
    where
        'a: 'b,
    {
        convert::convert(self, target)
    }

    /// Convert to `target`, always producing an owned value.
    pub fn convert_copy(self, target: &Arc<TypeDescriptor>) -> Result<Value, ConversionError> {
        convert::convert(self, target).map(Converted::into_owned)
    }

    pub fn to_dynamic(&self) -> Option<DynamicValue> {
        self.ty.to_dynamic(self.storage)
    }
}

/// Values of the same type compare by structural form. A value without one
/// (an object type built without `with_dynamic`) is only equal to views of
/// its own storage, so a copy of it compares unequal.
impl PartialEq for ValueRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        if self.ty != other.ty {
            return false;
        }
        match (self.to_dynamic(), other.to_dynamic()) {
            (Some(a), Some(b)) => a == b,
            _ => std::ptr::eq(
                self.storage as *const Storage as *const u8,
                other.storage as *const Storage as *const u8,
            ),
        }
    }
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_dynamic() {
            Some(dynamic) => write!(f, "{}:{:?}", self.signature(), dynamic),
            None => write!(f, "{}:<{}>", self.signature(), self.ty.name()),
        }
    }
}

/// Outcome of a conversion.
#[derive(Debug)]
pub enum Converted<'a> {
    /// Borrows the source; nothing was allocated
    View(ValueRef<'a>),
    /// New storage owned by the caller
    Owned(Value),
}

impl<'a> Converted<'a> {
    /// Whether new storage was allocated.
    pub fn owns_storage(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    pub fn view(&self) -> ValueRef<'_> {
        match self {
            Self::View(view) => *view,
            Self::Owned(value) => value.view(),
        }
    }

    pub fn into_owned(self) -> Value {
        match self {
            Self::View(view) => view.to_owned_value(),
            Self::Owned(value) => value,
        }
    }
}

#[cfg(test)]
mod tests;
