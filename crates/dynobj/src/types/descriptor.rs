// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptor and per-kind interfaces.

use super::list::ListInterface;
use super::map::MapInterface;
use super::object_type::{Ancestor, ObjectInterface};
use super::Storage;
use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Closed kind taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Void,
    Int,
    Float,
    String,
    List,
    Map,
    Object,
    Dynamic,
}

/// Descriptor identity.
///
/// Native types are keyed by `TypeId`. Containers synthesized from a wire
/// signature are keyed by the identities of their element types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeIdentity {
    Native(TypeId),
    ErasedList(Box<TypeIdentity>),
    ErasedMap(Box<TypeIdentity>, Box<TypeIdentity>),
}

impl TypeIdentity {
    pub fn of<T: Any>() -> Self {
        Self::Native(TypeId::of::<T>())
    }
}

/// Storage lifecycle of one type.
pub trait StorageInterface: Send + Sync {
    /// Fresh zero value, if the type has one.
    fn initialize(&self) -> Option<Box<Storage>>;
    /// Deep copy of `storage`.
    fn clone_storage(&self, storage: &Storage) -> Box<Storage>;
}

pub(crate) struct NativeStorage<T> {
    init: Option<fn() -> T>,
}

impl<T> NativeStorage<T> {
    pub(crate) fn new(init: Option<fn() -> T>) -> Self {
        Self { init }
    }
}

impl<T: Any + Send + Sync + Clone> StorageInterface for NativeStorage<T> {
    fn initialize(&self) -> Option<Box<Storage>> {
        self.init.map(|init| Box::new(init()) as Box<Storage>)
    }

    fn clone_storage(&self, storage: &Storage) -> Box<Storage> {
        Box::new(storage_as::<T>(storage).clone())
    }
}

/// Downcast storage to the type its descriptor promises.
///
/// # Panics
///
/// Panics if the storage does not hold a `T`, which means a descriptor was
/// paired with foreign storage.
pub(crate) fn storage_as<T: Any>(storage: &Storage) -> &T {
    match storage.downcast_ref::<T>() {
        Some(value) => value,
        None => panic!("storage does not hold a {}", type_name::<T>()),
    }
}

/// Mutable counterpart of [`storage_as`].
pub(crate) fn storage_as_mut<T: Any>(storage: &mut Storage) -> &mut T {
    match storage.downcast_mut::<T>() {
        Some(value) => value,
        None => panic!("storage does not hold a {}", type_name::<T>()),
    }
}

/// Integer kind (including `bool`).
pub trait IntInterface: Send + Sync {
    fn get(&self, storage: &Storage) -> i128;
    /// Store `value`, wrapping to the target width.
    fn set(&self, storage: &mut Storage, value: i128);
    /// Store `value` with `as` semantics (truncate, saturate, NaN to zero).
    fn set_float(&self, storage: &mut Storage, value: f64);
    /// Width in bytes.
    fn size(&self) -> usize;
    fn is_signed(&self) -> bool;
    fn is_bool(&self) -> bool {
        false
    }
}

/// Floating point kind.
pub trait FloatInterface: Send + Sync {
    fn get(&self, storage: &Storage) -> f64;
    fn set(&self, storage: &mut Storage, value: f64);
    fn set_int(&self, storage: &mut Storage, value: i128);
    fn size(&self) -> usize;
}

/// String kind.
pub trait StringInterface: Send + Sync {
    fn as_str<'a>(&self, storage: &'a Storage) -> &'a str;
    fn set(&self, storage: &mut Storage, value: &str);
}

pub(crate) struct NativeInt<T>(PhantomData<fn() -> T>);

impl<T> NativeInt<T> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

macro_rules! impl_native_int {
    ($($ty:ty => $signed:expr),* $(,)?) => {
        $(
            impl IntInterface for NativeInt<$ty> {
                fn get(&self, storage: &Storage) -> i128 {
                    i128::from(*storage_as::<$ty>(storage))
                }

                fn set(&self, storage: &mut Storage, value: i128) {
                    *storage_as_mut::<$ty>(storage) = value as $ty;
                }

                fn set_float(&self, storage: &mut Storage, value: f64) {
                    *storage_as_mut::<$ty>(storage) = value as $ty;
                }

                fn size(&self) -> usize {
                    std::mem::size_of::<$ty>()
                }

                fn is_signed(&self) -> bool {
                    $signed
                }
            }
        )*
    };
}

impl_native_int!(
    i8 => true,
    u8 => false,
    i16 => true,
    u16 => false,
    i32 => true,
    u32 => false,
    i64 => true,
    u64 => false,
);

impl IntInterface for NativeInt<bool> {
    fn get(&self, storage: &Storage) -> i128 {
        i128::from(*storage_as::<bool>(storage))
    }

    fn set(&self, storage: &mut Storage, value: i128) {
        *storage_as_mut::<bool>(storage) = value != 0;
    }

    fn set_float(&self, storage: &mut Storage, value: f64) {
        *storage_as_mut::<bool>(storage) = (value as i64) != 0;
    }

    fn size(&self) -> usize {
        1
    }

    fn is_signed(&self) -> bool {
        false
    }

    fn is_bool(&self) -> bool {
        true
    }
}

pub(crate) struct NativeFloat<T>(PhantomData<fn() -> T>);

impl<T> NativeFloat<T> {
    pub(crate) fn new() -> Self {
        Self(PhantomData)
    }
}

macro_rules! impl_native_float {
    ($($ty:ty),*) => {
        $(
            impl FloatInterface for NativeFloat<$ty> {
                fn get(&self, storage: &Storage) -> f64 {
                    f64::from(*storage_as::<$ty>(storage))
                }

                fn set(&self, storage: &mut Storage, value: f64) {
                    *storage_as_mut::<$ty>(storage) = value as $ty;
                }

                fn set_int(&self, storage: &mut Storage, value: i128) {
                    *storage_as_mut::<$ty>(storage) = value as $ty;
                }

                fn size(&self) -> usize {
                    std::mem::size_of::<$ty>()
                }
            }
        )*
    };
}

impl_native_float!(f32, f64);

pub(crate) struct NativeString;

impl StringInterface for NativeString {
    fn as_str<'a>(&self, storage: &'a Storage) -> &'a str {
        storage_as::<String>(storage)
    }

    fn set(&self, storage: &mut Storage, value: &str) {
        let target = storage_as_mut::<String>(storage);
        target.clear();
        target.push_str(value);
    }
}

/// Kind plus the kind-specific interface.
pub enum TypeKind {
    Void,
    Int(Arc<dyn IntInterface>),
    Float(Arc<dyn FloatInterface>),
    String(Arc<dyn StringInterface>),
    List(Arc<dyn ListInterface>),
    Map(Arc<dyn MapInterface>),
    Object(ObjectInterface),
    /// Storage is a [`crate::Value`].
    Dynamic,
}

impl TypeKind {
    pub fn kind(&self) -> Kind {
        match self {
            Self::Void => Kind::Void,
            Self::Int(_) => Kind::Int,
            Self::Float(_) => Kind::Float,
            Self::String(_) => Kind::String,
            Self::List(_) => Kind::List,
            Self::Map(_) => Kind::Map,
            Self::Object(_) => Kind::Object,
            Self::Dynamic => Kind::Dynamic,
        }
    }
}

/// Runtime descriptor of one concrete type.
pub struct TypeDescriptor {
    identity: TypeIdentity,
    name: String,
    signature: String,
    kind: TypeKind,
    storage: Arc<dyn StorageInterface>,
}

impl TypeDescriptor {
    pub fn new(
        identity: TypeIdentity,
        name: impl Into<String>,
        signature: impl Into<String>,
        kind: TypeKind,
        storage: Arc<dyn StorageInterface>,
    ) -> Self {
        Self {
            identity,
            name: name.into(),
            signature: signature.into(),
            kind,
            storage,
        }
    }

    /// Descriptor for a native type without a zero value.
    pub fn native<T: Any + Send + Sync + Clone>(
        name: impl Into<String>,
        signature: impl Into<String>,
        kind: TypeKind,
    ) -> Self {
        Self::new(
            TypeIdentity::of::<T>(),
            name,
            signature,
            kind,
            Arc::new(NativeStorage::<T>::new(None)),
        )
    }

    /// Descriptor for a native type whose zero value is `T::default()`.
    pub fn native_default<T: Any + Send + Sync + Clone + Default>(
        name: impl Into<String>,
        signature: impl Into<String>,
        kind: TypeKind,
    ) -> Self {
        Self::new(
            TypeIdentity::of::<T>(),
            name,
            signature,
            kind,
            Arc::new(NativeStorage::<T>::new(Some(T::default))),
        )
    }

    pub fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compact wire signature (`i`, `[s]`, `{sm}`, `o`, ...).
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn kind(&self) -> Kind {
        self.kind.kind()
    }

    pub fn type_kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn is<T: Any>(&self) -> bool {
        self.identity == TypeIdentity::of::<T>()
    }

    pub fn initialize(&self) -> Option<Box<Storage>> {
        self.storage.initialize()
    }

    pub fn clone_storage(&self, storage: &Storage) -> Box<Storage> {
        self.storage.clone_storage(storage)
    }

    /// Ancestor entry for `other` if this is an object type deriving from it.
    pub fn inherits(&self, other: &TypeDescriptor) -> Option<&Ancestor> {
        match &self.kind {
            TypeKind::Object(object) => object.inherits(&other.identity),
            _ => None,
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for TypeDescriptor {}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("kind", &self.kind())
            .finish()
    }
}
