// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type descriptors.
//!
//! Every type that crosses an erased boundary has exactly one descriptor
//! identity. Descriptors are shared through `Arc` and compared by
//! [`TypeIdentity`], never by address or textual name.
//!
//! # Example
//!
//! ```
//! use dynobj::{Kind, Reflect, TypeRegistry};
//!
//! let registry = TypeRegistry::builder().register::<Vec<u16>>().freeze();
//! let ty = registry.type_of::<Vec<u16>>();
//! assert_eq!(ty.kind(), Kind::List);
//! assert_eq!(ty.signature(), "[W]");
//! assert_eq!(*ty, <Vec<u16>>::describe());
//! ```

mod builtins;
mod descriptor;
mod list;
mod map;
mod object_type;
mod registry;


pub use descriptor::{
    FloatInterface, IntInterface, Kind, StorageInterface, StringInterface, TypeDescriptor,
    TypeIdentity, TypeKind,
};
pub use list::{ErasedList, ListError, ListInterface};
pub use map::{ErasedMap, MapInterface};
pub use object_type::{Ancestor, ObjectInterface, ObjectTypeBuilder, UnwrapFn, UpcastFn};
pub use registry::{TypeRegistry, TypeRegistryBuilder};

pub(crate) use descriptor::storage_as;

use std::any::Any;

/// Erased storage behind a [`crate::Value`].
pub type Storage = dyn Any + Send + Sync;

/// Native types that can be described at runtime.
///
/// Built-in implementations cover `()`, `bool`, fixed-width integers, `f32`,
/// `f64`, `String`, `Vec<T>`, `BTreeMap<K, V>`, [`crate::Value`] and
/// [`crate::ObjectPtr`]. Object types implement it with
/// [`ObjectTypeBuilder`].
pub trait Reflect: Any + Send + Sync + Clone {
    fn describe() -> TypeDescriptor;
}
