// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Explicit type registry.
//!
//! Types are registered during a startup phase on a [`TypeRegistryBuilder`],
//! then frozen into a read-only [`TypeRegistry`] shared through `Arc`.
//! Canonical descriptors for wire signatures are synthesized lazily and
//! cached in a concurrent map.

use super::{ErasedList, ErasedMap, Reflect, TypeDescriptor, TypeIdentity};
use crate::error::RegistrationError;
use crate::object::ObjectPtr;
use crate::signature::Signature;
use crate::value::Value;
use dashmap::DashMap;
use std::any::{type_name, Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, OnceLock};

impl TypeDescriptor {
    /// Process-wide descriptor of `T`, described on first use.
    ///
    /// Every caller gets the same instance, so container element types and
    /// values built with [`Value::from_native`] share one descriptor per type.
    pub fn of<T: Reflect>() -> Arc<TypeDescriptor> {
        static DESCRIBED: OnceLock<DashMap<TypeId, Arc<TypeDescriptor>>> = OnceLock::new();
        let described = DESCRIBED.get_or_init(DashMap::new);
        let id = TypeId::of::<T>();
        if let Some(hit) = described.get(&id) {
            return hit.value().clone();
        }
        // described outside the map lock: containers recurse into their elements
        let descriptor = Arc::new(T::describe());
        described.entry(id).or_insert(descriptor).value().clone()
    }
}

/// Startup-phase registry.
pub struct TypeRegistryBuilder {
    types: HashMap<TypeIdentity, Arc<TypeDescriptor>>,
}

impl TypeRegistryBuilder {
    /// Builder preloaded with the built-in types.
    pub fn new() -> Self {
        Self::empty()
            .register::<()>()
            .register::<bool>()
            .register::<i8>()
            .register::<u8>()
            .register::<i16>()
            .register::<u16>()
            .register::<i32>()
            .register::<u32>()
            .register::<i64>()
            .register::<u64>()
            .register::<f32>()
            .register::<f64>()
            .register::<String>()
            .register::<Value>()
            .register::<ObjectPtr>()
            .register::<Vec<bool>>()
            .register::<Vec<u8>>()
            .register::<Vec<i32>>()
            .register::<Vec<i64>>()
            .register::<Vec<f32>>()
            .register::<Vec<f64>>()
            .register::<Vec<String>>()
            .register::<Vec<Value>>()
            .register::<BTreeMap<String, String>>()
            .register::<BTreeMap<String, Value>>()
    }

    /// Builder without any type.
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Register `T`; registering twice is a no-op.
    #[must_use]
    pub fn register<T: Reflect>(mut self) -> Self {
        let _ = self.try_register::<T>();
        self
    }

    /// Register `T`, failing if it is already present.
    pub fn try_register<T: Reflect>(&mut self) -> Result<Arc<TypeDescriptor>, RegistrationError> {
        let identity = TypeIdentity::of::<T>();
        if self.types.contains_key(&identity) {
            return Err(RegistrationError::AlreadyRegistered(type_name::<T>()));
        }
        let descriptor = TypeDescriptor::of::<T>();
        log::debug!(
            "type registry: registered '{}' as '{}'",
            descriptor.name(),
            descriptor.signature()
        );
        self.types.insert(identity, descriptor.clone());
        Ok(descriptor)
    }

    pub fn freeze(self) -> Arc<TypeRegistry> {
        log::info!("type registry frozen with {} types", self.types.len());
        Arc::new(TypeRegistry {
            types: self.types,
            by_signature: DashMap::new(),
        })
    }
}

impl Default for TypeRegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Frozen, read-only registry.
pub struct TypeRegistry {
    types: HashMap<TypeIdentity, Arc<TypeDescriptor>>,
    by_signature: DashMap<Signature, Arc<TypeDescriptor>>,
}

impl TypeRegistry {
    pub fn builder() -> TypeRegistryBuilder {
        TypeRegistryBuilder::new()
    }

    /// Process-wide registry holding only the built-in types.
    pub fn builtin() -> &'static Arc<TypeRegistry> {
        static BUILTIN: OnceLock<Arc<TypeRegistry>> = OnceLock::new();
        BUILTIN.get_or_init(|| TypeRegistryBuilder::new().freeze())
    }

    /// Descriptor of `T`.
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered.
    pub fn type_of<T: Reflect>(&self) -> Arc<TypeDescriptor> {
        match self.lookup::<T>() {
            Some(descriptor) => descriptor,
            None => panic!("type '{}' is not registered", type_name::<T>()),
        }
    }

    pub fn lookup<T: Any>(&self) -> Option<Arc<TypeDescriptor>> {
        self.types.get(&TypeIdentity::of::<T>()).cloned()
    }

    pub fn get(&self, identity: &TypeIdentity) -> Option<&Arc<TypeDescriptor>> {
        self.types.get(identity)
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.types.contains_key(&TypeIdentity::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Wrap `value` with its registered descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `T` was never registered.
    pub fn value<T: Reflect>(&self, value: T) -> Value {
        Value::with_type(self.type_of::<T>(), value)
    }

    /// Canonical descriptor for a wire signature.
    ///
    /// Primitives map to their native type, containers to synthesized
    /// erased lists and maps, `m` to [`Value`] and `o` to [`ObjectPtr`].
    /// Tuples have no value type and yield `None`.
    pub fn for_signature(&self, signature: &Signature) -> Option<Arc<TypeDescriptor>> {
        if let Some(hit) = self.by_signature.get(signature).map(|r| r.value().clone()) {
            return Some(hit);
        }
        let descriptor = self.canonical(signature)?;
        Some(
            self.by_signature
                .entry(signature.clone())
                .or_insert(descriptor)
                .value()
                .clone(),
        )
    }

    fn native<T: Reflect>(&self) -> Arc<TypeDescriptor> {
        self.lookup::<T>().unwrap_or_else(TypeDescriptor::of::<T>)
    }

    fn canonical(&self, signature: &Signature) -> Option<Arc<TypeDescriptor>> {
        let descriptor = match signature {
            Signature::Void => self.native::<()>(),
            Signature::Bool => self.native::<bool>(),
            Signature::Int8 => self.native::<i8>(),
            Signature::UInt8 => self.native::<u8>(),
            Signature::Int16 => self.native::<i16>(),
            Signature::UInt16 => self.native::<u16>(),
            Signature::Int32 => self.native::<i32>(),
            Signature::UInt32 => self.native::<u32>(),
            Signature::Int64 => self.native::<i64>(),
            Signature::UInt64 => self.native::<u64>(),
            Signature::Float => self.native::<f32>(),
            Signature::Double => self.native::<f64>(),
            Signature::String => self.native::<String>(),
            Signature::Dynamic => self.native::<Value>(),
            Signature::Object => self.native::<ObjectPtr>(),
            Signature::List(element) => {
                Arc::new(ErasedList::describe_for(self.for_signature(element)?))
            }
            Signature::Map(key, value) => Arc::new(ErasedMap::describe_for(
                self.for_signature(key)?,
                self.for_signature(value)?,
            )),
            Signature::Tuple(_) => return None,
        };
        Some(descriptor)
    }
}
