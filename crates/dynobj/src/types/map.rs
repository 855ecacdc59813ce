// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Map kind: native `BTreeMap<K, V>` and the synthesized [`ErasedMap`].

use super::descriptor::{storage_as, storage_as_mut, StorageInterface, TypeIdentity, TypeKind};
use super::list::{check_element, ListError};
use super::{Reflect, Storage, TypeDescriptor};
use crate::value::{DynamicValue, Value, ValueRef};
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

type EntryIter<'a> = Box<dyn Iterator<Item = (ValueRef<'a>, ValueRef<'a>)> + 'a>;

/// Operations of a map-kind descriptor.
pub trait MapInterface: Send + Sync {
    fn key_type<'a>(&'a self, storage: &'a Storage) -> &'a Arc<TypeDescriptor>;
    fn value_type<'a>(&'a self, storage: &'a Storage) -> &'a Arc<TypeDescriptor>;
    fn len(&self, storage: &Storage) -> usize;
    fn iter<'a>(&'a self, storage: &'a Storage) -> EntryIter<'a>;
    /// Insert or replace; key and value must already have the map's types.
    fn insert(&self, storage: &mut Storage, key: Value, value: Value) -> Result<(), ListError>;
}

pub(crate) struct BTreeMapInterface<K, V> {
    key: Arc<TypeDescriptor>,
    value: Arc<TypeDescriptor>,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K: Reflect + Ord, V: Reflect> BTreeMapInterface<K, V> {
    pub(crate) fn new(key: Arc<TypeDescriptor>, value: Arc<TypeDescriptor>) -> Self {
        Self {
            key,
            value,
            _marker: PhantomData,
        }
    }
}

impl<K: Reflect + Ord, V: Reflect> MapInterface for BTreeMapInterface<K, V> {
    fn key_type<'a>(&'a self, _storage: &'a Storage) -> &'a Arc<TypeDescriptor> {
        &self.key
    }

    fn value_type<'a>(&'a self, _storage: &'a Storage) -> &'a Arc<TypeDescriptor> {
        &self.value
    }

    fn len(&self, storage: &Storage) -> usize {
        storage_as::<BTreeMap<K, V>>(storage).len()
    }

    fn iter<'a>(&'a self, storage: &'a Storage) -> EntryIter<'a> {
        Box::new(storage_as::<BTreeMap<K, V>>(storage).iter().map(
            move |(key, value)| {
                (
                    ValueRef::new(&self.key, key as &Storage),
                    ValueRef::new(&self.value, value as &Storage),
                )
            },
        ))
    }

    fn insert(&self, storage: &mut Storage, key: Value, value: Value) -> Result<(), ListError> {
        check_element(&self.key, &key)?;
        check_element(&self.value, &value)?;
        let mismatch = |expected: &TypeDescriptor, found: Value| ListError::ElementType {
            expected: expected.signature().to_string(),
            found: found.signature().to_string(),
        };
        let key = key.into_native::<K>().map_err(|k| mismatch(&self.key, k))?;
        let value = value
            .into_native::<V>()
            .map_err(|v| mismatch(&self.value, v))?;
        storage_as_mut::<BTreeMap<K, V>>(storage).insert(key, value);
        Ok(())
    }
}

/// Map whose key and value types are only known at runtime.
///
/// Entries keep insertion order; inserting an equal key replaces its value.
/// Keys are indexed by the hash of their structural form. Keys without one
/// (objects built without `with_dynamic`) are never equal to another key
/// and are appended.
#[derive(Clone)]
pub struct ErasedMap {
    key: Arc<TypeDescriptor>,
    value: Arc<TypeDescriptor>,
    entries: Vec<(Value, Value)>,
    index: HashMap<u64, Vec<usize>>,
}

fn key_hash(form: &DynamicValue) -> u64 {
    let mut hasher = DefaultHasher::new();
    form.hash(&mut hasher);
    hasher.finish()
}

impl ErasedMap {
    pub fn new(key: Arc<TypeDescriptor>, value: Arc<TypeDescriptor>) -> Self {
        Self {
            key,
            value,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn position(&self, hash: u64, form: &DynamicValue) -> Option<usize> {
        self.index
            .get(&hash)?
            .iter()
            .copied()
            .find(|&slot| self.entries[slot].0.to_dynamic().as_ref() == Some(form))
    }

    /// Descriptor of `{kv}` maps.
    pub fn describe_for(key: Arc<TypeDescriptor>, value: Arc<TypeDescriptor>) -> TypeDescriptor {
        TypeDescriptor::new(
            TypeIdentity::ErasedMap(
                Box::new(key.identity().clone()),
                Box::new(value.identity().clone()),
            ),
            format!("ErasedMap<{}, {}>", key.name(), value.name()),
            format!("{{{}{}}}", key.signature(), value.signature()),
            TypeKind::Map(Arc::new(ErasedMapInterface)),
            Arc::new(ErasedMapStorage { key, value }),
        )
    }

    pub fn key_type(&self) -> &Arc<TypeDescriptor> {
        &self.key
    }

    pub fn value_type(&self) -> &Arc<TypeDescriptor> {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), ListError> {
        check_element(&self.key, &key)?;
        check_element(&self.value, &value)?;
        let Some(form) = key.to_dynamic() else {
            self.entries.push((key, value));
            return Ok(());
        };
        let hash = key_hash(&form);
        match self.position(hash, &form) {
            Some(slot) => self.entries[slot].1 = value,
            None => {
                self.index.entry(hash).or_default().push(self.entries.len());
                self.entries.push((key, value));
            }
        }
        Ok(())
    }

    pub fn get(&self, key: ValueRef<'_>) -> Option<ValueRef<'_>> {
        let form = key.to_dynamic()?;
        let slot = self.position(key_hash(&form), &form)?;
        Some(self.entries[slot].1.view())
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValueRef<'_>, ValueRef<'_>)> {
        self.entries.iter().map(|(k, v)| (k.view(), v.view()))
    }
}

impl fmt::Debug for ErasedMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedMap")
            .field("key", &self.key.signature())
            .field("value", &self.value.signature())
            .field("entries", &self.entries)
            .finish()
    }
}

struct ErasedMapInterface;

impl MapInterface for ErasedMapInterface {
    fn key_type<'a>(&'a self, storage: &'a Storage) -> &'a Arc<TypeDescriptor> {
        storage_as::<ErasedMap>(storage).key_type()
    }

    fn value_type<'a>(&'a self, storage: &'a Storage) -> &'a Arc<TypeDescriptor> {
        storage_as::<ErasedMap>(storage).value_type()
    }

    fn len(&self, storage: &Storage) -> usize {
        storage_as::<ErasedMap>(storage).len()
    }

    fn iter<'a>(&'a self, storage: &'a Storage) -> EntryIter<'a> {
        Box::new(storage_as::<ErasedMap>(storage).iter())
    }

    fn insert(&self, storage: &mut Storage, key: Value, value: Value) -> Result<(), ListError> {
        storage_as_mut::<ErasedMap>(storage).insert(key, value)
    }
}

struct ErasedMapStorage {
    key: Arc<TypeDescriptor>,
    value: Arc<TypeDescriptor>,
}

impl StorageInterface for ErasedMapStorage {
    fn initialize(&self) -> Option<Box<Storage>> {
        Some(Box::new(ErasedMap::new(self.key.clone(), self.value.clone())))
    }

    fn clone_storage(&self, storage: &Storage) -> Box<Storage> {
        Box::new(storage_as::<ErasedMap>(storage).clone())
    }
}
