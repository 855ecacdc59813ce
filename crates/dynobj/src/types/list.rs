// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! List kind: native `Vec<T>` and the signature-synthesized [`ErasedList`].

use super::descriptor::{storage_as, storage_as_mut, StorageInterface, TypeIdentity, TypeKind};
use super::{Reflect, Storage, TypeDescriptor};
use crate::value::{Value, ValueRef};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Errors raised when mutating an erased container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// Pushed value does not have the element type
    ElementType { expected: String, found: String },

    /// Value is not a list (or map) at all
    NotAContainer { signature: String },
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementType { expected, found } => write!(
                f,
                "Element type mismatch: expected '{}', found '{}'",
                expected, found
            ),
            Self::NotAContainer { signature } => {
                write!(f, "Value of type '{}' is not a container", signature)
            }
        }
    }
}

impl std::error::Error for ListError {}

pub(crate) fn check_element(expected: &TypeDescriptor, value: &Value) -> Result<(), ListError> {
    if expected == &**value.type_descriptor() {
        Ok(())
    } else {
        Err(ListError::ElementType {
            expected: expected.signature().to_string(),
            found: value.signature().to_string(),
        })
    }
}

/// Operations of a list-kind descriptor.
pub trait ListInterface: Send + Sync {
    /// Element descriptor, read from the storage for synthesized lists.
    fn element_type<'a>(&'a self, storage: &'a Storage) -> &'a Arc<TypeDescriptor>;
    fn len(&self, storage: &Storage) -> usize;
    /// Restartable forward iteration over element views.
    fn iter<'a>(&'a self, storage: &'a Storage) -> Box<dyn Iterator<Item = ValueRef<'a>> + 'a>;
    /// Append `value`, which must already have the element type.
    fn push_back(&self, storage: &mut Storage, value: Value) -> Result<(), ListError>;
}

pub(crate) struct VecList<T> {
    element: Arc<TypeDescriptor>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reflect> VecList<T> {
    pub(crate) fn new(element: Arc<TypeDescriptor>) -> Self {
        Self {
            element,
            _marker: PhantomData,
        }
    }
}

impl<T: Reflect> ListInterface for VecList<T> {
    fn element_type<'a>(&'a self, _storage: &'a Storage) -> &'a Arc<TypeDescriptor> {
        &self.element
    }

    fn len(&self, storage: &Storage) -> usize {
        storage_as::<Vec<T>>(storage).len()
    }

    fn iter<'a>(&'a self, storage: &'a Storage) -> Box<dyn Iterator<Item = ValueRef<'a>> + 'a> {
        let items = storage_as::<Vec<T>>(storage);
        Box::new(
            items
                .iter()
                .map(move |item| ValueRef::new(&self.element, item as &Storage)),
        )
    }

    fn push_back(&self, storage: &mut Storage, value: Value) -> Result<(), ListError> {
        check_element(&self.element, &value)?;
        let item = value
            .into_native::<T>()
            .map_err(|value| ListError::ElementType {
                expected: self.element.signature().to_string(),
                found: value.signature().to_string(),
            })?;
        storage_as_mut::<Vec<T>>(storage).push(item);
        Ok(())
    }
}

/// Homogeneous list whose element type is only known at runtime.
#[derive(Clone)]
pub struct ErasedList {
    element: Arc<TypeDescriptor>,
    items: Vec<Value>,
}

impl ErasedList {
    pub fn new(element: Arc<TypeDescriptor>) -> Self {
        Self {
            element,
            items: Vec::new(),
        }
    }

    /// Descriptor of `[element]` lists.
    pub fn describe_for(element: Arc<TypeDescriptor>) -> TypeDescriptor {
        TypeDescriptor::new(
            TypeIdentity::ErasedList(Box::new(element.identity().clone())),
            format!("ErasedList<{}>", element.name()),
            format!("[{}]", element.signature()),
            TypeKind::List(Arc::new(ErasedListInterface)),
            Arc::new(ErasedListStorage { element }),
        )
    }

    pub fn element_type(&self) -> &Arc<TypeDescriptor> {
        &self.element
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append `value`. Nothing is converted: the type must match exactly.
    pub fn push_back(&mut self, value: Value) -> Result<(), ListError> {
        check_element(&self.element, &value)?;
        self.items.push(value);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = ValueRef<'_>> {
        self.items.iter().map(Value::view)
    }
}

impl fmt::Debug for ErasedList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErasedList")
            .field("element", &self.element.signature())
            .field("items", &self.items)
            .finish()
    }
}

struct ErasedListInterface;

impl ListInterface for ErasedListInterface {
    fn element_type<'a>(&'a self, storage: &'a Storage) -> &'a Arc<TypeDescriptor> {
        storage_as::<ErasedList>(storage).element_type()
    }

    fn len(&self, storage: &Storage) -> usize {
        storage_as::<ErasedList>(storage).len()
    }

    fn iter<'a>(&'a self, storage: &'a Storage) -> Box<dyn Iterator<Item = ValueRef<'a>> + 'a> {
        Box::new(storage_as::<ErasedList>(storage).iter())
    }

    fn push_back(&self, storage: &mut Storage, value: Value) -> Result<(), ListError> {
        storage_as_mut::<ErasedList>(storage).push_back(value)
    }
}

struct ErasedListStorage {
    element: Arc<TypeDescriptor>,
}

impl StorageInterface for ErasedListStorage {
    fn initialize(&self) -> Option<Box<Storage>> {
        Some(Box::new(ErasedList::new(self.element.clone())))
    }

    fn clone_storage(&self, storage: &Storage) -> Box<Storage> {
        Box::new(storage_as::<ErasedList>(storage).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int_list() -> Value {
        let ty = Arc::new(ErasedList::describe_for(Arc::new(i32::describe())));
        Value::initialize(&ty).expect("erased list has a zero value")
    }

    #[test]
    fn test_erased_list_push_and_iterate() {
        let mut list = int_list();
        for i in 0..4 {
            list.push_back(Value::from_native(i)).expect("push");
        }
        let seen: Vec<i64> = list
            .elements()
            .expect("list")
            .map(|item| item.as_int().expect("int"))
            .collect();
        assert_eq!(seen, vec![0, 1, 2, 3]);

        // second pass restarts from the beginning
        assert_eq!(list.elements().expect("list").count(), 4);
    }

    #[test]
    fn test_erased_list_rejects_wrong_element() {
        let mut list = int_list();
        let err = list
            .push_back(Value::from_native(1i64))
            .expect_err("i64 into [i]");
        assert_eq!(
            err,
            ListError::ElementType {
                expected: "i".to_string(),
                found: "l".to_string()
            }
        );
        assert_eq!(list.len(), Some(0));
    }

    #[test]
    fn test_vec_list_push_back() {
        let mut value = Value::from_native(vec!["a".to_string()]);
        value
            .push_back(Value::from_native("b".to_string()))
            .expect("push");
        assert_eq!(
            value.downcast_ref::<Vec<String>>(),
            Some(&vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_push_back_on_scalar() {
        let mut value = Value::from_native(3u8);
        assert!(matches!(
            value.push_back(Value::from_native(1u8)),
            Err(ListError::NotAContainer { .. })
        ));
    }
}
