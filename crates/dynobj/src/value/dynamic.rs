// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Structural value tree.
//!
//! [`DynamicValue`] is the intermediate form of the fallback conversion and
//! the model the argument codec reads and writes.

use super::Value;
use crate::signature::Signature;
use crate::types::{storage_as, Storage, TypeDescriptor, TypeKind, TypeRegistry};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::mem;
use std::sync::Arc;

/// Type-independent value tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicValue {
    Void,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    List(Vec<DynamicValue>),
    /// Entries in iteration order.
    Map(Vec<(DynamicValue, DynamicValue)>),
    /// Named fields of an object with a structural form.
    Struct(BTreeMap<String, DynamicValue>),
    /// Inner signature and value of a dynamic (`m`) value.
    Dynamic(String, Box<DynamicValue>),
}

impl DynamicValue {
    pub fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Try to get as bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get as i64 (unsigned values must fit).
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Try to get as u64 (signed values must be non-negative).
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            Self::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[DynamicValue]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(DynamicValue, DynamicValue)]> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    /// Try to get struct field.
    pub fn get_field(&self, name: &str) -> Option<&DynamicValue> {
        match self {
            Self::Struct(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Signature of the type this tree decodes to when nothing else is known.
    ///
    /// Lists and maps become lists and maps of dynamic values. Structs have no
    /// wire type.
    pub fn natural_signature(&self) -> Option<Signature> {
        Some(match self {
            Self::Void => Signature::Void,
            Self::Bool(_) => Signature::Bool,
            Self::Int(_) => Signature::Int64,
            Self::UInt(_) => Signature::UInt64,
            Self::Float(_) => Signature::Double,
            Self::String(_) => Signature::String,
            Self::List(_) => Signature::List(Box::new(Signature::Dynamic)),
            Self::Map(_) => {
                Signature::Map(Box::new(Signature::Dynamic), Box::new(Signature::Dynamic))
            }
            Self::Dynamic(..) => Signature::Dynamic,
            Self::Struct(_) => return None,
        })
    }
}

/// Consistent with `PartialEq`: `-0.0` hashes like `0.0`. NaN never equals
/// anything, so its hash is irrelevant.
impl Hash for DynamicValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self).hash(state);
        match self {
            Self::Void => {}
            Self::Bool(v) => v.hash(state),
            Self::Int(v) => v.hash(state),
            Self::UInt(v) => v.hash(state),
            Self::Float(v) => {
                let v = if *v == 0.0 { 0.0 } else { *v };
                v.to_bits().hash(state);
            }
            Self::String(v) => v.hash(state),
            Self::List(items) => items.hash(state),
            Self::Map(entries) => entries.hash(state),
            Self::Struct(fields) => fields.hash(state),
            Self::Dynamic(signature, inner) => {
                signature.hash(state);
                inner.hash(state);
            }
        }
    }
}

impl TypeDescriptor {
    /// Structural form of `storage`, `None` for objects without one.
    pub fn to_dynamic(&self, storage: &Storage) -> Option<DynamicValue> {
        Some(match self.type_kind() {
            TypeKind::Void => DynamicValue::Void,
            TypeKind::Int(int) => {
                let raw = int.get(storage);
                if int.is_bool() {
                    DynamicValue::Bool(raw != 0)
                } else if int.is_signed() {
                    DynamicValue::Int(raw as i64)
                } else {
                    DynamicValue::UInt(raw as u64)
                }
            }
            TypeKind::Float(float) => DynamicValue::Float(float.get(storage)),
            TypeKind::String(string) => DynamicValue::String(string.as_str(storage).to_string()),
            TypeKind::List(list) => DynamicValue::List(
                list.iter(storage)
                    .map(|item| item.to_dynamic())
                    .collect::<Option<Vec<_>>>()?,
            ),
            TypeKind::Map(map) => DynamicValue::Map(
                map.iter(storage)
                    .map(|(key, value)| Some((key.to_dynamic()?, value.to_dynamic()?)))
                    .collect::<Option<Vec<_>>>()?,
            ),
            TypeKind::Object(object) => match object.unwrap(storage) {
                Some(receiver) => receiver.to_dynamic()?,
                None => object.to_dynamic(storage)?,
            },
            TypeKind::Dynamic => {
                let inner = storage_as::<Value>(storage);
                DynamicValue::Dynamic(inner.signature().to_string(), Box::new(inner.to_dynamic()?))
            }
        })
    }

    /// Rebuild a value of this type from its structural form.
    ///
    /// Numbers are accepted across integer and float shapes with `as`
    /// semantics. Dynamic targets resolve the inner type through the
    /// built-in registry.
    pub fn from_dynamic(self: &Arc<Self>, value: &DynamicValue) -> Option<Value> {
        match (self.type_kind(), value) {
            (TypeKind::Void, DynamicValue::Void) => Value::initialize(self),
            (TypeKind::Int(int), _) => {
                let mut out = Value::initialize(self)?;
                match value {
                    DynamicValue::Bool(v) => int.set(out.storage_mut(), i128::from(*v)),
                    DynamicValue::Int(v) => int.set(out.storage_mut(), i128::from(*v)),
                    DynamicValue::UInt(v) => int.set(out.storage_mut(), i128::from(*v)),
                    DynamicValue::Float(v) => int.set_float(out.storage_mut(), *v),
                    _ => return None,
                }
                Some(out)
            }
            (TypeKind::Float(float), _) => {
                let mut out = Value::initialize(self)?;
                match value {
                    DynamicValue::Int(v) => float.set_int(out.storage_mut(), i128::from(*v)),
                    DynamicValue::UInt(v) => float.set_int(out.storage_mut(), i128::from(*v)),
                    DynamicValue::Float(v) => float.set(out.storage_mut(), *v),
                    _ => return None,
                }
                Some(out)
            }
            (TypeKind::String(string), DynamicValue::String(text)) => {
                let mut out = Value::initialize(self)?;
                string.set(out.storage_mut(), text);
                Some(out)
            }
            (TypeKind::List(list), DynamicValue::List(items)) => {
                let mut out = Value::initialize(self)?;
                let element = list.element_type(out.storage()).clone();
                for item in items {
                    list.push_back(out.storage_mut(), element.from_dynamic(item)?)
                        .ok()?;
                }
                Some(out)
            }
            (TypeKind::Map(map), DynamicValue::Map(entries)) => {
                let mut out = Value::initialize(self)?;
                let key_type = map.key_type(out.storage()).clone();
                let value_type = map.value_type(out.storage()).clone();
                for (key, value) in entries {
                    let key = key_type.from_dynamic(key)?;
                    let value = value_type.from_dynamic(value)?;
                    map.insert(out.storage_mut(), key, value).ok()?;
                }
                Some(out)
            }
            (TypeKind::Object(object), _) => object
                .from_dynamic(value)
                .map(|storage| Value::from_parts(self.clone(), storage)),
            (TypeKind::Dynamic, DynamicValue::Dynamic(signature, inner)) => {
                let signature = Signature::parse(signature).ok()?;
                let inner_type = TypeRegistry::builtin().for_signature(&signature)?;
                let inner = inner_type.from_dynamic(inner)?;
                Some(Value::with_type(self.clone(), inner))
            }
            (TypeKind::Dynamic, _) => {
                let signature = value.natural_signature()?;
                let inner_type = TypeRegistry::builtin().for_signature(&signature)?;
                let inner = inner_type.from_dynamic(value)?;
                Some(Value::with_type(self.clone(), inner))
            }
            _ => None,
        }
    }
}
