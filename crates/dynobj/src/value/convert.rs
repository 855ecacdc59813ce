// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Conversion engine.
//!
//! Rules are tried in a fixed order; the first one that applies wins:
//!
//! 1. same identity: view of the source
//! 2. same kind (int, float, list, map): allocate and copy
//! 3. float <-> int: allocate and cast with `as` semantics
//! 4. dynamic target wraps a clone; dynamic source is unwrapped
//! 5. erased object handles are unwrapped to their receiver
//! 6. object to ancestor: view through the upcast accessor
//! 7. structural fallback through [`DynamicValue`](super::DynamicValue)

use super::{ConversionError, Converted, Value, ValueRef};
use crate::config::RuntimeConfig;
use crate::types::{Kind, ListInterface, MapInterface, TypeDescriptor, TypeKind};
use std::sync::Arc;

pub(super) fn convert<'b>(
    source: ValueRef<'b>,
    target: &'b Arc<TypeDescriptor>,
) -> Result<Converted<'b>, ConversionError> {
    let from = source.type_descriptor();
    if from.identity() == target.identity() {
        return Ok(Converted::View(source));
    }

    match (from.type_kind(), target.type_kind()) {
        (TypeKind::Int(src), TypeKind::Int(dst)) => {
            let mut out = allocate(target)?;
            dst.set(out.storage_mut(), src.get(source.storage()));
            return Ok(Converted::Owned(out));
        }
        (TypeKind::Float(src), TypeKind::Float(dst)) => {
            let mut out = allocate(target)?;
            dst.set(out.storage_mut(), src.get(source.storage()));
            return Ok(Converted::Owned(out));
        }
        (TypeKind::List(src), TypeKind::List(dst)) => {
            return convert_list(source, src.as_ref(), target, dst.as_ref()).map(Converted::Owned);
        }
        (TypeKind::Map(src), TypeKind::Map(dst)) => {
            return convert_map(source, src.as_ref(), target, dst.as_ref()).map(Converted::Owned);
        }
        (TypeKind::Float(src), TypeKind::Int(dst)) => {
            let mut out = allocate(target)?;
            dst.set_float(out.storage_mut(), src.get(source.storage()));
            return Ok(Converted::Owned(out));
        }
        (TypeKind::Int(src), TypeKind::Float(dst)) => {
            let mut out = allocate(target)?;
            dst.set_int(out.storage_mut(), src.get(source.storage()));
            return Ok(Converted::Owned(out));
        }
        _ => {}
    }

    if target.kind() == Kind::Dynamic {
        let wrapped = Value::with_type(target.clone(), source.to_owned_value());
        return Ok(Converted::Owned(wrapped));
    }
    if let Some(inner) = source.dynamic_inner() {
        return convert(inner, target);
    }

    if let TypeKind::Object(object) = from.type_kind() {
        if let Some(receiver) = object.unwrap(source.storage()) {
            return convert(receiver, target);
        }
        if target.kind() == Kind::Object {
            let ancestor = object
                .inherits(target.identity())
                .and_then(|ancestor| ancestor.upcast(source.storage()));
            if let Some(storage) = ancestor {
                return Ok(Converted::View(ValueRef::new(target, storage)));
            }
        }
    }

    fallback(source, target)
}

fn allocate(target: &Arc<TypeDescriptor>) -> Result<Value, ConversionError> {
    Value::initialize(target).ok_or_else(|| ConversionError::NoZeroValue {
        to: target.name().to_string(),
    })
}

fn convert_list(
    source: ValueRef<'_>,
    src: &dyn ListInterface,
    target: &Arc<TypeDescriptor>,
    dst: &dyn ListInterface,
) -> Result<Value, ConversionError> {
    let mut out = allocate(target)?;
    let element = dst.element_type(out.storage()).clone();
    let same = src.element_type(source.storage()).identity() == element.identity();

    for item in src.iter(source.storage()) {
        let item = if same {
            item.to_owned_value()
        } else {
            item.convert(&element)?.into_owned()
        };
        dst.push_back(out.storage_mut(), item)?;
    }
    Ok(out)
}

fn convert_map(
    source: ValueRef<'_>,
    src: &dyn MapInterface,
    target: &Arc<TypeDescriptor>,
    dst: &dyn MapInterface,
) -> Result<Value, ConversionError> {
    let mut out = allocate(target)?;
    let key_type = dst.key_type(out.storage()).clone();
    let value_type = dst.value_type(out.storage()).clone();

    for (key, value) in src.iter(source.storage()) {
        let key = key.convert(&key_type)?.into_owned();
        let value = value.convert(&value_type)?.into_owned();
        dst.insert(out.storage_mut(), key, value)?;
    }
    Ok(out)
}

fn fallback<'b>(
    source: ValueRef<'b>,
    target: &'b Arc<TypeDescriptor>,
) -> Result<Converted<'b>, ConversionError> {
    let failed = |reason: &'static str| {
        if RuntimeConfig::global().dispatch().warn_on_fallback {
            log::warn!(
                "conversion '{}' -> '{}' failed: {}",
                source.type_descriptor().name(),
                target.name(),
                reason
            );
        }
        ConversionError::FallbackFailed {
            from: source.type_descriptor().name().to_string(),
            to: target.name().to_string(),
            reason,
        }
    };

    let Some(intermediate) = source.to_dynamic() else {
        return Err(failed("source has no dynamic form"));
    };
    target
        .from_dynamic(&intermediate)
        .map(Converted::Owned)
        .ok_or_else(|| failed("target rejected the dynamic form"))
}
