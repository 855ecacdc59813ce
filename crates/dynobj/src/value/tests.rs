// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::object::GenericObjectBuilder;
use crate::signature::Signature;
use crate::types::{ErasedList, ObjectTypeBuilder, TypeRegistry};
use std::collections::BTreeMap;

#[derive(Clone, Default, Debug, PartialEq)]
struct Shape {
    sides: u32,
}

impl Reflect for Shape {
    fn describe() -> TypeDescriptor {
        ObjectTypeBuilder::<Shape>::new("Shape")
            .with_default()
            .with_dynamic(
                |s| {
                    let mut fields = BTreeMap::new();
                    fields.insert("sides".to_string(), DynamicValue::UInt(u64::from(s.sides)));
                    DynamicValue::Struct(fields)
                },
                |v| {
                    let sides = v.get_field("sides")?.as_u64()?;
                    Some(Shape {
                        sides: u32::try_from(sides).ok()?,
                    })
                },
            )
            .build()
    }
}

#[derive(Clone, Default, Debug, PartialEq)]
struct Square {
    shape: Shape,
    side: f64,
}

impl Reflect for Square {
    fn describe() -> TypeDescriptor {
        ObjectTypeBuilder::<Square>::new("Square")
            .inherits::<Shape>(|s| &s.shape)
            .with_default()
            .build()
    }
}

#[derive(Clone, Default, Debug, PartialEq)]
struct Tile {
    square: Square,
}

impl Reflect for Tile {
    fn describe() -> TypeDescriptor {
        ObjectTypeBuilder::<Tile>::new("Tile")
            .inherits::<Square>(|t| &t.square)
            .build()
    }
}

fn ty<T: Reflect>() -> Arc<TypeDescriptor> {
    TypeDescriptor::of::<T>()
}

#[test]
fn test_identity_is_a_view() {
    let value = Value::from_native(5i32);
    let target = value.type_descriptor().clone();
    let converted = value.convert(&target).expect("identity");
    assert!(!converted.owns_storage());
    assert!(std::ptr::eq(
        converted.view().storage() as *const Storage as *const u8,
        value.storage() as *const Storage as *const u8
    ));
}

#[test]
fn test_int_to_int_wraps_like_as() {
    let target = ty::<u8>();
    let out = Value::from_native(300i32).convert_copy(&target).expect("convert");
    assert_eq!(out.downcast_ref::<u8>(), Some(&(300i32 as u8)));

    let target = ty::<i64>();
    let out = Value::from_native(u32::MAX).convert_copy(&target).expect("widen");
    assert_eq!(out.as_int(), Some(i64::from(u32::MAX)));
}

#[test]
fn test_bool_is_an_int() {
    let target = ty::<i32>();
    let out = Value::from_native(true).convert_copy(&target).expect("convert");
    assert_eq!(out.as_int(), Some(1));

    let target = ty::<bool>();
    let out = Value::from_native(0u64).convert_copy(&target).expect("convert");
    assert_eq!(out.as_bool(), Some(false));
}

#[test]
fn test_float_to_int_truncates_and_saturates() {
    let target = ty::<i32>();
    let cases = [(2.9, 2), (-2.9, -2), (1e20, i32::MAX), (-1e20, i32::MIN), (f64::NAN, 0)];
    for (input, expected) in cases {
        let out = Value::from_native(input).convert_copy(&target).expect("convert");
        assert_eq!(out.downcast_ref::<i32>(), Some(&expected), "input {}", input);
    }
}

#[test]
fn test_int_to_float() {
    let target = ty::<f32>();
    let out = Value::from_native(-7i16).convert_copy(&target).expect("convert");
    assert_eq!(out.downcast_ref::<f32>(), Some(&-7.0));
}

#[test]
fn test_list_conversion_preserves_order_and_length() {
    let source = Value::from_native(vec![1i32, -2, 3]);
    let target = ty::<Vec<f64>>();
    let out = source.convert_copy(&target).expect("convert");
    assert_eq!(out.downcast_ref::<Vec<f64>>(), Some(&vec![1.0, -2.0, 3.0]));
}

#[test]
fn test_list_to_erased_list_and_back() {
    let registry = TypeRegistry::builtin();
    let erased = registry
        .for_signature(&Signature::parse("[s]").expect("parse"))
        .expect("erased");
    let source = Value::from_native(vec!["a".to_string(), "b".to_string()]);

    let converted = source.convert_copy(&erased).expect("to erased");
    let list = converted.downcast_ref::<ErasedList>().expect("erased storage");
    let items: Vec<&str> = list.iter().filter_map(|item| item.as_str()).collect();
    assert_eq!(items, vec!["a", "b"]);

    let native = converted.convert_copy(&ty::<Vec<String>>()).expect("back");
    assert_eq!(native, source);
}

#[test]
fn test_list_element_conversion_failure() {
    let source = Value::from_native(vec!["x".to_string()]);
    let err = source
        .convert_copy(&ty::<Vec<i32>>())
        .expect_err("string into i32");
    assert!(matches!(err, ConversionError::FallbackFailed { .. }));
}

#[test]
fn test_map_conversion() {
    let mut map = BTreeMap::new();
    map.insert("one".to_string(), 1i32);
    map.insert("two".to_string(), 2i32);
    let source = Value::from_native(map);

    let out = source
        .convert_copy(&ty::<BTreeMap<String, i64>>())
        .expect("convert");
    let out = out.downcast_ref::<BTreeMap<String, i64>>().expect("native");
    assert_eq!(out.get("two"), Some(&2));
    assert_eq!(out.len(), 2);
}

#[test]
fn test_dynamic_wrap_and_unwrap() {
    let source = Value::from_native(42u16);
    let wrapped = source.convert_copy(&ty::<Value>()).expect("wrap");
    assert_eq!(wrapped.kind(), Kind::Dynamic);
    let inner = wrapped.view().dynamic_inner().expect("inner");
    assert_eq!(inner.signature(), "W");

    let unwrapped = wrapped.convert(&ty::<u16>()).map(Converted::into_owned);
    assert_eq!(unwrapped, Ok(source.clone()));

    // unwrap then convert
    let widened = wrapped.convert_copy(&ty::<i64>()).expect("unwrap and widen");
    assert_eq!(widened.as_int(), Some(42));
}

#[test]
fn test_upcast_is_a_view_of_the_embedded_ancestor() {
    let tile = Value::from_native(Tile {
        square: Square {
            shape: Shape { sides: 4 },
            side: 2.5,
        },
    });
    let shape_type = ty::<Shape>();
    let converted = tile.convert(&shape_type).expect("upcast two levels");
    assert!(!converted.owns_storage());
    assert_eq!(converted.view().downcast_ref::<Shape>(), Some(&Shape { sides: 4 }));

    let original = tile.downcast_ref::<Tile>().expect("tile");
    let upcast = converted.view().downcast_ref::<Shape>().expect("shape");
    assert!(std::ptr::eq(upcast, &original.square.shape));
}

#[test]
fn test_dropping_a_view_keeps_the_source() {
    let value = Value::from_native(Square {
        shape: Shape { sides: 4 },
        side: 1.0,
    });
    {
        let target = ty::<Shape>();
        let view = value.convert(&target).expect("view");
        drop(view);
    }
    assert_eq!(value.downcast_ref::<Square>().map(|s| s.side), Some(1.0));
}

#[test]
fn test_unrelated_objects_fail() {
    let square = Value::from_native(Square::default());
    let err = square.convert_copy(&ty::<Tile>()).expect_err("downcast");
    assert!(matches!(err, ConversionError::FallbackFailed { .. }));
}

#[test]
fn test_object_handle_unwraps_to_receiver() {
    let registry = TypeRegistry::builder().register::<Shape>().freeze();
    let object = GenericObjectBuilder::new(&registry).object(registry.value(Shape { sides: 3 }));
    let handle = registry.value(object);
    let out = handle.convert_copy(&ty::<Shape>()).expect("unwrap");
    assert_eq!(out.downcast_ref::<Shape>(), Some(&Shape { sides: 3 }));
}

#[test]
fn test_fallback_through_dynamic_form() {
    // string-keyed map of dynamic values rebuilds the object structurally
    let shape = Value::from_native(Shape { sides: 6 });
    let tree = shape.to_dynamic().expect("structural form");
    assert_eq!(
        tree.get_field("sides"),
        Some(&DynamicValue::UInt(6))
    );
    let rebuilt = ty::<Shape>().from_dynamic(&tree).expect("rebuild");
    assert_eq!(rebuilt, shape);
}

#[test]
fn test_fallback_failure_is_explicit() {
    let text = Value::from_native("not a shape".to_string());
    let err = text.convert_copy(&ty::<Shape>()).expect_err("no path");
    match err {
        ConversionError::FallbackFailed { from, to, .. } => {
            assert_eq!(from, "String");
            assert_eq!(to, "Shape");
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_string_to_int_has_no_path() {
    let err = Value::from_native("12".to_string())
        .convert_copy(&ty::<i32>())
        .expect_err("no implicit parse");
    assert!(matches!(err, ConversionError::FallbackFailed { .. }));
}

#[test]
fn test_clone_is_deep() {
    let original = Value::from_native(vec![vec![1u8], vec![2u8, 3]]);
    let mut copy = original.clone();
    copy.push_back(Value::from_native(vec![9u8])).expect("push");
    assert_eq!(original.len(), Some(2));
    assert_eq!(copy.len(), Some(3));
}

#[test]
fn test_push_back_rejects_foreign_element() {
    let mut list = Value::from_native(Vec::<i32>::new());
    let err = list
        .push_back(Value::from_native(1i64))
        .expect_err("wrong element type");
    assert!(matches!(err, ListError::ElementType { .. }));
}

#[test]
fn test_iteration_restarts() {
    let list = Value::from_native(vec![1u8, 2, 3]);
    let first: Vec<i64> = list.elements().expect("list").filter_map(|v| v.as_int()).collect();
    let second: Vec<i64> = list.elements().expect("list").filter_map(|v| v.as_int()).collect();
    assert_eq!(first, vec![1, 2, 3]);
    assert_eq!(first, second);
}

#[test]
fn test_equality_is_typed() {
    assert_eq!(Value::from_native(1i32), Value::from_native(1i32));
    assert_ne!(Value::from_native(1i32), Value::from_native(1i64));
    assert_ne!(Value::from_native(1i32), Value::from_native(2i32));
}

#[test]
fn test_object_without_dynamic_form_equals_itself() {
    let tile = Value::from_native(Tile::default());
    assert!(tile.to_dynamic().is_none());

    let same = tile.view();
    assert_eq!(tile.view(), same);

    let target = ty::<Tile>();
    let converted = tile.convert(&target).expect("identity");
    assert!(!converted.owns_storage());
    assert_eq!(converted.view(), tile.view());

    // a copy has its own storage and nothing structural to compare
    let copy = tile.convert_copy(&target).expect("copy");
    assert_ne!(copy, tile);
}
