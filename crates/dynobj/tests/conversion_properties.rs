// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// Randomized conversion properties: round trips between integer and float
// kinds, truncation boundaries of f32/f64, and list conversion shape.

#![allow(clippy::float_cmp)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]

use dynobj::{Reflect, TypeDescriptor, Value};
use std::sync::Arc;

const ITERATIONS: usize = 2_000;

fn ty<T: Reflect>() -> Arc<TypeDescriptor> {
    TypeDescriptor::of::<T>()
}

fn roundtrip<T: Reflect + PartialEq + std::fmt::Debug>(value: T, through: &Arc<TypeDescriptor>) {
    let source = Value::from_native(value);
    let there = source.convert_copy(through).expect("forward");
    let back = there.convert_copy(source.type_descriptor()).expect("backward");
    assert_eq!(back, source, "through {}", through.name());
}

#[test]
fn int_roundtrip_through_wider_int() {
    let mut rng = fastrand::Rng::with_seed(0x5eed);
    let wide = ty::<i64>();
    for _ in 0..ITERATIONS {
        roundtrip(rng.i32(..), &wide);
        roundtrip(rng.u32(..), &wide);
        roundtrip(rng.i8(..), &wide);
    }
}

#[test]
fn int_roundtrip_through_f64_within_2_pow_53() {
    let mut rng = fastrand::Rng::with_seed(53);
    let double = ty::<f64>();
    let limit = 1i64 << 53;
    for _ in 0..ITERATIONS {
        roundtrip(rng.i64(-limit..=limit), &double);
    }
    roundtrip(limit, &double);
    roundtrip(-limit, &double);
}

#[test]
fn int_roundtrip_through_f32_within_2_pow_24() {
    let mut rng = fastrand::Rng::with_seed(24);
    let single = ty::<f32>();
    let limit = 1i32 << 24;
    for _ in 0..ITERATIONS {
        roundtrip(rng.i32(-limit..=limit), &single);
    }
}

#[test]
fn f32_truncation_boundary() {
    let single = ty::<f32>();
    let int = ty::<i32>();
    let first_inexact = (1i32 << 24) + 1;
    let through = Value::from_native(first_inexact)
        .convert_copy(&single)
        .expect("to f32")
        .convert_copy(&int)
        .expect("back");
    assert_ne!(through.as_int(), Some(i64::from(first_inexact)));
}

#[test]
fn f64_truncation_boundary() {
    let double = ty::<f64>();
    let int = ty::<i64>();
    let first_inexact = (1i64 << 53) + 1;
    let through = Value::from_native(first_inexact)
        .convert_copy(&double)
        .expect("to f64")
        .convert_copy(&int)
        .expect("back");
    assert_ne!(through.as_int(), Some(first_inexact));
}

#[test]
fn float_to_int_truncates_toward_zero() {
    let mut rng = fastrand::Rng::with_seed(7);
    let int = ty::<i64>();
    for _ in 0..ITERATIONS {
        let x = (rng.f64() - 0.5) * 1e12;
        let out = Value::from_native(x).convert_copy(&int).expect("convert");
        assert_eq!(out.as_int(), Some(x.trunc() as i64), "input {}", x);
    }
}

#[test]
fn list_conversion_preserves_order_and_length() {
    let mut rng = fastrand::Rng::with_seed(99);
    let target = ty::<Vec<i64>>();
    for _ in 0..200 {
        let len = rng.usize(0..64);
        let items: Vec<i16> = (0..len).map(|_| rng.i16(..)).collect();
        let out = Value::from_native(items.clone())
            .convert_copy(&target)
            .expect("convert");
        let expected: Vec<i64> = items.iter().copied().map(i64::from).collect();
        assert_eq!(out.downcast_ref::<Vec<i64>>(), Some(&expected));
        assert_eq!(out.len(), Some(len));
    }
}

#[test]
fn dynamic_roundtrip_is_identity() {
    let mut rng = fastrand::Rng::with_seed(1);
    let dynamic = ty::<Value>();
    for _ in 0..ITERATIONS {
        let source = Value::from_native(rng.u64(..));
        let wrapped = source.convert_copy(&dynamic).expect("wrap");
        let back = wrapped
            .convert_copy(source.type_descriptor())
            .expect("unwrap");
        assert_eq!(back, source);
    }
}
