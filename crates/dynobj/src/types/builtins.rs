// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `Reflect` for primitives, standard containers and [`Value`].

use super::descriptor::{
    NativeFloat, NativeInt, NativeStorage, NativeString, TypeIdentity, TypeKind,
};
use super::list::VecList;
use super::map::BTreeMapInterface;
use super::{Reflect, TypeDescriptor};
use crate::config::{
    SIG_BOOL, SIG_DOUBLE, SIG_DYNAMIC, SIG_FLOAT, SIG_INT16, SIG_INT32, SIG_INT64, SIG_INT8,
    SIG_STRING, SIG_UINT16, SIG_UINT32, SIG_UINT64, SIG_UINT8, SIG_VOID,
};
use crate::value::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

fn token(sig: u8) -> String {
    (sig as char).to_string()
}

impl Reflect for () {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::native_default::<()>("void", token(SIG_VOID), TypeKind::Void)
    }
}

macro_rules! reflect_int {
    ($($ty:ty => $sig:expr),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn describe() -> TypeDescriptor {
                    TypeDescriptor::native_default::<$ty>(
                        stringify!($ty),
                        token($sig),
                        TypeKind::Int(Arc::new(NativeInt::<$ty>::new())),
                    )
                }
            }
        )*
    };
}

reflect_int!(
    bool => SIG_BOOL,
    i8 => SIG_INT8,
    u8 => SIG_UINT8,
    i16 => SIG_INT16,
    u16 => SIG_UINT16,
    i32 => SIG_INT32,
    u32 => SIG_UINT32,
    i64 => SIG_INT64,
    u64 => SIG_UINT64,
);

impl Reflect for f32 {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::native_default::<f32>(
            "f32",
            token(SIG_FLOAT),
            TypeKind::Float(Arc::new(NativeFloat::<f32>::new())),
        )
    }
}

impl Reflect for f64 {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::native_default::<f64>(
            "f64",
            token(SIG_DOUBLE),
            TypeKind::Float(Arc::new(NativeFloat::<f64>::new())),
        )
    }
}

impl Reflect for String {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::native_default::<String>(
            "String",
            token(SIG_STRING),
            TypeKind::String(Arc::new(NativeString)),
        )
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn describe() -> TypeDescriptor {
        let element = TypeDescriptor::of::<T>();
        let list = VecList::<T>::new(element.clone());
        TypeDescriptor::native_default::<Vec<T>>(
            format!("Vec<{}>", element.name()),
            format!("[{}]", element.signature()),
            TypeKind::List(Arc::new(list)),
        )
    }
}

impl<K: Reflect + Ord, V: Reflect> Reflect for BTreeMap<K, V> {
    fn describe() -> TypeDescriptor {
        let (key, value) = (TypeDescriptor::of::<K>(), TypeDescriptor::of::<V>());
        let map = BTreeMapInterface::<K, V>::new(key.clone(), value.clone());
        TypeDescriptor::native_default::<BTreeMap<K, V>>(
            format!("BTreeMap<{}, {}>", key.name(), value.name()),
            format!("{{{}{}}}", key.signature(), value.signature()),
            TypeKind::Map(Arc::new(map)),
        )
    }
}

impl Reflect for Value {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::new(
            TypeIdentity::of::<Value>(),
            "Value",
            token(SIG_DYNAMIC),
            TypeKind::Dynamic,
            Arc::new(NativeStorage::<Value>::new(Some(Value::void))),
        )
    }
}
