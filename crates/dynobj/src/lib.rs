// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dynobj - dynamic object core
//!
//! Type erasure, reflection and signature-addressed call dispatch for objects
//! whose callable surface is only known at runtime.
//!
//! ## Quick Start
//!
//! ```rust
//! use dynobj::{codec, dispatch, GenericObjectBuilder, TypeRegistry, Value};
//!
//! let registry = TypeRegistry::builder().freeze();
//!
//! let mut builder = GenericObjectBuilder::new(&registry);
//! builder
//!     .advertise_function("echo", |s: String| s)
//!     .expect("register echo");
//! let object = builder.object(Value::void());
//!
//! let args = codec::encode_arguments(&[Value::from_native("abc".to_string()).view()])
//!     .expect("encode");
//! let reply = dispatch::meta_call(&object, "echo::(s)", &args).wait_value().expect("call");
//! let value = codec::decode_result(&reply, "s").expect("decode");
//! assert_eq!(value.as_str(), Some("abc"));
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  dispatch: resolve -> deserialize -> invoke -> serialize -> deliver |
//! +---------------------------------------------------------------------+
//! |  object / meta: GenericObject, MetaObject, MetaObjectBuilder        |
//! +---------------------------------------------------------------------+
//! |  method: MethodType, GenericMethod, native adapters, raw methods    |
//! +---------------------------------------------------------------------+
//! |  value: Value / ValueRef, conversion engine, DynamicValue           |
//! +---------------------------------------------------------------------+
//! |  types: TypeDescriptor, Kind, TypeRegistry, lists, maps, objects    |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TypeDescriptor`] | Runtime descriptor of one concrete type |
//! | [`TypeRegistry`] | Explicit, frozen registry of descriptors |
//! | [`Value`] / [`ValueRef`] | Owned erased value / non-owning view |
//! | [`MetaObject`] | Frozen signature table of an object |
//! | [`GenericObjectBuilder`] | Builds an object from native or foreign callables |
//! | [`Future`] / [`Promise`] | One-shot call result handoff |

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod future;
pub mod meta;
pub mod method;
pub mod object;
pub mod signature;
pub mod types;
pub mod value;

pub use config::{DispatchConfig, RuntimeConfig};
pub use dispatch::{meta_call, meta_call_with, CallFuture, CallState};
pub use error::{DispatchError, DispatchResult, RegistrationError};
pub use future::{promise, Future, Outcome, Promise};
pub use meta::{MetaEvent, MetaMethod, MetaObject, MetaObjectBuilder, MethodId};
pub use method::{
    FallibleMethodFn, FunctionFn, GenericMethod, MethodError, MethodFn, MethodType, ParamList,
    RawMethod,
};
pub use object::{GenericObject, GenericObjectBuilder, MetaCallable, ObjectPtr};
pub use signature::{MethodSignature, Signature, SignatureError};
pub use types::{
    Ancestor, ErasedList, ErasedMap, Kind, ListError, ObjectTypeBuilder, Reflect, Storage,
    TypeDescriptor, TypeIdentity, TypeKind, TypeRegistry, TypeRegistryBuilder,
};
pub use value::{ConversionError, Converted, DynamicValue, Value, ValueRef};
