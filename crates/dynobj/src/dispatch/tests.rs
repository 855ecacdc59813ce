// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::object::GenericObjectBuilder;
use crate::signature::Signature;
use crate::types::{ObjectTypeBuilder, Reflect, TypeDescriptor, TypeRegistry};
use crate::value::{DynamicValue, Value};

#[derive(Clone, Default)]
struct Greeter {
    greeting: String,
}

impl Reflect for Greeter {
    fn describe() -> TypeDescriptor {
        ObjectTypeBuilder::<Greeter>::new("Greeter")
            .with_default()
            .build()
    }
}

fn greeter() -> ObjectPtr {
    let registry = TypeRegistry::builder().register::<Greeter>().freeze();
    let mut builder = GenericObjectBuilder::new(&registry);
    builder
        .advertise_method("greet", |g: &Greeter, name: String| {
            format!("{} {}", g.greeting, name)
        })
        .expect("greet");
    builder
        .advertise_fallible_method("parse", |_: &Greeter, text: String| text.parse::<i32>())
        .expect("parse");
    builder
        .advertise_function("boom", || -> i32 { panic!("kaboom") })
        .expect("boom");
    builder
        .advertise_function("spawn", || {
            GenericObjectBuilder::new(TypeRegistry::builtin()).object(Value::void())
        })
        .expect("spawn");
    builder
        .advertise_raw_method(
            "s raw::(s)",
            |signature: &str, args: &[u8]| -> Result<Vec<u8>, String> {
                let text = DynamicValue::String(format!("{}/{}", signature, args.len()));
                codec::encode_dynamic(&text, &Signature::String).map_err(|e| e.to_string())
            },
        )
        .expect("raw");
    builder.object(registry.value(Greeter {
        greeting: "hello".to_string(),
    }))
}

fn encode_string(text: &str) -> Vec<u8> {
    let value = Value::from_native(text.to_string());
    codec::encode_arguments(&[value.view()]).expect("encode")
}

#[test]
fn test_typed_method_uses_instance() {
    let object = greeter();
    let reply = meta_call(&object, "greet::(s)", &encode_string("bob"))
        .wait_value()
        .expect("greet");
    let value = codec::decode_result(&reply, "s").expect("decode");
    assert_eq!(value.as_str(), Some("hello bob"));
}

#[test]
fn test_unknown_method() {
    let object = greeter();
    let err = meta_call(&object, "greet::(i)", &[])
        .wait_value()
        .expect_err("unknown");
    assert_eq!(
        err,
        DispatchError::UnknownMethod {
            signature: "greet::(i)".to_string()
        }
    );
}

#[test]
fn test_bad_arguments_on_trailing_bytes() {
    let object = greeter();
    let mut args = encode_string("bob");
    args.extend_from_slice(&[0, 0, 0, 0]);
    let err = meta_call(&object, "greet::(s)", &args)
        .wait_value()
        .expect_err("trailing");
    assert!(matches!(err, DispatchError::BadArguments { .. }));
}

#[test]
fn test_argument_limit() {
    let object = greeter();
    let config = DispatchConfig {
        max_argument_bytes: 4,
        ..DispatchConfig::default()
    };
    let err = meta_call_with(&object, "greet::(s)", &encode_string("bob"), &config)
        .wait_value()
        .expect_err("too large");
    assert!(matches!(err, DispatchError::BadArguments { .. }));
}

#[test]
fn test_fallible_method_error_is_method_failed() {
    let object = greeter();
    let err = meta_call(&object, "parse::(s)", &encode_string("x1"))
        .wait_value()
        .expect_err("parse");
    match err {
        DispatchError::MethodFailed { signature, cause } => {
            assert_eq!(signature, "parse::(s)");
            assert!(cause.contains("invalid digit"));
        }
        other => panic!("unexpected {:?}", other),
    }

    let reply = meta_call(&object, "parse::(s)", &encode_string("42"))
        .wait_value()
        .expect("parse ok");
    assert_eq!(codec::decode_result(&reply, "i").expect("decode").as_int(), Some(42));
}

#[test]
fn test_panic_is_captured() {
    let object = greeter();
    let err = meta_call_with(&object, "boom::()", &[], &DispatchConfig::default())
        .wait_value()
        .expect_err("panic");
    match err {
        DispatchError::MethodFailed { cause, .. } => assert!(cause.contains("kaboom")),
        other => panic!("unexpected {:?}", other),
    }
    // the object stays usable
    assert!(meta_call(&object, "greet::(s)", &encode_string("x"))
        .wait_value()
        .is_ok());
}

#[test]
fn test_panic_is_captured_without_logging() {
    let object = greeter();
    let config = DispatchConfig {
        log_panics: false,
        ..DispatchConfig::default()
    };
    let future = meta_call_with(&object, "boom::()", &[], &config);
    assert!(future.is_ready());
    assert!(matches!(
        future.wait_value(),
        Err(DispatchError::MethodFailed { .. })
    ));
}

#[test]
fn test_unencodable_result_is_serialization_failure() {
    let object = greeter();
    let (method, _) = object.resolve("spawn::()").expect("spawn");
    assert_eq!(method.sigreturn(), "o");

    let err = meta_call(&object, "spawn::()", &[])
        .wait_value()
        .expect_err("object handles do not cross a buffer");
    match err {
        DispatchError::SerializationFailed { signature, .. } => assert_eq!(signature, "spawn::()"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_raw_method_receives_buffer() {
    let object = greeter();
    let reply = meta_call(&object, "raw::(s)", &[1, 2, 3])
        .wait_value()
        .expect("raw");
    let value = codec::decode_result(&reply, "s").expect("decode");
    assert_eq!(value.as_str(), Some("raw::(s)/3"));
}

#[test]
fn test_future_is_ready_on_return() {
    let object = greeter();
    let future = meta_call(&object, "greet::(s)", &encode_string("a"));
    assert!(future.is_ready());
}

#[test]
fn test_call_state_display() {
    assert_eq!(CallState::Deserializing.to_string(), "deserializing");
    assert_eq!(CallState::Errored.to_string(), "errored");
}
