// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object builder and call entry point for C.
//!
//! Foreign callables are registered with a complete signature
//! (`"<ret> <name>::(<params>)"`) and receive the encoded argument buffer
//! untouched; they write the encoded result into the reply message.

use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_void};
use std::ptr;

use dynobj::{meta_call, GenericObjectBuilder, ObjectPtr, RawMethod, TypeRegistry, Value};

use super::future::{into_handle, DynobjFuture};
use super::message::{DynobjMessage, Message};
use super::DynobjError;

// =============================================================================
// Opaque handles
// =============================================================================

/// Opaque handle to an object builder
#[repr(C)]
pub struct DynobjObjectBuilder {
    _private: [u8; 0],
}

/// Opaque handle to a built object
#[repr(C)]
pub struct DynobjObject {
    _private: [u8; 0],
}

// =============================================================================
// C callback type
// =============================================================================

/// C callback implementing one method.
///
/// # Parameters
/// - `signature`: Signature the method was called with (`name::(params)`).
/// - `args`, `args_len`: Encoded argument buffer (read-only).
/// - `reply`: Message to fill with the encoded result.
/// - `user_data`: Context pointer given at registration.
///
/// # Returns
/// 0 on success. On failure, return non-zero; the content of `reply`, if
/// any, is reported as the failure cause.
pub type DynobjMethodFn = unsafe extern "C" fn(
    signature: *const c_char,
    args: *const u8,
    args_len: usize,
    reply: *mut DynobjMessage,
    user_data: *mut c_void,
) -> i32;

/// Bridge from a C function pointer to [`RawMethod`].
struct CMethodBridge {
    callback: DynobjMethodFn,
    user_data: *mut c_void,
}

// SAFETY: methods are called from arbitrary threads.
// The C callback and user_data must be thread-safe (documented in C API).
unsafe impl Send for CMethodBridge {}
unsafe impl Sync for CMethodBridge {}

impl RawMethod for CMethodBridge {
    fn call(&self, signature: &str, args: &[u8]) -> Result<Vec<u8>, String> {
        let signature = CString::new(signature).map_err(|e| e.to_string())?;
        let mut reply = Message::default();
        let rc = unsafe {
            (self.callback)(
                signature.as_ptr(),
                args.as_ptr(),
                args.len(),
                ptr::addr_of_mut!(reply).cast::<DynobjMessage>(),
                self.user_data,
            )
        };

        if rc == 0 {
            Ok(reply.into_bytes())
        } else if reply.bytes().is_empty() {
            Err(format!("foreign method returned {}", rc))
        } else {
            Err(String::from_utf8_lossy(reply.bytes()).into_owned())
        }
    }
}

unsafe fn c_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    CStr::from_ptr(s).to_str().ok()
}

unsafe fn builder_mut<'a>(builder: *mut DynobjObjectBuilder) -> Option<&'a mut GenericObjectBuilder> {
    builder.cast::<GenericObjectBuilder>().as_mut()
}

unsafe fn object_ref<'a>(object: *const DynobjObject) -> Option<&'a ObjectPtr> {
    object.cast::<ObjectPtr>().as_ref()
}

// =============================================================================
// Builder lifecycle
// =============================================================================

/// Create an object builder over the built-in types
///
/// # Safety
/// The returned handle must be released with `dynobj_object_builder_build`
/// or `dynobj_object_builder_destroy`.
#[no_mangle]
pub unsafe extern "C" fn dynobj_object_builder_create() -> *mut DynobjObjectBuilder {
    let builder = GenericObjectBuilder::new(TypeRegistry::builtin());
    Box::into_raw(Box::new(builder)).cast::<DynobjObjectBuilder>()
}

/// Destroy a builder without building
///
/// # Safety
/// - `builder` must be a valid handle from `dynobj_object_builder_create`, or NULL (no-op).
/// - Must not be called more than once with the same pointer.
#[no_mangle]
pub unsafe extern "C" fn dynobj_object_builder_destroy(builder: *mut DynobjObjectBuilder) {
    if !builder.is_null() {
        let _ = Box::from_raw(builder.cast::<GenericObjectBuilder>());
    }
}

/// Register a foreign method
///
/// # Safety
/// - `builder` must be a valid builder handle.
/// - `complete_signature` must be a valid null-terminated C string.
/// - `callback` and `user_data` must stay valid and thread-safe for the
///   lifetime of the built object.
///
/// # Arguments
/// * `complete_signature` - `"<ret> <name>::(<params>)"`, e.g. `"s upper::(s)"`
///
/// # Returns
/// `DynobjOk`, `DynobjConflict` for a duplicate signature or
/// `DynobjInvalidSignature` for a malformed one
#[no_mangle]
pub unsafe extern "C" fn dynobj_object_builder_register_method(
    builder: *mut DynobjObjectBuilder,
    complete_signature: *const c_char,
    callback: Option<DynobjMethodFn>,
    user_data: *mut c_void,
) -> DynobjError {
    let (Some(builder), Some(signature), Some(callback)) =
        (builder_mut(builder), c_str(complete_signature), callback)
    else {
        return DynobjError::DynobjInvalidArgument;
    };

    let bridge = CMethodBridge {
        callback,
        user_data,
    };
    match builder.advertise_raw_method(signature, bridge) {
        Ok(_) => DynobjError::DynobjOk,
        Err(e) => {
            log::warn!("[dynobj-c] cannot register '{}': {}", signature, e);
            DynobjError::from(&e)
        }
    }
}

/// Advertise an event signature (`name::(params)`)
///
/// # Safety
/// - `builder` must be a valid builder handle.
/// - `signature` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn dynobj_object_builder_advertise_event(
    builder: *mut DynobjObjectBuilder,
    signature: *const c_char,
) -> DynobjError {
    let (Some(builder), Some(signature)) = (builder_mut(builder), c_str(signature)) else {
        return DynobjError::DynobjInvalidArgument;
    };
    match builder.xadvertise_event(signature) {
        Ok(_) => DynobjError::DynobjOk,
        Err(e) => DynobjError::from(&e),
    }
}

/// Remove a method registered earlier
///
/// # Safety
/// - `builder` must be a valid builder handle.
/// - `signature` must be a valid null-terminated C string.
///
/// # Returns
/// `DynobjOk`, or `DynobjNotFound` if no such method was registered
#[no_mangle]
pub unsafe extern "C" fn dynobj_object_builder_forget_method(
    builder: *mut DynobjObjectBuilder,
    signature: *const c_char,
) -> DynobjError {
    let (Some(builder), Some(signature)) = (builder_mut(builder), c_str(signature)) else {
        return DynobjError::DynobjInvalidArgument;
    };
    if builder.xforget_method(signature) {
        DynobjError::DynobjOk
    } else {
        DynobjError::DynobjNotFound
    }
}

/// Build the object, consuming the builder
///
/// # Safety
/// - `builder` must be a valid builder handle; it is invalid after this call.
/// - The returned handle must be released with `dynobj_object_destroy`.
#[no_mangle]
pub unsafe extern "C" fn dynobj_object_builder_build(
    builder: *mut DynobjObjectBuilder,
) -> *mut DynobjObject {
    if builder.is_null() {
        return ptr::null_mut();
    }
    let builder = Box::from_raw(builder.cast::<GenericObjectBuilder>());
    let object = builder.object(Value::void());
    Box::into_raw(Box::new(object)).cast::<DynobjObject>()
}

/// Destroy an object handle
///
/// Calls still in flight keep the object alive until they complete.
///
/// # Safety
/// - `object` must be a valid handle from `dynobj_object_builder_build`, or NULL (no-op).
/// - Must not be called more than once with the same pointer.
#[no_mangle]
pub unsafe extern "C" fn dynobj_object_destroy(object: *mut DynobjObject) {
    if !object.is_null() {
        let _ = Box::from_raw(object.cast::<ObjectPtr>());
    }
}

/// Whether the object advertises `signature`
///
/// # Safety
/// - `object` must be a valid object handle.
/// - `signature` must be a valid null-terminated C string.
#[no_mangle]
pub unsafe extern "C" fn dynobj_object_has_method(
    object: *const DynobjObject,
    signature: *const c_char,
) -> bool {
    match (object_ref(object), c_str(signature)) {
        (Some(object), Some(signature)) => object.resolve(signature).is_some(),
        _ => false,
    }
}

/// Write the return signature of a method into `out`
///
/// # Safety
/// - `object` must be a valid object handle.
/// - `signature` must be a valid null-terminated C string.
/// - `out` must be a valid message handle.
#[no_mangle]
pub unsafe extern "C" fn dynobj_object_method_sigreturn(
    object: *const DynobjObject,
    signature: *const c_char,
    out: *mut DynobjMessage,
) -> DynobjError {
    let (Some(object), Some(signature), Some(out)) = (
        object_ref(object),
        c_str(signature),
        super::message::message_mut(out),
    ) else {
        return DynobjError::DynobjInvalidArgument;
    };
    match object.resolve(signature) {
        Some((method, _)) => {
            out.replace(method.sigreturn().as_bytes());
            DynobjError::DynobjOk
        }
        None => DynobjError::DynobjNotFound,
    }
}

// =============================================================================
// Calls
// =============================================================================

/// Call a method by signature
///
/// # Safety
/// - `object` must be a valid object handle.
/// - `signature` must be a valid null-terminated C string.
/// - `args` must point to `args_len` readable bytes (may be NULL when `args_len` is 0).
/// - The returned handle must be released with `dynobj_future_destroy`.
///
/// # Returns
/// A future handle, or NULL on invalid arguments. Dispatch errors are
/// reported through the future.
#[no_mangle]
pub unsafe extern "C" fn dynobj_object_call(
    object: *const DynobjObject,
    signature: *const c_char,
    args: *const u8,
    args_len: usize,
) -> *mut DynobjFuture {
    let (Some(object), Some(signature)) = (object_ref(object), c_str(signature)) else {
        return ptr::null_mut();
    };
    let args: &[u8] = if args_len == 0 {
        &[]
    } else if args.is_null() {
        return ptr::null_mut();
    } else {
        std::slice::from_raw_parts(args, args_len)
    };

    let reply = meta_call(object, signature, args).map(|bytes| Ok(Message::from(bytes.clone())));
    into_handle(reply)
}
