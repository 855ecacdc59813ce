// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Call-result futures for C.

use std::os::raw::c_void;
use std::time::Duration;

use dynobj::Future;

use super::message::{message_mut, DynobjMessage, Message};
use super::DynobjError;

/// Opaque handle to a pending call result
#[repr(C)]
pub struct DynobjFuture {
    _private: [u8; 0],
}

/// C callback invoked once a call result is known.
///
/// # Parameters
/// - `status`: `DynobjOk` or the dispatch error code.
/// - `data`, `len`: Encoded result on success, UTF-8 error text otherwise.
///   Only valid during the callback.
/// - `user_data`: Context pointer given to `dynobj_future_connect`.
pub type DynobjResultFn =
    unsafe extern "C" fn(status: DynobjError, data: *const u8, len: usize, user_data: *mut c_void);

pub(crate) fn into_handle(future: Future<Message>) -> *mut DynobjFuture {
    Box::into_raw(Box::new(future)).cast::<DynobjFuture>()
}

unsafe fn future_ref<'a>(future: *const DynobjFuture) -> Option<&'a Future<Message>> {
    future.cast::<Future<Message>>().as_ref()
}

struct UserData(*mut c_void);

// SAFETY: the continuation may run on the thread delivering the result.
// user_data must be thread-safe (documented in C API).
unsafe impl Send for UserData {}

/// Destroy a future handle
///
/// # Safety
/// - `future` must be a valid handle from `dynobj_object_call`, or NULL (no-op).
/// - Must not be called more than once with the same pointer.
#[no_mangle]
pub unsafe extern "C" fn dynobj_future_destroy(future: *mut DynobjFuture) {
    if !future.is_null() {
        let _ = Box::from_raw(future.cast::<Future<Message>>());
    }
}

/// Whether the result is available
///
/// # Safety
/// `future` must be a valid future handle or NULL.
#[no_mangle]
pub unsafe extern "C" fn dynobj_future_is_ready(future: *const DynobjFuture) -> bool {
    future_ref(future).is_some_and(Future::is_ready)
}

/// Wait for the result
///
/// # Safety
/// - `future` must be a valid future handle.
/// - `out` must be a valid message handle; it receives the encoded result on
///   success or the UTF-8 error text on failure.
///
/// # Arguments
/// * `timeout_ms` - Maximum wait in milliseconds, negative to wait forever
///
/// # Returns
/// `DynobjOk`, `DynobjTimeout`, or the dispatch error code
#[no_mangle]
pub unsafe extern "C" fn dynobj_future_wait(
    future: *const DynobjFuture,
    timeout_ms: i64,
    out: *mut DynobjMessage,
) -> DynobjError {
    let (Some(future), Some(out)) = (future_ref(future), message_mut(out)) else {
        return DynobjError::DynobjInvalidArgument;
    };

    let outcome = match u64::try_from(timeout_ms) {
        Ok(ms) => match future.wait_timeout(Duration::from_millis(ms)) {
            Some(outcome) => outcome,
            None => return DynobjError::DynobjTimeout,
        },
        Err(_) => future.wait(),
    };

    match outcome.as_ref() {
        Ok(reply) => {
            out.replace(reply.bytes());
            DynobjError::DynobjOk
        }
        Err(e) => {
            out.replace(e.to_string().as_bytes());
            DynobjError::from(e)
        }
    }
}

/// Run `callback` once the result is known
///
/// Runs immediately, on the calling thread, if the result is already
/// available; otherwise on the thread that delivers it.
///
/// # Safety
/// - `future` must be a valid future handle.
/// - `callback` and `user_data` must stay valid until the callback ran.
#[no_mangle]
pub unsafe extern "C" fn dynobj_future_connect(
    future: *const DynobjFuture,
    callback: Option<DynobjResultFn>,
    user_data: *mut c_void,
) -> DynobjError {
    let (Some(future), Some(callback)) = (future_ref(future), callback) else {
        return DynobjError::DynobjInvalidArgument;
    };
    let user_data = UserData(user_data);
    future.connect(move |outcome| {
        let user_data = user_data;
        match outcome {
            Ok(reply) => unsafe {
                callback(
                    DynobjError::DynobjOk,
                    reply.bytes().as_ptr(),
                    reply.bytes().len(),
                    user_data.0,
                );
            },
            Err(e) => {
                let text = e.to_string();
                unsafe {
                    callback(DynobjError::from(e), text.as_ptr(), text.len(), user_data.0);
                }
            }
        }
    });
    DynobjError::DynobjOk
}
