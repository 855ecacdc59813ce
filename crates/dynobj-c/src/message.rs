// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte buffers exchanged with C: argument and reply payloads.

use std::ptr;
use std::slice;

use super::DynobjError;

/// Opaque handle to a message buffer
#[repr(C)]
pub struct DynobjMessage {
    _private: [u8; 0],
}

/// Owned payload behind a [`DynobjMessage`] handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    payload: Vec<u8>,
}

impl Message {
    pub fn bytes(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.payload
    }

    pub(crate) fn replace(&mut self, bytes: &[u8]) {
        self.payload.clear();
        self.payload.extend_from_slice(bytes);
    }
}

impl From<Vec<u8>> for Message {
    fn from(payload: Vec<u8>) -> Self {
        Self { payload }
    }
}

pub(crate) unsafe fn message_mut<'a>(message: *mut DynobjMessage) -> Option<&'a mut Message> {
    message.cast::<Message>().as_mut()
}

/// Create an empty message
///
/// # Safety
/// The returned handle must be released with `dynobj_message_destroy`.
#[no_mangle]
pub unsafe extern "C" fn dynobj_message_create() -> *mut DynobjMessage {
    Box::into_raw(Box::<Message>::default()).cast::<DynobjMessage>()
}

/// Destroy a message
///
/// # Safety
/// - `message` must be a valid handle from `dynobj_message_create`, or NULL (no-op).
/// - Must not be called more than once with the same pointer.
#[no_mangle]
pub unsafe extern "C" fn dynobj_message_destroy(message: *mut DynobjMessage) {
    if !message.is_null() {
        let _ = Box::from_raw(message.cast::<Message>());
    }
}

/// Append `len` bytes to a message
///
/// # Safety
/// - `message` must be a valid message handle.
/// - `data` must point to `len` readable bytes (may be NULL when `len` is 0).
#[no_mangle]
pub unsafe extern "C" fn dynobj_message_write(
    message: *mut DynobjMessage,
    data: *const u8,
    len: usize,
) -> DynobjError {
    let Some(message) = message_mut(message) else {
        return DynobjError::DynobjInvalidArgument;
    };
    if len == 0 {
        return DynobjError::DynobjOk;
    }
    if data.is_null() {
        return DynobjError::DynobjInvalidArgument;
    }
    message
        .payload
        .extend_from_slice(slice::from_raw_parts(data, len));
    DynobjError::DynobjOk
}

/// Discard the content of a message
///
/// # Safety
/// `message` must be a valid message handle.
#[no_mangle]
pub unsafe extern "C" fn dynobj_message_clear(message: *mut DynobjMessage) -> DynobjError {
    let Some(message) = message_mut(message) else {
        return DynobjError::DynobjInvalidArgument;
    };
    message.payload.clear();
    DynobjError::DynobjOk
}

/// Borrow the content of a message
///
/// The pointer stays valid until the message is modified or destroyed.
///
/// # Safety
/// - `message` must be a valid message handle.
/// - `out_len` must be a valid pointer or NULL.
///
/// # Returns
/// Pointer to the first byte, or NULL for a NULL handle.
#[no_mangle]
pub unsafe extern "C" fn dynobj_message_data(
    message: *const DynobjMessage,
    out_len: *mut usize,
) -> *const u8 {
    let Some(message) = message.cast::<Message>().as_ref() else {
        if !out_len.is_null() {
            out_len.write(0);
        }
        return ptr::null();
    };
    if !out_len.is_null() {
        out_len.write(message.payload.len());
    }
    message.payload.as_ptr()
}

/// Length of a message in bytes (0 for NULL)
///
/// # Safety
/// `message` must be a valid message handle or NULL.
#[no_mangle]
pub unsafe extern "C" fn dynobj_message_len(message: *const DynobjMessage) -> usize {
    message
        .cast::<Message>()
        .as_ref()
        .map_or(0, |message| message.payload.len())
}
