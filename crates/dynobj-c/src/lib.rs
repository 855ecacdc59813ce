// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # dynobj C FFI Bindings
//!
//! C-compatible entry points for building objects out of foreign callbacks
//! and calling methods by signature.
//!
//! # Usage from C
//!
//! ```c
//! int32_t upper(const char* signature, const uint8_t* args, size_t args_len,
//!               DynobjMessage* reply, void* user_data) {
//!     // decode args, compute, encode the result
//!     dynobj_message_write(reply, encoded, encoded_len);
//!     return 0;
//! }
//!
//! DynobjObjectBuilder* builder = dynobj_object_builder_create();
//! dynobj_object_builder_register_method(builder, "s upper::(s)", upper, NULL);
//! DynobjObject* object = dynobj_object_builder_build(builder);
//!
//! DynobjFuture* future = dynobj_object_call(object, "upper::(s)", args, args_len);
//! DynobjMessage* reply = dynobj_message_create();
//! if (dynobj_future_wait(future, 1000, reply) == DYNOBJ_OK) {
//!     // use dynobj_message_data(reply, &len)
//! }
//! dynobj_message_destroy(reply);
//! dynobj_future_destroy(future);
//! dynobj_object_destroy(object);
//! ```
//!
//! # Safety
//!
//! All public functions are `unsafe` and require the caller to uphold the
//! invariants documented in each function's safety comment.

mod future;
mod logging;
mod message;
mod object;

pub use future::*;
pub use logging::*;
pub use message::*;
pub use object::*;

use dynobj::{DispatchError, RegistrationError};

/// Error codes returned by dynobj C functions
///
/// # Error Code Ranges
///
/// - **0-9**: Generic errors
/// - **10-19**: Registration errors
/// - **20-29**: Call errors
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynobjError {
    /// Operation completed successfully
    DynobjOk = 0,
    /// Invalid argument provided (null pointer, invalid UTF-8)
    DynobjInvalidArgument = 1,
    /// Requested resource not found
    DynobjNotFound = 2,
    /// Generic operation failure
    DynobjOperationFailed = 3,
    /// Result not available before the timeout
    DynobjTimeout = 4,

    // === Registration errors (10-19) ===
    /// Signature already advertised on this object
    DynobjConflict = 10,
    /// Malformed signature
    DynobjInvalidSignature = 11,

    // === Call errors (20-29) ===
    /// No method with this signature
    DynobjUnknownMethod = 20,
    /// Argument buffer does not match the parameter list
    DynobjBadArguments = 21,
    /// An argument could not be converted to its parameter type
    DynobjConversionFailed = 22,
    /// The method reported a failure or panicked
    DynobjMethodFailed = 23,
    /// The result could not be encoded
    DynobjSerializationFailed = 24,
    /// The call was abandoned without a result
    DynobjBrokenPromise = 25,
}

impl From<&DispatchError> for DynobjError {
    fn from(e: &DispatchError) -> Self {
        match e {
            DispatchError::UnknownMethod { .. } => Self::DynobjUnknownMethod,
            DispatchError::BadArguments { .. } => Self::DynobjBadArguments,
            DispatchError::ConversionFailed { .. } => Self::DynobjConversionFailed,
            DispatchError::MethodFailed { .. } => Self::DynobjMethodFailed,
            DispatchError::SerializationFailed { .. } => Self::DynobjSerializationFailed,
            DispatchError::BrokenPromise => Self::DynobjBrokenPromise,
        }
    }
}

impl From<&RegistrationError> for DynobjError {
    fn from(e: &RegistrationError) -> Self {
        match e {
            RegistrationError::Conflict(_) => Self::DynobjConflict,
            RegistrationError::InvalidSignature(_)
            | RegistrationError::SignatureMismatch { .. } => Self::DynobjInvalidSignature,
            RegistrationError::UnregisteredType(_) | RegistrationError::AlreadyRegistered(_) => {
                Self::DynobjOperationFailed
            }
        }
    }
}
