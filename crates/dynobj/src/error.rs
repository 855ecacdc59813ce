// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for registration and call dispatch.

use crate::signature::SignatureError;
use crate::value::ConversionError;
use std::fmt;

/// Result type for dispatch operations
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Errors delivered through a call [`crate::Future`].
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchError {
    /// No method with this exact signature on the object
    UnknownMethod { signature: String },

    /// Argument buffer could not be decoded against the parameter list
    BadArguments { signature: String, reason: String },

    /// A decoded argument could not be converted to the parameter type
    ConversionFailed {
        signature: String,
        source: ConversionError,
    },

    /// The callable reported a failure (or panicked)
    MethodFailed { signature: String, cause: String },

    /// The return value could not be encoded
    SerializationFailed { signature: String, reason: String },

    /// The promise was dropped without a result
    BrokenPromise,
}

impl DispatchError {
    /// Signature of the failed call, if known.
    pub fn signature(&self) -> Option<&str> {
        match self {
            Self::UnknownMethod { signature }
            | Self::BadArguments { signature, .. }
            | Self::ConversionFailed { signature, .. }
            | Self::MethodFailed { signature, .. }
            | Self::SerializationFailed { signature, .. } => Some(signature),
            Self::BrokenPromise => None,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMethod { signature } => write!(f, "Unknown method: {}", signature),
            Self::BadArguments { signature, reason } => {
                write!(f, "Bad arguments for {}: {}", signature, reason)
            }
            Self::ConversionFailed { signature, source } => {
                write!(f, "Argument conversion failed for {}: {}", signature, source)
            }
            Self::MethodFailed { signature, cause } => {
                write!(f, "Method {} failed: {}", signature, cause)
            }
            Self::SerializationFailed { signature, reason } => {
                write!(f, "Result serialization failed for {}: {}", signature, reason)
            }
            Self::BrokenPromise => write!(f, "Promise dropped without a result"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConversionFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors raised while building types or objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Signature already advertised on this builder
    Conflict(String),

    /// Signature text did not parse
    InvalidSignature(SignatureError),

    /// A native type used in a signature was never registered
    UnregisteredType(&'static str),

    /// `try_register` on a type that is already present
    AlreadyRegistered(&'static str),

    /// Typed callable does not match the signatures it is advertised under
    SignatureMismatch {
        signature: String,
        advertised: String,
        callable: String,
    },
}

impl fmt::Display for RegistrationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Conflict(sig) => write!(f, "Signature already registered: {}", sig),
            Self::InvalidSignature(e) => write!(f, "Invalid signature: {}", e),
            Self::UnregisteredType(name) => write!(f, "Type not registered: {}", name),
            Self::AlreadyRegistered(name) => write!(f, "Type already registered: {}", name),
            Self::SignatureMismatch {
                signature,
                advertised,
                callable,
            } => write!(
                f,
                "Callable for {} has signature '{}', advertised as '{}'",
                signature, callable, advertised
            ),
        }
    }
}

impl std::error::Error for RegistrationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidSignature(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SignatureError> for RegistrationError {
    fn from(e: SignatureError) -> Self {
        Self::InvalidSignature(e)
    }
}
