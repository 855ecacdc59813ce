// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signature-addressed call dispatch.
//!
//! A call walks `Resolved -> Deserializing -> Invoking -> Serializing ->
//! Delivered`; any step may end in `Errored`. The pipeline runs on the
//! calling thread and always completes the returned future exactly once.
//! Buffer-level callables skip the codec steps.

use crate::codec;
use crate::config::{DispatchConfig, RuntimeConfig};
use crate::error::{DispatchError, DispatchResult};
use crate::future::{promise, Future};
use crate::method::{GenericMethod, MethodError, RawMethod};
use crate::object::{MetaCallable, ObjectPtr};
use crate::value::ValueRef;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Future of an encoded call result.
pub type CallFuture = Future<Vec<u8>>;

/// Dispatch pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Resolved,
    Deserializing,
    Invoking,
    Serializing,
    Delivered,
    Errored,
}

impl fmt::Display for CallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Resolved => "resolved",
            Self::Deserializing => "deserializing",
            Self::Invoking => "invoking",
            Self::Serializing => "serializing",
            Self::Delivered => "delivered",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

fn transition(signature: &str, state: CallState) {
    log::trace!("call {}: {}", signature, state);
}

/// Call `signature` on `object` with encoded `args`, using the process-wide
/// dispatch configuration.
pub fn meta_call(object: &ObjectPtr, signature: &str, args: &[u8]) -> CallFuture {
    let config = RuntimeConfig::global().dispatch();
    meta_call_with(object, signature, args, &config)
}

/// Like [`meta_call`] with an explicit configuration.
pub fn meta_call_with(
    object: &ObjectPtr,
    signature: &str,
    args: &[u8],
    config: &DispatchConfig,
) -> CallFuture {
    let (promise, future) = promise();
    let outcome = run(object, signature, args, config);
    match &outcome {
        Ok(reply) => {
            log::trace!("call {}: {} reply bytes", signature, reply.len());
            transition(signature, CallState::Delivered);
        }
        Err(e) => {
            log::debug!("call {} failed: {}", signature, e);
            transition(signature, CallState::Errored);
        }
    }
    promise.set_outcome(outcome);
    future
}

fn run(
    object: &ObjectPtr,
    signature: &str,
    args: &[u8],
    config: &DispatchConfig,
) -> DispatchResult<Vec<u8>> {
    let Some((_, callable)) = object.resolve(signature) else {
        return Err(DispatchError::UnknownMethod {
            signature: signature.to_string(),
        });
    };
    transition(signature, CallState::Resolved);

    if args.len() > config.max_argument_bytes {
        return Err(DispatchError::BadArguments {
            signature: signature.to_string(),
            reason: format!(
                "argument buffer of {} bytes exceeds limit of {}",
                args.len(),
                config.max_argument_bytes
            ),
        });
    }

    match callable {
        MetaCallable::Raw(raw) => call_raw(raw.as_ref(), signature, args, config),
        MetaCallable::Method(method) => call_method(object, method, signature, args, config),
    }
}

fn call_raw(
    raw: &dyn RawMethod,
    signature: &str,
    args: &[u8],
    config: &DispatchConfig,
) -> DispatchResult<Vec<u8>> {
    transition(signature, CallState::Invoking);
    guarded(signature, config, || raw.call(signature, args))?.map_err(|cause| {
        DispatchError::MethodFailed {
            signature: signature.to_string(),
            cause,
        }
    })
}

fn call_method(
    object: &ObjectPtr,
    method: &GenericMethod,
    signature: &str,
    args: &[u8],
    config: &DispatchConfig,
) -> DispatchResult<Vec<u8>> {
    transition(signature, CallState::Deserializing);
    let values = codec::decode_arguments(args, method.params()).map_err(|e| {
        DispatchError::BadArguments {
            signature: signature.to_string(),
            reason: e.to_string(),
        }
    })?;
    let views: Vec<ValueRef<'_>> = values.iter().map(|value| value.view()).collect();

    transition(signature, CallState::Invoking);
    let receiver = object.instance().view();
    let result = guarded(signature, config, || method.call(receiver, &views))?
        .map_err(|e| method_error(signature, e))?;

    transition(signature, CallState::Serializing);
    codec::encode_result(result.view(), method.return_signature()).map_err(|e| {
        DispatchError::SerializationFailed {
            signature: signature.to_string(),
            reason: e.to_string(),
        }
    })
}

fn method_error(signature: &str, error: MethodError) -> DispatchError {
    let signature = signature.to_string();
    match error {
        MethodError::Arity { .. } => DispatchError::BadArguments {
            signature,
            reason: error.to_string(),
        },
        MethodError::Argument { source, .. } => DispatchError::ConversionFailed { signature, source },
        MethodError::Receiver { .. } | MethodError::Failed(_) => DispatchError::MethodFailed {
            signature,
            cause: error.to_string(),
        },
    }
}

/// Run `f`, turning a panic into `MethodFailed`.
fn guarded<R>(
    signature: &str,
    config: &DispatchConfig,
    f: impl FnOnce() -> R,
) -> DispatchResult<R> {
    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let cause = panic_message(payload.as_ref());
        if config.log_panics {
            log::warn!("call {} panicked: {}", signature, cause);
        }
        DispatchError::MethodFailed {
            signature: signature.to_string(),
            cause,
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panic: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panic: {}", message)
    } else {
        "panic".to_string()
    }
}

#[cfg(test)]
mod tests;
