// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Erased callables.
//!
//! A [`MethodType`] performs a strongly typed call over erased arguments.
//! Native closures are adapted for up to five parameters: arguments are
//! converted to the declared parameter types, the receiver is converted
//! (unwrapped or upcast) to the declared receiver type.
//!
//! Foreign callables implement [`RawMethod`] and work on encoded buffers.

use crate::error::RegistrationError;
use crate::signature::{Signature, SignatureError};
use crate::types::{Reflect, TypeDescriptor, TypeRegistry};
use crate::value::{ConversionError, Converted, Value, ValueRef};
use std::any::type_name;
use std::fmt;
use std::sync::Arc;

/// Errors raised by a method call.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodError {
    /// Wrong number of arguments
    Arity { expected: usize, found: usize },

    /// Argument could not be converted to its parameter type
    Argument {
        index: usize,
        source: ConversionError,
    },

    /// Receiver is not (and does not derive from) the expected type
    Receiver { expected: String, found: String },

    /// The callable reported a failure
    Failed(String),
}

impl fmt::Display for MethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arity { expected, found } => {
                write!(f, "Expected {} arguments, found {}", expected, found)
            }
            Self::Argument { index, source } => write!(f, "Argument {}: {}", index, source),
            Self::Receiver { expected, found } => {
                write!(f, "Receiver mismatch: expected {}, found {}", expected, found)
            }
            Self::Failed(cause) => write!(f, "{}", cause),
        }
    }
}

impl std::error::Error for MethodError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Argument { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Erased callable with a fixed parameter list.
pub trait MethodType: Send + Sync {
    fn param_types(&self) -> &[Arc<TypeDescriptor>];
    fn return_type(&self) -> &Arc<TypeDescriptor>;
    fn call(&self, receiver: ValueRef<'_>, args: &[ValueRef<'_>]) -> Result<Value, MethodError>;
}

/// Callable on encoded buffers, used for foreign registrations.
pub trait RawMethod: Send + Sync {
    fn call(&self, signature: &str, args: &[u8]) -> Result<Vec<u8>, String>;
}

impl<F> RawMethod for F
where
    F: Fn(&str, &[u8]) -> Result<Vec<u8>, String> + Send + Sync,
{
    fn call(&self, signature: &str, args: &[u8]) -> Result<Vec<u8>, String> {
        self(signature, args)
    }
}

/// A [`MethodType`] with its parameter and return signatures parsed once.
#[derive(Clone)]
pub struct GenericMethod {
    method: Arc<dyn MethodType>,
    params: Vec<Signature>,
    ret: Signature,
}

impl GenericMethod {
    pub fn new(method: Arc<dyn MethodType>) -> Result<Self, SignatureError> {
        let params = method
            .param_types()
            .iter()
            .map(|ty| Signature::parse(ty.signature()))
            .collect::<Result<Vec<_>, _>>()?;
        let ret = Signature::parse(method.return_type().signature())?;
        Ok(Self {
            method,
            params,
            ret,
        })
    }

    pub fn params(&self) -> &[Signature] {
        &self.params
    }

    pub fn return_signature(&self) -> &Signature {
        &self.ret
    }

    /// Concatenated parameter tokens (`"si"`), without the envelope.
    pub fn params_signature(&self) -> String {
        self.params.iter().map(ToString::to_string).collect()
    }

    pub fn sigreturn(&self) -> String {
        self.ret.to_string()
    }

    pub fn param_types(&self) -> &[Arc<TypeDescriptor>] {
        self.method.param_types()
    }

    pub fn return_type(&self) -> &Arc<TypeDescriptor> {
        self.method.return_type()
    }

    pub fn call(&self, receiver: ValueRef<'_>, args: &[ValueRef<'_>]) -> Result<Value, MethodError> {
        let expected = self.params.len();
        if args.len() != expected {
            return Err(MethodError::Arity {
                expected,
                found: args.len(),
            });
        }
        self.method.call(receiver, args)
    }
}

impl fmt::Debug for GenericMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericMethod")
            .field("params", &self.params_signature())
            .field("ret", &self.sigreturn())
            .finish()
    }
}

/// Parameter tuples whose types can be described from a registry.
pub trait ParamList {
    fn descriptors(registry: &TypeRegistry) -> Result<Vec<Arc<TypeDescriptor>>, RegistrationError>;

    /// Concatenated parameter tokens.
    fn signature(registry: &TypeRegistry) -> Result<String, RegistrationError> {
        Ok(Self::descriptors(registry)?
            .iter()
            .map(|ty| ty.signature())
            .collect())
    }
}

fn resolve<T: Reflect>(registry: &TypeRegistry) -> Result<Arc<TypeDescriptor>, RegistrationError> {
    registry
        .lookup::<T>()
        .ok_or(RegistrationError::UnregisteredType(type_name::<T>()))
}

type Body = Box<dyn Fn(ValueRef<'_>, &[ValueRef<'_>]) -> Result<Value, MethodError> + Send + Sync>;

struct NativeMethod {
    params: Vec<Arc<TypeDescriptor>>,
    ret: Arc<TypeDescriptor>,
    body: Body,
}

impl MethodType for NativeMethod {
    fn param_types(&self) -> &[Arc<TypeDescriptor>] {
        &self.params
    }

    fn return_type(&self) -> &Arc<TypeDescriptor> {
        &self.ret
    }

    fn call(&self, receiver: ValueRef<'_>, args: &[ValueRef<'_>]) -> Result<Value, MethodError> {
        if args.len() != self.params.len() {
            return Err(MethodError::Arity {
                expected: self.params.len(),
                found: args.len(),
            });
        }
        (self.body)(receiver, args)
    }
}

fn extract<A: Reflect>(
    ty: &Arc<TypeDescriptor>,
    arg: ValueRef<'_>,
    index: usize,
) -> Result<A, MethodError> {
    let mismatch = |found: ValueRef<'_>| MethodError::Argument {
        index,
        source: ConversionError::FallbackFailed {
            from: found.type_descriptor().name().to_string(),
            to: ty.name().to_string(),
            reason: "storage does not hold the parameter type",
        },
    };
    match arg
        .convert(ty)
        .map_err(|source| MethodError::Argument { index, source })?
    {
        Converted::View(view) => view.downcast_ref::<A>().cloned().ok_or_else(|| mismatch(view)),
        Converted::Owned(value) => value.into_native::<A>().map_err(|value| mismatch(value.view())),
    }
}

fn receiver_mismatch(receiver: ValueRef<'_>, expected: &TypeDescriptor) -> MethodError {
    MethodError::Receiver {
        expected: expected.name().to_string(),
        found: receiver.type_descriptor().name().to_string(),
    }
}

/// Closures `Fn(&T, A..) -> R` usable as methods of `T`.
pub trait MethodFn<T, Args, R>: Send + Sync + 'static {
    fn into_method(self, registry: &TypeRegistry) -> Result<Arc<dyn MethodType>, RegistrationError>;
}

/// Closures `Fn(&T, A..) -> Result<R, E>` usable as methods of `T`.
pub trait FallibleMethodFn<T, Args, R, E>: Send + Sync + 'static {
    fn into_method(self, registry: &TypeRegistry) -> Result<Arc<dyn MethodType>, RegistrationError>;
}

/// Closures `Fn(A..) -> R` that ignore the receiver.
pub trait FunctionFn<Args, R>: Send + Sync + 'static {
    fn into_method(self, registry: &TypeRegistry) -> Result<Arc<dyn MethodType>, RegistrationError>;
}

macro_rules! impl_native_adapters {
    ($($arg:ident : $idx:tt),*) => {
        impl<$($arg: Reflect,)*> ParamList for ($($arg,)*) {
            #[allow(unused_variables)]
            fn descriptors(
                registry: &TypeRegistry,
            ) -> Result<Vec<Arc<TypeDescriptor>>, RegistrationError> {
                Ok(vec![$(resolve::<$arg>(registry)?),*])
            }
        }

        impl<F, T, R, $($arg,)*> MethodFn<T, ($($arg,)*), R> for F
        where
            F: Fn(&T $(, $arg)*) -> R + Send + Sync + 'static,
            T: Reflect,
            R: Reflect,
            $($arg: Reflect,)*
        {
            #[allow(unused_variables)]
            fn into_method(
                self,
                registry: &TypeRegistry,
            ) -> Result<Arc<dyn MethodType>, RegistrationError> {
                let this_type = resolve::<T>(registry)?;
                let params = <($($arg,)*) as ParamList>::descriptors(registry)?;
                let ret = resolve::<R>(registry)?;
                let (types, ret_type) = (params.clone(), ret.clone());
                let body: Body = Box::new(
                    move |receiver: ValueRef<'_>,
                          args: &[ValueRef<'_>]|
                          -> Result<Value, MethodError> {
                        let converted = receiver
                            .convert(&this_type)
                            .map_err(|_| receiver_mismatch(receiver, &this_type))?;
                        let view = converted.view();
                        let this = view
                            .downcast_ref::<T>()
                            .ok_or_else(|| receiver_mismatch(receiver, &this_type))?;
                        let result = self(this $(, extract::<$arg>(&types[$idx], args[$idx], $idx)?)*);
                        Ok(Value::with_type(ret_type.clone(), result))
                    },
                );
                Ok(Arc::new(NativeMethod { params, ret, body }))
            }
        }

        impl<F, T, R, E, $($arg,)*> FallibleMethodFn<T, ($($arg,)*), R, E> for F
        where
            F: Fn(&T $(, $arg)*) -> Result<R, E> + Send + Sync + 'static,
            T: Reflect,
            R: Reflect,
            E: fmt::Display,
            $($arg: Reflect,)*
        {
            #[allow(unused_variables)]
            fn into_method(
                self,
                registry: &TypeRegistry,
            ) -> Result<Arc<dyn MethodType>, RegistrationError> {
                let this_type = resolve::<T>(registry)?;
                let params = <($($arg,)*) as ParamList>::descriptors(registry)?;
                let ret = resolve::<R>(registry)?;
                let (types, ret_type) = (params.clone(), ret.clone());
                let body: Body = Box::new(
                    move |receiver: ValueRef<'_>,
                          args: &[ValueRef<'_>]|
                          -> Result<Value, MethodError> {
                        let converted = receiver
                            .convert(&this_type)
                            .map_err(|_| receiver_mismatch(receiver, &this_type))?;
                        let view = converted.view();
                        let this = view
                            .downcast_ref::<T>()
                            .ok_or_else(|| receiver_mismatch(receiver, &this_type))?;
                        let result = self(this $(, extract::<$arg>(&types[$idx], args[$idx], $idx)?)*)
                            .map_err(|e| MethodError::Failed(e.to_string()))?;
                        Ok(Value::with_type(ret_type.clone(), result))
                    },
                );
                Ok(Arc::new(NativeMethod { params, ret, body }))
            }
        }

        impl<F, R, $($arg,)*> FunctionFn<($($arg,)*), R> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: Reflect,
            $($arg: Reflect,)*
        {
            #[allow(unused_variables)]
            fn into_method(
                self,
                registry: &TypeRegistry,
            ) -> Result<Arc<dyn MethodType>, RegistrationError> {
                let params = <($($arg,)*) as ParamList>::descriptors(registry)?;
                let ret = resolve::<R>(registry)?;
                let (types, ret_type) = (params.clone(), ret.clone());
                let body: Body = Box::new(
                    move |_receiver: ValueRef<'_>,
                          args: &[ValueRef<'_>]|
                          -> Result<Value, MethodError> {
                        let result = self($(extract::<$arg>(&types[$idx], args[$idx], $idx)?),*);
                        Ok(Value::with_type(ret_type.clone(), result))
                    },
                );
                Ok(Arc::new(NativeMethod { params, ret, body }))
            }
        }
    };
}

impl_native_adapters!();
impl_native_adapters!(A0: 0);
impl_native_adapters!(A0: 0, A1: 1);
impl_native_adapters!(A0: 0, A1: 1, A2: 2);
impl_native_adapters!(A0: 0, A1: 1, A2: 2, A3: 3);
impl_native_adapters!(A0: 0, A1: 1, A2: 2, A3: 3, A4: 4);

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Arc<TypeRegistry> {
        TypeRegistry::builder().freeze()
    }

    #[test]
    fn test_function_adapter_converts_arguments() {
        let registry = registry();
        let method = GenericMethod::new(
            FunctionFn::into_method(|a: i64, b: f64| a as f64 + b, &registry).expect("adapt"),
        )
        .expect("signature");
        assert_eq!(method.params_signature(), "ld");
        assert_eq!(method.sigreturn(), "d");

        // i32 and i32 arguments are converted to i64 and f64
        let a = Value::from_native(2i32);
        let b = Value::from_native(3i32);
        let out = method
            .call(Value::void().view(), &[a.view(), b.view()])
            .expect("call");
        assert_eq!(out.as_float(), Some(5.0));
    }

    #[test]
    fn test_arity_checked() {
        let registry = registry();
        let method =
            GenericMethod::new(FunctionFn::into_method(|s: String| s, &registry).expect("adapt"))
                .expect("sig");
        let err = method.call(Value::void().view(), &[]).expect_err("no args");
        assert_eq!(
            err,
            MethodError::Arity {
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn test_argument_conversion_failure() {
        let registry = registry();
        let method = GenericMethod::new(FunctionFn::into_method(|n: i32| n, &registry).expect("adapt"))
            .expect("sig");
        let text = Value::from_native("not a number".to_string());
        let err = method
            .call(Value::void().view(), &[text.view()])
            .expect_err("string into i32");
        assert!(matches!(err, MethodError::Argument { index: 0, .. }));
    }

    #[test]
    fn test_unregistered_type_rejected() {
        let registry = TypeRegistry::builder().freeze();
        let result = FunctionFn::into_method(|v: Vec<u16>| v.len() as u64, &registry);
        assert!(matches!(
            result.map(|_| ()),
            Err(RegistrationError::UnregisteredType(_))
        ));
    }

    #[test]
    fn test_raw_method_closure() {
        let raw = |signature: &str, args: &[u8]| -> Result<Vec<u8>, String> {
            Ok(format!("{}:{}", signature, args.len()).into_bytes())
        };
        assert_eq!(RawMethod::call(&raw, "f::()", &[1, 2]), Ok(b"f::():2".to_vec()));
    }
}
