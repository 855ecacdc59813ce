// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Erased objects: an instance value plus its table of callables.
//!
//! Objects are assembled with [`GenericObjectBuilder`] and shared as
//! [`ObjectPtr`]. Once built, the method table is read-only.

use crate::error::RegistrationError;
use crate::meta::{MetaMethod, MetaObject, MetaObjectBuilder, MethodId};
use crate::method::{
    FallibleMethodFn, FunctionFn, GenericMethod, MethodFn, MethodType, ParamList, RawMethod,
};
use crate::signature::{make_method_signature, split_complete, MethodSignature, Signature};
use crate::types::{ObjectTypeBuilder, Reflect, Storage, TypeDescriptor, TypeRegistry};
use crate::value::{Value, ValueRef};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Callable bound to a method id.
#[derive(Clone)]
pub enum MetaCallable {
    /// Typed callable; arguments are decoded before the call.
    Method(GenericMethod),
    /// Buffer-level callable; receives the encoded arguments as-is.
    Raw(Arc<dyn RawMethod>),
}

impl fmt::Debug for MetaCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(method) => f.debug_tuple("Method").field(method).finish(),
            Self::Raw(_) => f.write_str("Raw"),
        }
    }
}

/// Shared handle on a built object.
pub type ObjectPtr = Arc<GenericObject>;

/// An instance together with its reflection table.
pub struct GenericObject {
    meta: Arc<MetaObject>,
    callables: HashMap<MethodId, MetaCallable>,
    instance: Value,
}

impl GenericObject {
    pub fn meta_object(&self) -> &Arc<MetaObject> {
        &self.meta
    }

    /// Receiver passed to every typed method.
    pub fn instance(&self) -> &Value {
        &self.instance
    }

    pub fn callable(&self, id: MethodId) -> Option<&MetaCallable> {
        self.callables.get(&id)
    }

    /// Look up a method by its full `name::(params)` signature.
    pub fn resolve(&self, signature: &str) -> Option<(&MetaMethod, &MetaCallable)> {
        let method = self.meta.method_by_signature(signature)?;
        let callable = self.callables.get(&method.id())?;
        Some((method, callable))
    }
}

impl fmt::Debug for GenericObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericObject")
            .field("instance", &self.instance.type_descriptor().name())
            .field("methods", &self.callables.len())
            .finish()
    }
}

fn unwrap_receiver(storage: &Storage) -> Option<ValueRef<'_>> {
    storage
        .downcast_ref::<ObjectPtr>()
        .map(|object| object.instance().view())
}

impl Reflect for ObjectPtr {
    fn describe() -> TypeDescriptor {
        ObjectTypeBuilder::<ObjectPtr>::new("Object")
            .with_unwrap(unwrap_receiver)
            .build()
    }
}

/// Assembles a [`GenericObject`].
pub struct GenericObjectBuilder {
    registry: Arc<TypeRegistry>,
    meta: MetaObjectBuilder,
    callables: HashMap<MethodId, MetaCallable>,
}

impl GenericObjectBuilder {
    pub fn new(registry: &Arc<TypeRegistry>) -> Self {
        Self {
            registry: registry.clone(),
            meta: MetaObjectBuilder::new(),
            callables: HashMap::new(),
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    fn advertise_generic(
        &mut self,
        name: &str,
        method: Arc<dyn MethodType>,
    ) -> Result<MethodId, RegistrationError> {
        let method = GenericMethod::new(method)?;
        let signature = make_method_signature(name, &method.params_signature());
        let sigreturn = method.sigreturn();
        self.xadvertise_method(&sigreturn, &signature, MetaCallable::Method(method))
    }

    /// Advertise `method(&T, args..) -> R`; the instance must be (or derive
    /// from, or wrap) a `T`.
    pub fn advertise_method<T, Args, R, F>(
        &mut self,
        name: &str,
        method: F,
    ) -> Result<MethodId, RegistrationError>
    where
        F: MethodFn<T, Args, R>,
    {
        let method = method.into_method(&self.registry)?;
        self.advertise_generic(name, method)
    }

    /// Like [`advertise_method`](Self::advertise_method) for callables
    /// returning `Result`; an `Err` is reported as a method failure.
    pub fn advertise_fallible_method<T, Args, R, E, F>(
        &mut self,
        name: &str,
        method: F,
    ) -> Result<MethodId, RegistrationError>
    where
        F: FallibleMethodFn<T, Args, R, E>,
    {
        let method = method.into_method(&self.registry)?;
        self.advertise_generic(name, method)
    }

    /// Advertise a free function that ignores the instance.
    pub fn advertise_function<Args, R, F>(
        &mut self,
        name: &str,
        function: F,
    ) -> Result<MethodId, RegistrationError>
    where
        F: FunctionFn<Args, R>,
    {
        let method = function.into_method(&self.registry)?;
        self.advertise_generic(name, method)
    }

    /// Advertise a callable under explicit signatures.
    ///
    /// A typed callable must take exactly the advertised parameters and
    /// return the advertised type; raw callables are taken at their word.
    pub fn xadvertise_method(
        &mut self,
        sigreturn: &str,
        signature: &str,
        callable: MetaCallable,
    ) -> Result<MethodId, RegistrationError> {
        if let MetaCallable::Method(method) = &callable {
            check_contract(method, sigreturn, signature)?;
        }
        let id = self.meta.xadvertise_method(sigreturn, signature)?;
        self.callables.insert(id, callable);
        Ok(id)
    }

    /// Advertise a buffer-level callable from a complete signature
    /// (`"<ret> <name>::(<params>)"`).
    pub fn advertise_raw_method(
        &mut self,
        complete_signature: &str,
        method: impl RawMethod + 'static,
    ) -> Result<MethodId, RegistrationError> {
        let (sigreturn, signature) = split_complete(complete_signature)?;
        self.xadvertise_method(&sigreturn, &signature, MetaCallable::Raw(Arc::new(method)))
    }

    pub fn advertise_event<Args: ParamList>(
        &mut self,
        name: &str,
    ) -> Result<MethodId, RegistrationError> {
        self.meta.advertise_event::<Args>(name, &self.registry)
    }

    pub fn xadvertise_event(&mut self, signature: &str) -> Result<MethodId, RegistrationError> {
        self.meta.xadvertise_event(signature)
    }

    /// Drop a method advertised earlier. Returns `false` if it was unknown.
    pub fn xforget_method(&mut self, signature: &str) -> bool {
        match self.meta.xforget_method(signature) {
            Some(id) => {
                self.callables.remove(&id);
                true
            }
            None => false,
        }
    }

    /// Freeze the table around `instance`.
    pub fn object(self, instance: Value) -> ObjectPtr {
        let meta = self.meta.build();
        log::debug!(
            "object: built '{}' with {} methods",
            instance.type_descriptor().name(),
            self.callables.len()
        );
        Arc::new(GenericObject {
            meta: Arc::new(meta),
            callables: self.callables,
            instance,
        })
    }
}

fn check_contract(
    method: &GenericMethod,
    sigreturn: &str,
    signature: &str,
) -> Result<(), RegistrationError> {
    let parsed = MethodSignature::parse(signature)?;
    let returns = Signature::parse(sigreturn)?;
    if parsed.params.as_slice() == method.params() && &returns == method.return_signature() {
        return Ok(());
    }
    Err(RegistrationError::SignatureMismatch {
        signature: signature.to_string(),
        advertised: format!("{} {}", sigreturn, parsed.params_signature()),
        callable: format!(
            "{} ({})",
            method.sigreturn(),
            method.params_signature()
        ),
    })
}

impl fmt::Debug for GenericObjectBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericObjectBuilder")
            .field("methods", &self.callables.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Counter {
        step: i32,
    }

    impl Reflect for Counter {
        fn describe() -> TypeDescriptor {
            ObjectTypeBuilder::<Counter>::new("Counter")
                .with_default()
                .build()
        }
    }

    fn registry() -> Arc<TypeRegistry> {
        TypeRegistry::builder().register::<Counter>().freeze()
    }

    #[test]
    fn test_signatures_derived_from_closure() {
        let registry = registry();
        let mut builder = GenericObjectBuilder::new(&registry);
        builder
            .advertise_method("bump", |c: &Counter, n: i32| c.step + n)
            .expect("bump");
        builder
            .advertise_function("concat", |a: String, b: String| a + &b)
            .expect("concat");
        let object = builder.object(registry.value(Counter { step: 2 }));

        let (method, _) = object.resolve("bump::(i)").expect("bump");
        assert_eq!(method.sigreturn(), "i");
        assert!(object.resolve("concat::(ss)").is_some());
        assert!(object.resolve("concat::(s)").is_none());
    }

    #[test]
    fn test_conflicting_registration() {
        let registry = registry();
        let mut builder = GenericObjectBuilder::new(&registry);
        builder.advertise_function("f", |x: i32| x).expect("first");
        let err = builder
            .advertise_function("f", |x: i32| x + 1)
            .expect_err("same signature");
        assert_eq!(err, RegistrationError::Conflict("f::(i)".to_string()));
        // different parameter list is an overload
        builder.advertise_function("f", |x: i64| x).expect("overload");
    }

    #[test]
    fn test_raw_method_signature_split() {
        let registry = registry();
        let mut builder = GenericObjectBuilder::new(&registry);
        builder
            .advertise_raw_method("L size::(s)", |_: &str, _: &[u8]| -> Result<Vec<u8>, String> {
                Ok(Vec::new())
            })
            .expect("raw");
        let object = builder.object(Value::void());
        let (method, callable) = object.resolve("size::(s)").expect("size");
        assert_eq!(method.sigreturn(), "L");
        assert!(matches!(callable, MetaCallable::Raw(_)));
    }

    #[test]
    fn test_typed_callable_must_match_advertised_signature() {
        let registry = registry();
        let double = |n: i32| n * 2;
        let adapted = FunctionFn::<(i32,), i32>::into_method(double, &registry).expect("adapt");
        let method = GenericMethod::new(adapted).expect("method");

        let mut builder = GenericObjectBuilder::new(&registry);
        let err = builder
            .xadvertise_method("s", "echo::(s)", MetaCallable::Method(method.clone()))
            .expect_err("params and return differ");
        assert!(matches!(err, RegistrationError::SignatureMismatch { .. }));
        assert!(matches!(
            builder.xadvertise_method("i", "echo::(s)", MetaCallable::Method(method.clone())),
            Err(RegistrationError::SignatureMismatch { .. })
        ));
        assert!(matches!(
            builder.xadvertise_method("s", "echo::(i)", MetaCallable::Method(method.clone())),
            Err(RegistrationError::SignatureMismatch { .. })
        ));

        builder
            .xadvertise_method("i", "double::(i)", MetaCallable::Method(method))
            .expect("matching contract");
        let object = builder.object(Value::void());
        assert!(object.resolve("echo::(s)").is_none());
        assert_eq!(
            object.resolve("double::(i)").map(|(m, _)| m.sigreturn()),
            Some("i")
        );
    }

    #[test]
    fn test_forget_method_removes_callable() {
        let registry = registry();
        let mut builder = GenericObjectBuilder::new(&registry);
        let id = builder.advertise_function("f", || 1i32).expect("f");
        assert!(builder.xforget_method("f::()"));
        assert!(!builder.xforget_method("f::()"));
        let object = builder.object(Value::void());
        assert!(object.callable(id).is_none());
        assert!(object.resolve("f::()").is_none());
    }

    #[test]
    fn test_object_ptr_unwraps_to_instance() {
        let registry = registry();
        let object = GenericObjectBuilder::new(&registry).object(registry.value(Counter { step: 7 }));
        let handle = registry.value(object);
        let counter = registry.type_of::<Counter>();
        let converted = handle.convert(&counter).expect("unwrap");
        assert!(!converted.owns_storage());
        assert_eq!(
            converted.view().downcast_ref::<Counter>().map(|c| c.step),
            Some(7)
        );
    }
}
