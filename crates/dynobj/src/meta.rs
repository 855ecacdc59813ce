// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reflection metadata: the signature table of an object.

use crate::config::METHOD_SEPARATOR;
use crate::error::RegistrationError;
use crate::method::ParamList;
use crate::signature::{make_method_signature, MethodSignature, Signature};
use crate::types::TypeRegistry;
use std::collections::{BTreeMap, HashMap};

/// Method identifier, unique within one object.
pub type MethodId = u32;

/// Advertised method: `(signature, sigreturn, id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaMethod {
    signature: String,
    sigreturn: String,
    id: MethodId,
}

impl MetaMethod {
    /// Full `name::(params)` signature.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn sigreturn(&self) -> &str {
        &self.sigreturn
    }

    pub fn id(&self) -> MethodId {
        self.id
    }

    /// Bare method name.
    pub fn name(&self) -> &str {
        method_name(&self.signature)
    }
}

/// Advertised event: a broadcast signature without return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaEvent {
    signature: String,
    id: MethodId,
}

impl MetaEvent {
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn id(&self) -> MethodId {
        self.id
    }

    pub fn name(&self) -> &str {
        method_name(&self.signature)
    }
}

fn method_name(signature: &str) -> &str {
    signature
        .split_once(METHOD_SEPARATOR)
        .map_or(signature, |(name, _)| name)
}

/// Frozen signature table.
#[derive(Debug, Default)]
pub struct MetaObject {
    methods: BTreeMap<MethodId, MetaMethod>,
    method_ids: HashMap<String, MethodId>,
    events: BTreeMap<MethodId, MetaEvent>,
    event_ids: HashMap<String, MethodId>,
}

impl MetaObject {
    pub fn method(&self, id: MethodId) -> Option<&MetaMethod> {
        self.methods.get(&id)
    }

    pub fn method_id(&self, signature: &str) -> Option<MethodId> {
        self.method_ids.get(signature).copied()
    }

    pub fn method_by_signature(&self, signature: &str) -> Option<&MetaMethod> {
        self.method_id(signature).and_then(|id| self.method(id))
    }

    /// Methods in id order.
    pub fn methods(&self) -> impl Iterator<Item = &MetaMethod> {
        self.methods.values()
    }

    /// All overloads advertised under `name`.
    pub fn find_method(&self, name: &str) -> Vec<&MetaMethod> {
        self.methods.values().filter(|m| m.name() == name).collect()
    }

    pub fn event(&self, id: MethodId) -> Option<&MetaEvent> {
        self.events.get(&id)
    }

    pub fn event_id(&self, signature: &str) -> Option<MethodId> {
        self.event_ids.get(signature).copied()
    }

    pub fn events(&self) -> impl Iterator<Item = &MetaEvent> {
        self.events.values()
    }
}

/// Mutable builder; consumed by [`MetaObjectBuilder::build`].
#[derive(Debug, Default)]
pub struct MetaObjectBuilder {
    next_id: MethodId,
    meta: MetaObject,
}

impl MetaObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_free(&self, signature: &str) -> Result<(), RegistrationError> {
        if self.meta.method_ids.contains_key(signature) || self.meta.event_ids.contains_key(signature)
        {
            return Err(RegistrationError::Conflict(signature.to_string()));
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> MethodId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Advertise a method from its raw signatures.
    pub fn xadvertise_method(
        &mut self,
        sigreturn: &str,
        signature: &str,
    ) -> Result<MethodId, RegistrationError> {
        MethodSignature::parse(signature)?;
        Signature::parse(sigreturn)?;
        self.check_free(signature)?;

        let id = self.allocate_id();
        self.meta.method_ids.insert(signature.to_string(), id);
        self.meta.methods.insert(
            id,
            MetaMethod {
                signature: signature.to_string(),
                sigreturn: sigreturn.to_string(),
                id,
            },
        );
        log::debug!("meta: advertised method {} -> {} (id {})", signature, sigreturn, id);
        Ok(id)
    }

    /// Advertise an event from its raw signature.
    pub fn xadvertise_event(&mut self, signature: &str) -> Result<MethodId, RegistrationError> {
        MethodSignature::parse(signature)?;
        self.check_free(signature)?;

        let id = self.allocate_id();
        self.meta.event_ids.insert(signature.to_string(), id);
        self.meta.events.insert(
            id,
            MetaEvent {
                signature: signature.to_string(),
                id,
            },
        );
        log::debug!("meta: advertised event {} (id {})", signature, id);
        Ok(id)
    }

    /// Advertise event `name` carrying `Args`.
    pub fn advertise_event<Args: ParamList>(
        &mut self,
        name: &str,
        registry: &TypeRegistry,
    ) -> Result<MethodId, RegistrationError> {
        let signature = make_method_signature(name, &Args::signature(registry)?);
        self.xadvertise_event(&signature)
    }

    /// Remove a previously advertised method, returning its id.
    pub fn xforget_method(&mut self, signature: &str) -> Option<MethodId> {
        let id = self.meta.method_ids.remove(signature)?;
        self.meta.methods.remove(&id);
        log::debug!("meta: forgot method {} (id {})", signature, id);
        Some(id)
    }

    pub fn build(self) -> MetaObject {
        self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_sequential_and_shared() {
        let mut builder = MetaObjectBuilder::new();
        assert_eq!(builder.xadvertise_method("s", "echo::(s)"), Ok(0));
        assert_eq!(builder.xadvertise_event("changed::(i)"), Ok(1));
        assert_eq!(builder.xadvertise_method("L", "size::(s)"), Ok(2));

        let meta = builder.build();
        assert_eq!(meta.method_id("size::(s)"), Some(2));
        assert_eq!(meta.method(0).map(MetaMethod::sigreturn), Some("s"));
        assert_eq!(meta.event_id("changed::(i)"), Some(1));
        assert!(meta.method_id("changed::(i)").is_none());
    }

    #[test]
    fn test_duplicate_signature_conflicts() {
        let mut builder = MetaObjectBuilder::new();
        builder.xadvertise_method("s", "echo::(s)").expect("first");
        assert_eq!(
            builder.xadvertise_method("i", "echo::(s)"),
            Err(RegistrationError::Conflict("echo::(s)".to_string()))
        );
        assert!(matches!(
            builder.xadvertise_event("echo::(s)"),
            Err(RegistrationError::Conflict(_))
        ));
    }

    #[test]
    fn test_invalid_signatures() {
        let mut builder = MetaObjectBuilder::new();
        assert!(matches!(
            builder.xadvertise_method("s", "echo(s)"),
            Err(RegistrationError::InvalidSignature(_))
        ));
        assert!(matches!(
            builder.xadvertise_method("q", "echo::(s)"),
            Err(RegistrationError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_find_method_overloads() {
        let mut builder = MetaObjectBuilder::new();
        builder.xadvertise_method("v", "log::(s)").expect("log s");
        builder.xadvertise_method("v", "log::(si)").expect("log si");
        builder.xadvertise_method("v", "logger::()").expect("logger");
        let meta = builder.build();
        let found: Vec<&str> = meta
            .find_method("log")
            .into_iter()
            .map(MetaMethod::signature)
            .collect();
        assert_eq!(found, vec!["log::(s)", "log::(si)"]);
    }

    #[test]
    fn test_forget_method() {
        let mut builder = MetaObjectBuilder::new();
        let id = builder.xadvertise_method("s", "echo::(s)").expect("add");
        assert_eq!(builder.xforget_method("echo::(s)"), Some(id));
        assert_eq!(builder.xforget_method("echo::(s)"), None);
        // the signature is free again
        builder.xadvertise_method("s", "echo::(s)").expect("re-add");
        assert_eq!(builder.build().methods().count(), 1);
    }

    #[test]
    fn test_advertise_event_derives_signature() {
        let registry = TypeRegistry::builder().freeze();
        let mut builder = MetaObjectBuilder::new();
        builder
            .advertise_event::<(String, i32)>("renamed", &registry)
            .expect("event");
        let meta = builder.build();
        assert_eq!(
            meta.events().map(MetaEvent::signature).collect::<Vec<_>>(),
            vec!["renamed::(si)"]
        );
    }
}
