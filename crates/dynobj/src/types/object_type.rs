// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object kind: ancestor table and the builder used by user types.
//!
//! Upcasting is an accessor that maps the storage of a descendant to the
//! storage of the embedded ancestor sub-object, so a converted view always
//! points at a field of the source.
//!
//! ```
//! use dynobj::{ObjectTypeBuilder, Reflect, TypeDescriptor, Value};
//!
//! #[derive(Clone, Default)]
//! struct Base {
//!     id: u32,
//! }
//!
//! impl Reflect for Base {
//!     fn describe() -> TypeDescriptor {
//!         ObjectTypeBuilder::<Base>::new("Base").with_default().build()
//!     }
//! }
//!
//! #[derive(Clone, Default)]
//! struct Derived {
//!     base: Base,
//! }
//!
//! impl Reflect for Derived {
//!     fn describe() -> TypeDescriptor {
//!         ObjectTypeBuilder::<Derived>::new("Derived")
//!             .inherits::<Base>(|d| &d.base)
//!             .build()
//!     }
//! }
//!
//! let derived = Value::from_native(Derived { base: Base { id: 7 } });
//! let base_ty = std::sync::Arc::new(Base::describe());
//! let upcast = derived.convert(&base_ty).expect("upcast");
//! assert!(!upcast.owns_storage());
//! assert_eq!(upcast.view().downcast_ref::<Base>().map(|b| b.id), Some(7));
//! ```

use super::descriptor::{NativeStorage, TypeIdentity, TypeKind};
use super::{Reflect, Storage, TypeDescriptor};
use crate::config::SIG_OBJECT;
use crate::value::{DynamicValue, ValueRef};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Maps descendant storage to the storage of an ancestor sub-object.
pub type UpcastFn = Arc<dyn for<'a> Fn(&'a Storage) -> Option<&'a Storage> + Send + Sync>;

/// Reaches the receiver wrapped by an erased object handle.
pub type UnwrapFn = for<'a> fn(&'a Storage) -> Option<ValueRef<'a>>;

type ToDynamicFn = Arc<dyn Fn(&Storage) -> Option<DynamicValue> + Send + Sync>;
type FromDynamicFn = Arc<dyn Fn(&DynamicValue) -> Option<Box<Storage>> + Send + Sync>;

fn upcast_fn<F>(f: F) -> UpcastFn
where
    F: for<'a> Fn(&'a Storage) -> Option<&'a Storage> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// One entry of an object's ancestor table.
#[derive(Clone)]
pub struct Ancestor {
    identity: TypeIdentity,
    name: String,
    upcast: UpcastFn,
}

impl Ancestor {
    pub fn identity(&self) -> &TypeIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ancestor sub-object inside `storage`.
    pub fn upcast<'a>(&self, storage: &'a Storage) -> Option<&'a Storage> {
        (*self.upcast)(storage)
    }
}

impl fmt::Debug for Ancestor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ancestor").field("name", &self.name).finish()
    }
}

/// Object-kind interface.
pub struct ObjectInterface {
    ancestors: Vec<Ancestor>,
    unwrap: Option<UnwrapFn>,
    to_dynamic: Option<ToDynamicFn>,
    from_dynamic: Option<FromDynamicFn>,
}

impl ObjectInterface {
    /// All ancestors, direct and transitive.
    pub fn ancestors(&self) -> &[Ancestor] {
        &self.ancestors
    }

    pub fn inherits(&self, identity: &TypeIdentity) -> Option<&Ancestor> {
        self.ancestors.iter().find(|a| &a.identity == identity)
    }

    /// Receiver behind an erased object handle, `None` for plain objects.
    pub fn unwrap<'a>(&self, storage: &'a Storage) -> Option<ValueRef<'a>> {
        self.unwrap.and_then(|unwrap| unwrap(storage))
    }

    pub(crate) fn to_dynamic(&self, storage: &Storage) -> Option<DynamicValue> {
        self.to_dynamic.as_ref().and_then(|hook| hook(storage))
    }

    pub(crate) fn from_dynamic(&self, value: &DynamicValue) -> Option<Box<Storage>> {
        self.from_dynamic.as_ref().and_then(|hook| hook(value))
    }
}

/// Builds the descriptor of a user object type.
pub struct ObjectTypeBuilder<T> {
    name: String,
    ancestors: Vec<Ancestor>,
    init: Option<fn() -> T>,
    unwrap: Option<UnwrapFn>,
    to_dynamic: Option<ToDynamicFn>,
    from_dynamic: Option<FromDynamicFn>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync + Clone> ObjectTypeBuilder<T> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ancestors: Vec::new(),
            init: None,
            unwrap: None,
            to_dynamic: None,
            from_dynamic: None,
            _marker: PhantomData,
        }
    }

    /// Declare `B` as a direct ancestor reachable through `accessor`.
    ///
    /// The ancestors of `B` become ancestors of `T`, composed through the
    /// same accessor.
    #[must_use]
    pub fn inherits<B: Reflect>(mut self, accessor: fn(&T) -> &B) -> Self {
        let base = TypeDescriptor::of::<B>();
        let direct = upcast_fn(move |storage| {
            storage
                .downcast_ref::<T>()
                .map(|object| accessor(object) as &Storage)
        });

        if let TypeKind::Object(object) = base.type_kind() {
            for inherited in object.ancestors() {
                let outer = direct.clone();
                let inner = inherited.upcast.clone();
                self.ancestors.push(Ancestor {
                    identity: inherited.identity.clone(),
                    name: inherited.name.clone(),
                    upcast: upcast_fn(move |storage| (*outer)(storage).and_then(|b| (*inner)(b))),
                });
            }
        }

        self.ancestors.insert(
            0,
            Ancestor {
                identity: base.identity().clone(),
                name: base.name().to_string(),
                upcast: direct,
            },
        );
        self
    }

    /// Use `T::default()` as the zero value.
    #[must_use]
    pub fn with_default(mut self) -> Self
    where
        T: Default,
    {
        self.init = Some(T::default);
        self
    }

    /// Structural form used by the fallback conversion.
    #[must_use]
    pub fn with_dynamic(
        mut self,
        to: fn(&T) -> DynamicValue,
        from: fn(&DynamicValue) -> Option<T>,
    ) -> Self {
        self.to_dynamic = Some(Arc::new(move |storage: &Storage| {
            storage.downcast_ref::<T>().map(to)
        }));
        self.from_dynamic = Some(Arc::new(move |value: &DynamicValue| {
            from(value).map(|object| Box::new(object) as Box<Storage>)
        }));
        self
    }

    #[must_use]
    pub(crate) fn with_unwrap(mut self, unwrap: UnwrapFn) -> Self {
        self.unwrap = Some(unwrap);
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::new(
            TypeIdentity::of::<T>(),
            self.name,
            (SIG_OBJECT as char).to_string(),
            TypeKind::Object(ObjectInterface {
                ancestors: self.ancestors,
                unwrap: self.unwrap,
                to_dynamic: self.to_dynamic,
                from_dynamic: self.from_dynamic,
            }),
            Arc::new(NativeStorage::<T>::new(self.init)),
        )
    }
}
