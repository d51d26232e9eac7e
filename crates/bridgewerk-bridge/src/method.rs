// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge method abstraction.
//
// A bridge method is the unit of native functionality a runtime can invoke
// by name. Registries store `MethodHandle`s (the "class"); pools hold live
// instances created from them.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use bridgewerk_core::error::Result;
use bridgewerk_core::types::PlatformScope;
use bridgewerk_core::value::CanonicalMap;

use crate::completion::Completion;
use crate::context::BridgeContext;
use crate::model::FieldSpec;

/// Calling convention of a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compatibility {
    /// Legacy convention: the method receives the whole decoded payload and
    /// builds its own reply envelope.
    Compatible,
    /// Canonical convention: arguments are unwrapped and validated, and the
    /// completion is wrapped into `{code, msg, data}`.
    #[default]
    Incompatible,
}

/// A native operation invokable from an embedded runtime.
///
/// Instances are shared across concurrent calls, so any per-call state must
/// live in the completion, not in `self`.
pub trait BridgeMethod: Send + Sync + 'static {
    /// Name the runtime calls this method by, e.g. `"storage.setItem"`.
    fn name(&self) -> &str;

    fn compatibility(&self) -> Compatibility {
        Compatibility::Incompatible
    }

    /// Forward `data["originalResult"]` as the whole reply on success.
    fn use_original_result(&self) -> bool {
        false
    }

    /// Receive opaque runtime values untouched instead of their expanded
    /// object form.
    fn preserve_opaque(&self) -> bool {
        false
    }

    /// Declared parameter fields, validated before `handle` runs.
    fn param_fields(&self) -> Option<&'static [FieldSpec]> {
        None
    }

    /// Declared result fields, validated before the reply is encoded.
    fn result_fields(&self) -> Option<&'static [FieldSpec]> {
        None
    }

    /// Called before every invocation when a context is attached.
    fn set_bridge_context(&self, _context: &Arc<BridgeContext>) {}

    /// Run the method. The reply is delivered through `completion`, now or
    /// later from any thread. An `Err` is turned into an error reply unless
    /// the completion already fired.
    fn handle(&self, params: CanonicalMap, completion: Completion, scope: PlatformScope)
    -> Result<()>;

    /// Called once when the owning pool is released.
    fn release(&self) {}
}

/// A live, shareable method instance.
pub type SharedMethod = Arc<dyn BridgeMethod>;

type Factory = dyn Fn() -> SharedMethod + Send + Sync;

/// Registry entry: a method name plus a way to build instances.
///
/// Two handles are equal only when they come from the same registration
/// (they share the factory allocation).
#[derive(Clone)]
pub struct MethodHandle {
    name: Arc<str>,
    type_name: &'static str,
    factory: Arc<Factory>,
}

impl MethodHandle {
    /// Handle for a default-constructible method type.
    pub fn of<M: BridgeMethod + Default>() -> Self {
        let probe = M::default();
        Self {
            name: Arc::from(probe.name()),
            type_name: std::any::type_name::<M>(),
            factory: Arc::new(|| Arc::new(M::default()) as SharedMethod),
        }
    }

    /// Handle built from a closure, for methods that capture services.
    pub fn from_fn<M, F>(name: impl Into<String>, build: F) -> Self
    where
        M: BridgeMethod,
        F: Fn() -> M + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name.into()),
            type_name: std::any::type_name::<M>(),
            factory: Arc::new(move || Arc::new(build()) as SharedMethod),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn instantiate(&self) -> SharedMethod {
        (self.factory)()
    }
}

impl PartialEq for MethodHandle {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.factory), Arc::as_ptr(&other.factory))
    }
}

impl Eq for MethodHandle {}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodHandle")
            .field("name", &self.name)
            .field("type_name", &self.type_name)
            .finish()
    }
}

/// Non-owning slot a method keeps its injected context in.
#[derive(Default)]
pub struct ContextSlot {
    inner: RwLock<Weak<BridgeContext>>,
}

impl ContextSlot {
    pub fn set(&self, context: &Arc<BridgeContext>) {
        *self.inner.write() = Arc::downgrade(context);
    }

    /// The injected context, if it is still alive.
    pub fn get(&self) -> Option<Arc<BridgeContext>> {
        self.inner.read().upgrade()
    }
}

impl fmt::Debug for ContextSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextSlot")
            .field("attached", &self.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Echo;

    impl BridgeMethod for Echo {
        fn name(&self) -> &str {
            "test.echo"
        }

        fn handle(
            &self,
            params: CanonicalMap,
            completion: Completion,
            _scope: PlatformScope,
        ) -> Result<()> {
            completion.success(params);
            Ok(())
        }
    }

    #[test]
    fn handle_reads_name_from_method() {
        let handle = MethodHandle::of::<Echo>();
        assert_eq!(handle.name(), "test.echo");
        assert!(handle.type_name().ends_with("Echo"));
    }

    #[test]
    fn clones_are_equal_but_separate_registrations_are_not() {
        let a = MethodHandle::of::<Echo>();
        let b = MethodHandle::of::<Echo>();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn each_instantiation_is_a_fresh_instance() {
        let handle = MethodHandle::from_fn("test.echo", || Echo);
        let first = handle.instantiate();
        let second = handle.instantiate();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.compatibility(), Compatibility::Incompatible);
    }

    #[test]
    fn context_slot_does_not_keep_context_alive() {
        let slot = ContextSlot::default();
        let context = Arc::new(BridgeContext::new("slot-test".into()));
        slot.set(&context);
        assert!(slot.get().is_some());
        drop(context);
        assert!(slot.get().is_none());
    }
}
