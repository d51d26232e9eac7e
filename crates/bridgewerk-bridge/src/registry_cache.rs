// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-container registry cache.
//
// Maps a container id to that container's local registry. Entries are weak:
// the owning handler keeps the registry alive, and releasing the container
// must unregister its id so a later container reusing the id starts clean.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use tracing::debug;

use bridgewerk_core::types::ContainerId;

use crate::registry::MethodRegistry;

#[derive(Debug, Default)]
pub struct RegistryCacheManager {
    caches: DashMap<ContainerId, Weak<MethodRegistry>>,
}

impl RegistryCacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `registry` with `container_id`, replacing any previous entry.
    pub fn register(&self, container_id: &ContainerId, registry: &Arc<MethodRegistry>) {
        self.caches
            .insert(container_id.clone(), Arc::downgrade(registry));
        debug!(container_id = %container_id, "container registry cached");
    }

    /// Drop the entry for `container_id` if it still points at `registry`.
    /// A newer container that reused the id keeps its entry.
    pub fn unregister(&self, container_id: &ContainerId, registry: &Arc<MethodRegistry>) {
        let removed = self
            .caches
            .remove_if(container_id, |_, cached| {
                cached.upgrade().is_none_or(|live| Arc::ptr_eq(&live, registry))
            })
            .is_some();
        if removed {
            debug!(container_id = %container_id, "container registry unregistered");
        }
    }

    /// The live registry for `container_id`. Dead entries are pruned.
    pub fn provide(&self, container_id: &ContainerId) -> Option<Arc<MethodRegistry>> {
        let registry = self.caches.get(container_id)?.upgrade();
        if registry.is_none() {
            self.caches.remove(container_id);
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provide_returns_registered_registry() {
        let caches = RegistryCacheManager::new();
        let id = ContainerId::from("view-1");
        let registry = Arc::new(MethodRegistry::new("view-1"));
        caches.register(&id, &registry);

        let provided = caches.provide(&id).expect("cached registry");
        assert!(Arc::ptr_eq(&provided, &registry));
    }

    #[test]
    fn unregister_forgets_container() {
        let caches = RegistryCacheManager::new();
        let id = ContainerId::from("view-2");
        let registry = Arc::new(MethodRegistry::new("view-2"));
        caches.register(&id, &registry);
        caches.unregister(&id, &registry);
        caches.unregister(&id, &registry);

        assert!(caches.provide(&id).is_none());
        assert!(caches.is_empty());
    }

    #[test]
    fn unregister_keeps_a_newer_registry_for_the_same_id() {
        let caches = RegistryCacheManager::new();
        let id = ContainerId::from("view-4");
        let old = Arc::new(MethodRegistry::new("view-4"));
        let new = Arc::new(MethodRegistry::new("view-4"));
        caches.register(&id, &old);
        caches.register(&id, &new);

        caches.unregister(&id, &old);

        let provided = caches.provide(&id).expect("newer registry kept");
        assert!(Arc::ptr_eq(&provided, &new));
    }

    #[test]
    fn dropped_registries_are_pruned_on_lookup() {
        let caches = RegistryCacheManager::new();
        let id = ContainerId::from("view-3");
        {
            let registry = Arc::new(MethodRegistry::new("view-3"));
            caches.register(&id, &registry);
        }
        assert!(caches.provide(&id).is_none());
        assert_eq!(caches.len(), 0);
    }
}
