// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Namespaced registry manager.
//
// Holds one registry per namespace plus the per-container registry cache.
// Managers are constructed explicitly and passed by reference; `shared()`
// hands out the single process-wide default for hosts that want one.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use tracing::info;

use bridgewerk_core::types::{DEFAULT_NAMESPACE, PlatformScope};

use crate::method::MethodHandle;
use crate::registry::MethodRegistry;
use crate::registry_cache::RegistryCacheManager;

static SHARED: Lazy<Arc<BridgeManager>> = Lazy::new(|| Arc::new(BridgeManager::new()));

#[derive(Debug)]
pub struct BridgeManager {
    registries: DashMap<String, Arc<MethodRegistry>>,
    caches: RegistryCacheManager,
}

impl Default for BridgeManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeManager {
    pub fn new() -> Self {
        let registries = DashMap::new();
        registries.insert(
            DEFAULT_NAMESPACE.to_string(),
            Arc::new(MethodRegistry::new(DEFAULT_NAMESPACE)),
        );
        Self {
            registries,
            caches: RegistryCacheManager::new(),
        }
    }

    /// The process-wide default manager.
    pub fn shared() -> Arc<Self> {
        Arc::clone(&SHARED)
    }

    /// Registry for `namespace`, created on first use.
    pub fn registry(&self, namespace: &str) -> Arc<MethodRegistry> {
        self.registries
            .entry(namespace.to_string())
            .or_insert_with(|| Arc::new(MethodRegistry::new(namespace)))
            .value()
            .clone()
    }

    pub fn default_registry(&self) -> Arc<MethodRegistry> {
        self.registry(DEFAULT_NAMESPACE)
    }

    /// Install `registry` under its own namespace, replacing any existing one.
    pub fn register_registry(&self, registry: MethodRegistry) {
        let namespace = registry.namespace().to_string();
        self.registries.insert(namespace.clone(), Arc::new(registry));
        info!(namespace = %namespace, "registry installed");
    }

    pub fn register_method(&self, handle: MethodHandle, scope: PlatformScope, namespace: &str) {
        self.registry(namespace).register(handle, scope);
    }

    /// Exact lookup in one namespace. Never crosses into another namespace.
    pub fn find_method(
        &self,
        scope: PlatformScope,
        name: &str,
        namespace: &str,
    ) -> Option<MethodHandle> {
        self.registries.get(namespace)?.find_method(scope, name)
    }

    pub fn is_registered(&self, name: &str, scope: PlatformScope, namespace: &str) -> bool {
        self.registries
            .get(namespace)
            .is_some_and(|r| r.is_registered(name, scope))
    }

    pub fn list_methods(
        &self,
        scope: PlatformScope,
        namespace: &str,
    ) -> Option<HashMap<String, MethodHandle>> {
        self.registries.get(namespace)?.list_methods(scope)
    }

    pub fn caches(&self) -> &RegistryCacheManager {
        &self.caches
    }
}
