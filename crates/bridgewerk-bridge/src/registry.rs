// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Namespace-scoped method registry.
//
// A registry maps (scope, name) to a method handle. Each concrete scope has
// its own bucket; registering under `All` writes the `All`, `Web` and
// `Lynx` buckets at once, so a later narrow registration can still override
// a single platform.

use std::collections::HashMap;

use dashmap::DashMap;
use tracing::debug;

use bridgewerk_core::types::PlatformScope;

use crate::method::MethodHandle;

type Bucket = DashMap<String, MethodHandle>;

/// Thread-safe table of registered methods for one namespace.
#[derive(Debug)]
pub struct MethodRegistry {
    namespace: String,
    all: Bucket,
    web: Bucket,
    lynx: Bucket,
}

impl MethodRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            all: DashMap::new(),
            web: DashMap::new(),
            lynx: DashMap::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn bucket(&self, scope: PlatformScope) -> Option<&Bucket> {
        match scope {
            PlatformScope::All => Some(&self.all),
            PlatformScope::Web => Some(&self.web),
            PlatformScope::Lynx => Some(&self.lynx),
            PlatformScope::None => None,
        }
    }

    /// Register `handle` under `scope`. Registering under `None` is a no-op.
    pub fn register(&self, handle: MethodHandle, scope: PlatformScope) {
        for bucket_scope in scope.buckets() {
            if let Some(bucket) = self.bucket(*bucket_scope) {
                bucket.insert(handle.name().to_string(), handle.clone());
            }
        }
        debug!(
            namespace = %self.namespace,
            method = %handle.name(),
            scope = %scope,
            "method registered"
        );
    }

    /// Exact lookup in one bucket. `None` scope never matches.
    pub fn find_method(&self, scope: PlatformScope, name: &str) -> Option<MethodHandle> {
        self.bucket(scope)?.get(name).map(|e| e.value().clone())
    }

    /// Lookup in `scope`, falling back to the `All` bucket.
    pub fn resolve(&self, scope: PlatformScope, name: &str) -> Option<MethodHandle> {
        if scope == PlatformScope::None {
            return None;
        }
        self.find_method(scope, name)
            .or_else(|| self.find_method(PlatformScope::All, name))
    }

    pub fn is_registered(&self, name: &str, scope: PlatformScope) -> bool {
        self.bucket(scope).is_some_and(|b| b.contains_key(name))
    }

    /// Snapshot of one bucket. `None` for the `None` scope.
    pub fn list_methods(&self, scope: PlatformScope) -> Option<HashMap<String, MethodHandle>> {
        let bucket = self.bucket(scope)?;
        Some(
            bucket
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
        )
    }

    /// Deep-copy every bucket of `other` into this registry.
    pub fn copy_from(&self, other: &MethodRegistry) {
        for scope in PlatformScope::All.buckets() {
            if let (Some(src), Some(dst)) = (other.bucket(*scope), self.bucket(*scope)) {
                for entry in src.iter() {
                    dst.insert(entry.key().clone(), entry.value().clone());
                }
            }
        }
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.all.clear();
        self.web.clear();
        self.lynx.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.all.is_empty() && self.web.is_empty() && self.lynx.is_empty()
    }
}
