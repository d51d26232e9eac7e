// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Instance pool.
//
// Lazily instantiated, memoized method objects keyed by (scope, name).
// Concurrent calls for the same key race on a DashMap entry, so exactly one
// instance wins and is shared. Instances are only dropped on `release()`.

use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use tracing::{debug, info};

use bridgewerk_core::types::PlatformScope;

use crate::method::{MethodHandle, SharedMethod};

#[derive(Default)]
pub struct InstancePool {
    instances: DashMap<(PlatformScope, String), SharedMethod>,
    released: AtomicBool,
}

impl InstancePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached instance for `scope`, then for `All`. Nothing once released.
    pub fn cached(&self, scope: PlatformScope, name: &str) -> Option<SharedMethod> {
        if self.is_released() || scope == PlatformScope::None {
            return None;
        }
        let lookup = |s: PlatformScope| {
            self.instances
                .get(&(s, name.to_string()))
                .map(|e| e.value().clone())
        };
        lookup(scope).or_else(|| lookup(PlatformScope::All))
    }

    /// Instance for `(scope, handle.name())`, created from `handle` on miss.
    pub fn get_or_instantiate(&self, scope: PlatformScope, handle: &MethodHandle) -> Option<SharedMethod> {
        if self.is_released() {
            return None;
        }
        let key = (scope, handle.name().to_string());
        let instance = self
            .instances
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(method = %handle.name(), scope = %scope, "method instantiated");
                handle.instantiate()
            })
            .value()
            .clone();
        // A release that raced the insert has already drained the map.
        if self.is_released() {
            if let Some((_, late)) = self.instances.remove(&key) {
                late.release();
            }
            return None;
        }
        Some(instance)
    }

    /// Release every cached instance and refuse further lookups.
    /// Calling this again is a no-op.
    pub fn release(&self) {
        let first = !self.released.swap(true, Ordering::AcqRel);
        let keys: Vec<_> = self.instances.iter().map(|e| e.key().clone()).collect();
        for key in keys {
            if let Some((_, instance)) = self.instances.remove(&key) {
                instance.release();
            }
        }
        if first {
            info!("instance pool released");
        }
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use bridgewerk_core::error::Result;
    use bridgewerk_core::value::CanonicalMap;

    use crate::completion::Completion;
    use crate::method::BridgeMethod;

    struct Counted {
        released: Arc<AtomicUsize>,
    }

    impl BridgeMethod for Counted {
        fn name(&self) -> &str {
            "test.counted"
        }

        fn handle(&self, _: CanonicalMap, completion: Completion, _: PlatformScope) -> Result<()> {
            completion.success(CanonicalMap::new());
            Ok(())
        }

        fn release(&self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counted_handle(released: &Arc<AtomicUsize>) -> MethodHandle {
        let released = Arc::clone(released);
        MethodHandle::from_fn("test.counted", move || Counted {
            released: Arc::clone(&released),
        })
    }

    #[test]
    fn instances_are_memoized_per_scope() {
        let released = Arc::new(AtomicUsize::new(0));
        let handle = counted_handle(&released);
        let pool = InstancePool::new();

        let a = pool.get_or_instantiate(PlatformScope::Web, &handle).expect("instance");
        let b = pool.get_or_instantiate(PlatformScope::Web, &handle).expect("instance");
        let c = pool.get_or_instantiate(PlatformScope::Lynx, &handle).expect("instance");

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn cached_falls_back_to_all_scope() {
        let released = Arc::new(AtomicUsize::new(0));
        let pool = InstancePool::new();
        pool.get_or_instantiate(PlatformScope::All, &counted_handle(&released));

        assert!(pool.cached(PlatformScope::Lynx, "test.counted").is_some());
        assert!(pool.cached(PlatformScope::None, "test.counted").is_none());
    }

    #[test]
    fn release_is_idempotent_and_releases_each_instance_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let handle = counted_handle(&released);
        let pool = InstancePool::new();
        pool.get_or_instantiate(PlatformScope::Web, &handle);
        pool.get_or_instantiate(PlatformScope::Lynx, &handle);

        pool.release();
        pool.release();

        assert_eq!(released.load(Ordering::SeqCst), 2);
        assert!(pool.is_empty());
        assert!(pool.is_released());
        assert!(pool.cached(PlatformScope::Web, "test.counted").is_none());
        assert!(pool.get_or_instantiate(PlatformScope::Web, &handle).is_none());
    }

    #[test]
    fn concurrent_population_yields_one_instance() {
        let released = Arc::new(AtomicUsize::new(0));
        let handle = counted_handle(&released);
        let pool = Arc::new(InstancePool::new());

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let pool = Arc::clone(&pool);
                let handle = handle.clone();
                std::thread::spawn(move || pool.get_or_instantiate(PlatformScope::Web, &handle))
            })
            .collect();
        let instances: Vec<_> = workers
            .into_iter()
            .map(|w| w.join().expect("join").expect("instance"))
            .collect();

        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn instances_created_while_releasing_are_released_too() {
        let created = Arc::new(AtomicUsize::new(0));
        let released = Arc::new(AtomicUsize::new(0));
        let handle = {
            let created = Arc::clone(&created);
            let released = Arc::clone(&released);
            MethodHandle::from_fn("test.counted", move || {
                created.fetch_add(1, Ordering::SeqCst);
                Counted {
                    released: Arc::clone(&released),
                }
            })
        };
        let pool = Arc::new(InstancePool::new());
        let scopes = [PlatformScope::Web, PlatformScope::Lynx, PlatformScope::All];

        let workers: Vec<_> = (0..6)
            .map(|i| {
                let pool = Arc::clone(&pool);
                let handle = handle.clone();
                let scope = scopes[i % scopes.len()];
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        if pool.get_or_instantiate(scope, &handle).is_none() {
                            break;
                        }
                    }
                })
            })
            .collect();
        pool.release();
        for worker in workers {
            worker.join().expect("join");
        }

        assert!(pool.is_empty());
        assert_eq!(
            created.load(Ordering::SeqCst),
            released.load(Ordering::SeqCst)
        );
    }
}
