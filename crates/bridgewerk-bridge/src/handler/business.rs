// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Business call handler.
//
// Serves one feature namespace. The namespace registry is shared through the
// manager; the instance pool belongs to this handler alone. Arguments are
// unwrapped from a nested `data` map for both payload shapes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use bridgewerk_core::codes;
use bridgewerk_core::types::PlatformScope;

use crate::call::{BridgeCall, BridgeResult};
use crate::context::BridgeContext;
use crate::handler::{CallHandler, ReplyCallback, invoke};
use crate::manager::BridgeManager;
use crate::method::{ContextSlot, MethodHandle, SharedMethod};
use crate::pool::InstancePool;
use crate::registry::MethodRegistry;

pub struct BusinessCallHandler {
    namespace: String,
    registry: Arc<MethodRegistry>,
    pool: InstancePool,
    context: ContextSlot,
    released: AtomicBool,
}

impl BusinessCallHandler {
    pub fn new(manager: &BridgeManager, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let registry = manager.registry(&namespace);
        Self {
            namespace,
            registry,
            pool: InstancePool::new(),
            context: ContextSlot::default(),
            released: AtomicBool::new(false),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn set_bridge_context(&self, context: &Arc<BridgeContext>) {
        self.context.set(context);
    }

    pub fn register_method(&self, handle: MethodHandle, scope: PlatformScope) {
        self.registry.register(handle, scope);
    }

    pub fn is_registered(&self, name: &str, scope: PlatformScope) -> bool {
        self.registry.is_registered(name, scope)
    }

    /// Whether this handler would resolve `name` for `scope`.
    pub fn can_handle(&self, name: &str, scope: PlatformScope) -> bool {
        !self.is_released()
            && (self.pool.cached(scope, name).is_some()
                || self.registry.resolve(scope, name).is_some())
    }

    pub fn get_bridge(&self, scope: PlatformScope, name: &str) -> Option<SharedMethod> {
        if let Some(method) = self.pool.cached(scope, name) {
            return Some(method);
        }
        let handle = self.registry.resolve(scope, name)?;
        self.pool.get_or_instantiate(scope, &handle)
    }
}

impl CallHandler for BusinessCallHandler {
    fn handle(&self, call: &BridgeCall, callback: ReplyCallback) {
        let Some(shape) = call.payload().shape() else {
            warn!(method = %call.bridge_name(), namespace = %self.namespace, "unsupported payload shape, call skipped");
            return;
        };
        if self.is_released() {
            callback(BridgeResult::error(shape, codes::RELEASED, codes::RELEASED_MSG));
            return;
        }
        let Some(method) = self.get_bridge(shape.scope(), call.bridge_name()) else {
            debug!(method = %call.bridge_name(), namespace = %self.namespace, "business method not found");
            callback(BridgeResult::error(shape, codes::NOT_FOUND, codes::NOT_FOUND_MSG));
            return;
        };
        let context = self.context.get();
        invoke(&method, call, shape, context.as_ref(), true, callback);
    }

    fn release(&self) {
        self.pool.release();
        if !self.released.swap(true, Ordering::AcqRel) {
            info!(namespace = %self.namespace, "business handler released");
        }
    }

    fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    use serde_json::json;

    use crate::registry::tests::handle;

    fn reply(handler: &BusinessCallHandler, payload: serde_json::Value, name: &str) -> BridgeResult {
        let serde_json::Value::Object(map) = payload else {
            panic!("payload must be an object");
        };
        let (tx, rx) = mpsc::channel();
        handler.handle(
            &BridgeCall::web(name, map),
            Box::new(move |r| {
                tx.send(r).expect("send reply");
            }),
        );
        rx.recv_timeout(Duration::from_secs(1)).expect("reply")
    }

    #[test]
    fn web_payload_is_unwrapped_from_data() {
        let manager = BridgeManager::new();
        let handler = BusinessCallHandler::new(&manager, "shop");
        handler.register_method(handle("shop.cart"), PlatformScope::All);

        let result = reply(&handler, json!({"data": {"sku": "A1"}}), "shop.cart");
        let json = serde_json::Value::Object(result.to_json());
        assert_eq!(json["data"], json!({"sku": "A1"}));
    }

    #[test]
    fn registry_is_shared_per_namespace_but_pools_are_not() {
        let manager = BridgeManager::new();
        let first = BusinessCallHandler::new(&manager, "shop");
        let second = BusinessCallHandler::new(&manager, "shop");
        first.register_method(handle("shop.cart"), PlatformScope::Web);

        assert!(second.can_handle("shop.cart", PlatformScope::Web));
        assert!(!second.can_handle("shop.cart", PlatformScope::Lynx));
        assert!(manager.is_registered("shop.cart", PlatformScope::Web, "shop"));

        let a = first.get_bridge(PlatformScope::Web, "shop.cart").expect("instance");
        let b = second.get_bridge(PlatformScope::Web, "shop.cart").expect("instance");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn released_business_handler_refuses_calls() {
        let manager = BridgeManager::new();
        let handler = BusinessCallHandler::new(&manager, "shop");
        handler.register_method(handle("shop.cart"), PlatformScope::All);

        handler.release();
        handler.release();

        assert!(!handler.can_handle("shop.cart", PlatformScope::Web));
        assert_eq!(
            reply(&handler, json!({}), "shop.cart").code(),
            Some(codes::RELEASED)
        );
    }
}
