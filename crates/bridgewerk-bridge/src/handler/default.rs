// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Default call handler.
//
// Serves app-wide methods from the manager's DEFAULT registry plus the
// container's own local registry. Lookup order: instance pool, this
// handler's local registry, default registry. The local registry is also
// published in the manager's container cache for lookups by id.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};

use bridgewerk_core::codes;
use bridgewerk_core::types::{ContainerId, PlatformScope};

use crate::call::{BridgeCall, BridgeResult, PayloadShape};
use crate::context::BridgeContext;
use crate::handler::{CallHandler, ReplyCallback, invoke};
use crate::manager::BridgeManager;
use crate::method::{ContextSlot, MethodHandle, SharedMethod};
use crate::pool::InstancePool;
use crate::registry::MethodRegistry;

pub struct DefaultCallHandler {
    manager: Arc<BridgeManager>,
    container_id: ContainerId,
    local: Arc<MethodRegistry>,
    pool: InstancePool,
    context: ContextSlot,
    released: AtomicBool,
}

impl DefaultCallHandler {
    pub fn new(manager: Arc<BridgeManager>, container_id: ContainerId) -> Self {
        let local = Arc::new(MethodRegistry::new(container_id.as_str()));
        manager.caches().register(&container_id, &local);
        Self {
            manager,
            container_id,
            local,
            pool: InstancePool::new(),
            context: ContextSlot::default(),
            released: AtomicBool::new(false),
        }
    }

    pub fn container_id(&self) -> &ContainerId {
        &self.container_id
    }

    pub fn set_bridge_context(&self, context: &Arc<BridgeContext>) {
        self.context.set(context);
    }

    /// Register a method visible to this container only.
    pub fn register_local_method(&self, handle: MethodHandle, scope: PlatformScope) {
        self.local.register(handle, scope);
    }

    /// Resolve `name` for `scope`, instantiating and caching on first use.
    pub fn get_bridge(&self, scope: PlatformScope, name: &str) -> Option<SharedMethod> {
        if let Some(method) = self.pool.cached(scope, name) {
            return Some(method);
        }
        let handle = self
            .local
            .resolve(scope, name)
            .or_else(|| self.manager.default_registry().resolve(scope, name))?;
        self.pool.get_or_instantiate(scope, &handle)
    }
}

impl CallHandler for DefaultCallHandler {
    fn handle(&self, call: &BridgeCall, callback: ReplyCallback) {
        let Some(shape) = call.payload().shape() else {
            warn!(method = %call.bridge_name(), "unsupported payload shape, call skipped");
            return;
        };
        if self.is_released() {
            callback(BridgeResult::error(shape, codes::RELEASED, codes::RELEASED_MSG));
            return;
        }
        let Some(method) = self.get_bridge(shape.scope(), call.bridge_name()) else {
            debug!(method = %call.bridge_name(), container_id = %self.container_id, "bridge method not found");
            callback(BridgeResult::error(shape, codes::NOT_FOUND, codes::NOT_FOUND_MSG));
            return;
        };
        let context = self.context.get();
        invoke(
            &method,
            call,
            shape,
            context.as_ref(),
            shape == PayloadShape::Lynx,
            callback,
        );
    }

    fn release(&self) {
        self.pool.release();
        self.local.clear();
        self.manager.caches().unregister(&self.container_id, &self.local);
        if !self.released.swap(true, Ordering::AcqRel) {
            info!(container_id = %self.container_id, "default handler released");
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

    use bridgewerk_codec::{LynxMap, LynxValue};

    use crate::call::Payload;
    use crate::registry::tests::handle;

    fn reply(handler: &DefaultCallHandler, call: BridgeCall) -> BridgeResult {
        let (tx, rx) = mpsc::channel();
        handler.handle(
            &call,
            Box::new(move |r| {
                tx.send(r).expect("send reply");
            }),
        );
        rx.recv_timeout(Duration::from_secs(1)).expect("reply")
    }

    fn web_call(name: &str) -> BridgeCall {
        let serde_json::Value::Object(map) = json!({"key": "k"}) else {
            unreachable!();
        };
        BridgeCall::web(name, map)
    }

    #[test]
    fn unregistered_method_replies_not_found() {
        let handler = DefaultCallHandler::new(Arc::new(BridgeManager::new()), "c1".into());
        let result = reply(&handler, web_call("storage.unknownOp"));
        assert_eq!(result.code(), Some(codes::NOT_FOUND));
        assert_eq!(result.msg().as_deref(), Some(codes::NOT_FOUND_MSG));
    }

    #[test]
    fn local_methods_are_visible_to_their_container_only() {
        let manager = Arc::new(BridgeManager::new());
        manager.register_method(handle("app.info"), PlatformScope::All, "DEFAULT");
        let handler = DefaultCallHandler::new(Arc::clone(&manager), "c2".into());
        assert!(handler.get_bridge(PlatformScope::Web, "app.info").is_some());

        let other = DefaultCallHandler::new(Arc::clone(&manager), "c3".into());
        other.register_local_method(handle("local.only"), PlatformScope::Lynx);
        assert!(other.get_bridge(PlatformScope::Lynx, "local.only").is_some());
        assert!(other.get_bridge(PlatformScope::Web, "local.only").is_none());
        assert!(handler.get_bridge(PlatformScope::Lynx, "local.only").is_none());
    }

    #[test]
    fn lynx_payload_is_unwrapped_from_data() {
        let manager = Arc::new(BridgeManager::new());
        manager.register_method(handle("test.echo"), PlatformScope::All, "DEFAULT");
        let handler = DefaultCallHandler::new(manager, "c4".into());

        let mut inner = LynxMap::new();
        inner.insert("key".into(), LynxValue::String("k".into()));
        let mut payload = LynxMap::new();
        payload.insert("data".into(), LynxValue::Map(inner));

        let result = reply(&handler, BridgeCall::lynx("test.echo", payload));
        assert!(result.is_success());
        let json = serde_json::Value::Object(result.to_json());
        assert_eq!(json["data"], json!({"key": "k"}));
    }

    #[test]
    fn released_handler_replies_released_and_release_is_idempotent() {
        let manager = Arc::new(BridgeManager::new());
        manager.register_method(handle("test.echo"), PlatformScope::All, "DEFAULT");
        let id = ContainerId::from("c5");
        let handler = DefaultCallHandler::new(Arc::clone(&manager), id.clone());
        handler.register_local_method(handle("local.x"), PlatformScope::All);
        assert!(handler.get_bridge(PlatformScope::Web, "test.echo").is_some());

        handler.release();
        handler.release();

        assert!(handler.is_released());
        assert!(manager.caches().provide(&id).is_none());
        assert!(handler.get_bridge(PlatformScope::Web, "test.echo").is_none());
        assert_eq!(
            reply(&handler, web_call("test.echo")).code(),
            Some(codes::RELEASED)
        );
    }

    #[test]
    fn reused_container_id_starts_clean() {
        let manager = Arc::new(BridgeManager::new());
        let id = ContainerId::from("reused");

        let first = DefaultCallHandler::new(Arc::clone(&manager), id.clone());
        first.register_local_method(handle("stale.method"), PlatformScope::All);
        first.release();

        let second = DefaultCallHandler::new(Arc::clone(&manager), id);
        assert!(second.get_bridge(PlatformScope::Web, "stale.method").is_none());
        assert_eq!(
            reply(&second, web_call("stale.method")).code(),
            Some(codes::NOT_FOUND)
        );
    }

    #[test]
    fn handlers_sharing_a_container_id_keep_their_own_locals() {
        let manager = Arc::new(BridgeManager::new());
        let id = ContainerId::from("screen");
        let old = DefaultCallHandler::new(Arc::clone(&manager), id.clone());
        let new = DefaultCallHandler::new(Arc::clone(&manager), id.clone());
        old.register_local_method(handle("local.a"), PlatformScope::All);
        new.register_local_method(handle("local.b"), PlatformScope::All);

        assert!(old.get_bridge(PlatformScope::Web, "local.a").is_some());
        assert!(old.get_bridge(PlatformScope::Web, "local.b").is_none());
        assert!(new.get_bridge(PlatformScope::Web, "local.a").is_none());

        old.release();

        assert!(new.get_bridge(PlatformScope::Web, "local.b").is_some());
        let cached = manager.caches().provide(&id).expect("newer container stays cached");
        assert!(cached.is_registered("local.b", PlatformScope::Web));
    }

    #[test]
    fn unknown_payload_shape_gets_no_reply() {
        let handler = DefaultCallHandler::new(Arc::new(BridgeManager::new()), "c6".into());
        let (tx, rx) = mpsc::channel::<BridgeResult>();
        handler.handle(
            &BridgeCall::new("anything", Payload::Other),
            Box::new(move |r| {
                let _ = tx.send(r);
            }),
        );
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
