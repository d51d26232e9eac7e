// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-container bridge facade.
//
// A container creates one `Bridge` when it initialises and releases it when
// it is destroyed. The facade wires the context, the default handler, an
// optional business handler and the dispatcher together.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{info, instrument, warn};

use bridgewerk_core::error::{BridgeError, Result};
use bridgewerk_core::types::{ContainerId, DEFAULT_NAMESPACE, PlatformScope};

use crate::call::{BridgeCall, BridgeResult};
use crate::context::{BridgeContext, EventEmitter};
use crate::dispatcher::BridgeDispatcher;
use crate::executor::BridgeExecutor;
use crate::handler::{BusinessCallHandler, CallHandler, DefaultCallHandler};
use crate::manager::BridgeManager;
use crate::method::MethodHandle;
use crate::report::ErrorReporter;

pub struct Bridge {
    manager: Arc<BridgeManager>,
    context: Arc<BridgeContext>,
    dispatcher: BridgeDispatcher,
    released: AtomicBool,
}

impl Bridge {
    pub fn new(manager: Arc<BridgeManager>, container_id: ContainerId) -> Self {
        let context = Arc::new(BridgeContext::new(container_id.clone()));
        let default_handler = Arc::new(DefaultCallHandler::new(Arc::clone(&manager), container_id));
        default_handler.set_bridge_context(&context);
        info!(container_id = %context.container_id(), "bridge created");
        Self {
            manager,
            context,
            dispatcher: BridgeDispatcher::new(default_handler),
            released: AtomicBool::new(false),
        }
    }

    pub fn with_executor(mut self, executor: Arc<BridgeExecutor>) -> Self {
        self.dispatcher.set_executor(executor);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.dispatcher.set_reporter(reporter);
        self
    }

    pub fn context(&self) -> &Arc<BridgeContext> {
        &self.context
    }

    pub fn container_id(&self) -> &ContainerId {
        self.context.container_id()
    }

    /// Attach a business handler for `namespace`, replacing any previous one.
    pub fn bind_business_namespace(&self, namespace: impl Into<String>) {
        let handler = Arc::new(BusinessCallHandler::new(&self.manager, namespace));
        handler.set_bridge_context(&self.context);
        info!(
            container_id = %self.context.container_id(),
            namespace = %handler.namespace(),
            "business namespace bound"
        );
        if let Some(previous) = self.context.business_handler() {
            previous.release();
        }
        self.context.set_business_handler(handler);
    }

    /// Register an app-wide method in the DEFAULT namespace.
    pub fn register_method(&self, handle: MethodHandle, scope: PlatformScope) {
        self.manager.register_method(handle, scope, DEFAULT_NAMESPACE);
    }

    /// Register a method in the bound business namespace.
    pub fn register_business_method(&self, handle: MethodHandle, scope: PlatformScope) -> Result<()> {
        let Some(business) = self.context.business_handler() else {
            warn!(method = %handle.name(), "no business namespace bound, registration refused");
            return Err(BridgeError::IllegalOperation(format!(
                "cannot register {}: no business namespace is bound",
                handle.name()
            )));
        };
        business.register_method(handle, scope);
        Ok(())
    }

    /// Register a method visible to this container only.
    pub fn register_local_method(&self, handle: MethodHandle, scope: PlatformScope) {
        self.dispatcher
            .default_handler()
            .register_local_method(handle, scope);
    }

    pub fn is_business_method_registered(&self, name: &str, scope: PlatformScope) -> bool {
        self.context
            .business_handler()
            .is_some_and(|b| b.is_registered(name, scope))
    }

    pub fn set_event_emitter(&self, emitter: &Arc<dyn EventEmitter>) {
        self.context.set_event_emitter(emitter);
    }

    /// Dispatch `call`; `callback` receives the reply.
    #[instrument(skip_all, fields(container_id = %self.context.container_id()))]
    pub fn call(&self, call: BridgeCall, callback: impl FnOnce(BridgeResult) + Send + 'static) {
        self.dispatcher
            .dispatch(call, &self.context, Box::new(callback));
    }

    /// Release handlers, the container's registry cache entry and the
    /// context. Calls made afterwards reply with the released code.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        self.dispatcher.default_handler().release();
        self.context.release();
        info!(container_id = %self.context.container_id(), "bridge released");
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl Drop for Bridge {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    use serde_json::{Map, Value, json};

    use bridgewerk_core::codes;
    use bridgewerk_core::value::{CanonicalMap, MapBuilder, MapExt};

    use crate::completion::Completion;
    use crate::method::BridgeMethod;
    use crate::registry::tests::handle;

    #[derive(Default)]
    struct SetItem;

    impl BridgeMethod for SetItem {
        fn name(&self) -> &str {
            "storage.setItem"
        }

        fn handle(&self, params: CanonicalMap, completion: Completion, _: PlatformScope) -> Result<()> {
            let key = params
                .get_str("key")
                .ok_or_else(|| BridgeError::InvalidInput("key param is missing from input".into()))?;
            completion.success(MapBuilder::new().put("key", key).build());
            Ok(())
        }
    }

    fn web(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn call(bridge: &Bridge, call: BridgeCall) -> Value {
        let (tx, rx) = mpsc::channel();
        bridge.call(call, move |r| {
            tx.send(r).expect("send reply");
        });
        Value::Object(rx.recv_timeout(Duration::from_secs(1)).expect("reply").to_json())
    }

    #[test]
    fn storage_set_item_end_to_end() {
        let bridge = Bridge::new(Arc::new(BridgeManager::new()), "e2e".into());
        bridge.register_method(MethodHandle::of::<SetItem>(), PlatformScope::All);

        let ok = call(
            &bridge,
            BridgeCall::web("storage.setItem", web(json!({"key": "k", "data": "v"}))),
        );
        assert_eq!(ok["code"], json!(0));
        assert_eq!(ok["msg"], json!("Success"));
        assert_eq!(ok["data"], json!({"key": "k"}));

        let missing = call(
            &bridge,
            BridgeCall::web("storage.unknownOp", web(json!({"key": "k", "data": "v"}))),
        );
        assert_eq!(missing["code"], json!(codes::NOT_FOUND));
    }

    #[test]
    fn business_registration_requires_a_namespace() {
        let bridge = Bridge::new(Arc::new(BridgeManager::new()), "biz".into());
        let err = bridge
            .register_business_method(handle("shop.cart"), PlatformScope::All)
            .expect_err("no namespace bound");
        assert_eq!(err.code(), codes::ILLEGAL_OPERATION);

        bridge.bind_business_namespace("shop");
        bridge
            .register_business_method(handle("shop.cart"), PlatformScope::Web)
            .expect("namespace bound");
        assert!(bridge.is_business_method_registered("shop.cart", PlatformScope::Web));
        assert!(!bridge.is_business_method_registered("shop.cart", PlatformScope::Lynx));
    }

    #[test]
    fn release_is_idempotent_and_unregisters_container_cache() {
        let manager = Arc::new(BridgeManager::new());
        let bridge = Bridge::new(Arc::clone(&manager), "released".into());
        bridge.register_local_method(handle("local.ping"), PlatformScope::All);
        assert!(manager.caches().provide(&"released".into()).is_some());

        bridge.release();
        bridge.release();

        assert!(bridge.is_released());
        assert!(bridge.context().is_released());
        assert!(manager.caches().provide(&"released".into()).is_none());
        let reply = call(&bridge, BridgeCall::web("local.ping", Map::new()));
        assert_eq!(reply["code"], json!(codes::RELEASED));
    }

    #[test]
    fn new_bridge_for_reused_container_id_does_not_see_stale_local_methods() {
        let manager = Arc::new(BridgeManager::new());
        {
            let first = Bridge::new(Arc::clone(&manager), "screen-1".into());
            first.register_local_method(handle("local.stale"), PlatformScope::All);
        }
        let second = Bridge::new(Arc::clone(&manager), "screen-1".into());
        let reply = call(&second, BridgeCall::web("local.stale", Map::new()));
        assert_eq!(reply["code"], json!(codes::NOT_FOUND));
    }
}
