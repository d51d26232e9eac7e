// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-container bridge context.
//
// One context per hybrid-view container. It carries the dependencies methods
// may need (event emitter, typed providers, container id) and the optional
// hooks the dispatcher consults (mock interceptor, lifecycle client,
// business handler).

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

use bridgewerk_core::types::ContainerId;
use bridgewerk_core::value::CanonicalMap;

use crate::call::{BridgeCall, BridgeResult};
use crate::handler::{BusinessCallHandler, CallHandler};

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// Sends events from native code into the container's runtime.
pub trait EventEmitter: Send + Sync {
    fn send_event(&self, name: &str, params: CanonicalMap);
}

/// Test and debug hook that can fake or rewrite calls.
pub trait MockInterceptor: Send + Sync {
    /// A canned reply that replaces the whole call.
    fn invoke_result(&self, _call: &BridgeCall) -> Option<BridgeResult> {
        None
    }

    fn intercept_call(&self, call: BridgeCall) -> BridgeCall {
        call
    }

    fn intercept_result(&self, _call: &BridgeCall, result: BridgeResult) -> BridgeResult {
        result
    }
}

/// Verdict of [`LifecycleClient::should_handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleDecision {
    pub allow: bool,
    pub reason: String,
}

impl HandleDecision {
    pub fn allow() -> Self {
        Self {
            allow: true,
            reason: String::new(),
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allow: false,
            reason: reason.into(),
        }
    }
}

/// Observes and gates every call dispatched in a container.
pub trait LifecycleClient: Send + Sync {
    fn on_dispatched(&self, _call: &BridgeCall) {}

    /// A reply (normally permission denied) that is delivered instead of
    /// running the call.
    fn should_intercept_request(&self, _call: &BridgeCall) -> Option<BridgeResult> {
        None
    }

    fn should_handle(&self, _call: &BridgeCall) -> HandleDecision {
        HandleDecision::allow()
    }

    fn on_callback(&self, _call: &BridgeCall, _result: &BridgeResult) {}
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

enum Provider {
    Strong(Arc<dyn Any + Send + Sync>),
    Weak(Weak<dyn Any + Send + Sync>),
}

impl Provider {
    fn get(&self) -> Option<Arc<dyn Any + Send + Sync>> {
        match self {
            Provider::Strong(value) => Some(Arc::clone(value)),
            Provider::Weak(value) => value.upgrade(),
        }
    }
}

pub struct BridgeContext {
    container_id: ContainerId,
    url: RwLock<String>,
    event_emitter: RwLock<Option<Weak<dyn EventEmitter>>>,
    providers: DashMap<TypeId, Provider>,
    business_handler: RwLock<Option<Arc<BusinessCallHandler>>>,
    mock_interceptor: RwLock<Option<Arc<dyn MockInterceptor>>>,
    lifecycle: RwLock<Option<Arc<dyn LifecycleClient>>>,
    released: AtomicBool,
}

impl BridgeContext {
    pub fn new(container_id: ContainerId) -> Self {
        Self {
            container_id,
            url: RwLock::new(String::new()),
            event_emitter: RwLock::new(None),
            providers: DashMap::new(),
            business_handler: RwLock::new(None),
            mock_interceptor: RwLock::new(None),
            lifecycle: RwLock::new(None),
            released: AtomicBool::new(false),
        }
    }

    pub fn container_id(&self) -> &ContainerId {
        &self.container_id
    }

    pub fn url(&self) -> String {
        self.url.read().clone()
    }

    pub fn set_url(&self, url: impl Into<String>) {
        *self.url.write() = url.into();
    }

    /// The emitter is held weakly; its owner keeps it alive.
    pub fn set_event_emitter(&self, emitter: &Arc<dyn EventEmitter>) {
        *self.event_emitter.write() = Some(Arc::downgrade(emitter));
    }

    /// Forward an event to the container. Returns false when no emitter is
    /// attached or it has gone away.
    pub fn send_event(&self, name: &str, params: CanonicalMap) -> bool {
        let emitter = self.event_emitter.read().as_ref().and_then(Weak::upgrade);
        match emitter {
            Some(emitter) => {
                emitter.send_event(name, params);
                true
            }
            None => {
                debug!(event = %name, container_id = %self.container_id, "no event emitter, event dropped");
                false
            }
        }
    }

    /// Store `value` as the provider for `T`, keeping it alive.
    pub fn register_object<T: Any + Send + Sync>(&self, value: Arc<T>) {
        self.providers
            .insert(TypeId::of::<T>(), Provider::Strong(value));
    }

    /// Store `value` as the provider for `T` without keeping it alive.
    pub fn register_weak_object<T: Any + Send + Sync>(&self, value: &Arc<T>) {
        let erased: Arc<dyn Any + Send + Sync> = Arc::clone(value) as Arc<dyn Any + Send + Sync>;
        self.providers
            .insert(TypeId::of::<T>(), Provider::Weak(Arc::downgrade(&erased)));
    }

    pub fn object<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        let value = self.providers.get(&TypeId::of::<T>())?.value().get()?;
        value.downcast::<T>().ok()
    }

    pub fn set_business_handler(&self, handler: Arc<BusinessCallHandler>) {
        *self.business_handler.write() = Some(handler);
    }

    pub fn business_handler(&self) -> Option<Arc<BusinessCallHandler>> {
        self.business_handler.read().clone()
    }

    /// Namespace of the attached business handler, if any.
    pub fn namespace(&self) -> Option<String> {
        self.business_handler
            .read()
            .as_ref()
            .map(|h| h.namespace().to_string())
    }

    pub fn set_mock_interceptor(&self, interceptor: Arc<dyn MockInterceptor>) {
        *self.mock_interceptor.write() = Some(interceptor);
    }

    pub fn mock_interceptor(&self) -> Option<Arc<dyn MockInterceptor>> {
        self.mock_interceptor.read().clone()
    }

    pub fn set_lifecycle_client(&self, client: Arc<dyn LifecycleClient>) {
        *self.lifecycle.write() = Some(client);
    }

    pub fn lifecycle_client(&self) -> Option<Arc<dyn LifecycleClient>> {
        self.lifecycle.read().clone()
    }

    /// True when a business handler is attached, the call targets its
    /// namespace (or none) and the handler resolves the method.
    pub fn should_handle_with_business_handler(&self, call: &BridgeCall) -> bool {
        let Some(handler) = self.business_handler() else {
            return false;
        };
        let namespace_matches =
            call.namespace().is_empty() || call.namespace() == handler.namespace();
        namespace_matches && handler.can_handle(call.bridge_name(), call.platform())
    }

    /// Drop every dependency and hook. Idempotent.
    pub fn release(&self) {
        if self.released.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(handler) = self.business_handler.write().take() {
            handler.release();
        }
        *self.event_emitter.write() = None;
        *self.mock_interceptor.write() = None;
        *self.lifecycle.write() = None;
        self.providers.clear();
        info!(container_id = %self.container_id, "bridge context released");
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}

impl fmt::Debug for BridgeContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeContext")
            .field("container_id", &self.container_id)
            .field("namespace", &self.namespace())
            .field("released", &self.is_released())
            .finish()
    }
}
