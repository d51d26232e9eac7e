// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Incoming calls and outgoing results.
//
// The payload shape is resolved once at ingress into a closed enum; every
// later stage matches on it instead of probing runtime types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use bridgewerk_codec::{Codec, LynxMap, LynxValue, WebPayload, lynx};
use bridgewerk_core::codes;
use bridgewerk_core::settings;
use bridgewerk_core::types::{PlatformScope, ThreadType};
use bridgewerk_core::value::CanonicalMap;

/// Native payload as delivered by a runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Web(WebPayload),
    Lynx(LynxMap),
    /// A shape the bridge does not understand; such calls are skipped.
    Other,
}

/// Which codec a payload (and therefore its reply) uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    Web,
    Lynx,
}

impl PayloadShape {
    pub fn scope(self) -> PlatformScope {
        match self {
            PayloadShape::Web => PlatformScope::Web,
            PayloadShape::Lynx => PlatformScope::Lynx,
        }
    }
}

impl Payload {
    pub fn shape(&self) -> Option<PayloadShape> {
        match self {
            Payload::Web(_) => Some(PayloadShape::Web),
            Payload::Lynx(_) => Some(PayloadShape::Lynx),
            Payload::Other => None,
        }
    }

    /// Platform scope implied by the payload shape.
    pub fn scope(&self) -> PlatformScope {
        self.shape().map_or(PlatformScope::All, PayloadShape::scope)
    }
}

/// One incoming invocation. Immutable once dispatched.
#[derive(Debug, Clone)]
pub struct BridgeCall {
    bridge_name: String,
    payload: Payload,
    namespace: String,
    url: String,
    callback_id: String,
    thread_type: Option<ThreadType>,
    created_at: DateTime<Utc>,
}

impl BridgeCall {
    pub fn new(bridge_name: impl Into<String>, payload: Payload) -> Self {
        Self {
            bridge_name: bridge_name.into(),
            payload,
            namespace: String::new(),
            url: String::new(),
            callback_id: String::new(),
            thread_type: None,
            created_at: Utc::now(),
        }
    }

    pub fn web(bridge_name: impl Into<String>, payload: WebPayload) -> Self {
        Self::new(bridge_name, Payload::Web(payload))
    }

    pub fn lynx(bridge_name: impl Into<String>, payload: LynxMap) -> Self {
        Self::new(bridge_name, Payload::Lynx(payload))
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_callback_id(mut self, callback_id: impl Into<String>) -> Self {
        self.callback_id = callback_id.into();
        self
    }

    pub fn with_thread_type(mut self, thread_type: ThreadType) -> Self {
        self.thread_type = Some(thread_type);
        self
    }

    pub fn bridge_name(&self) -> &str {
        &self.bridge_name
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn platform(&self) -> PlatformScope {
        self.payload.scope()
    }

    /// Target namespace; empty means "whichever handler resolves it".
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn callback_id(&self) -> &str {
        &self.callback_id
    }

    pub fn thread_type(&self) -> Option<ThreadType> {
        self.thread_type
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl fmt::Display for BridgeCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BridgeCall(callback_id='{}', bridge_name='{}', platform={}, namespace='{}')",
            self.callback_id,
            self.bridge_name,
            self.platform(),
            self.namespace
        )
    }
}

/// Reply delivered to the runtime, in the shape the call arrived in.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeResult {
    payload: Payload,
}

impl BridgeResult {
    pub fn new(payload: Payload) -> Self {
        Self { payload }
    }

    /// `{code, msg, data: {}}` in the given shape.
    pub fn error(shape: PayloadShape, code: i32, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let payload = match shape {
            PayloadShape::Web => {
                let mut map = WebPayload::new();
                map.insert(codes::KEY_CODE.into(), Value::from(code));
                map.insert(codes::KEY_MSG.into(), Value::from(msg));
                map.insert(codes::KEY_DATA.into(), Value::Object(WebPayload::new()));
                Payload::Web(map)
            }
            PayloadShape::Lynx => {
                let mut map = LynxMap::new();
                map.insert(codes::KEY_CODE.into(), LynxValue::Int(code));
                map.insert(codes::KEY_MSG.into(), LynxValue::String(msg));
                map.insert(codes::KEY_DATA.into(), LynxValue::Map(LynxMap::new()));
                Payload::Lynx(map)
            }
        };
        Self { payload }
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn into_payload(self) -> Payload {
        self.payload
    }

    pub fn code(&self) -> Option<i32> {
        match &self.payload {
            Payload::Web(map) => map
                .get(codes::KEY_CODE)
                .and_then(Value::as_i64)
                .and_then(|c| i32::try_from(c).ok()),
            Payload::Lynx(map) => lynx::reply_code(map),
            Payload::Other => None,
        }
    }

    pub fn msg(&self) -> Option<String> {
        match &self.payload {
            Payload::Web(map) => map.get(codes::KEY_MSG)?.as_str().map(String::from),
            Payload::Lynx(map) => match map.get(codes::KEY_MSG)? {
                LynxValue::String(s) => Some(s.clone()),
                _ => None,
            },
            Payload::Other => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code() == Some(codes::SUCCESS)
    }

    /// The reply as a canonical map, regardless of shape.
    pub fn to_canonical(&self) -> CanonicalMap {
        let codec = Codec::current();
        match &self.payload {
            Payload::Web(map) => codec.decode_web(map),
            Payload::Lynx(map) => codec.decode_lynx(map),
            Payload::Other => CanonicalMap::new(),
        }
    }

    /// The reply as a JSON object, regardless of shape.
    pub fn to_json(&self) -> WebPayload {
        match &self.payload {
            Payload::Web(map) => map.clone(),
            _ => Codec::current().encode_web(&self.to_canonical()),
        }
    }
}

/// Reply bodies are only printed in the debug environment.
impl fmt::Display for BridgeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if settings::is_debug_env() {
            write!(f, "{}", Value::Object(self.to_json()))
        } else {
            Ok(())
        }
    }
}
