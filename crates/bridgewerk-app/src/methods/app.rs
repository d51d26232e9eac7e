// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `app.*` bridge methods: host information and event echo.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use bridgewerk_bridge::{
    BridgeContext, BridgeMethod, Completion, ContextSlot, FieldKind, FieldSpec, MethodHandle,
    ResultModel,
};
use bridgewerk_core::error::{BridgeError, Result};
use bridgewerk_core::types::PlatformScope;
use bridgewerk_core::value::{CanonicalMap, MapBuilder, MapExt};

static INFO_RESULT: &[FieldSpec] = &[
    FieldSpec::required("appName", FieldKind::String),
    FieldSpec::required("version", FieldKind::String),
    FieldSpec::required("platform", FieldKind::String),
];

/// Reply of `app.info`.
#[derive(Debug, Clone)]
pub struct AppInfo {
    pub app_name: &'static str,
    pub version: &'static str,
    pub platform: PlatformScope,
    pub container_id: Option<String>,
    pub uptime_secs: i64,
}

impl ResultModel for AppInfo {
    fn to_canonical_map(&self) -> CanonicalMap {
        MapBuilder::new()
            .put("appName", self.app_name)
            .put("version", self.version)
            .put("platform", self.platform.to_string())
            .put_opt("containerId", self.container_id.clone())
            .put("uptimeSecs", self.uptime_secs)
            .build()
    }
}

pub struct Info {
    started_at: DateTime<Utc>,
    context: ContextSlot,
}

impl BridgeMethod for Info {
    fn name(&self) -> &str {
        "app.info"
    }

    fn result_fields(&self) -> Option<&'static [FieldSpec]> {
        Some(INFO_RESULT)
    }

    fn set_bridge_context(&self, context: &Arc<BridgeContext>) {
        self.context.set(context);
    }

    fn handle(&self, _params: CanonicalMap, completion: Completion, scope: PlatformScope) -> Result<()> {
        let info = AppInfo {
            app_name: "bridgewerk-demo",
            version: env!("CARGO_PKG_VERSION"),
            platform: scope,
            container_id: self.context.get().map(|c| c.container_id().to_string()),
            uptime_secs: (Utc::now() - self.started_at).num_seconds(),
        };
        completion.success(info.to_canonical_map());
        Ok(())
    }
}

static EMIT_PARAMS: &[FieldSpec] = &[
    FieldSpec::required("event", FieldKind::String),
    FieldSpec::optional("payload", FieldKind::Map),
];

/// Sends `payload` back into the container as event `event`.
#[derive(Default)]
pub struct Emit {
    context: ContextSlot,
}

impl BridgeMethod for Emit {
    fn name(&self) -> &str {
        "app.emit"
    }

    fn param_fields(&self) -> Option<&'static [FieldSpec]> {
        Some(EMIT_PARAMS)
    }

    fn set_bridge_context(&self, context: &Arc<BridgeContext>) {
        self.context.set(context);
    }

    fn handle(&self, params: CanonicalMap, completion: Completion, _scope: PlatformScope) -> Result<()> {
        let context = self
            .context
            .get()
            .ok_or_else(|| BridgeError::IllegalOperation("no bridge context attached".into()))?;
        let event = params.get_str("event").unwrap_or_default();
        let payload = params.get_map("payload").cloned().unwrap_or_default();
        let delivered = context.send_event(event, payload);
        completion.success(MapBuilder::new().put("delivered", delivered).build());
        Ok(())
    }
}

pub fn handles(started_at: DateTime<Utc>) -> Vec<MethodHandle> {
    vec![
        MethodHandle::from_fn("app.info", move || Info {
            started_at,
            context: ContextSlot::default(),
        }),
        MethodHandle::of::<Emit>(),
    ]
}
