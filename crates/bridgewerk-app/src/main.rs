// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridgewerk demo host.
//
// Entry point. Initialises logging, loads and applies the bridge settings,
// registers the demo methods and plays a few calls through a container
// bridge the way an embedded runtime would.

mod methods;
mod services;

use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{error, info, warn};

use bridgewerk_bridge::{Bridge, BridgeCall, BridgeExecutor, BridgeManager, BridgeResult};
use bridgewerk_codec::{LynxMap, LynxValue};
use bridgewerk_core::error::Result;
use bridgewerk_core::types::{ContainerId, PlatformScope, ThreadType};
use bridgewerk_core::BridgeConfig;

use services::app_services::AppServices;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Bridgewerk demo starting");

    if let Err(e) = run() {
        error!(error = %e, "demo failed");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let config = load_config()?;
    config.apply();

    let svc = match AppServices::init() {
        Ok(s) => {
            info!(data_dir = ?s.data_dir(), "app services initialised");
            s
        }
        Err(e) => {
            warn!(error = %e, "persistent storage failed, using in-memory fallback");
            AppServices::fallback()
        }
    };

    let manager = BridgeManager::shared();
    let store = svc.store();
    for handle in methods::storage::handles(&store) {
        manager.register_method(handle, PlatformScope::All, bridgewerk_core::DEFAULT_NAMESPACE);
    }

    let executor = Arc::new(BridgeExecutor::new(&config.executor)?);
    let bridge = Bridge::new(Arc::clone(&manager), ContainerId::new())
        .with_executor(Arc::clone(&executor));
    for handle in methods::app::handles(svc.started_at()) {
        bridge.register_method(handle, PlatformScope::All);
    }

    play(&bridge, BridgeCall::web("storage.setItem", object(json!({"key": "greeting", "data": "hello"}))));
    play(&bridge, BridgeCall::web("storage.getItem", object(json!({"key": "greeting"}))).with_thread_type(ThreadType::Io));
    play(&bridge, BridgeCall::web("storage.unknownOp", object(json!({"key": "greeting"}))));
    play(&bridge, BridgeCall::lynx("app.info", LynxMap::new()).with_thread_type(ThreadType::Serial));

    let mut args = LynxMap::new();
    args.insert("event".into(), LynxValue::String("ready".into()));
    let mut payload = LynxMap::new();
    payload.insert("data".into(), LynxValue::Map(args));
    play(&bridge, BridgeCall::lynx("app.emit", payload));

    bridge.release();
    drop(bridge);
    match Arc::try_unwrap(executor) {
        Ok(executor) => executor.shutdown(Duration::from_secs(2)),
        Err(_) => warn!("executor still shared, skipping shutdown"),
    }
    info!(items = store.len(), "Bridgewerk demo finished");
    Ok(())
}

/// `BRIDGEWERK_CONFIG` names a JSON file; otherwise settings come from the
/// environment.
fn load_config() -> Result<BridgeConfig> {
    match std::env::var("BRIDGEWERK_CONFIG") {
        Ok(path) => {
            info!(path = %path, "loading bridge config");
            BridgeConfig::load(path)
        }
        Err(_) => {
            let config = BridgeConfig::from_env();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Dispatch `call` and log its reply.
fn play(bridge: &Bridge, call: BridgeCall) {
    let name = call.bridge_name().to_string();
    let (tx, rx) = mpsc::channel::<BridgeResult>();
    bridge.call(call, move |reply| {
        let _ = tx.send(reply);
    });
    match rx.recv_timeout(Duration::from_secs(5)) {
        Ok(reply) => info!(
            method = %name,
            code = ?reply.code(),
            reply = %serde_json::Value::Object(reply.to_json()),
            "reply received"
        ),
        Err(_) => warn!(method = %name, "no reply within 5s"),
    }
}

fn object(value: Value) -> serde_json::Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    }
}
