// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `storage.*` bridge methods over the host key/value store.

use std::sync::Arc;

use bridgewerk_bridge::{BridgeMethod, Completion, FieldKind, FieldSpec, MethodHandle, ParamModel};
use bridgewerk_codec::Codec;
use bridgewerk_core::error::{BridgeError, Result};
use bridgewerk_core::types::PlatformScope;
use bridgewerk_core::value::{CanonicalMap, CanonicalValue, MapBuilder, MapExt};

use crate::services::storage::KeyValueStore;

static SET_ITEM_PARAMS: &[FieldSpec] = &[
    FieldSpec::required("key", FieldKind::String),
    FieldSpec::required("data", FieldKind::Any),
];

static KEY_PARAMS: &[FieldSpec] = &[FieldSpec::required("key", FieldKind::String)];

/// Typed view over `storage.setItem` arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct SetItemParams {
    pub key: String,
    pub data: CanonicalValue,
}

impl ParamModel for SetItemParams {
    fn from_canonical(params: &CanonicalMap) -> Result<Self> {
        let key = params
            .get_str("key")
            .ok_or_else(|| BridgeError::ParamModel("key is not a string".into()))?;
        let data = params
            .get("data")
            .cloned()
            .ok_or_else(|| BridgeError::ParamModel("data is absent".into()))?;
        Ok(Self {
            key: key.to_string(),
            data,
        })
    }
}

pub struct SetItem {
    store: Arc<KeyValueStore>,
}

impl BridgeMethod for SetItem {
    fn name(&self) -> &str {
        "storage.setItem"
    }

    fn param_fields(&self) -> Option<&'static [FieldSpec]> {
        Some(SET_ITEM_PARAMS)
    }

    fn handle(&self, params: CanonicalMap, completion: Completion, _scope: PlatformScope) -> Result<()> {
        let params = SetItemParams::from_canonical(&params)?;
        let value = Codec::current().encode_web_value(&params.data);
        self.store.set(&params.key, value)?;
        completion.success(CanonicalMap::new());
        Ok(())
    }
}

pub struct GetItem {
    store: Arc<KeyValueStore>,
}

impl BridgeMethod for GetItem {
    fn name(&self) -> &str {
        "storage.getItem"
    }

    fn param_fields(&self) -> Option<&'static [FieldSpec]> {
        Some(KEY_PARAMS)
    }

    fn handle(&self, params: CanonicalMap, completion: Completion, _scope: PlatformScope) -> Result<()> {
        let key = params.get_str("key").unwrap_or_default();
        let data = self
            .store
            .get(key)
            .map(|v| Codec::current().decode_web_value(&v))
            .unwrap_or(CanonicalValue::Null);
        completion.success(MapBuilder::new().put("data", data).build());
        Ok(())
    }
}

pub struct RemoveItem {
    store: Arc<KeyValueStore>,
}

impl BridgeMethod for RemoveItem {
    fn name(&self) -> &str {
        "storage.removeItem"
    }

    fn param_fields(&self) -> Option<&'static [FieldSpec]> {
        Some(KEY_PARAMS)
    }

    fn handle(&self, params: CanonicalMap, completion: Completion, _scope: PlatformScope) -> Result<()> {
        let key = params.get_str("key").unwrap_or_default();
        let existed = self.store.remove(key)?;
        completion.success(MapBuilder::new().put("existed", existed).build());
        Ok(())
    }
}

/// Handles for every storage method, sharing `store`.
pub fn handles(store: &Arc<KeyValueStore>) -> Vec<MethodHandle> {
    let set = Arc::clone(store);
    let get = Arc::clone(store);
    let remove = Arc::clone(store);
    vec![
        MethodHandle::from_fn("storage.setItem", move || SetItem {
            store: Arc::clone(&set),
        }),
        MethodHandle::from_fn("storage.getItem", move || GetItem {
            store: Arc::clone(&get),
        }),
        MethodHandle::from_fn("storage.removeItem", move || RemoveItem {
            store: Arc::clone(&remove),
        }),
    ]
}
