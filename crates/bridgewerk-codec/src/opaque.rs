// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Best-effort expansion of opaque runtime values.
//
// Only the `dataType` tag decides how a wrapper is read. Parse and
// serialize failures are swallowed and degrade to the empty value.

use serde_json::Value;
use tracing::debug;

use bridgewerk_core::value::{CanonicalMap, CanonicalValue, OpaqueKind, OpaqueRaw, OpaqueValue};

use crate::Codec;

/// Object form of an opaque value.
///
/// `String`-tagged text is parsed as a JSON object; `Structured` wrappers
/// yield their map. Every other combination is the empty map.
pub fn to_object(value: &OpaqueValue, codec: &Codec) -> CanonicalMap {
    match (&value.kind, &value.raw) {
        (OpaqueKind::String, OpaqueRaw::Text(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => codec.decode_web(&map),
            Ok(_) => CanonicalMap::new(),
            Err(e) => {
                debug!(error = %e, "opaque text is not a JSON object");
                CanonicalMap::new()
            }
        },
        (OpaqueKind::Structured, OpaqueRaw::Map(map)) => map.clone(),
        _ => CanonicalMap::new(),
    }
}

/// Flat string form of an opaque value.
///
/// `String`-tagged text is returned as is; `Structured` wrappers are
/// serialized to JSON. Every other combination is the empty string.
pub fn stringify(value: &OpaqueValue, codec: &Codec) -> String {
    match (&value.kind, &value.raw) {
        (OpaqueKind::String, OpaqueRaw::Text(text)) => text.clone(),
        (OpaqueKind::Structured, OpaqueRaw::Map(map)) => {
            serde_json::to_string(&Value::Object(codec.encode_web(map))).unwrap_or_default()
        }
        _ => String::new(),
    }
}

/// Whether any value in the map (at any depth) is an opaque wrapper.
pub fn contains_opaque(map: &CanonicalMap) -> bool {
    map.values().any(value_contains_opaque)
}

fn value_contains_opaque(value: &CanonicalValue) -> bool {
    match value {
        CanonicalValue::Opaque(_) => true,
        CanonicalValue::Map(m) => contains_opaque(m),
        CanonicalValue::List(items) => items.iter().any(value_contains_opaque),
        _ => false,
    }
}
