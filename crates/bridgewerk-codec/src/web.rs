// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Web payload codec (JSON object <-> canonical map).

use serde_json::{Map, Number, Value};
use tracing::debug;

use bridgewerk_core::error::{BridgeError, Result};
use bridgewerk_core::settings::NumericPolicy;
use bridgewerk_core::value::{CanonicalMap, CanonicalValue};

use crate::{Codec, opaque};

/// Web runtime payload: a JSON object.
pub type WebPayload = Map<String, Value>;

/// Parse JSON text sent by a web view. Anything but an object is rejected.
pub fn parse(text: &str) -> Result<WebPayload> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(BridgeError::InvalidInput(format!(
            "expected a JSON object payload, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Codec {
    /// JSON object to canonical map.
    pub fn decode_web(&self, payload: &WebPayload) -> CanonicalMap {
        payload
            .iter()
            .map(|(k, v)| (k.clone(), self.decode_web_value(v)))
            .collect()
    }

    /// Integers that fit in 32 bits become `Int`, wider ones `Long`.
    /// Unsigned values beyond `i64` can only be represented as `Double`.
    pub fn decode_web_value(&self, value: &Value) -> CanonicalValue {
        match value {
            Value::Null => CanonicalValue::Null,
            Value::Bool(b) => CanonicalValue::Bool(*b),
            Value::Number(n) => decode_number(n),
            Value::String(s) => CanonicalValue::String(s.clone()),
            Value::Array(items) => {
                CanonicalValue::List(items.iter().map(|v| self.decode_web_value(v)).collect())
            }
            Value::Object(map) => CanonicalValue::Map(self.decode_web(map)),
        }
    }

    /// Canonical map to JSON object, applying the numeric-fidelity policy.
    pub fn encode_web(&self, map: &CanonicalMap) -> WebPayload {
        map.iter()
            .map(|(k, v)| (k.clone(), self.encode_web_value(v)))
            .collect()
    }

    pub fn encode_web_value(&self, value: &CanonicalValue) -> Value {
        match value {
            CanonicalValue::Null => Value::Null,
            CanonicalValue::Bool(b) => Value::Bool(*b),
            CanonicalValue::Int(i) => Value::Number(Number::from(*i)),
            CanonicalValue::Long(l) => match self.policy {
                NumericPolicy::PreserveLong => Value::Number(Number::from(*l)),
                NumericPolicy::LongAsDouble => float(*l as f64),
            },
            CanonicalValue::Double(d) => float(*d),
            CanonicalValue::String(s) => Value::String(s.clone()),
            CanonicalValue::List(items) => {
                Value::Array(items.iter().map(|v| self.encode_web_value(v)).collect())
            }
            CanonicalValue::Map(m) => Value::Object(self.encode_web(m)),
            // JSON has no slot for a wrapper; send its flat string form.
            CanonicalValue::Opaque(o) => Value::String(opaque::stringify(o, self)),
        }
    }
}

fn decode_number(n: &Number) -> CanonicalValue {
    if let Some(i) = n.as_i64() {
        return match i32::try_from(i) {
            Ok(small) => CanonicalValue::Int(small),
            Err(_) => CanonicalValue::Long(i),
        };
    }
    CanonicalValue::Double(n.as_f64().unwrap_or(f64::NAN))
}

/// JSON cannot carry NaN or infinities; those become `null`.
fn float(f: f64) -> Value {
    match Number::from_f64(f) {
        Some(n) => Value::Number(n),
        None => {
            debug!(value = f, "non-finite double encoded as null");
            Value::Null
        }
    }
}
