// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lynx payload codec (platform map <-> canonical map).
//
// The Lynx runtime hands over a typed key/value map with separate 32-bit
// float and 64-bit integer slots, binary/JSON wrappers, and occasionally
// host objects the bridge cannot interpret.

use std::collections::BTreeMap;

use bridgewerk_core::settings::NumericPolicy;
use bridgewerk_core::value::{CanonicalMap, CanonicalValue, OpaqueValue};

use crate::{Codec, opaque};

/// Lynx runtime payload.
pub type LynxMap = BTreeMap<String, LynxValue>;

/// A value inside a Lynx platform map.
#[derive(Debug, Clone, PartialEq)]
pub enum LynxValue {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Array(Vec<LynxValue>),
    Map(LynxMap),
    /// Tagged wrapper (`dataType` + raw storage).
    Opaque(OpaqueValue),
    /// Host object with no payload representation.
    Foreign { type_name: String, repr: String },
}

impl Codec {
    /// Lynx map to canonical map.
    pub fn decode_lynx(&self, payload: &LynxMap) -> CanonicalMap {
        payload
            .iter()
            .map(|(k, v)| (k.clone(), self.decode_lynx_value(v)))
            .collect()
    }

    /// Floats are widened. Opaque wrappers expand to their object form
    /// unless the codec preserves them; host objects become `Null` (or
    /// their string form when preserving).
    pub fn decode_lynx_value(&self, value: &LynxValue) -> CanonicalValue {
        match value {
            LynxValue::Null => CanonicalValue::Null,
            LynxValue::Bool(b) => CanonicalValue::Bool(*b),
            LynxValue::Int(i) => CanonicalValue::Int(*i),
            LynxValue::Long(l) => CanonicalValue::Long(*l),
            LynxValue::Float(f) => CanonicalValue::Double(f64::from(*f)),
            LynxValue::Double(d) => CanonicalValue::Double(*d),
            LynxValue::String(s) => CanonicalValue::String(s.clone()),
            LynxValue::Array(items) => {
                CanonicalValue::List(items.iter().map(|v| self.decode_lynx_value(v)).collect())
            }
            LynxValue::Map(m) => CanonicalValue::Map(self.decode_lynx(m)),
            LynxValue::Opaque(o) if self.preserve_opaque => CanonicalValue::Opaque(o.clone()),
            LynxValue::Opaque(o) => CanonicalValue::Map(opaque::to_object(o, self)),
            LynxValue::Foreign { repr, .. } if self.preserve_opaque => {
                CanonicalValue::String(repr.clone())
            }
            LynxValue::Foreign { .. } => CanonicalValue::Null,
        }
    }

    /// Canonical map to Lynx map, applying the numeric-fidelity policy.
    pub fn encode_lynx(&self, map: &CanonicalMap) -> LynxMap {
        map.iter()
            .map(|(k, v)| (k.clone(), self.encode_lynx_value(v)))
            .collect()
    }

    pub fn encode_lynx_value(&self, value: &CanonicalValue) -> LynxValue {
        match value {
            CanonicalValue::Null => LynxValue::Null,
            CanonicalValue::Bool(b) => LynxValue::Bool(*b),
            CanonicalValue::Int(i) => LynxValue::Int(*i),
            CanonicalValue::Long(l) => match self.policy {
                NumericPolicy::PreserveLong => LynxValue::Long(*l),
                NumericPolicy::LongAsDouble => LynxValue::Double(*l as f64),
            },
            CanonicalValue::Double(d) => LynxValue::Double(*d),
            CanonicalValue::String(s) => LynxValue::String(s.clone()),
            CanonicalValue::List(items) => {
                LynxValue::Array(items.iter().map(|v| self.encode_lynx_value(v)).collect())
            }
            CanonicalValue::Map(m) => LynxValue::Map(self.encode_lynx(m)),
            CanonicalValue::Opaque(o) => LynxValue::Opaque(o.clone()),
        }
    }
}

/// Read a `code` entry from a Lynx reply map.
pub fn reply_code(map: &LynxMap) -> Option<i32> {
    match map.get(bridgewerk_core::codes::KEY_CODE)? {
        LynxValue::Int(i) => Some(*i),
        LynxValue::Long(l) => i32::try_from(*l).ok(),
        LynxValue::Double(d) if d.fract() == 0.0 => Some(*d as i32),
        _ => None,
    }
}
