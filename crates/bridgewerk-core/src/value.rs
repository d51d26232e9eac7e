// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Canonical Value Model.
//
// Every payload crossing the bridge is converted to and from this
// representation. Native method implementations only ever see
// `CanonicalMap`; the codecs own the runtime-specific shapes.

use std::collections::BTreeMap;
use std::fmt;

/// String-keyed map of canonical values. Keys are unique by construction.
pub type CanonicalMap = BTreeMap<String, CanonicalValue>;

/// Recursive value type shared by all payload shapes.
#[derive(Debug, Clone)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    List(Vec<CanonicalValue>),
    Map(CanonicalMap),
    /// A runtime value carried through untouched (binary wrappers and the
    /// like). Only produced when a codec runs in preserve-opaque mode.
    Opaque(OpaqueValue),
}

/// Tag describing what an opaque wrapper holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpaqueKind {
    /// Raw JSON text.
    String,
    /// A native map.
    Structured,
    /// Any other runtime tag (the numeric tag is kept for diagnostics).
    Other(i32),
}

/// Storage behind an opaque wrapper. The kind tag and the storage are
/// independent, so a mismatched pair is representable and must degrade.
#[derive(Debug, Clone, PartialEq)]
pub enum OpaqueRaw {
    Text(String),
    Map(CanonicalMap),
    Bytes(Vec<u8>),
    Empty,
}

/// Opaque runtime value keyed by a `dataType` tag.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueValue {
    pub kind: OpaqueKind,
    pub raw: OpaqueRaw,
}

impl OpaqueValue {
    pub fn new(kind: OpaqueKind, raw: OpaqueRaw) -> Self {
        Self { kind, raw }
    }

    /// A `String`-tagged wrapper around JSON text.
    pub fn text(json: impl Into<String>) -> Self {
        Self::new(OpaqueKind::String, OpaqueRaw::Text(json.into()))
    }

    /// A `Structured`-tagged wrapper around a native map.
    pub fn structured(map: CanonicalMap) -> Self {
        Self::new(OpaqueKind::Structured, OpaqueRaw::Map(map))
    }
}

/// Numeric view used for cross-variant equality.
#[derive(Clone, Copy)]
enum Numeric {
    Integral(i64),
    Float(f64),
}

impl CanonicalValue {
    /// Default stringification for host values the model has no slot for.
    pub fn stringified(value: impl fmt::Display) -> Self {
        CanonicalValue::String(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CanonicalValue::Null)
    }

    /// Name of the variant, used in validation messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            CanonicalValue::Null => "null",
            CanonicalValue::Bool(_) => "boolean",
            CanonicalValue::Int(_) => "int",
            CanonicalValue::Long(_) => "long",
            CanonicalValue::Double(_) => "double",
            CanonicalValue::String(_) => "string",
            CanonicalValue::List(_) => "list",
            CanonicalValue::Map(_) => "map",
            CanonicalValue::Opaque(_) => "opaque",
        }
    }

    pub fn is_number(&self) -> bool {
        self.numeric().is_some()
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CanonicalValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CanonicalValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral view. Doubles qualify only when they hold an exact integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self.numeric()? {
            Numeric::Integral(i) => Some(i),
            Numeric::Float(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => Some(f as i64),
            Numeric::Float(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.numeric()? {
            Numeric::Integral(i) => Some(i as f64),
            Numeric::Float(f) => Some(f),
        }
    }

    pub fn as_map(&self) -> Option<&CanonicalMap> {
        match self {
            CanonicalValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CanonicalValue]> {
        match self {
            CanonicalValue::List(l) => Some(l),
            _ => None,
        }
    }

    fn numeric(&self) -> Option<Numeric> {
        match self {
            CanonicalValue::Int(i) => Some(Numeric::Integral(i64::from(*i))),
            CanonicalValue::Long(l) => Some(Numeric::Integral(*l)),
            CanonicalValue::Double(d) => Some(Numeric::Float(*d)),
            _ => None,
        }
    }
}

/// Value equality. Numbers compare by value across `Int`, `Long` and
/// `Double`, so `Int(5) == Long(5) == Double(5.0)`.
impl PartialEq for CanonicalValue {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.numeric(), other.numeric()) {
            return match (a, b) {
                (Numeric::Integral(a), Numeric::Integral(b)) => a == b,
                (Numeric::Float(a), Numeric::Float(b)) => a == b,
                (Numeric::Integral(i), Numeric::Float(f))
                | (Numeric::Float(f), Numeric::Integral(i)) => {
                    f.fract() == 0.0 && (i as f64) == f && (f as i64) == i
                }
            };
        }
        match (self, other) {
            (CanonicalValue::Null, CanonicalValue::Null) => true,
            (CanonicalValue::Bool(a), CanonicalValue::Bool(b)) => a == b,
            (CanonicalValue::String(a), CanonicalValue::String(b)) => a == b,
            (CanonicalValue::List(a), CanonicalValue::List(b)) => a == b,
            (CanonicalValue::Map(a), CanonicalValue::Map(b)) => a == b,
            (CanonicalValue::Opaque(a), CanonicalValue::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for CanonicalValue {
    fn from(v: bool) -> Self {
        CanonicalValue::Bool(v)
    }
}

impl From<i32> for CanonicalValue {
    fn from(v: i32) -> Self {
        CanonicalValue::Int(v)
    }
}

impl From<i64> for CanonicalValue {
    fn from(v: i64) -> Self {
        CanonicalValue::Long(v)
    }
}

impl From<f64> for CanonicalValue {
    fn from(v: f64) -> Self {
        CanonicalValue::Double(v)
    }
}

/// 32-bit floats are always widened.
impl From<f32> for CanonicalValue {
    fn from(v: f32) -> Self {
        CanonicalValue::Double(f64::from(v))
    }
}

impl From<&str> for CanonicalValue {
    fn from(v: &str) -> Self {
        CanonicalValue::String(v.to_string())
    }
}

impl From<String> for CanonicalValue {
    fn from(v: String) -> Self {
        CanonicalValue::String(v)
    }
}

impl From<Vec<CanonicalValue>> for CanonicalValue {
    fn from(v: Vec<CanonicalValue>) -> Self {
        CanonicalValue::List(v)
    }
}

impl From<CanonicalMap> for CanonicalValue {
    fn from(v: CanonicalMap) -> Self {
        CanonicalValue::Map(v)
    }
}

impl From<OpaqueValue> for CanonicalValue {
    fn from(v: OpaqueValue) -> Self {
        CanonicalValue::Opaque(v)
    }
}

impl<T: Into<CanonicalValue>> From<Option<T>> for CanonicalValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(CanonicalValue::Null, Into::into)
    }
}

// ---------------------------------------------------------------------------
// Typed accessors
// ---------------------------------------------------------------------------

/// Typed getters over a canonical map.
pub trait MapExt {
    fn get_str(&self, key: &str) -> Option<&str>;
    fn get_i64(&self, key: &str) -> Option<i64>;
    fn get_f64(&self, key: &str) -> Option<f64>;
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_map(&self, key: &str) -> Option<&CanonicalMap>;
    fn get_list(&self, key: &str) -> Option<&[CanonicalValue]>;
}

impl MapExt for CanonicalMap {
    fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(CanonicalValue::as_str)
    }

    fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(CanonicalValue::as_i64)
    }

    fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(CanonicalValue::as_f64)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(CanonicalValue::as_bool)
    }

    fn get_map(&self, key: &str) -> Option<&CanonicalMap> {
        self.get(key).and_then(CanonicalValue::as_map)
    }

    fn get_list(&self, key: &str) -> Option<&[CanonicalValue]> {
        self.get(key).and_then(CanonicalValue::as_list)
    }
}

/// Builder for canonical maps (typed setters).
#[derive(Debug, Default, Clone)]
pub struct MapBuilder {
    map: CanonicalMap,
}

impl MapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(mut self, key: impl Into<String>, value: impl Into<CanonicalValue>) -> Self {
        self.map.insert(key.into(), value.into());
        self
    }

    /// Insert only when `value` is present; absent values leave no key.
    pub fn put_opt<V: Into<CanonicalValue>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.put(key, v),
            None => self,
        }
    }

    pub fn build(self) -> CanonicalMap {
        self.map
    }
}
