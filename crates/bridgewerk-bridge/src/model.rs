// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Model adapter: statically declared parameter/result fields.
//
// Methods describe their arguments and results as `FieldSpec` tables. The
// processor fills defaults, enforces required keys, types and enum options
// on the canonical map, and typed models read from it via `ParamModel`.

use bridgewerk_core::error::{BridgeError, Result};
use bridgewerk_core::value::{CanonicalMap, CanonicalValue};

/// Declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Number,
    Bool,
    List,
    Map,
    Any,
}

impl FieldKind {
    fn label(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Bool => "boolean",
            FieldKind::List => "list",
            FieldKind::Map => "map",
            FieldKind::Any => "any",
        }
    }

    fn accepts(self, value: &CanonicalValue) -> bool {
        match self {
            FieldKind::String => matches!(value, CanonicalValue::String(_)),
            FieldKind::Number => value.is_number(),
            FieldKind::Bool => matches!(value, CanonicalValue::Bool(_)),
            FieldKind::List => matches!(value, CanonicalValue::List(_)),
            FieldKind::Map => matches!(value, CanonicalValue::Map(_)),
            FieldKind::Any => true,
        }
    }
}

/// Value filled in when an optional field is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Str(&'static str),
    Int(i64),
    Double(f64),
    Bool(bool),
}

impl DefaultValue {
    fn to_value(self) -> CanonicalValue {
        match self {
            DefaultValue::Str(s) => CanonicalValue::from(s),
            DefaultValue::Int(i) => match i32::try_from(i) {
                Ok(small) => CanonicalValue::Int(small),
                Err(_) => CanonicalValue::Long(i),
            },
            DefaultValue::Double(d) => CanonicalValue::Double(d),
            DefaultValue::Bool(b) => CanonicalValue::Bool(b),
        }
    }
}

/// One declared field of a parameter or result model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<DefaultValue>,
    pub string_options: Option<&'static [&'static str]>,
    pub int_options: Option<&'static [i64]>,
}

impl FieldSpec {
    pub const fn required(key: &'static str, kind: FieldKind) -> Self {
        Self {
            key,
            kind,
            required: true,
            default: None,
            string_options: None,
            int_options: None,
        }
    }

    pub const fn optional(key: &'static str, kind: FieldKind) -> Self {
        Self {
            required: false,
            ..Self::required(key, kind)
        }
    }

    pub const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// Restrict a string field to a fixed set of values.
    pub const fn one_of(mut self, options: &'static [&'static str]) -> Self {
        self.string_options = Some(options);
        self
    }

    /// Restrict a numeric field to a fixed set of integers.
    pub const fn one_of_ints(mut self, options: &'static [i64]) -> Self {
        self.int_options = Some(options);
        self
    }
}

/// Fill defaults and validate `params` in place.
pub fn apply_param_fields(fields: &[FieldSpec], params: &mut CanonicalMap) -> Result<()> {
    for field in fields {
        let absent = params.get(field.key).is_none_or(CanonicalValue::is_null);
        if absent {
            if let Some(default) = field.default {
                params.insert(field.key.to_string(), default.to_value());
            }
        }
    }
    check(fields, params, "param", "input", BridgeError::InvalidInput)
}

/// Validate a method's result map.
pub fn check_result_fields(fields: &[FieldSpec], result: &CanonicalMap) -> Result<()> {
    check(fields, result, "result", "output", BridgeError::InvalidOutput)
}

fn check(
    fields: &[FieldSpec],
    map: &CanonicalMap,
    role: &str,
    side: &str,
    error: fn(String) -> BridgeError,
) -> Result<()> {
    for field in fields {
        let value = match map.get(field.key) {
            Some(v) if !v.is_null() => v,
            _ if field.required => {
                return Err(error(format!("{} {role} is missing from {side}", field.key)));
            }
            _ => continue,
        };

        if !field.kind.accepts(value) {
            return Err(error(format!(
                "{} {role} has wrong declared type. expect {}, but {}",
                field.key,
                field.kind.label(),
                value.kind_name()
            )));
        }

        if let (Some(options), Some(s)) = (field.string_options, value.as_str()) {
            if !options.contains(&s) {
                return Err(error(format!(
                    "{} {role} has illegal value {s}, expect one of {options:?}",
                    field.key
                )));
            }
        }

        if let Some(options) = field.int_options {
            match value.as_i64() {
                Some(i) if options.contains(&i) => {}
                _ => {
                    return Err(error(format!(
                        "{} {role} has illegal value, expect one of {options:?}",
                        field.key
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Typed view over validated parameters.
pub trait ParamModel: Sized {
    fn from_canonical(params: &CanonicalMap) -> Result<Self>;
}

/// Typed result that knows its canonical form.
pub trait ResultModel {
    fn to_canonical_map(&self) -> CanonicalMap;
}

impl ResultModel for CanonicalMap {
    fn to_canonical_map(&self) -> CanonicalMap {
        self.clone()
    }
}
