// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridgewerk: canonical values, reply codes, errors and settings shared
// across all crates.

pub mod codes;
pub mod config;
pub mod error;
pub mod settings;
pub mod types;
pub mod value;

pub use config::{BridgeConfig, ExecutorConfig};
pub use error::{BridgeError, Result};
pub use settings::NumericPolicy;
pub use types::*;
pub use value::{CanonicalMap, CanonicalValue, MapBuilder, MapExt, OpaqueKind, OpaqueRaw, OpaqueValue};
