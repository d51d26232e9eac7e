// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Payload codecs.
//
// Converts between the canonical map and the two runtime payload shapes:
// the web view's JSON object and the Lynx platform map. Both directions
// consult the same `Codec` value, so the numeric-fidelity policy is
// identical for decode and encode within one call.

pub mod lynx;
pub mod opaque;
pub mod web;

use bridgewerk_core::settings::{self, NumericPolicy};

pub use lynx::{LynxMap, LynxValue};
pub use web::WebPayload;

/// Conversion parameters for one encode/decode pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Codec {
    /// How 64-bit integers are encoded.
    pub policy: NumericPolicy,
    /// Carry opaque runtime values through decode untouched instead of
    /// expanding them.
    pub preserve_opaque: bool,
}

impl Codec {
    /// Codec reflecting the process-wide settings at this instant.
    pub fn current() -> Self {
        Self::with_policy(settings::numeric_policy())
    }

    pub fn with_policy(policy: NumericPolicy) -> Self {
        Self {
            policy,
            preserve_opaque: false,
        }
    }

    pub fn preserving_opaque(mut self) -> Self {
        self.preserve_opaque = true;
        self
    }
}
