// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Process-wide bridge settings.
//
// These toggles are read on every encode/decode and every failed reply.
// Writers should flip them at startup (see `BridgeConfig::apply`), not while
// calls that expect a stable numeric policy are in flight.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

/// How 64-bit integers are written by the encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericPolicy {
    /// Legacy web behaviour: 64-bit integers become doubles.
    #[default]
    LongAsDouble,
    /// 64-bit integers stay integral (no loss above 2^53).
    PreserveLong,
}

static PRESERVE_LONG: AtomicBool = AtomicBool::new(false);
static DEBUG_ENV: AtomicBool = AtomicBool::new(false);

static REPORT_BLOCK_LIST: Lazy<RwLock<HashSet<String>>> =
    Lazy::new(|| RwLock::new(HashSet::new()));

static REPORT_EXTENSIONS: Lazy<RwLock<BTreeMap<String, String>>> =
    Lazy::new(|| RwLock::new(BTreeMap::new()));

/// Current numeric-fidelity policy.
pub fn numeric_policy() -> NumericPolicy {
    if PRESERVE_LONG.load(Ordering::Acquire) {
        NumericPolicy::PreserveLong
    } else {
        NumericPolicy::LongAsDouble
    }
}

pub fn set_numeric_policy(policy: NumericPolicy) {
    PRESERVE_LONG.store(policy == NumericPolicy::PreserveLong, Ordering::Release);
}

/// Whether verbose diagnostics are enabled.
pub fn is_debug_env() -> bool {
    DEBUG_ENV.load(Ordering::Relaxed)
}

pub fn set_debug_env(enabled: bool) {
    DEBUG_ENV.store(enabled, Ordering::Relaxed);
}

/// Replace the list of methods whose failures are never reported.
pub fn set_report_block_list<I, S>(names: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    *REPORT_BLOCK_LIST.write() = names.into_iter().map(Into::into).collect();
}

pub fn is_report_blocked(method: &str) -> bool {
    REPORT_BLOCK_LIST.read().contains(method)
}

/// Extra key/value pairs attached to not-found reports.
pub fn set_report_extensions(extensions: BTreeMap<String, String>) {
    *REPORT_EXTENSIONS.write() = extensions;
}

pub fn report_extensions() -> BTreeMap<String, String> {
    REPORT_EXTENSIONS.read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_is_long_as_double() {
        assert_eq!(NumericPolicy::default(), NumericPolicy::LongAsDouble);
    }

    #[test]
    fn block_list_matches_exact_names() {
        set_report_block_list(["settings.blocked.probe"]);
        assert!(is_report_blocked("settings.blocked.probe"));
        assert!(!is_report_blocked("settings.blocked"));
        set_report_block_list(Vec::<String>::new());
        assert!(!is_report_blocked("settings.blocked.probe"));
    }
}
