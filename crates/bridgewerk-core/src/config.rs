// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.
//
// Loaded from a JSON file or from `BRIDGEWERK_*` environment variables and
// installed into the process-wide `settings` module with `apply()`.

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{BridgeError, Result};
use crate::settings::{self, NumericPolicy};

/// Persistent bridge settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Encode 64-bit integers as integers instead of doubles.
    pub preserve_long: bool,
    /// Enable verbose per-call diagnostics.
    pub debug_env: bool,
    /// Methods whose failures are never reported.
    pub error_report_block_list: Vec<String>,
    /// Extra fields attached to not-found error reports.
    pub report_extensions: BTreeMap<String, String>,
    /// Background executor sizing.
    pub executor: ExecutorConfig,
}

/// Sizing for the background executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Upper bound on parallel (blocking) threads. `None` means half the
    /// available cores, at least one.
    pub parallel_threads: Option<usize>,
    /// Seconds an idle parallel thread lingers before exiting.
    pub idle_timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            parallel_threads: None,
            idle_timeout_secs: 60,
        }
    }
}

impl ExecutorConfig {
    /// Effective parallel pool size.
    pub fn parallel_threads(&self) -> usize {
        self.parallel_threads.unwrap_or_else(|| {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            (cores / 2).max(1)
        })
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            preserve_long: false,
            debug_env: false,
            error_report_block_list: Vec::new(),
            report_extensions: BTreeMap::new(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl BridgeConfig {
    /// Read a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by `BRIDGEWERK_PRESERVE_LONG`, `BRIDGEWERK_DEBUG`
    /// and `BRIDGEWERK_REPORT_BLOCK_LIST` (comma separated).
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(v) = env_flag("BRIDGEWERK_PRESERVE_LONG") {
            config.preserve_long = v;
        }
        if let Some(v) = env_flag("BRIDGEWERK_DEBUG") {
            config.debug_env = v;
        }
        if let Ok(list) = env::var("BRIDGEWERK_REPORT_BLOCK_LIST") {
            config.error_report_block_list = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        config
    }

    /// Reject values the executor cannot honour.
    pub fn validate(&self) -> Result<()> {
        if self.executor.parallel_threads == Some(0) {
            return Err(BridgeError::Config(
                "executor.parallel_threads must be greater than 0".into(),
            ));
        }
        if self.error_report_block_list.iter().any(|n| n.trim().is_empty()) {
            return Err(BridgeError::Config(
                "error_report_block_list contains an empty method name".into(),
            ));
        }
        Ok(())
    }

    /// Install into the process-wide settings.
    pub fn apply(&self) {
        settings::set_numeric_policy(self.numeric_policy());
        settings::set_debug_env(self.debug_env);
        settings::set_report_block_list(self.error_report_block_list.iter().cloned());
        settings::set_report_extensions(self.report_extensions.clone());
        info!(
            preserve_long = self.preserve_long,
            debug = self.debug_env,
            blocked = self.error_report_block_list.len(),
            "bridge settings applied"
        );
    }

    pub fn numeric_policy(&self) -> NumericPolicy {
        if self.preserve_long {
            NumericPolicy::PreserveLong
        } else {
            NumericPolicy::LongAsDouble
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    let raw = env::var(name).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
