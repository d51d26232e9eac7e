// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Error reporting for failed replies.
//
// Only a fixed set of codes is reported, methods on the configured block
// list never are, and not-found reports carry the configured extension
// fields.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use bridgewerk_core::codes;
use bridgewerk_core::settings;
use bridgewerk_core::types::{ContainerId, PlatformScope};

use crate::call::{BridgeCall, BridgeResult};

/// One failed call, as handed to an [`ErrorReporter`].
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorReport {
    pub method: String,
    pub code: i32,
    pub msg: String,
    pub url: String,
    pub container_id: ContainerId,
    pub platform: PlatformScope,
    pub extensions: BTreeMap<String, String>,
    pub at: DateTime<Utc>,
}

/// Telemetry sink for failed replies.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, report: &ErrorReport);
}

/// Default sink: one structured warning per report.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, report: &ErrorReport) {
        warn!(
            method = %report.method,
            code = report.code,
            reason = codes::describe(report.code),
            msg = %report.msg,
            url = %report.url,
            container_id = %report.container_id,
            platform = %report.platform,
            extensions = ?report.extensions,
            "bridge call failed"
        );
    }
}

/// Build the report for `result`, or `None` when it must not be reported.
pub fn build_report(
    call: &BridgeCall,
    result: &BridgeResult,
    container_id: &ContainerId,
) -> Option<ErrorReport> {
    let code = result.code()?;
    if code == codes::SUCCESS || !codes::is_reportable(code) {
        return None;
    }
    if settings::is_report_blocked(call.bridge_name()) {
        return None;
    }
    let extensions = if code == codes::NOT_FOUND {
        settings::report_extensions()
    } else {
        BTreeMap::new()
    };
    Some(ErrorReport {
        method: call.bridge_name().to_string(),
        code,
        msg: result.msg().unwrap_or_default(),
        url: call.url().to_string(),
        container_id: container_id.clone(),
        platform: call.platform(),
        extensions,
        at: Utc::now(),
    })
}
