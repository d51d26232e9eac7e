// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reply codes and well-known reply keys.
//
// Every reply delivered to a runtime has the shape `{code, msg, data}`.
// Zero is success; the negative codes below are reserved by the dispatch
// layer. Methods are free to use any other value for their own failures.

/// Reply key holding the numeric code.
pub const KEY_CODE: &str = "code";
/// Reply key holding the human-readable message.
pub const KEY_MSG: &str = "msg";
/// Reply key holding the result payload (also the argument wrapper key).
pub const KEY_DATA: &str = "data";
/// Result key whose map is forwarded verbatim by methods that opt in.
pub const KEY_ORIGINAL_RESULT: &str = "originalResult";

// -- Fixed sentinels --

pub const SUCCESS: i32 = 0;
pub const PERMISSION_DENIED: i32 = -1;
pub const NOT_FOUND: i32 = -2;

// -- Dispatch layer --

pub const INVALID_PARAM: i32 = -3;
pub const INVALID_RESULT: i32 = -5;
pub const UNAUTHORIZED_ACCESS: i32 = -6;
pub const CANCELLED: i32 = -7;
pub const OPERATION_TIMEOUT: i32 = -8;
pub const RESOURCE_NOT_FOUND: i32 = -9;
pub const INTERCEPTED: i32 = -10;
pub const RELEASED: i32 = -13;
pub const UNKNOWN_ERROR: i32 = -1000;
pub const NETWORK_UNREACHABLE: i32 = -1001;
pub const NETWORK_TIMEOUT: i32 = -1002;
pub const MALFORMED_RESPONSE: i32 = -1003;
pub const PERMISSION_NOT_DECLARED: i32 = -1128;
pub const PARAM_MODEL_ERROR: i32 = -2000;
pub const ILLEGAL_OPERATION: i32 = -2001;

// -- Fixed messages --

pub const SUCCESS_MSG: &str = "Success";
pub const NOT_FOUND_MSG: &str = "The JSBridge method is not found, please register";
pub const PERMISSION_DENIED_MSG: &str = "The URL is not authorized to call this JSBridge method";
pub const RELEASED_MSG: &str = "Bridge is released, please check it with container's owner.";
pub const INTERCEPTED_MSG: &str = "intercepted by lifeClient";

/// Codes that indicate a fault in the dispatch layer itself rather than an
/// ordinary business failure. Only these are forwarded to error reporting.
const REPORTABLE: [i32; 9] = [
    NOT_FOUND,
    INVALID_PARAM,
    INVALID_RESULT,
    UNKNOWN_ERROR,
    PERMISSION_NOT_DECLARED,
    PARAM_MODEL_ERROR,
    ILLEGAL_OPERATION,
    INTERCEPTED,
    RELEASED,
];

/// Whether a reply with this code should reach the error reporter.
pub fn is_reportable(code: i32) -> bool {
    REPORTABLE.contains(&code)
}

/// Short label used in log lines and error reports.
pub fn describe(code: i32) -> &'static str {
    match code {
        SUCCESS => "success",
        PERMISSION_DENIED => "permission denied",
        NOT_FOUND => "method not found",
        INVALID_PARAM => "invalid parameter",
        INVALID_RESULT => "invalid result",
        UNAUTHORIZED_ACCESS => "unauthorized access",
        CANCELLED => "cancelled",
        OPERATION_TIMEOUT => "operation timeout",
        RESOURCE_NOT_FOUND => "resource not found",
        INTERCEPTED => "intercepted",
        RELEASED => "bridge released",
        UNKNOWN_ERROR => "unknown error",
        NETWORK_UNREACHABLE => "network unreachable",
        NETWORK_TIMEOUT => "network timeout",
        MALFORMED_RESPONSE => "malformed response",
        PERMISSION_NOT_DECLARED => "permission not declared",
        PARAM_MODEL_ERROR => "parameter model error",
        ILLEGAL_OPERATION => "illegal operation",
        _ => "method-defined",
    }
}
