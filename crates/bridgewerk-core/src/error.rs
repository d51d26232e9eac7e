// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Bridgewerk.

use thiserror::Error;

use crate::codes;

/// Top-level error type for all Bridgewerk operations.
///
/// Every variant maps onto a numeric reply code via [`BridgeError::code`], so
/// any failure raised between resolving a method and replying to the caller
/// can be folded into a `{code, msg}` reply.
#[derive(Debug, Error)]
pub enum BridgeError {
    // -- Call failures (surface as replies) --
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    InvalidOutput(String),

    #[error("{0}")]
    IllegalOperation(String),

    #[error("method not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("bridge has been released")]
    Released,

    #[error("call intercepted: {0}")]
    Intercepted(String),

    #[error("parameter model error: {0}")]
    ParamModel(String),

    #[error("{0}")]
    Unknown(String),

    // -- Runtime plumbing --
    #[error("executor error: {0}")]
    Executor(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    /// Reply code carried in the `code` field when this error terminates a call.
    pub fn code(&self) -> i32 {
        match self {
            BridgeError::InvalidInput(_) => codes::INVALID_PARAM,
            BridgeError::InvalidOutput(_) => codes::INVALID_RESULT,
            BridgeError::IllegalOperation(_) => codes::ILLEGAL_OPERATION,
            BridgeError::NotFound(_) => codes::NOT_FOUND,
            BridgeError::PermissionDenied(_) => codes::PERMISSION_DENIED,
            BridgeError::Released => codes::RELEASED,
            BridgeError::Intercepted(_) => codes::INTERCEPTED,
            BridgeError::ParamModel(_) => codes::PARAM_MODEL_ERROR,
            BridgeError::Unknown(_)
            | BridgeError::Executor(_)
            | BridgeError::Config(_)
            | BridgeError::Io(_)
            | BridgeError::Serialization(_) => codes::UNKNOWN_ERROR,
        }
    }

    /// Message carried in the `msg` field of the reply.
    pub fn reply_message(&self) -> String {
        match self {
            BridgeError::NotFound(_) => codes::NOT_FOUND_MSG.to_string(),
            BridgeError::PermissionDenied(_) => codes::PERMISSION_DENIED_MSG.to_string(),
            BridgeError::Released => codes::RELEASED_MSG.to_string(),
            other => other.to_string(),
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, BridgeError>;
