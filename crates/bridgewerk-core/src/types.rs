// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Bridgewerk dispatch layer.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Namespace of the process-wide default registry.
pub const DEFAULT_NAMESPACE: &str = "DEFAULT";

/// Runtime category a method is registered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlatformScope {
    /// Registered for every concrete platform.
    All,
    /// Web view runtime.
    Web,
    /// Declarative view (Lynx) runtime.
    Lynx,
    /// Disabled platform; lookups never match.
    None,
}

impl PlatformScope {
    /// The buckets a registration under this scope populates.
    pub fn buckets(self) -> &'static [PlatformScope] {
        match self {
            PlatformScope::All => &[PlatformScope::All, PlatformScope::Web, PlatformScope::Lynx],
            PlatformScope::Web => &[PlatformScope::Web],
            PlatformScope::Lynx => &[PlatformScope::Lynx],
            PlatformScope::None => &[],
        }
    }
}

impl fmt::Display for PlatformScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlatformScope::All => "ALL",
            PlatformScope::Web => "WEB",
            PlatformScope::Lynx => "LYNX",
            PlatformScope::None => "NONE",
        };
        f.write_str(label)
    }
}

/// Thread a call asks to be handled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadType {
    /// Whatever thread the runtime dispatched on.
    Current,
    /// The host's main thread. The core has no main loop, so this runs inline.
    Main,
    Background,
    Io,
    Normal,
    Cpu,
    /// The sequential queue.
    Serial,
}

impl ThreadType {
    /// Whether the call is moved onto the parallel pool.
    pub fn is_parallel(self) -> bool {
        matches!(
            self,
            ThreadType::Background | ThreadType::Io | ThreadType::Normal | ThreadType::Cpu
        )
    }
}

/// Unknown labels fall back to `Main`, never an error.
impl FromStr for ThreadType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "current" => ThreadType::Current,
            "background" => ThreadType::Background,
            "io" => ThreadType::Io,
            "normal" => ThreadType::Normal,
            "cpu" => ThreadType::Cpu,
            "serial" => ThreadType::Serial,
            _ => ThreadType::Main,
        })
    }
}

/// Identifier of a hybrid-view container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub String);

impl ContainerId {
    /// A fresh, random container id.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ContainerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_scope_populates_every_concrete_bucket() {
        assert_eq!(
            PlatformScope::All.buckets(),
            &[PlatformScope::All, PlatformScope::Web, PlatformScope::Lynx]
        );
        assert!(PlatformScope::None.buckets().is_empty());
    }

    #[test]
    fn unknown_thread_type_defaults_to_main() {
        assert_eq!("serial".parse::<ThreadType>(), Ok(ThreadType::Serial));
        assert_eq!("IO".parse::<ThreadType>(), Ok(ThreadType::Io));
        assert_eq!("gpu".parse::<ThreadType>(), Ok(ThreadType::Main));
    }

    #[test]
    fn scope_serializes_uppercase() {
        let json = serde_json::to_string(&PlatformScope::Lynx).expect("serialize");
        assert_eq!(json, "\"LYNX\"");
    }

    #[test]
    fn container_ids_are_unique() {
        assert_ne!(ContainerId::new(), ContainerId::new());
    }
}
