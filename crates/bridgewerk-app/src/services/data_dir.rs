// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Host data directory resolution.

use std::path::PathBuf;

/// Return the demo host's data directory, creating it if needed.
///
/// `BRIDGEWERK_DATA_DIR` wins; otherwise the XDG data dir, then `~/.local/share`.
pub fn data_dir() -> PathBuf {
    let dir = match std::env::var("BRIDGEWERK_DATA_DIR") {
        Ok(explicit) => PathBuf::from(explicit),
        Err(_) => dirs_fallback().join("bridgewerk"),
    };
    std::fs::create_dir_all(&dir).ok();
    dir
}

fn dirs_fallback() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local").join("share");
    }
    std::env::temp_dir()
}
