// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer for the demo host.
//
// Bridge method instances are shared across calls and threads, so every
// service they capture is `Arc`-wrapped and internally synchronised.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use bridgewerk_core::error::Result;

use super::data_dir;
use super::storage::KeyValueStore;

#[derive(Clone)]
pub struct AppServices {
    store: Arc<KeyValueStore>,
    data_dir: Option<PathBuf>,
    started_at: DateTime<Utc>,
}

impl AppServices {
    /// Open file-backed services in the host data directory.
    pub fn init() -> Result<Self> {
        let dir = data_dir::data_dir();
        info!(path = %dir.display(), "initialising app services");
        let store = KeyValueStore::open(&dir)?;
        Ok(Self {
            store: Arc::new(store),
            data_dir: Some(dir),
            started_at: Utc::now(),
        })
    }

    /// In-memory services, used when the data directory is unusable.
    pub fn fallback() -> Self {
        Self {
            store: Arc::new(KeyValueStore::in_memory()),
            data_dir: None,
            started_at: Utc::now(),
        }
    }

    pub fn store(&self) -> Arc<KeyValueStore> {
        Arc::clone(&self.store)
    }

    pub fn data_dir(&self) -> Option<&PathBuf> {
        self.data_dir.as_ref()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}
