// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Key/value store backing the `storage.*` bridge methods.
//
// Values are kept as JSON and written through to a single file when the
// store is file-backed. An in-memory store is used when the data directory
// cannot be written.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, info};

use bridgewerk_core::error::Result;

const STORAGE_FILE: &str = "storage.json";

pub struct KeyValueStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl KeyValueStore {
    /// Open (or create) the store file inside `dir`.
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join(STORAGE_FILE);
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!(path = %path.display(), "key/value store opened");
        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().get(key).cloned()
    }

    /// Write `key`. Memory only changes once the file write succeeded.
    pub fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.lock();
        let mut staged = entries.clone();
        staged.insert(key.to_string(), value);
        self.persist(&staged)?;
        *entries = staged;
        debug!(key = %key, "storage item written");
        Ok(())
    }

    /// Remove `key`. Returns whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(key) {
            return Ok(false);
        }
        let mut staged = entries.clone();
        staged.remove(key);
        self.persist(&staged)?;
        *entries = staged;
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        if let Some(path) = &self.path {
            let json = serde_json::to_string_pretty(entries)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }
}
