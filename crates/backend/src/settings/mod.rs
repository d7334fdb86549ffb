//! Flat key/value settings persisted as a single JSON document.
//!
//! The in-memory map is authoritative while the process runs. Every mutation
//! is applied to memory first and then the whole document is written out
//! before the call returns. A failed write leaves memory ahead of disk until
//! the next successful flush.

pub mod backend;

use crate::types::BackendResult;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info, warn};

pub use backend::{JsonFileBackend, SettingsBackend, SettingsMap};

pub const THEME_KEY: &str = "theme";
pub const TIMELINE_ZOOM_KEY: &str = "timeline-zoom";
pub const DEFAULT_TIMELINE_ZOOM: f64 = 0.5;

pub struct SettingsStore {
    backend: Box<dyn SettingsBackend>,
    entries: OnceCell<Mutex<SettingsMap>>,
}

impl SettingsStore {
    pub fn new(backend: impl SettingsBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            entries: OnceCell::new(),
        }
    }

    pub fn json_file(path: impl Into<std::path::PathBuf>) -> Self {
        Self::new(JsonFileBackend::new(path))
    }

    /// Load the document on first use. Concurrent first callers all wait for
    /// the same load; a failed load leaves the store empty but usable.
    pub async fn initialize(&self) {
        self.entries().await;
    }

    async fn entries(&self) -> &Mutex<SettingsMap> {
        self.entries
            .get_or_init(|| async {
                let entries = match self.backend.load().await {
                    Ok(entries) => {
                        info!(location = %self.backend.location(), keys = entries.len(), "Settings storage initialized");
                        entries
                    }
                    Err(e) => {
                        error!(location = %self.backend.location(), error = %e, "Failed to initialize settings storage");
                        SettingsMap::new()
                    }
                };
                Mutex::new(entries)
            })
            .await
    }

    async fn flush(&self, entries: &SettingsMap) -> BackendResult<()> {
        self.backend.save(entries).await.inspect_err(|e| {
            error!(location = %self.backend.location(), error = %e, "Failed to save settings file");
        })?;
        debug!(keys = entries.len(), "Settings flushed");
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.entries().await.lock().await.get(key).cloned()
    }

    pub async fn set(&self, key: &str, value: Value) -> BackendResult<()> {
        let mut entries = self.entries().await.lock().await;
        entries.insert(key.to_string(), value);
        self.flush(&entries).await
    }

    pub async fn remove(&self, key: &str) -> BackendResult<()> {
        let mut entries = self.entries().await.lock().await;
        entries.remove(key);
        self.flush(&entries).await
    }

    pub async fn clear(&self) -> BackendResult<()> {
        let mut entries = self.entries().await.lock().await;
        entries.clear();
        self.flush(&entries).await
    }

    pub async fn has(&self, key: &str) -> bool {
        self.entries().await.lock().await.contains_key(key)
    }

    /// Detached copy of every entry.
    pub async fn get_all(&self) -> SettingsMap {
        self.entries().await.lock().await.clone()
    }

    /// Merge `batch` into the store with a single flush.
    pub async fn set_multiple(&self, batch: SettingsMap) -> BackendResult<()> {
        let mut entries = self.entries().await.lock().await;
        entries.extend(batch);
        self.flush(&entries).await
    }

    /// Remove every listed key with a single flush; absent keys are ignored.
    pub async fn remove_multiple<S: AsRef<str>>(&self, keys: &[S]) -> BackendResult<()> {
        let mut entries = self.entries().await.lock().await;
        for key in keys {
            entries.remove(key.as_ref());
        }
        self.flush(&entries).await
    }

    /// Typed read. A stored value of the wrong shape reads as absent.
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                warn!(key, error = %e, "Ignoring stored setting with unexpected shape");
                None
            }
        }
    }

    pub async fn set_as<T: Serialize>(&self, key: &str, value: &T) -> BackendResult<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value).await
    }

    pub async fn timeline_zoom(&self) -> f64 {
        self.get_as(TIMELINE_ZOOM_KEY)
            .await
            .unwrap_or(DEFAULT_TIMELINE_ZOOM)
    }
}
