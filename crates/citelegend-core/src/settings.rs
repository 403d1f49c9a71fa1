//! Persistent settings.
//!
//! A flat JSON object with the keys `enabled`, `customNames`,
//! `cachedMappings` and `version`. [`SettingsStore`] is the raw key/value
//! seam; [`Settings`] layers typed access and first-run defaults on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::SettingsError;
use crate::key::CitationKey;
use crate::store::MappingEntry;

pub const KEY_ENABLED: &str = "enabled";
pub const KEY_CUSTOM_NAMES: &str = "customNames";
pub const KEY_CACHED_MAPPINGS: &str = "cachedMappings";
pub const KEY_VERSION: &str = "version";

pub const SETTINGS_VERSION: &str = "1.0";

/// Cached mappings older than this are dropped at startup.
pub const CACHE_MAX_AGE_DAYS: i64 = 7;

/// Raw key/value access to persisted settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError>;

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError>;

    async fn remove(&self, key: &str) -> Result<(), SettingsError>;
}

/// Settings held in memory only.
#[derive(Default)]
pub struct MemorySettingsStore {
    values: parking_lot::Mutex<Map<String, Value>>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SettingsError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Settings stored as one pretty-printed JSON object on disk.
pub struct FileSettingsStore {
    path: PathBuf,
    // Serializes read-modify-write cycles.
    lock: tokio::sync::Mutex<()>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Map<String, Value>, SettingsError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(SettingsError::NotAnObject),
        }
    }

    async fn write(&self, map: Map<String, Value>) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(map))?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, SettingsError> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), SettingsError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read().await?;
        map.insert(key.to_string(), value);
        self.write(map).await
    }

    async fn remove(&self, key: &str) -> Result<(), SettingsError> {
        let _guard = self.lock.lock().await;
        let mut map = self.read().await?;
        if map.remove(key).is_some() {
            self.write(map).await?;
        }
        Ok(())
    }
}

/// The last snapshot a pass produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedMappings {
    pub saved_at: DateTime<Utc>,
    pub mappings: Vec<MappingEntry>,
}

/// Typed access to the settings keys.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn SettingsStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySettingsStore::new()))
    }

    /// Write defaults for every absent key.
    pub async fn initialize(&self) -> Result<(), SettingsError> {
        let defaults = [
            (KEY_ENABLED, Value::Bool(true)),
            (KEY_CUSTOM_NAMES, Value::Object(Map::new())),
            (KEY_VERSION, Value::String(SETTINGS_VERSION.to_string())),
        ];

        for (key, value) in defaults {
            if self.store.get(key).await?.is_none() {
                debug!("Writing default setting {}", key);
                self.store.set(key, value).await?;
            }
        }
        Ok(())
    }

    pub async fn enabled(&self) -> Result<bool, SettingsError> {
        Ok(self
            .store
            .get(KEY_ENABLED)
            .await?
            .and_then(|v| v.as_bool())
            .unwrap_or(true))
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<(), SettingsError> {
        self.store.set(KEY_ENABLED, Value::Bool(enabled)).await
    }

    pub async fn custom_names(&self) -> Result<BTreeMap<CitationKey, String>, SettingsError> {
        let Some(value) = self.store.get(KEY_CUSTOM_NAMES).await? else {
            return Ok(BTreeMap::new());
        };
        match serde_json::from_value(value) {
            Ok(names) => Ok(names),
            Err(e) => {
                warn!("Ignoring malformed {}: {}", KEY_CUSTOM_NAMES, e);
                Ok(BTreeMap::new())
            }
        }
    }

    pub async fn set_custom_names(
        &self,
        names: &BTreeMap<CitationKey, String>,
    ) -> Result<(), SettingsError> {
        self.store
            .set(KEY_CUSTOM_NAMES, serde_json::to_value(names)?)
            .await
    }

    pub async fn cached_mappings(&self) -> Result<Option<CachedMappings>, SettingsError> {
        let Some(value) = self.store.get(KEY_CACHED_MAPPINGS).await? else {
            return Ok(None);
        };
        Ok(serde_json::from_value(value).ok())
    }

    pub async fn save_cached_mappings(
        &self,
        mappings: Vec<MappingEntry>,
        saved_at: DateTime<Utc>,
    ) -> Result<(), SettingsError> {
        let cached = CachedMappings { saved_at, mappings };
        self.store
            .set(KEY_CACHED_MAPPINGS, serde_json::to_value(cached)?)
            .await
    }

    /// Drop cached mappings that are older than the cache lifetime or
    /// unreadable. Returns whether anything was removed.
    pub async fn prune_stale_cache(&self, now: DateTime<Utc>) -> Result<bool, SettingsError> {
        if self.store.get(KEY_CACHED_MAPPINGS).await?.is_none() {
            return Ok(false);
        }

        let stale = match self.cached_mappings().await? {
            Some(cached) => now - cached.saved_at > TimeDelta::days(CACHE_MAX_AGE_DAYS),
            None => true,
        };

        if stale {
            info!("Pruning cached mappings older than {} days", CACHE_MAX_AGE_DAYS);
            self.store.remove(KEY_CACHED_MAPPINGS).await?;
        }
        Ok(stale)
    }
}
