use std::{
    collections::HashMap,
    io,
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use tracing::trace;

use crate::error::StorageError;

/// Key the [`HydrationRecord`](crate::structs::HydrationRecord) is stored under
pub const HYDRATION_DATA_KEY: &str = "hydrationData";
/// Key the [`Settings`](crate::structs::Settings) are stored under
pub const SETTINGS_KEY: &str = "hydrationSettings";

/// String key-value persistence. Values are opaque JSON blobs.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` when nothing was ever stored under `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Reads `key` and deserializes it as JSON
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })
}

/// Serializes `value` as JSON and stores it under `key`
pub async fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;

    store.set(key, &raw).await
}

/// Stores every key as `<key>.json` inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Full path of the file backing `key`
    pub fn path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path(key);
        trace!("Reading {key} from {path:?}");

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(path, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| StorageError::Io(self.data_dir.clone(), e))?;

        // Write next to the target then rename, so a crash never leaves half a file
        let path = self.path(key);
        let tmp_path = path.with_extension("json.tmp");
        trace!("Writing {key} to {path:?}");

        tokio::fs::write(&tmp_path, value)
            .await
            .map_err(|e| StorageError::Io(tmp_path.clone(), e))?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| StorageError::Io(path, e))
    }
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-filled with `entries`, as if written by an earlier run
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Bounds every call to the wrapped store, so a hung storage backend
/// surfaces as [`StorageError::Timeout`] instead of stalling the manager.
#[derive(Debug)]
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: KeyValueStore> KeyValueStore for TimeoutStore<S> {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        tokio::time::timeout(self.timeout, self.inner.get(key))
            .await
            .map_err(|_| StorageError::Timeout(self.timeout))?
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::time::timeout(self.timeout, self.inner.set(key, value))
            .await
            .map_err(|_| StorageError::Timeout(self.timeout))?
    }
}
