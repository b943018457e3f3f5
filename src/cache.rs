//! On-disk key/value cache with per-entry expiry

use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fjall::Keyspace;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::task;

use crate::{DayTripError, Result};

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

/// Cheap to clone; clones share the same database
#[derive(Clone)]
pub struct PersistentCache {
    store: Keyspace,
}

fn now_secs() -> Result<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| DayTripError::cache(format!("System clock before epoch: {e}")))
}

fn joined<T, E: std::fmt::Display>(
    outcome: std::result::Result<std::result::Result<T, E>, task::JoinError>,
) -> Result<T> {
    outcome
        .map_err(|e| DayTripError::cache(format!("Cache task aborted: {e}")))?
        .map_err(|e| DayTripError::cache(e.to_string()))
}

impl PersistentCache {
    /// Open (or create) the cache database under `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(path.as_ref())
            .open()
            .map_err(|e| DayTripError::cache(format!("Failed to open cache database: {e}")))?;
        let store = db
            .keyspace("cache", fjall::KeyspaceCreateOptions::default)
            .map_err(|e| DayTripError::cache(format!("Failed to open cache keyspace: {e}")))?;
        Ok(Self { store })
    }

    /// Store a value that expires after `ttl`
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = now_secs()?.saturating_add(ttl.as_secs());
        let bytes = postcard::to_stdvec(&StoredEntry { value, expires_at })
            .map_err(|e| DayTripError::cache(format!("Failed to encode entry: {e}")))?;

        joined(task::spawn_blocking(move || store.insert(key, bytes)).await)
    }

    /// Fresh value under `key`; misses and expired entries are `None`
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let stored = joined(
            task::spawn_blocking(move || {
                store.get(key_bytes).map(|v| v.map(|bytes| bytes.to_vec()))
            })
            .await,
        )?;

        let Some(bytes) = stored else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<T> = match postcard::from_bytes(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                // Written by an older layout; drop it
                tracing::debug!("Unreadable entry: {e}");
                self.remove(key).await?;
                return Ok(None);
            }
        };

        if now_secs()? < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        joined(task::spawn_blocking(move || store.remove(key)).await)
    }
}
