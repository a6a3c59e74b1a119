/// Collaborator traits for Tonearm
///
/// The playback engine never reaches for a concrete catalog or storage backend;
/// hosts hand it implementations of these traits.
use crate::error::Result;
use crate::types::{Track, TrackId};
use async_trait::async_trait;

/// Catalog lookup service
///
/// Resolves track identifiers to full track metadata.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Get track by ID
    ///
    /// Returns `Ok(None)` when the catalog has no such track and `Err(_)` on
    /// transient failure. Callers restoring a queue treat both the same way.
    async fn get_track_by_id(&self, id: &TrackId) -> Result<Option<Track>>;
}

/// Durable key-value store
///
/// Client-local, synchronous and size-bounded. Every operation may fail, e.g.
/// when the backing store is disabled or full.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the value under `key` (deleting a missing key is not an error)
    fn remove(&self, key: &str) -> Result<()>;

    /// Probe availability with a harmless write/delete round-trip
    fn probe(&self) -> Result<()> {
        const PROBE_KEY: &str = "__tonearm_probe__";
        self.set(PROBE_KEY, "1")?;
        self.remove(PROBE_KEY)
    }
}

#[async_trait]
impl<T: CatalogLookup + ?Sized> CatalogLookup for std::sync::Arc<T> {
    async fn get_track_by_id(&self, id: &TrackId) -> Result<Option<Track>> {
        (**self).get_track_by_id(id).await
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }

    fn probe(&self) -> Result<()> {
        (**self).probe()
    }
}
