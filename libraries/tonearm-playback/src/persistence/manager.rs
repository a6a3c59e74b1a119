//! Persistence manager
//!
//! Single read/write surface over the durable store: debounced writes, reads
//! with corruption and expiry eviction, and rehydration of snapshots through
//! the catalog. Persistence is best-effort; nothing here fails playback.

use crate::config::PlaybackConfig;
use crate::error::{PlaybackError, Result};
use crate::persistence::codec::{self, PersistedSnapshot};
use crate::types::{PlaybackState, QueueItem};
use futures_util::future::join_all;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tonearm_core::{CatalogLookup, KeyValueStore, TrackId};
use tracing::{debug, info, warn};

/// Persistence manager
///
/// Cheap to clone; clones share the store handle and the pending-write timer.
#[derive(Clone)]
pub struct PersistenceManager {
    inner: Arc<Inner>,
}

struct Inner {
    // None when the store failed its startup probe
    store: Option<Arc<dyn KeyValueStore>>,
    key: String,
    max_age_ms: u64,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl PersistenceManager {
    /// Create a manager over `store`, probing it once
    ///
    /// An unavailable store disables persistence for the lifetime of the manager.
    pub fn new(store: Arc<dyn KeyValueStore>, config: &PlaybackConfig) -> Self {
        let store = match store.probe() {
            Ok(()) => Some(store),
            Err(e) => {
                warn!(error = %e, "Durable store unavailable, persistence disabled");
                None
            }
        };

        Self {
            inner: Arc::new(Inner {
                store,
                key: config.storage_key.clone(),
                max_age_ms: config.max_age_ms,
                pending: Mutex::new(None),
            }),
        }
    }

    /// Manager with persistence switched off
    pub fn disabled(config: &PlaybackConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store: None,
                key: config.storage_key.clone(),
                max_age_ms: config.max_age_ms,
                pending: Mutex::new(None),
            }),
        }
    }

    /// Whether the store passed its probe
    pub fn is_enabled(&self) -> bool {
        self.inner.store.is_some()
    }

    /// Key holding the snapshot
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Encode and write `state` now
    ///
    /// Failures are logged, never returned.
    pub fn save(&self, state: &PlaybackState) {
        let snapshot = codec::serialize(state, codec::now_millis());
        if let Err(e) = self.inner.write(&snapshot) {
            warn!(error = %e, "Failed to save playback state");
        }
    }

    /// Write `state` once `delay` has passed without another call
    ///
    /// Each call cancels the pending write and reschedules, so a burst produces
    /// a single write of the last state. Outside a Tokio runtime the write
    /// happens immediately.
    pub fn debounced_save(&self, state: &PlaybackState, delay: Duration) {
        if !self.is_enabled() {
            return;
        }

        let mut snapshot = codec::serialize(state, codec::now_millis());
        let mut pending = self.lock_pending();
        if let Some(handle) = pending.take() {
            handle.abort();
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let inner = Arc::clone(&self.inner);
                *pending = Some(runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    snapshot.saved_at_epoch_millis = codec::now_millis();
                    if let Err(e) = inner.write(&snapshot) {
                        warn!(error = %e, "Failed to save playback state");
                    }
                }));
            }
            Err(_) => {
                debug!("No async runtime, saving playback state immediately");
                drop(pending);
                if let Err(e) = self.inner.write(&snapshot) {
                    warn!(error = %e, "Failed to save playback state");
                }
            }
        }
    }

    /// Whether a debounced write is waiting to fire
    pub fn has_pending(&self) -> bool {
        self.lock_pending()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Drop the pending debounced write, if any
    pub fn cancel_pending(&self) {
        if let Some(handle) = self.lock_pending().take() {
            handle.abort();
        }
    }

    /// Read the stored snapshot
    ///
    /// Corrupt or expired entries are deleted and reported as absent.
    pub fn load(&self) -> Option<PersistedSnapshot> {
        self.load_at(codec::now_millis())
    }

    /// `load` against an explicit clock
    pub fn load_at(&self, now: i64) -> Option<PersistedSnapshot> {
        let store = self.inner.store.as_ref()?;

        let raw = match store.get(&self.inner.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read playback state");
                return None;
            }
        };

        let snapshot = match codec::deserialize(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Discarding corrupt playback snapshot");
                self.clear();
                return None;
            }
        };

        if codec::is_expired(&snapshot, self.inner.max_age_ms, now) {
            info!(
                saved_at = snapshot.saved_at_epoch_millis,
                "Discarding expired playback snapshot"
            );
            self.clear();
            return None;
        }

        Some(snapshot)
    }

    /// Delete the stored snapshot and any pending write
    pub fn clear(&self) {
        self.cancel_pending();
        if let Some(store) = &self.inner.store {
            if let Err(e) = store.remove(&self.inner.key) {
                warn!(error = %e, "Failed to clear playback state");
            }
        }
    }

    /// Rehydrate snapshot items into queue items through the catalog
    ///
    /// Lookups run concurrently; the output keeps snapshot order. Items whose
    /// lookup fails or finds nothing are dropped.
    pub async fn restore<C>(&self, snapshot: &PersistedSnapshot, catalog: &C) -> Vec<QueueItem>
    where
        C: CatalogLookup + ?Sized,
    {
        let lookups = snapshot.queue.iter().map(|persisted| async move {
            let id = TrackId::new(persisted.track_id.clone());
            match catalog.get_track_by_id(&id).await {
                Ok(Some(track)) => Some(QueueItem::new(track, persisted.is_pinned)),
                Ok(None) => {
                    warn!(track_id = %id, "Track missing from catalog, dropping from queue");
                    None
                }
                Err(e) => {
                    warn!(track_id = %id, error = %e, "Track lookup failed, dropping from queue");
                    None
                }
            }
        });

        let items: Vec<QueueItem> = join_all(lookups).await.into_iter().flatten().collect();
        debug!(
            requested = snapshot.queue.len(),
            restored = items.len(),
            "Restored queue"
        );
        items
    }

    fn lock_pending(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Inner {
    fn write(&self, snapshot: &PersistedSnapshot) -> Result<()> {
        let store = self.store.as_ref().ok_or(PlaybackError::PersistenceDisabled)?;
        let encoded = codec::encode(snapshot)?;
        store.set(&self.key, &encoded)?;
        debug!(
            bytes = encoded.len(),
            items = snapshot.queue.len(),
            "Saved playback state"
        );
        Ok(())
    }
}

impl std::fmt::Debug for PersistenceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceManager")
            .field("key", &self.inner.key)
            .field("enabled", &self.is_enabled())
            .field("max_age_ms", &self.inner.max_age_ms)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RepeatMode;
    use tonearm_core::{MemoryStore, Track};

    fn state_with(ids: &[&str]) -> PlaybackState {
        let mut state = PlaybackState::new(0.5, RepeatMode::Off);
        state.queue = ids
            .iter()
            .map(|id| QueueItem::from_source(Track::new(*id, id.to_uppercase())))
            .collect();
        state.current_index = if ids.is_empty() { None } else { Some(0) };
        state
    }

    #[test]
    fn save_then_load() {
        let store = Arc::new(MemoryStore::new());
        let manager = PersistenceManager::new(store.clone(), &PlaybackConfig::default());
        assert!(manager.is_enabled());

        manager.save(&state_with(&["a", "b"]));
        let snapshot = manager.load().unwrap();
        assert_eq!(snapshot.queue.len(), 2);
        assert_eq!(snapshot.current_track_id.as_deref(), Some("a"));
        assert!(store.get("tonearm.playback").unwrap().is_some());
    }

    #[test]
    fn unavailable_store_disables_persistence() {
        let store = Arc::new(MemoryStore::unavailable());
        let manager = PersistenceManager::new(store.clone(), &PlaybackConfig::default());
        assert!(!manager.is_enabled());

        // Coming back later does not re-enable the manager
        store.set_available(true);
        manager.save(&state_with(&["a"]));
        assert_eq!(store.write_count(), 0);
        assert!(manager.load().is_none());
    }

    #[test]
    fn write_failure_is_swallowed() {
        let store = Arc::new(MemoryStore::with_quota(64));
        let manager = PersistenceManager::new(store.clone(), &PlaybackConfig::default());

        let ids: Vec<String> = (0..50).map(|i| format!("track-{i}")).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        manager.save(&state_with(&refs));

        assert!(store.get("tonearm.playback").unwrap().is_none());
    }

    #[test]
    fn corrupt_entry_is_evicted() {
        let store = Arc::new(MemoryStore::new());
        store.set("tonearm.playback", "{\"currentIndex\":\"zero\"}").unwrap();
        let manager = PersistenceManager::new(store.clone(), &PlaybackConfig::default());

        assert!(manager.load().is_none());
        assert!(store.get("tonearm.playback").unwrap().is_none());
    }

    #[test]
    fn expired_entry_is_evicted() {
        let store = Arc::new(MemoryStore::new());
        let config = PlaybackConfig {
            max_age_ms: 1_000,
            ..Default::default()
        };
        let manager = PersistenceManager::new(store.clone(), &config);
        manager.save(&state_with(&["a"]));

        let saved_at = manager.load().unwrap().saved_at_epoch_millis;
        assert!(manager.load_at(saved_at + 1_000).is_some());
        assert!(manager.load_at(saved_at + 1_001).is_none());
        assert!(store.get("tonearm.playback").unwrap().is_none());
    }

    #[test]
    fn clear_removes_entry() {
        let store = Arc::new(MemoryStore::new());
        let manager = PersistenceManager::new(store.clone(), &PlaybackConfig::default());
        manager.save(&state_with(&["a"]));
        manager.clear();
        assert!(manager.load().is_none());
    }

    #[test]
    fn debounced_save_without_runtime_writes_immediately() {
        let store = Arc::new(MemoryStore::new());
        let manager = PersistenceManager::new(store.clone(), &PlaybackConfig::default());
        let before = store.write_count();
        manager.debounced_save(&state_with(&["a"]), Duration::from_millis(500));
        assert_eq!(store.write_count(), before + 1);
        assert!(!manager.has_pending());
    }
}
