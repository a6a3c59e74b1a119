//! Snapshot codec
//!
//! Projects `PlaybackState` onto the identifier-only `PersistedSnapshot` and
//! back. Track metadata and media URLs are never stored: they go stale, and the
//! catalog is the authority on them.

use crate::error::{PlaybackError, Result};
use crate::types::PlaybackState;
use serde::{Deserialize, Serialize};

/// One queue slot as persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedItem {
    pub track_id: String,
    pub is_pinned: bool,
}

/// Durable projection of `PlaybackState`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    /// Track id of the current item, absent when nothing was loaded
    #[serde(default)]
    pub current_track_id: Option<String>,

    /// Current index, `-1` when nothing was loaded
    pub current_index: i64,

    pub queue: Vec<PersistedItem>,

    pub volume: f64,

    pub saved_at_epoch_millis: i64,
}

impl PersistedSnapshot {
    /// Current index as a queue position
    pub fn current_position(&self) -> Option<usize> {
        usize::try_from(self.current_index).ok()
    }
}

/// Wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Project `state` into a snapshot stamped `saved_at`
pub fn serialize(state: &PlaybackState, saved_at: i64) -> PersistedSnapshot {
    PersistedSnapshot {
        current_track_id: state.current_track().map(|t| t.id.to_string()),
        current_index: state
            .current_index
            .and_then(|i| i64::try_from(i).ok())
            .unwrap_or(-1),
        queue: state
            .queue
            .iter()
            .map(|item| PersistedItem {
                track_id: item.track.id.to_string(),
                is_pinned: item.is_pinned,
            })
            .collect(),
        volume: state.volume,
        saved_at_epoch_millis: saved_at,
    }
}

/// Encode a snapshot as JSON
pub fn encode(snapshot: &PersistedSnapshot) -> Result<String> {
    Ok(serde_json::to_string(snapshot)?)
}

/// Decode and validate a raw snapshot
///
/// Any structural mismatch rejects the whole snapshot; there is no partial
/// value.
pub fn deserialize(raw: &str) -> Result<PersistedSnapshot> {
    let snapshot: PersistedSnapshot = serde_json::from_str(raw)?;
    validate(&snapshot)?;
    Ok(snapshot)
}

fn validate(snapshot: &PersistedSnapshot) -> Result<()> {
    if snapshot.current_index < -1 {
        return Err(PlaybackError::InvalidSnapshotField {
            field: "currentIndex",
            reason: format!("{} is below -1", snapshot.current_index),
        });
    }
    if !snapshot.volume.is_finite() {
        return Err(PlaybackError::InvalidSnapshotField {
            field: "volume",
            reason: "not a finite number".into(),
        });
    }
    Ok(())
}

/// `now - saved_at > max_age`
pub fn is_expired(snapshot: &PersistedSnapshot, max_age_ms: u64, now: i64) -> bool {
    let max_age = i64::try_from(max_age_ms).unwrap_or(i64::MAX);
    now.saturating_sub(snapshot.saved_at_epoch_millis) > max_age
}
