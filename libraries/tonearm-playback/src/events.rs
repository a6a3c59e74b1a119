//! Playback Events
//!
//! Event-based communication for UI synchronization.
//! The controller records events as commands complete; hosts drain them with
//! `PlaybackController::drain_events`.

use crate::types::{PlaybackStatus, RepeatMode};
use serde::{Deserialize, Serialize};

/// Events emitted by the playback controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// Effective status changed (empty, loading, playing, paused)
    StateChanged {
        /// The new status
        status: PlaybackStatus,
    },

    /// The current item changed
    TrackChanged {
        /// Item id of the new current item, `None` when the queue emptied
        item_id: Option<String>,
        /// Track id of the new current item
        track_id: Option<String>,
    },

    /// Queue changed (tracks added/removed/reordered/restored)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// Volume changed
    VolumeChanged {
        /// New volume (0.0-1.0)
        volume: f64,
    },

    /// Repeat or shuffle setting changed
    ModeChanged {
        repeat_mode: RepeatMode,
        is_shuffled: bool,
    },

    /// Error reported by the rendering surface
    Error {
        /// Error message
        message: String,
    },
}
