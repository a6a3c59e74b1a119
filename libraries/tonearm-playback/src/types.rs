//! Core types for playback management

use serde::{Deserialize, Serialize};
use tonearm_core::Track;
use uuid::Uuid;

/// One slot in the ordered playback list
///
/// The same track may occupy several slots, so `item_id` (fresh per insertion)
/// is the handle for removal and UI keys, never the track id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueItem {
    /// Track metadata from the catalog
    pub track: Track,

    /// Inserted by an explicit "play next / play last" request
    ///
    /// Items that arrived with bulk source playback (album, playlist) are unpinned.
    /// Pinned items survive a selective clear.
    pub is_pinned: bool,

    /// Unique handle for this slot
    pub item_id: String,
}

impl QueueItem {
    /// Create a new queue item with a fresh item id
    pub fn new(track: Track, is_pinned: bool) -> Self {
        Self {
            track,
            is_pinned,
            item_id: Uuid::new_v4().to_string(),
        }
    }

    /// Unpinned item (bulk source playback)
    pub fn from_source(track: Track) -> Self {
        Self::new(track, false)
    }

    /// Pinned item (user queued)
    pub fn pinned(track: Track) -> Self {
        Self::new(track, true)
    }
}

/// Repeat mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatMode {
    /// Stop when queue ends
    #[default]
    Off,

    /// Loop entire queue
    All,

    /// Loop current track only
    One,
}

impl RepeatMode {
    /// Next mode in the toggle cycle: off -> all -> one -> off
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::One,
            Self::One => Self::Off,
        }
    }
}

/// Effective playback status
///
/// Derived from `PlaybackState` flags, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Nothing loaded
    Empty,

    /// Waiting for the rendering surface to report ready
    Loading,

    /// Currently playing
    Playing,

    /// Loaded but not sounding (paused, ended, or halted on error)
    Paused,
}

/// Live playback state
///
/// Owned exclusively by the `PlaybackController`. `queue[current_index]` is the
/// only source of the current track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Ordered playback list
    pub queue: Vec<QueueItem>,

    /// Index of the current item, `None` when nothing is loaded
    pub current_index: Option<usize>,

    /// Audio is sounding
    pub is_playing: bool,

    /// A load is in flight
    pub is_loading: bool,

    /// Position in the current track
    pub progress_seconds: f64,

    /// Duration of the current track, `0.0` when unknown
    pub duration_seconds: f64,

    /// Output volume in `[0, 1]`
    pub volume: f64,

    /// Repeat mode
    pub repeat_mode: RepeatMode,

    /// Shuffle flag (UI-facing; see `toggle_shuffle`)
    pub is_shuffled: bool,

    /// Last rendering-surface error
    pub last_error: Option<String>,
}

impl PlaybackState {
    /// Empty session state
    pub fn new(volume: f64, repeat_mode: RepeatMode) -> Self {
        Self {
            queue: Vec::new(),
            current_index: None,
            is_playing: false,
            is_loading: false,
            progress_seconds: 0.0,
            duration_seconds: 0.0,
            volume: clamp_volume(volume),
            repeat_mode,
            is_shuffled: false,
            last_error: None,
        }
    }

    /// The current queue item
    pub fn current_item(&self) -> Option<&QueueItem> {
        self.current_index.and_then(|i| self.queue.get(i))
    }

    /// The current track
    pub fn current_track(&self) -> Option<&Track> {
        self.current_item().map(|item| &item.track)
    }

    /// Effective status
    pub fn status(&self) -> PlaybackStatus {
        if self.current_item().is_none() {
            PlaybackStatus::Empty
        } else if self.is_loading {
            PlaybackStatus::Loading
        } else if self.is_playing {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Paused
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(1.0, RepeatMode::Off)
    }
}

/// Clamp a volume to `[0, 1]`; NaN maps to `0`
pub fn clamp_volume(volume: f64) -> f64 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}
