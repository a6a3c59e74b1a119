//! Tonearm - Playback Queue Engine
//!
//! Platform-agnostic queue and playback orchestration for a media player.
//!
//! This crate provides:
//! - Queue model with user-pinned items (play next / play last)
//! - Shuffle that keeps the current item at the head
//! - Repeat modes (Off, All, One)
//! - Seek and volume control
//! - Debounced persistence of the session and token-guarded restoration
//!
//! # Architecture
//!
//! `tonearm-playback` never renders audio and never owns track metadata:
//! - Output goes through the `RenderSurface` trait (decoder, media element, ...)
//! - Track metadata comes from a `CatalogLookup`
//! - Durable state goes to a `KeyValueStore`
//!
//! Responses from the surface and the catalog are tagged with request tokens so
//! that late results of superseded requests are discarded.
//!
//! # Example: Basic Playback
//!
//! ```rust
//! use std::sync::Arc;
//! use tonearm_core::{MemoryStore, Track};
//! use tonearm_playback::{
//!     PersistenceManager, PlaybackConfig, PlaybackController, PlaybackStatus, RecordingSurface,
//!     SurfaceEvent,
//! };
//!
//! let config = PlaybackConfig::default();
//! let persistence = PersistenceManager::new(Arc::new(MemoryStore::new()), &config);
//! let mut player = PlaybackController::new(RecordingSurface::new(), persistence, &config);
//!
//! player.play(vec![Track::new("a", "Intro"), Track::new("b", "Theme")]);
//! assert_eq!(player.status(), PlaybackStatus::Loading);
//!
//! // The surface reports back with the token of the load it finished
//! let token = player.surface().last_load_token().unwrap();
//! player.handle_surface_event(SurfaceEvent::Ready { token, duration_seconds: Some(212.0) });
//! assert_eq!(player.status(), PlaybackStatus::Playing);
//!
//! // User-queued item lands right after the current one
//! player.queue_next(Track::new("x", "Interlude"));
//! assert_eq!(player.queue()[1].track.id.as_str(), "x");
//! ```
//!
//! # Example: Shuffle and Repeat
//!
//! ```rust
//! use tonearm_core::Track;
//! use tonearm_playback::{
//!     PersistenceManager, PlaybackConfig, PlaybackController, RecordingSurface, RepeatMode,
//! };
//!
//! let config = PlaybackConfig { shuffle_seed: Some(7), ..Default::default() };
//! let mut player =
//!     PlaybackController::new(RecordingSurface::new(), PersistenceManager::disabled(&config), &config);
//!
//! let tracks = (0..10).map(|i| Track::new(format!("t{i}"), format!("Track {i}"))).collect();
//! player.play_from(tracks, 4);
//!
//! player.toggle_shuffle();
//! assert_eq!(player.current_index(), Some(0));
//! assert_eq!(player.current_track().unwrap().id.as_str(), "t4");
//!
//! assert_eq!(player.toggle_repeat_mode(), RepeatMode::All);
//! ```

pub mod config;
mod controller;
mod error;
pub mod events;
pub mod persistence;
pub mod queue;
pub mod shuffle;
pub mod surface;
mod tokens;
pub mod types;

// Public exports
pub use config::PlaybackConfig;
pub use controller::{PlaybackController, RestoreTask, RestoredQueue};
pub use error::{PlaybackError, Result};
pub use events::PlaybackEvent;
pub use persistence::{PersistedItem, PersistedSnapshot, PersistenceManager};
pub use surface::{RecordingSurface, RenderSurface, SurfaceCommand, SurfaceEvent};
pub use tokens::{RequestToken, RequestTokens};
pub use types::{PlaybackState, PlaybackStatus, QueueItem, RepeatMode};
