//! Playback controller - core orchestration
//!
//! Owns the live `PlaybackState` and is the only code that mutates it.
//! Commands run to completion synchronously: they update state through the
//! queue and shuffle primitives, issue transport commands to the rendering
//! surface, then schedule a debounced snapshot write. Asynchronous results
//! (surface events, restored queues) come back tagged with request tokens and
//! are dropped when stale.

use crate::{
    config::PlaybackConfig,
    events::PlaybackEvent,
    persistence::{PersistedSnapshot, PersistenceManager},
    queue::{self, index_after_move},
    shuffle::shuffle_with_pinned_head,
    surface::{RenderSurface, SurfaceEvent},
    tokens::{RequestToken, RequestTokens},
    types::{clamp_volume, PlaybackState, PlaybackStatus, QueueItem, RepeatMode},
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use tonearm_core::{CatalogLookup, Track, TrackId};
use tracing::{debug, info, warn};

/// Central playback control
///
/// Orchestrates:
/// - Queue commands (play, play next / play last, remove, move, clear)
/// - Transport (pause, resume, next, previous, seek, volume)
/// - Repeat modes (Off, All, One) and shuffle with the current item pinned
/// - Surface events (ready, ended, time updates, errors)
/// - Debounced persistence and token-guarded restoration
pub struct PlaybackController<S: RenderSurface> {
    state: PlaybackState,
    surface: S,
    persistence: PersistenceManager,
    debounce: Duration,

    load_tokens: RequestTokens,
    restore_tokens: RequestTokens,

    // Whether the in-flight load should start playing once ready
    autoplay_on_ready: bool,
    // Whether the surface holds the current item ready to play
    loaded: bool,
    // User volume change while a restoration is in flight; it beats the snapshot's
    volume_set_during_restore: bool,

    rng: StdRng,
    pending_events: Vec<PlaybackEvent>,
}

impl<S: RenderSurface> PlaybackController<S> {
    /// Create a controller with an empty session
    pub fn new(mut surface: S, persistence: PersistenceManager, config: &PlaybackConfig) -> Self {
        let state = PlaybackState::new(config.initial_volume, config.initial_repeat);
        surface.set_volume(state.volume);

        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            state,
            surface,
            persistence,
            debounce: config.debounce(),
            load_tokens: RequestTokens::new(),
            restore_tokens: RequestTokens::new(),
            autoplay_on_ready: false,
            loaded: false,
            volume_set_during_restore: false,
            rng,
            pending_events: Vec::new(),
        }
    }

    // ===== State Queries =====

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn status(&self) -> PlaybackStatus {
        self.state.status()
    }

    pub fn queue(&self) -> &[QueueItem] {
        &self.state.queue
    }

    pub fn current_index(&self) -> Option<usize> {
        self.state.current_index
    }

    pub fn current_item(&self) -> Option<&QueueItem> {
        self.state.current_item()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state.current_track()
    }

    /// Whether `next` would move somewhere
    pub fn has_next(&self) -> bool {
        self.next_target().is_some()
    }

    /// Whether `previous` would move somewhere
    pub fn has_previous(&self) -> bool {
        self.state
            .current_index
            .and_then(queue::previous_index)
            .is_some()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn persistence(&self) -> &PersistenceManager {
        &self.persistence
    }

    /// Token of the load the surface should be working on
    pub fn current_load_token(&self) -> Option<RequestToken> {
        self.load_tokens.current()
    }

    /// Drain all pending events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    // ===== Playback Control =====

    /// Play a single track as a fresh source
    pub fn play_track(&mut self, track: Track) -> bool {
        self.play_from(vec![track], 0)
    }

    /// Play `tracks` from the first one
    pub fn play(&mut self, tracks: Vec<Track>) -> bool {
        self.play_from(tracks, 0)
    }

    /// Replace the queue with `tracks` and start at `start`
    ///
    /// Starting a new source is not additive: pinned items are dropped too.
    /// Returns `false` (no-op) for an empty list or out-of-range start.
    pub fn play_from(&mut self, tracks: Vec<Track>, start: usize) -> bool {
        if !queue::is_valid_index(start, tracks.len()) {
            warn!(len = tracks.len(), start, "Ignoring play with invalid start");
            return false;
        }
        let before = self.status();

        self.state.queue = tracks.into_iter().map(QueueItem::from_source).collect();
        self.state.current_index = Some(start);
        self.state.is_shuffled = false;
        self.queue_mutated();
        self.load_current(true);

        self.finish(before);
        true
    }

    /// Pause playback
    ///
    /// Pausing during a load cancels its autoplay instead.
    pub fn pause(&mut self) -> bool {
        let before = self.status();
        if self.state.is_playing {
            self.surface.pause();
            self.state.is_playing = false;
        } else if self.state.is_loading && self.autoplay_on_ready {
            self.autoplay_on_ready = false;
        } else {
            return false;
        }
        self.finish(before);
        true
    }

    /// Resume playback of the current item
    ///
    /// With nothing current, starts the head of a non-empty queue.
    pub fn resume(&mut self) -> bool {
        if self.state.current_index.is_none() {
            return self.next();
        }
        if self.state.is_playing || self.state.current_item().is_none() {
            return false;
        }
        let before = self.status();

        if self.state.is_loading {
            self.autoplay_on_ready = true;
        } else if !self.loaded {
            // Halted, errored, or stopped: the surface needs the track again
            self.load_current(true);
        } else {
            let duration = self.state.duration_seconds;
            if duration > 0.0 && self.state.progress_seconds >= duration {
                self.surface.seek(0.0);
                self.state.progress_seconds = 0.0;
            }
            self.surface.play();
            self.state.is_playing = true;
        }

        self.finish(before);
        true
    }

    /// Pause if playing, resume otherwise
    pub fn toggle_play_pause(&mut self) -> bool {
        if self.state.is_playing {
            self.pause()
        } else {
            self.resume()
        }
    }

    /// Skip to the next item
    ///
    /// With nothing current (items queued on an empty player, or a restored
    /// session without a current item) the head of the queue is next.
    ///
    /// Wraps to the head under `RepeatMode::All`. An explicit skip advances even
    /// under `RepeatMode::One`.
    pub fn next(&mut self) -> bool {
        let Some(target) = self.next_target() else {
            return false;
        };
        let before = self.status();
        self.state.current_index = Some(target);
        self.load_current(true);
        self.finish(before);
        true
    }

    /// Go back one item
    ///
    /// Never wraps: the head stays the head, whatever the repeat mode.
    pub fn previous(&mut self) -> bool {
        let Some(target) = self.state.current_index.and_then(queue::previous_index) else {
            return false;
        };
        let before = self.status();
        self.state.current_index = Some(target);
        self.load_current(true);
        self.finish(before);
        true
    }

    /// Seek within the current track, clamped to `[0, duration]`
    ///
    /// Rejected until a duration is known from the surface or the catalog.
    pub fn seek(&mut self, seconds: f64) -> bool {
        let Some(track) = self.state.current_track() else {
            return false;
        };
        if !seconds.is_finite() {
            return false;
        }

        let duration = if self.state.duration_seconds > 0.0 {
            self.state.duration_seconds
        } else {
            track.duration_seconds()
        };
        if duration <= 0.0 {
            debug!(seconds, "Ignoring seek before the duration is known");
            return false;
        }
        let target = seconds.clamp(0.0, duration);

        let before = self.status();
        self.state.progress_seconds = target;
        self.surface.seek(target);
        self.finish(before);
        true
    }

    // ===== Volume =====

    /// Set volume, clamped to `[0, 1]`
    pub fn set_volume(&mut self, volume: f64) -> bool {
        if volume.is_nan() {
            return false;
        }
        let before = self.status();
        let volume = clamp_volume(volume);
        self.volume_set_during_restore |= self.restore_tokens.current().is_some();
        self.state.volume = volume;
        self.surface.set_volume(volume);
        self.emit(PlaybackEvent::VolumeChanged { volume });
        self.finish(before);
        true
    }

    // ===== Shuffle & Repeat =====

    /// Cycle repeat mode: off -> all -> one -> off
    pub fn toggle_repeat_mode(&mut self) -> RepeatMode {
        let mode = self.state.repeat_mode.cycle();
        self.set_repeat_mode(mode);
        mode
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        let before = self.status();
        self.state.repeat_mode = mode;
        self.emit_mode_changed();
        self.finish(before);
    }

    /// Toggle the shuffle flag
    ///
    /// Turning shuffle on reorders everything but the current item, which moves
    /// to the head. Turning it off only clears the flag; the shuffled order stays.
    pub fn toggle_shuffle(&mut self) -> bool {
        let before = self.status();

        if self.state.is_shuffled {
            self.state.is_shuffled = false;
        } else {
            let (shuffled, current) = shuffle_with_pinned_head(
                &self.state.queue,
                self.state.current_index,
                &mut self.rng,
            );
            self.state.queue = shuffled;
            self.state.current_index = current;
            self.state.is_shuffled = true;
            self.queue_mutated();
        }

        self.emit_mode_changed();
        self.finish(before);
        self.state.is_shuffled
    }

    // ===== Queue Management =====

    /// Insert `track` right after the current item
    ///
    /// Returns the new item's id.
    pub fn queue_next(&mut self, track: Track) -> String {
        let position = self.state.current_index.map_or(0, |i| i + 1);
        self.insert_pinned(track, position)
    }

    /// Append `track` to the end of the queue
    ///
    /// Returns the new item's id.
    pub fn queue_last(&mut self, track: Track) -> String {
        let position = self.state.queue.len();
        self.insert_pinned(track, position)
    }

    /// Remove the item with `item_id`
    ///
    /// Removing the current item moves playback to the item that followed it
    /// (or the new last item, paused, when it was the last one).
    pub fn remove_from_queue(&mut self, item_id: &str) -> bool {
        let Some((removed_at, removed)) = queue::remove_by_id(&mut self.state.queue, item_id)
        else {
            debug!(item_id, "Ignoring removal of unknown queue item");
            return false;
        };
        let before = self.status();
        let len = self.state.queue.len();

        match self.state.current_index {
            Some(current) if removed_at < current => {
                self.state.current_index = Some(current - 1);
            }
            Some(current) if removed_at == current => {
                debug!(track_id = %removed.track.id, "Removed the current item");
                let keep_playing = self.wants_playback();
                if len == 0 {
                    self.state.current_index = None;
                    self.halt();
                } else if current < len {
                    self.load_current(keep_playing);
                } else {
                    self.state.current_index = Some(len - 1);
                    self.load_current(false);
                }
            }
            _ => {}
        }

        self.queue_mutated();
        self.finish(before);
        true
    }

    /// Move the item at `from` to `to`, keeping the current item current
    pub fn move_queue_item(&mut self, from: usize, to: usize) -> bool {
        if !queue::move_item(&mut self.state.queue, from, to) {
            debug!(from, to, "Ignoring out-of-range queue move");
            return false;
        }
        let before = self.status();
        if let Some(current) = self.state.current_index {
            self.state.current_index = Some(index_after_move(current, from, to));
        }
        self.queue_mutated();
        self.finish(before);
        true
    }

    /// Clear the queue
    ///
    /// With `preserve_pinned`, user-queued items stay (in order) and the current
    /// index follows the current item, or falls to the pinned item nearest to
    /// it. `stop_playback` also halts the surface.
    pub fn clear_queue(&mut self, preserve_pinned: bool, stop_playback: bool) {
        let before = self.status();
        let previous_item = self.state.current_item().map(|item| item.item_id.clone());
        let keep_playing = self.wants_playback();

        if preserve_pinned {
            let new_current = self
                .state
                .current_index
                .and_then(|current| nearest_pinned_position(&self.state.queue, current));
            self.state.queue = queue::filter_pinned(&self.state.queue);
            self.state.current_index = new_current;
        } else {
            self.state.queue.clear();
            self.state.current_index = None;
        }
        self.queue_mutated();

        let current_item = self.state.current_item().map(|item| item.item_id.clone());
        if current_item.is_none() || stop_playback {
            self.halt();
        } else if current_item != previous_item {
            self.load_current(keep_playing);
        }

        self.finish(before);
    }

    // ===== Surface Events =====

    /// Apply an event from the rendering surface
    ///
    /// Events for anything but the latest load are discarded. Returns whether
    /// the event was applied.
    pub fn handle_surface_event(&mut self, event: SurfaceEvent) -> bool {
        if !self.load_tokens.is_current(event.token()) {
            debug!(token = %event.token(), "Discarding stale surface event");
            return false;
        }
        let before = self.status();

        match event {
            SurfaceEvent::Ready {
                duration_seconds, ..
            } => {
                self.state.is_loading = false;
                self.loaded = true;
                if let Some(duration) = duration_seconds.filter(|d| d.is_finite() && *d > 0.0) {
                    self.state.duration_seconds = duration;
                }
                if std::mem::take(&mut self.autoplay_on_ready) {
                    self.surface.play();
                    self.state.is_playing = true;
                }
            }
            SurfaceEvent::TimeUpdate { seconds, .. } => {
                if seconds.is_finite() {
                    let mut progress = seconds.max(0.0);
                    if self.state.duration_seconds > 0.0 {
                        progress = progress.min(self.state.duration_seconds);
                    }
                    self.state.progress_seconds = progress;
                }
                // Progress is not part of the snapshot
                self.emit_status_change(before);
                return true;
            }
            SurfaceEvent::Ended { .. } => self.on_track_ended(),
            SurfaceEvent::Error { message, .. } => {
                warn!(error = %message, "Rendering surface error, halting on current item");
                self.state.is_playing = false;
                self.state.is_loading = false;
                self.loaded = false;
                self.state.last_error = Some(message.clone());
                self.emit(PlaybackEvent::Error { message });
            }
        }

        self.finish(before);
        true
    }

    fn on_track_ended(&mut self) {
        // An end implies the load completed, even if Ready never arrived
        self.state.is_loading = false;
        self.loaded = true;

        if self.state.repeat_mode == RepeatMode::One {
            self.state.progress_seconds = 0.0;
            self.surface.seek(0.0);
            self.surface.play();
            self.state.is_playing = true;
            return;
        }

        if let Some(target) = self.next_target() {
            self.state.current_index = Some(target);
            self.load_current(true);
        } else {
            // Paused at the end of the last item
            self.state.is_playing = false;
            if self.state.duration_seconds > 0.0 {
                self.state.progress_seconds = self.state.duration_seconds;
            }
        }
    }

    // ===== Restoration =====

    /// Start restoring the persisted session
    ///
    /// Returns `None` when there is nothing (valid) to restore. The task runs
    /// without borrowing the controller; its result is applied with
    /// `apply_restored` and is dropped if any queue command ran in between.
    pub fn begin_restore(&mut self) -> Option<RestoreTask> {
        let snapshot = self.persistence.load()?;
        let token = self.restore_tokens.issue();
        self.volume_set_during_restore = false;
        info!(token = %token, items = snapshot.queue.len(), "Restoring playback session");
        Some(RestoreTask {
            token,
            snapshot,
            persistence: self.persistence.clone(),
        })
    }

    /// Apply a finished restoration
    ///
    /// The restored session comes back paused on its current item.
    pub fn apply_restored(&mut self, restored: RestoredQueue) -> bool {
        if !self.restore_tokens.is_current(restored.token) {
            debug!(token = %restored.token, "Discarding superseded restoration");
            return false;
        }
        self.restore_tokens.invalidate();
        let before = self.status();

        let RestoredQueue {
            snapshot, items, ..
        } = restored;
        self.state.current_index = restored_index(&items, &snapshot);
        self.state.queue = items;
        self.state.is_shuffled = false;
        self.emit(PlaybackEvent::QueueChanged {
            length: self.state.queue.len(),
        });
        if std::mem::take(&mut self.volume_set_during_restore) {
            debug!(volume = self.state.volume, "Keeping volume set during restoration");
        } else {
            self.state.volume = clamp_volume(snapshot.volume);
            self.surface.set_volume(self.state.volume);
            self.emit(PlaybackEvent::VolumeChanged {
                volume: self.state.volume,
            });
        }
        if self.state.current_index.is_some() {
            self.load_current(false);
        }

        self.finish(before);
        true
    }

    /// Restore the persisted session in one step
    ///
    /// Holds the controller for the whole lookup; hosts that keep accepting
    /// commands meanwhile should use `begin_restore` / `apply_restored`.
    pub async fn restore<C>(&mut self, catalog: &C) -> bool
    where
        C: CatalogLookup + ?Sized,
    {
        let Some(task) = self.begin_restore() else {
            return false;
        };
        let restored = task.run(catalog).await;
        self.apply_restored(restored)
    }

    // ===== Internals =====

    fn next_target(&self) -> Option<usize> {
        let len = self.state.queue.len();
        match self.state.current_index {
            // Nothing current: the head is next
            None => (len > 0).then_some(0),
            Some(current) => queue::next_index(current, len)
                .or_else(|| (self.state.repeat_mode == RepeatMode::All && len > 0).then_some(0)),
        }
    }

    fn insert_pinned(&mut self, track: Track, position: usize) -> String {
        let before = self.status();
        let item = QueueItem::pinned(track);
        let item_id = item.item_id.clone();
        queue::insert_at(&mut self.state.queue, [item], position);
        self.queue_mutated();
        self.finish(before);
        item_id
    }

    fn wants_playback(&self) -> bool {
        self.state.is_playing || (self.state.is_loading && self.autoplay_on_ready)
    }

    /// Load the current item into the surface
    fn load_current(&mut self, autoplay: bool) {
        let Some(track) = self.state.current_track().cloned() else {
            self.halt();
            return;
        };

        if self.state.is_loading {
            // Abort the superseded load before starting the next one
            self.surface.stop();
        }
        let token = self.load_tokens.issue();

        self.state.is_loading = true;
        self.state.is_playing = false;
        self.state.progress_seconds = 0.0;
        self.state.duration_seconds = track.duration_seconds();
        self.state.last_error = None;
        self.autoplay_on_ready = autoplay;
        self.loaded = false;

        debug!(track_id = %track.id, token = %token, autoplay, "Loading track");
        self.surface.load(&track, token);

        let item_id = self.state.current_item().map(|item| item.item_id.clone());
        self.emit(PlaybackEvent::TrackChanged {
            item_id,
            track_id: Some(track.id.to_string()),
        });
    }

    /// Stop the surface and forget any in-flight load
    fn halt(&mut self) {
        self.load_tokens.invalidate();
        self.surface.stop();
        self.state.is_playing = false;
        self.state.is_loading = false;
        self.autoplay_on_ready = false;
        self.loaded = false;

        if self.state.current_index.is_none() {
            self.state.progress_seconds = 0.0;
            self.state.duration_seconds = 0.0;
            self.emit(PlaybackEvent::TrackChanged {
                item_id: None,
                track_id: None,
            });
        }
    }

    fn queue_mutated(&mut self) {
        // A restoration finishing after this would clobber the user's change
        self.restore_tokens.invalidate();
        self.emit(PlaybackEvent::QueueChanged {
            length: self.state.queue.len(),
        });
    }

    fn finish(&mut self, before: PlaybackStatus) {
        debug_assert!(
            self.state.current_index.is_none() || self.state.current_item().is_some(),
            "current index out of range"
        );
        self.emit_status_change(before);
        self.persistence.debounced_save(&self.state, self.debounce);
    }

    fn emit_status_change(&mut self, before: PlaybackStatus) {
        let status = self.status();
        if status != before {
            self.emit(PlaybackEvent::StateChanged { status });
        }
    }

    fn emit_mode_changed(&mut self) {
        self.emit(PlaybackEvent::ModeChanged {
            repeat_mode: self.state.repeat_mode,
            is_shuffled: self.state.is_shuffled,
        });
    }

    fn emit(&mut self, event: PlaybackEvent) {
        self.pending_events.push(event);
    }
}

/// A pending restoration, detached from the controller
#[derive(Debug)]
pub struct RestoreTask {
    token: RequestToken,
    snapshot: PersistedSnapshot,
    persistence: PersistenceManager,
}

impl RestoreTask {
    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn snapshot(&self) -> &PersistedSnapshot {
        &self.snapshot
    }

    /// Resolve every snapshot item through the catalog
    pub async fn run<C>(self, catalog: &C) -> RestoredQueue
    where
        C: CatalogLookup + ?Sized,
    {
        let items = self.persistence.restore(&self.snapshot, catalog).await;
        RestoredQueue {
            token: self.token,
            snapshot: self.snapshot,
            items,
        }
    }
}

/// Result of a restoration, ready for `apply_restored`
#[derive(Debug, Clone)]
pub struct RestoredQueue {
    pub token: RequestToken,
    pub snapshot: PersistedSnapshot,
    pub items: Vec<QueueItem>,
}

/// Position of the pinned item that survives a selective clear in place of
/// the item at `current`: the item itself if pinned, else the nearest pinned
/// item (ties go to the upcoming one). Positions are in the filtered queue.
fn nearest_pinned_position(items: &[QueueItem], current: usize) -> Option<usize> {
    let pinned: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.is_pinned)
        .map(|(i, _)| i)
        .collect();

    pinned
        .into_iter()
        .enumerate()
        .min_by_key(|&(_, original)| (original.abs_diff(current), original < current))
        .map(|(rank, _)| rank)
}

/// Current index for a rehydrated queue
///
/// Prefers the snapshot index if it still holds the current track, then the
/// first occurrence of that track, then the snapshot index clamped.
fn restored_index(items: &[QueueItem], snapshot: &PersistedSnapshot) -> Option<usize> {
    if items.is_empty() {
        return None;
    }
    let position = snapshot.current_position();

    if let Some(track_id) = snapshot.current_track_id.as_deref() {
        let at_position = position
            .and_then(|p| items.get(p))
            .is_some_and(|item| item.track.id.as_str() == track_id);
        if at_position {
            return position;
        }
        if let Some(found) = queue::find_index_by_track_id(items, &TrackId::new(track_id)) {
            return Some(found);
        }
    }

    position.map(|p| p.min(items.len() - 1))
}
