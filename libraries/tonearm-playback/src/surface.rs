//! Audio rendering surface boundary
//!
//! The engine issues transport commands to a surface it does not own (a
//! decoder + output device, a media element, a cast target) and receives its
//! events back through `PlaybackController::handle_surface_event`.

use crate::tokens::RequestToken;
use serde::{Deserialize, Serialize};
use tonearm_core::Track;

/// Platform rendering surface
///
/// Every load is tagged with a `RequestToken`; the surface must echo that
/// token on every event it emits for the load so stale events can be dropped.
pub trait RenderSurface {
    /// Start loading `track`; emits `Ready` (or `Error`) tagged with `token`
    fn load(&mut self, track: &Track, token: RequestToken);

    /// Start or resume output
    fn play(&mut self);

    /// Pause output, keeping position
    fn pause(&mut self);

    /// Halt output and abort any in-flight load
    fn stop(&mut self);

    /// Seek within the loaded track
    fn seek(&mut self, seconds: f64);

    /// Apply output volume in `[0, 1]`
    fn set_volume(&mut self, volume: f64);
}

/// Events emitted by the rendering surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// Load finished; the surface can play
    Ready {
        token: RequestToken,
        /// Duration reported by the decoder, when known
        duration_seconds: Option<f64>,
    },

    /// Playback reached the end of the track
    Ended { token: RequestToken },

    /// Periodic position report
    TimeUpdate { token: RequestToken, seconds: f64 },

    /// Decode or output failure
    Error {
        token: RequestToken,
        message: String,
    },
}

impl SurfaceEvent {
    /// Token of the load this event belongs to
    pub fn token(&self) -> RequestToken {
        match self {
            Self::Ready { token, .. }
            | Self::Ended { token }
            | Self::TimeUpdate { token, .. }
            | Self::Error { token, .. } => *token,
        }
    }
}

/// Command issued to a surface, as captured by `RecordingSurface`
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    Load { track_id: String, token: RequestToken },
    Play,
    Pause,
    Stop,
    Seek(f64),
    SetVolume(f64),
}

/// Surface that records commands instead of rendering
///
/// Useful for headless hosts and tests.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    commands: Vec<SurfaceCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands received so far
    pub fn commands(&self) -> &[SurfaceCommand] {
        &self.commands
    }

    /// Token of the most recent load
    pub fn last_load_token(&self) -> Option<RequestToken> {
        self.commands.iter().rev().find_map(|cmd| match cmd {
            SurfaceCommand::Load { token, .. } => Some(*token),
            _ => None,
        })
    }

    /// Track id of the most recent load
    pub fn last_loaded_track(&self) -> Option<&str> {
        self.commands.iter().rev().find_map(|cmd| match cmd {
            SurfaceCommand::Load { track_id, .. } => Some(track_id.as_str()),
            _ => None,
        })
    }

    /// Most recent command
    pub fn last_command(&self) -> Option<&SurfaceCommand> {
        self.commands.last()
    }

    /// Forget recorded commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn load(&mut self, track: &Track, token: RequestToken) {
        self.commands.push(SurfaceCommand::Load {
            track_id: track.id.to_string(),
            token,
        });
    }

    fn play(&mut self) {
        self.commands.push(SurfaceCommand::Play);
    }

    fn pause(&mut self) {
        self.commands.push(SurfaceCommand::Pause);
    }

    fn stop(&mut self) {
        self.commands.push(SurfaceCommand::Stop);
    }

    fn seek(&mut self, seconds: f64) {
        self.commands.push(SurfaceCommand::Seek(seconds));
    }

    fn set_volume(&mut self, volume: f64) {
        self.commands.push(SurfaceCommand::SetVolume(volume));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::RequestTokens;

    #[test]
    fn recording_surface_tracks_last_load() {
        let mut tokens = RequestTokens::new();
        let mut surface = RecordingSurface::new();
        assert!(surface.last_load_token().is_none());

        let first = tokens.issue();
        surface.load(&Track::new("a", "A"), first);
        surface.play();
        let second = tokens.issue();
        surface.load(&Track::new("b", "B"), second);

        assert_eq!(surface.last_load_token(), Some(second));
        assert_eq!(surface.last_loaded_track(), Some("b"));
        assert_eq!(surface.commands().len(), 3);
    }

    #[test]
    fn event_token_accessor() {
        let token = RequestTokens::new().issue();
        let event = SurfaceEvent::TimeUpdate {
            token,
            seconds: 1.5,
        };
        assert_eq!(event.token(), token);
    }
}
