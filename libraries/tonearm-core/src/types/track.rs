/// Track domain type
use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Catalog track
///
/// Owned by the catalog; the playback engine treats it as read-only value data
/// and only relies on `id` for identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Credited artists, in display order
    #[serde(default)]
    pub artists: Vec<String>,

    /// Track duration, if the catalog knows it
    #[serde(default)]
    pub duration: Option<Duration>,

    /// Artwork URL
    #[serde(default)]
    pub artwork_url: Option<String>,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artists: Vec::new(),
            duration: None,
            artwork_url: None,
        }
    }

    /// Set the credited artists
    #[must_use]
    pub fn with_artists<I, S>(mut self, artists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.artists = artists.into_iter().map(Into::into).collect();
        self
    }

    /// Set the duration
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Set the artwork URL
    #[must_use]
    pub fn with_artwork(mut self, url: impl Into<String>) -> Self {
        self.artwork_url = Some(url.into());
        self
    }

    /// Duration in seconds, `0.0` when unknown
    pub fn duration_seconds(&self) -> f64 {
        self.duration.map_or(0.0, |d| d.as_secs_f64())
    }

    /// Artists joined for display ("A, B")
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}
