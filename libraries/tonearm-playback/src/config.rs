//! Playback engine configuration
use crate::error::{PlaybackError, Result};
use crate::types::RepeatMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default snapshot key in the durable store
pub const DEFAULT_STORAGE_KEY: &str = "tonearm.playback";

/// Default snapshot lifetime: 7 days
pub const DEFAULT_MAX_AGE_MS: u64 = 7 * 24 * 60 * 60 * 1000;

/// Default debounce delay for state writes
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Key holding the persisted snapshot
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Snapshots older than this are discarded on load
    #[serde(default = "default_max_age_ms")]
    pub max_age_ms: u64,

    /// Quiet period before a burst of mutations is written
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Volume for a fresh session (0.0-1.0)
    #[serde(default = "default_volume")]
    pub initial_volume: f64,

    /// Repeat mode for a fresh session
    #[serde(default)]
    pub initial_repeat: RepeatMode,

    /// Seed for the shuffle RNG; entropy-seeded when absent
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            max_age_ms: default_max_age_ms(),
            debounce_ms: default_debounce_ms(),
            initial_volume: default_volume(),
            initial_repeat: RepeatMode::Off,
            shuffle_seed: None,
        }
    }
}

impl PlaybackConfig {
    /// Load configuration from an optional TOML file and the environment
    ///
    /// Environment variables are prefixed with `TONEARM_`, e.g.
    /// `TONEARM_DEBOUNCE_MS=250`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        if let Some(path) = path {
            if path.exists() {
                settings = settings.add_source(config::File::from(path));
            }
        }

        settings = settings.add_source(config::Environment::with_prefix("TONEARM").try_parsing(true));

        let config = settings
            .build()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| PlaybackError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage_key.is_empty() {
            return Err(PlaybackError::Config("storage_key must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.initial_volume) {
            return Err(PlaybackError::Config(format!(
                "initial_volume must be within 0.0-1.0, got {}",
                self.initial_volume
            )));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_max_age_ms() -> u64 {
    DEFAULT_MAX_AGE_MS
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE_MS
}

fn default_volume() -> f64 {
    0.8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let config = PlaybackConfig::default();
        assert_eq!(config.storage_key, "tonearm.playback");
        assert_eq!(config.max_age(), Duration::from_secs(7 * 24 * 3600));
        assert_eq!(config.debounce(), Duration::from_millis(500));
        assert_eq!(config.initial_volume, 0.8);
        assert_eq!(config.initial_repeat, RepeatMode::Off);
        assert!(config.shuffle_seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_toml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tonearm.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "debounce_ms = 250").unwrap();
        writeln!(file, "initial_repeat = \"all\"").unwrap();
        writeln!(file, "shuffle_seed = 42").unwrap();

        let config = PlaybackConfig::load(Some(&path)).unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert_eq!(config.initial_repeat, RepeatMode::All);
        assert_eq!(config.shuffle_seed, Some(42));
        // Untouched fields keep defaults
        assert_eq!(config.max_age_ms, DEFAULT_MAX_AGE_MS);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = PlaybackConfig::load(Some(Path::new("/nonexistent/tonearm.toml"))).unwrap();
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn rejects_out_of_range_volume() {
        let config = PlaybackConfig {
            initial_volume: 1.2,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
