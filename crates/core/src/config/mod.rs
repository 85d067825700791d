use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{KaraokeError, Result};

/// Top-level configuration: sync tuning plus the track catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub tracks: Vec<TrackDescriptor>,
}

impl AppConfig {
    /// Decodes and validates a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        self.sync.validate()
    }

    pub fn track(&self, title: &str) -> Option<&TrackDescriptor> {
        self.tracks
            .iter()
            .find(|track| track.title.eq_ignore_ascii_case(title))
    }
}

/// Tuning for the playback coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Largest tolerated gap, in seconds, between the lyric clock and the
    /// audio position before the lyric clock is re-seeked.
    pub drift_threshold: f64,
    /// Reveal window, in seconds, for the final segment, which has no
    /// successor to bound it.
    pub final_segment_hold: f64,
    /// Suggested cadence for whoever drives `on_tick`.
    pub tick_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            drift_threshold: 0.3,
            final_segment_hold: 4.0,
            tick_interval_ms: 50,
        }
    }
}

impl SyncConfig {
    pub fn with_drift_threshold(mut self, drift_threshold: f64) -> Self {
        self.drift_threshold = drift_threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.drift_threshold.is_finite() && self.drift_threshold > 0.0) {
            return Err(KaraokeError::InvalidConfig(format!(
                "drift_threshold must be a positive number of seconds, got {}",
                self.drift_threshold
            )));
        }
        if !(self.final_segment_hold.is_finite() && self.final_segment_hold > 0.0) {
            return Err(KaraokeError::InvalidConfig(format!(
                "final_segment_hold must be a positive number of seconds, got {}",
                self.final_segment_hold
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(KaraokeError::InvalidConfig(
                "tick_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One entry of the song catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub title: String,
    #[serde(default)]
    pub artist: String,
    pub audio_path: String,
    pub lyric_path: String,
}
