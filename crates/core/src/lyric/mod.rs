use serde::{Deserialize, Serialize};

use crate::Timeline;

/// Header tags carried by an LRC document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub contributor: String,
}

impl LyricMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.artist.is_empty()
            && self.album.is_empty()
            && self.contributor.is_empty()
    }
}

/// A word inside a segment that carries its own start time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedWord {
    /// Absolute start time in seconds.
    pub start: f64,
    pub text: String,
}

impl TimedWord {
    pub fn new(start: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            text: text.into(),
        }
    }
}

/// One timed line of the lyric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricSegment {
    /// Start time in seconds, never negative.
    pub timestamp: f64,
    /// Display text with any inline word markers removed.
    pub text: String,
    /// Word-level timing, empty when the line has none.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub words: Vec<TimedWord>,
}

impl LyricSegment {
    pub fn new(timestamp: f64, text: impl Into<String>) -> Self {
        Self {
            timestamp: non_negative(timestamp),
            text: text.into(),
            words: Vec::new(),
        }
    }

    /// Builds a segment whose display text is the concatenation of `words`.
    pub fn with_words(timestamp: f64, words: Vec<TimedWord>) -> Self {
        let text = words.iter().map(|word| word.text.as_str()).collect();
        Self {
            timestamp: non_negative(timestamp),
            text,
            words,
        }
    }

    pub fn has_word_timing(&self) -> bool {
        !self.words.is_empty()
    }
}

/// Clamps to `[0, ∞)`, mapping `-0.0` and NaN to `0.0` so that equal
/// instants compare equal under `total_cmp`.
pub(crate) fn non_negative(seconds: f64) -> f64 {
    if seconds > 0.0 {
        seconds
    } else {
        0.0
    }
}

/// A parsed lyric: header metadata plus its timeline.
///
/// Consumers only ever read a `Lyric`; it is assembled once by a
/// [`LyricParser`](crate::LyricParser).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Lyric {
    metadata: LyricMetadata,
    timeline: Timeline,
}

impl Lyric {
    pub(crate) fn new(metadata: LyricMetadata, timeline: Timeline) -> Self {
        Self { metadata, timeline }
    }

    pub fn metadata(&self) -> &LyricMetadata {
        &self.metadata
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// All segment texts in playback order, one per line.
    pub fn full_text(&self) -> String {
        self.timeline
            .segments()
            .iter()
            .map(|segment| segment.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
