//! Timed-lyric synchronisation engine.
//!
//! Raw LRC text goes through a [`LyricParser`] into an immutable [`Lyric`],
//! whose [`Timeline`] answers "which line is showing and how much of it is
//! revealed" for any playback position. A [`PlaybackCoordinator`] owns a
//! pausable [`SyncClock`], keeps it aligned with an external
//! [`AudioTransport`], and reports reveal progress to a [`RenderSink`].
//! Everything here is synchronous and single-threaded; I/O is limited to
//! the file-loading helpers.

pub mod audio;
pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod lyric;
pub mod parser;
pub mod render;
pub mod timeline;

pub use audio::{AudioTransport, SimulatedTransport};
pub use clock::{
    ClockPhase, ClockState, ManualTimeSource, MonotonicTimeSource, SyncClock, TimeSource,
};
pub use config::{AppConfig, SyncConfig, TrackDescriptor};
pub use coordinator::{FillUpdate, PlaybackCoordinator};
pub use error::{KaraokeError, Result};
pub use lyric::{Lyric, LyricMetadata, LyricSegment, TimedWord};
pub use parser::{load_lyric_file, parse_timestamp, LrcParser, LyricParser, ParseIssue, ParseWarning};
pub use render::{RecordingSink, RenderEvent, RenderSink};
pub use timeline::{FillCurve, FillPoint, Timeline};
