use crate::clock::ClockPhase;

/// Result alias that carries the custom [`KaraokeError`] type.
pub type Result<T> = std::result::Result<T, KaraokeError>;

/// Common error type for the core crate.
///
/// Nothing in the sync engine is fatal. Clock misuse comes back as
/// [`KaraokeError::InvalidTransition`] and leaves the clock untouched, while
/// malformed lyric lines never surface here at all (see
/// [`ParseWarning`](crate::ParseWarning)).
#[derive(Debug, thiserror::Error)]
pub enum KaraokeError {
    /// Free-form message for conditions without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// A configuration document could not be decoded.
    #[error("invalid configuration document: {0}")]
    Config(#[from] serde_json::Error),
    /// A configuration value was decoded but is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A clock operation was requested in a phase that does not allow it.
    #[error("cannot {operation} while the clock is {phase}")]
    InvalidTransition {
        operation: &'static str,
        phase: ClockPhase,
    },
}

impl KaraokeError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }

    /// Returns `true` for clock misuse, which callers may treat as a no-op.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}
