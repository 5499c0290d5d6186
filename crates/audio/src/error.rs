//! Audio Ingestion Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// An audio ingestion error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for audio operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The download did not complete.
    #[display("audio download failed")]
    Fetch,
    /// The server answered with a non-success status.
    #[display("audio download returned HTTP {_0}")]
    FetchStatus(#[error(not(source))] u16),
    /// The payload could not be decoded as an audio stream.
    #[display("audio decode failed: {_0}")]
    Decode(#[error(not(source))] &'static str),
    /// Writing the normalized file failed.
    #[display("audio export failed")]
    Io,
    /// The blocking decode task died before delivering a result.
    #[display("audio decode task failed")]
    TaskJoin,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Network hiccups may clear up; a payload that doesn't decode won't
        // start decoding on the second attempt.
        matches!(self, Self::Fetch | Self::FetchStatus(_))
    }
}
