//! Harvester Error Types
//!
//! Failures from the pipeline crates are re-raised under process-level
//! categories here; the original error trees stay attached as sources.

use derive_more::{Display, Error};

/// A harvester error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for harvester operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error: {_0}")]
    Config(#[error(not(source))] String),
    /// Creating the data folder layout failed.
    #[display("data folder setup failed")]
    Bootstrap,
    /// The episode page request did not complete.
    #[display("episode page fetch failed")]
    Fetch,
    /// The episode page violated the upstream contract.
    #[display("episode page extraction failed")]
    Extract,
    /// Downloading, decoding, or exporting the episode audio failed.
    #[display("audio ingestion failed")]
    Audio,
    /// A store operation failed; a duplicate key here means the crawl cursor
    /// and the committed rows have diverged.
    #[display("storage operation failed")]
    Storage,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch)
    }
}
