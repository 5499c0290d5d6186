//! Audio ingestion: download an episode's MP3 payload, decode it to PCM, and
//! normalize it to a WAV file.
//!
//! The decode step is CPU-bound and runs off the async runtime on a blocking
//! thread; everything else is plain async I/O. Nothing here retries - the
//! crawl loop decides what a failed download means.

mod decode;
pub mod error;
mod fetch;
mod wav;

pub use crate::decode::{AudioProperties, DecodedAudio, decode};
pub use crate::fetch::fetch;

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use tracing::instrument;

/// Materialize a decoded audio stream from a download URL.
///
/// Fetches the payload (following redirects) and decodes it as MP3. The
/// returned [`DecodedAudio`] carries the derived properties and can be
/// exported to a caller-supplied path via [`DecodedAudio::export`].
#[instrument(skip(client))]
pub async fn ingest(client: &reqwest::Client, url: &str) -> Result<DecodedAudio> {
    let payload = fetch(client, url).await?;
    tokio::task::spawn_blocking(move || decode(payload)).await.or_raise(|| ErrorKind::TaskJoin)?
}
