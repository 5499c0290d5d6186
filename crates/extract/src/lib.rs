//! Episode metadata extraction for zeitsprung.fm podcast pages.
//!
//! One fetched page goes in, one typed [`Episode`](models::Episode) record
//! comes out - or `None` when the episode has not been published yet. The
//! extractor never touches the network; fetching is the caller's concern.

mod consts;
pub mod error;
mod extract;
pub mod models;
mod normalize;

pub use crate::extract::{Extractor, Graph};
pub use crate::normalize::normalize;

use crate::error::Result;
use crate::models::Episode;
use tracing::instrument;

/// Easy, top-level entrypoint: turn one fetched page into an [`Episode`], or
/// detect that the episode is not published yet.
///
/// Any non-200 status maps to `Ok(None)`. This layer deliberately does not
/// distinguish a transient upstream failure from a page that does not exist;
/// both mean "try again later" to the crawl loop.
///
/// Accepts raw bytes instead of requiring the page to be valid UTF-8; invalid
/// byte sequences are replaced with U+FFFD during parsing.
#[instrument(skip(body), fields(body_size = body.as_ref().len()))]
pub fn extract(uid: u32, status: u16, body: impl AsRef<[u8]>) -> Result<Option<Episode>> {
    if status != 200 {
        return Ok(None);
    }
    let html = String::from_utf8_lossy(body.as_ref());
    Extractor::from_html(uid, &html).episode().map(Some)
}
