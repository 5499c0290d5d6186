use time::OffsetDateTime;

/// Metadata extracted from a single episode page.
///
/// The `uid` is assigned by the crawl sequence, not read from the page:
/// episode numbering is dense and sequential starting at 1, and the page URL
/// is derived from it. Everything else comes out of the page itself.
///
/// Free-text fields (`abbreviation`, `title`, `description`) are stored in
/// normalized form; see [`normalize`](crate::normalize).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    /// Episode number (primary identity).
    pub uid: u32,
    /// Publication timestamp from the page's structured data.
    pub published_at: OffsetDateTime,
    /// Last-modified timestamp from the page's structured data.
    pub modified_at: OffsetDateTime,
    /// Short episode code from the page title, e.g. `"ZS99"`.
    pub abbreviation: String,
    /// Episode title (the part after the colon).
    pub title: String,
    /// Teaser text from the Open Graph description tag.
    pub description: String,
    /// Canonical URL of the episode page.
    pub episode_url: String,
    /// Download URL of the episode audio; some episodes have none.
    pub audio_url: Option<String>,
}

impl Episode {
    /// Returns `true` if the episode has downloadable audio.
    pub fn has_audio(&self) -> bool {
        self.audio_url.is_some()
    }
}
