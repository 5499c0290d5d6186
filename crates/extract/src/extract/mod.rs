//! Main extraction logic for episode pages.

mod graph;

pub use self::graph::Graph;
use crate::consts;
use crate::error::{ErrorKind, Result};
use crate::models::Episode;
use crate::normalize::normalize;
use exn::OptionExt;
use scraper::{Html, Selector};
use tracing::instrument;

/// Extracts the metadata record of one episode from its fetched page.
#[derive(Debug)]
pub struct Extractor {
    uid: u32,
    document: Html,
}

impl Extractor {
    pub fn from_document(uid: u32, document: Html) -> Self {
        Self { uid, document }
    }

    pub fn from_html(uid: u32, html: &str) -> Self {
        Self::from_document(uid, Html::parse_document(html))
    }

    /// Extracts the full episode record.
    ///
    /// # Errors
    ///
    /// Returns an error if the page violates the upstream contract:
    /// - missing/unparseable JSON-LD timestamps,
    /// - a `<title>` without the colon delimiter,
    /// - missing `og:description` or `og:url` meta tags.
    ///
    /// An absent download list is NOT an error; it means the episode has no
    /// audio.
    #[instrument(skip(self), fields(uid = self.uid))]
    pub fn episode(self) -> Result<Episode> {
        let graph = Graph::parse(&self.document)?;
        let published_at = graph.timestamp("datePublished")?;
        let modified_at = graph.timestamp("dateModified")?;
        let (abbreviation, title) = self.split_title()?;
        Ok(Episode {
            uid: self.uid,
            published_at,
            modified_at,
            abbreviation: normalize(&abbreviation),
            title: normalize(&title),
            description: normalize(&self.description()?),
            episode_url: self.episode_url()?,
            audio_url: self.audio_url(),
        })
    }

    /// Page titles follow the `"<abbreviation>: <title>"` convention.
    /// Splitting on the first colon keeps colons inside the title intact.
    fn split_title(&self) -> Result<(String, String)> {
        let text = self
            .document
            .select(&consts::TITLE_SELECTOR)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_raise(|| ErrorKind::MissingField("title"))?;
        let (abbreviation, title) = text.split_once(':').ok_or_raise(|| ErrorKind::MalformedTitle)?;
        let title = title.strip_prefix(' ').unwrap_or(title);
        Ok((abbreviation.trim().to_string(), title.to_string()))
    }

    fn description(&self) -> Result<String> {
        self.meta_content(&consts::OG_DESCRIPTION_SELECTOR)
            .ok_or_raise(|| ErrorKind::MissingField("og:description"))
    }

    fn episode_url(&self) -> Result<String> {
        self.meta_content(&consts::OG_URL_SELECTOR).ok_or_raise(|| ErrorKind::MissingField("og:url"))
    }

    fn meta_content(&self, selector: &Selector) -> Option<String> {
        self.document.select(selector).next().and_then(|el| el.value().attr("content")).map(str::to_string)
    }

    /// Href of the first anchor in the download list, if the list exists.
    fn audio_url(&self) -> Option<String> {
        self.document
            .select(&consts::DOWNLOAD_ANCHOR_SELECTOR)
            .next()
            .and_then(|el| el.value().attr("href"))
            .map(str::to_string)
    }
}
impl TryFrom<Extractor> for Episode {
    type Error = crate::error::Error;
    fn try_from(extractor: Extractor) -> Result<Self> {
        extractor.episode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    const LD_JSON: &str = r#"{"@context":"https://schema.org","@graph":[
        {"@type":"WebPage","url":"https://www.zeitsprung.fm/podcast/zs99/"},
        {"@type":"PodcastEpisode","datePublished":"2019-05-12T08:00:00+00:00","dateModified":"2019-05-13T09:30:00+00:00"}
    ]}"#;

    fn page(title: &str, head_extra: &str, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html>
            <html><head>
            <title>{title}</title>
            <script type="application/ld+json">{LD_JSON}</script>
            <meta property="og:url" content="https://www.zeitsprung.fm/podcast/zs99/" />
            {head_extra}
            </head><body>{body}</body></html>"#
        )
    }

    fn full_page() -> String {
        page(
            "ZS99: The Great Test Episode",
            r#"<meta property="og:description" content="A test episode about nothing at all." />"#,
            r#"<ul class="episode_download_list">
                <li><a href="https://cdn.zeitsprung.fm/zs99.mp3">mp3</a></li>
                <li><a href="https://cdn.zeitsprung.fm/zs99.ogg">ogg</a></li>
            </ul>"#,
        )
    }

    #[test]
    fn test_full_extraction() {
        let episode = Extractor::from_html(99, &full_page()).episode().unwrap();
        assert_eq!(episode.uid, 99);
        assert_eq!(episode.abbreviation, "ZS99");
        assert_eq!(episode.title, "The Great Test Episode");
        assert_eq!(episode.description, "A test episode about nothing at all.");
        assert_eq!(episode.episode_url, "https://www.zeitsprung.fm/podcast/zs99/");
        assert_eq!(episode.published_at, datetime!(2019-05-12 08:00 UTC));
        assert_eq!(episode.modified_at, datetime!(2019-05-13 09:30 UTC));
    }

    #[test]
    fn test_first_download_link_wins() {
        let episode = Extractor::from_html(99, &full_page()).episode().unwrap();
        assert_eq!(episode.audio_url.as_deref(), Some("https://cdn.zeitsprung.fm/zs99.mp3"));
    }

    #[test]
    fn test_absent_download_list_means_no_audio() {
        let html = page(
            "ZS99: The Great Test Episode",
            r#"<meta property="og:description" content="No audio here." />"#,
            "",
        );
        let episode = Extractor::from_html(99, &html).episode().unwrap();
        assert_eq!(episode.audio_url, None);
        assert!(!episode.has_audio());
    }

    #[test]
    fn test_title_without_colon() {
        let html = page("Just a headline", r#"<meta property="og:description" content="x" />"#, "");
        let err = Extractor::from_html(1, &html).episode().unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedTitle));
    }

    #[test]
    fn test_title_keeps_later_colons() {
        let html = page("ZS12: History: a retrospective", r#"<meta property="og:description" content="x" />"#, "");
        let episode = Extractor::from_html(12, &html).episode().unwrap();
        assert_eq!(episode.abbreviation, "ZS12");
        assert_eq!(episode.title, "History: a retrospective");
    }

    #[test]
    fn test_missing_description() {
        let html = page("ZS99: The Great Test Episode", "", "");
        let err = Extractor::from_html(99, &html).episode().unwrap_err();
        assert!(matches!(&*err, ErrorKind::MissingField("og:description")));
    }

    #[test]
    fn test_text_fields_are_normalized() {
        let head = format!(r#"<meta property="og:description" content="Es geht um Karl's {}nden." />"#, '\u{fb01}');
        let html = page("ZS07: Karl's Gesp\u{e4}ch", &head, "");
        let episode = Extractor::from_html(7, &html).episode().unwrap();
        assert_eq!(episode.title, "Karls Gespa\u{308}ch");
        assert!(!episode.description.contains('\''));
    }
}
