use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

// The JSON-LD script block carries the schema.org graph with the episode dates.
selector!(LD_JSON_SELECTOR, r#"script[type="application/ld+json"]"#);
selector!(TITLE_SELECTOR, "title");
selector!(OG_DESCRIPTION_SELECTOR, r#"meta[property="og:description"]"#);
selector!(OG_URL_SELECTOR, r#"meta[property="og:url"]"#);
// The first link of the download list is the episode audio. Episodes without
// the list have no downloadable audio at all.
selector!(DOWNLOAD_ANCHOR_SELECTOR, "ul.episode_download_list a[href]");
