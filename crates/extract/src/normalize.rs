use unicode_normalization::UnicodeNormalization;

/// Normalize free text destined for storage.
///
/// Applies Unicode compatibility decomposition (NFKD) and strips apostrophe
/// characters, so downstream text matching sees one consistent
/// representation of ligatures, precomposed accents, and quoted names.
/// Storage safety does not depend on this; inserts use bound parameters.
pub fn normalize(text: &str) -> String {
    text.nfkd().filter(|c| *c != '\'').collect()
}
