use crate::consts;
use crate::error::{ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use scraper::Html;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// The schema.org graph embedded in the page's JSON-LD script block.
///
/// The upstream CMS emits one script element containing a `@graph` array of
/// entries; the timestamps we need live on different entries depending on the
/// page, so lookups walk the whole graph.
#[derive(Debug)]
pub struct Graph {
    entries: Vec<Value>,
}

impl Graph {
    pub(crate) fn parse(document: &Html) -> Result<Self> {
        let script = document
            .select(&consts::LD_JSON_SELECTOR)
            .next()
            .ok_or_raise(|| ErrorKind::MissingField("structured data"))?;
        let text = script.text().collect::<String>();
        let value: Value = serde_json::from_str(&text).or_raise(|| ErrorKind::ParseError {
            field: "structured data",
            value: "invalid JSON".to_string(),
        })?;
        let entries = match value.get("@graph") {
            Some(Value::Array(entries)) => entries.clone(),
            // A block without the graph wrapper is a single-entry graph.
            _ => vec![value],
        };
        Ok(Self { entries })
    }

    /// First occurrence of `key` across the graph entries wins.
    fn search(&self, key: &'static str) -> Result<&Value> {
        self.entries.iter().find_map(|entry| entry.get(key)).ok_or_raise(|| ErrorKind::MissingField(key))
    }

    /// Looks up `key` and parses its value as an RFC 3339 timestamp.
    pub fn timestamp(&self, key: &'static str) -> Result<OffsetDateTime> {
        let value = self.search(key)?;
        let raw = value.as_str().ok_or_raise(|| ErrorKind::ParseError { field: key, value: value.to_string() })?;
        OffsetDateTime::parse(raw, &Rfc3339)
            .or_raise(|| ErrorKind::ParseError { field: key, value: raw.to_string() })
    }
}
