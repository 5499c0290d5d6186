//! Incremental harvester for the zeitsprung.fm podcast archive.
//!
//! For each sequentially numbered episode the harvester fetches the episode
//! page, extracts structured metadata, downloads and normalizes the audio,
//! and commits both to a local SQLite store. It runs indefinitely, resuming
//! from the last committed episode and sleeping whenever the next one has
//! not been published yet.
//!
//! The pipeline crates do the actual work:
//! - [`zeitsprung_extract`] turns a fetched page into a typed record,
//! - [`zeitsprung_audio`] materializes the normalized audio asset,
//! - [`zeitsprung_store`] owns the schema and the append-only tables.
//!
//! This crate wires them into the long-running crawl loop.

pub mod config;
pub mod error;
pub mod harvest;

pub use crate::config::Config;
pub use crate::harvest::{Harvester, Step};
