//! The crawl loop: fetch, extract, ingest, persist, advance.

use crate::config::Config;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::time::Duration;
use tracing::{info, instrument};
use zeitsprung_extract::models::Episode;
use zeitsprung_store::{AudioAsset, Database, Repository};

/// Outcome of a single crawl iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The episode was found and committed; the cursor advanced.
    Ingested(u32),
    /// The targeted episode is not published yet; the cursor stays put.
    NotYetPublished(u32),
}

/// Drives the pipeline end-to-end, forever, resuming from the last committed
/// episode.
///
/// The cursor is explicit loop state: derived from the store once at
/// construction, advanced in memory after each committed episode, and never
/// consulted again until the next process start.
pub struct Harvester {
    config: Config,
    repo: Repository,
    client: reqwest::Client,
    current_episode: u32,
}

impl Harvester {
    /// Bind to (or bootstrap) the data folder and derive the crawl cursor.
    ///
    /// - existing database, reset requested: the directory layout is
    ///   recreated and the schema reinitialized, discarding prior rows;
    /// - existing database, no reset: bind to it as-is;
    /// - no database: the directory layout is created and the schema
    ///   initialized.
    pub async fn new(config: Config) -> Result<Self> {
        let db_file = config.db_file();
        let initialize = config.reset || !db_file.exists();
        if initialize {
            info!(data_folder = %config.data_folder.display(), "creating directory structure");
            tokio::fs::create_dir_all(config.audio_dir()).await.or_raise(|| ErrorKind::Bootstrap)?;
        } else {
            info!(data_folder = %config.data_folder.display(), "binding to existing directory structure");
        }
        let db = Database::connect(&db_file).await.or_raise(|| ErrorKind::Storage)?;
        if initialize {
            db.setup_schema().await.or_raise(|| ErrorKind::Storage)?;
        }
        let repo = Repository::from(&db);
        let current_episode = repo.last_episode_id().await.or_raise(|| ErrorKind::Storage)?;
        info!(current_episode, "crawl cursor derived from store");
        let client = reqwest::Client::builder()
            .user_agent(concat!("zeitsprung/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::Fetch)?;
        Ok(Self { config, repo, client, current_episode })
    }

    /// Last committed episode number; the next iteration targets the one
    /// after it.
    pub fn current_episode(&self) -> u32 {
        self.current_episode
    }

    /// Run the crawl loop forever.
    ///
    /// There is no terminal state under normal operation; this only returns
    /// on an unrecovered error. The only built-in resilience is the
    /// wait-and-retry on "not yet published", which is unbounded.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.step().await? {
                Step::Ingested(uid) => info!(uid, "episode ingested"),
                Step::NotYetPublished(uid) => {
                    info!(uid, seconds = self.config.update_interval, "episode not yet published, pausing");
                    tokio::time::sleep(Duration::from_secs(self.config.update_interval)).await;
                },
            }
        }
    }

    /// One crawl iteration against the next episode number.
    ///
    /// Audio is fetched and exported before anything is committed; metadata
    /// and audio provenance then land in a single transaction, so an
    /// interruption anywhere in here re-attempts the same episode on restart.
    /// At worst an orphaned WAV file is left behind, which the retry
    /// overwrites.
    #[instrument(skip(self))]
    pub async fn step(&mut self) -> Result<Step> {
        let next = self.current_episode + 1;
        let Some(episode) = self.fetch_episode(next).await? else {
            return Ok(Step::NotYetPublished(next));
        };
        let asset = match &episode.audio_url {
            Some(url) => Some(self.ingest_audio(next, url).await?),
            None => {
                info!(uid = next, "episode has no audio download");
                None
            },
        };
        self.repo.insert_episode(&episode, asset.as_ref()).await.or_raise(|| ErrorKind::Storage)?;
        self.current_episode = next;
        Ok(Step::Ingested(next))
    }

    async fn fetch_episode(&self, uid: u32) -> Result<Option<Episode>> {
        let url = self.config.episode_url(uid);
        info!(uid, url = %url, "requesting episode page");
        let response = self.client.get(&url).send().await.or_raise(|| ErrorKind::Fetch)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.or_raise(|| ErrorKind::Fetch)?;
        zeitsprung_extract::extract(uid, status, &body).or_raise(|| ErrorKind::Extract)
    }

    async fn ingest_audio(&self, uid: u32, url: &str) -> Result<AudioAsset> {
        info!(uid, url, "fetching audio file");
        let decoded = zeitsprung_audio::ingest(&self.client, url).await.or_raise(|| ErrorKind::Audio)?;
        let path = self.config.audio_file(uid);
        decoded.export(&path).await.or_raise(|| ErrorKind::Audio)?;
        Ok(AudioAsset::new(uid, path, decoded.properties()))
    }
}
