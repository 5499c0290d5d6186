//! Harvester configuration.
//!
//! Sources are merged lowest to highest precedence: built-in defaults, an
//! optional TOML file, `ZEITSPRUNG_`-prefixed environment variables, then
//! command-line flags.

use crate::error::{ErrorKind, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name of the SQLite database inside the data folder.
pub const DB_FILE_NAME: &str = "zeitsprung.db";
/// Directory name for normalized audio files inside the data folder.
pub const AUDIO_DIR_NAME: &str = "audio";

const DEFAULT_CONFIG_FILE: &str = "zeitsprung.toml";
const DEFAULT_BASE_URL: &str = "https://www.zeitsprung.fm";
const DEFAULT_UPDATE_INTERVAL: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Folder holding the database and audio files.
    pub data_folder: PathBuf,
    /// Website root; episode pages live under `/podcast/zs<N>/`.
    pub base_url: String,
    /// Seconds to sleep after a "not yet published" response.
    pub update_interval: u64,
    /// Drop and recreate the schema on startup, discarding prior data.
    pub reset: bool,
    /// Emit timestamped progress lines.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_folder: PathBuf::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            reset: false,
            verbose: true,
        }
    }
}

impl Config {
    /// Load configuration from file and environment, without CLI overrides.
    ///
    /// A missing file is fine (defaults apply); a present-but-invalid one is
    /// a [`ErrorKind::Config`] failure.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("ZEITSPRUNG_"))
            .extract()
            .map_err(|err| exn::Exn::from(ErrorKind::Config(err.to_string())))
    }

    /// Reject configurations the harvester cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.data_folder.as_os_str().is_empty() {
            exn::bail!(ErrorKind::Config("data_folder is required".to_string()));
        }
        Ok(())
    }

    /// Path of the SQLite database file.
    pub fn db_file(&self) -> PathBuf {
        self.data_folder.join(DB_FILE_NAME)
    }

    /// Folder holding the normalized audio files.
    pub fn audio_dir(&self) -> PathBuf {
        self.data_folder.join(AUDIO_DIR_NAME)
    }

    /// Page URL for an episode number.
    ///
    /// Numbers below ten are zero-padded to match the site's slug scheme
    /// (`zs09`, `zs10`, `zs100`).
    pub fn episode_url(&self, uid: u32) -> String {
        format!("{}/podcast/zs{uid:02}/", self.base_url.trim_end_matches('/'))
    }

    /// Target path of the normalized audio file for an episode.
    pub fn audio_file(&self, uid: u32) -> PathBuf {
        self.audio_dir().join(format!("{uid:03}.wav"))
    }
}

/// Command-line flags; the highest-precedence configuration source.
#[derive(Debug, clap::Parser)]
#[command(name = "zeitsprung", version, about = "Harvest zeitsprung.fm episodes into a local archive")]
pub struct Cli {
    /// Folder to store the database and audio files.
    #[arg(long)]
    pub data_folder: Option<PathBuf>,
    /// Configuration file to read before applying flags.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Seconds to wait before re-checking an unpublished episode.
    #[arg(long)]
    pub update_interval: Option<u64>,
    /// Drop and recreate the database schema, discarding existing data.
    #[arg(long)]
    pub reset: bool,
    /// Only log warnings and errors.
    #[arg(long)]
    pub quiet: bool,
}

impl Cli {
    /// Resolve the full configuration with these flags applied on top.
    pub fn into_config(self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(data_folder) = self.data_folder {
            config.data_folder = data_folder;
        }
        if let Some(update_interval) = self.update_interval {
            config.update_interval = update_interval;
        }
        config.reset |= self.reset;
        config.verbose &= !self.quiet;
        config.validate()?;
        Ok(config)
    }
}
