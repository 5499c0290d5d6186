//! Repository for the `meta` and `audio` tables.
//!
//! Both tables are append-only: the pipeline writes each row exactly once and
//! never updates or deletes it. The crawl cursor is derived from the highest
//! committed `meta` row, which is why a duplicate key is treated as a fatal
//! divergence instead of something to paper over.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{AudioAsset, AudioRow, MetaRow};
use exn::ResultExt;
use sqlx::SqlitePool;
use tracing::instrument;
use zeitsprung_extract::models::Episode;

/// Repository for episode metadata and audio provenance rows.
///
/// All statements are parameterized; field values are always bound, never
/// interpolated, so quotes and control characters in page text round-trip
/// without any escaping on this side.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn is_unique_violation(err: &sqlx::Error) -> bool {
        err.as_database_error().is_some_and(|db| db.is_unique_violation())
    }

    async fn exec_insert_meta<'e, E>(episode: &Episode, executor: E) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row = MetaRow::try_from(episode)?;
        let result = sqlx::query(include_str!("../queries/insert_meta.sql"))
            .bind(row.uid)
            .bind(row.published_at)
            .bind(row.modified_at)
            .bind(row.abbreviation)
            .bind(row.title)
            .bind(row.description)
            .bind(row.url_episode)
            .bind(row.url_audio)
            .execute(executor)
            .await;
        match result {
            Err(err) if Self::is_unique_violation(&err) => exn::bail!(ErrorKind::DuplicateKey(episode.uid)),
            other => other.or_raise(|| ErrorKind::Database)?,
        };
        Ok(())
    }

    async fn exec_insert_audio<'e, E>(asset: &AudioAsset, executor: E) -> Result<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row = AudioRow::try_from(asset)?;
        let result = sqlx::query(include_str!("../queries/insert_audio.sql"))
            .bind(row.uid)
            .bind(row.file_path)
            .bind(row.duration)
            .bind(row.frame_rate)
            .bind(row.frame_width)
            .execute(executor)
            .await;
        match result {
            Err(err) if Self::is_unique_violation(&err) => exn::bail!(ErrorKind::DuplicateKey(asset.uid)),
            other => other.or_raise(|| ErrorKind::Database)?,
        };
        Ok(())
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Append one metadata row.
    ///
    /// Returns [`ErrorKind::DuplicateKey`] if a row for this `uid` already
    /// exists; existing rows are never overwritten.
    #[instrument(skip(self, episode), fields(uid = episode.uid))]
    pub async fn insert_meta(&self, episode: &Episode) -> Result<()> {
        Self::exec_insert_meta(episode, &self.pool).await
    }

    /// Append one audio provenance row; same duplicate contract as
    /// [`insert_meta`](Self::insert_meta), keyed on `uid`.
    #[instrument(skip(self, asset), fields(uid = asset.uid))]
    pub async fn insert_audio(&self, asset: &AudioAsset) -> Result<()> {
        Self::exec_insert_audio(asset, &self.pool).await
    }

    /// Commit one episode and (when present) its audio provenance in a single
    /// transaction.
    ///
    /// The crawl loop uses this instead of two separate inserts so that an
    /// interruption between the writes can never leave a metadata row without
    /// its expected audio row: either the whole episode lands, or none of it
    /// does and the cursor re-derives to the same episode on restart.
    #[instrument(skip(self, episode, audio), fields(uid = episode.uid, has_audio = audio.is_some()))]
    pub async fn insert_episode(&self, episode: &Episode, audio: Option<&AudioAsset>) -> Result<()> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        Self::exec_insert_meta(episode, &mut *tx).await?;
        if let Some(asset) = audio {
            Self::exec_insert_audio(asset, &mut *tx).await?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    // =========================================================================
    // Query
    // =========================================================================

    /// Highest committed episode number, or `0` for a fresh store.
    ///
    /// This is the sole resumption mechanism: the crawl loop derives its
    /// cursor from it once at startup. Only committed rows count.
    pub async fn last_episode_id(&self) -> Result<u32> {
        let uid: i64 = sqlx::query_scalar(include_str!("../queries/last_episode_id.sql"))
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u32::try_from(uid).or_raise(|| ErrorKind::InvalidData("uid"))
    }

    /// All metadata rows, ordered by `uid` ascending, with timestamps parsed
    /// back into typed values.
    #[instrument(skip(self))]
    pub async fn all_meta(&self) -> Result<Vec<Episode>> {
        let rows: Vec<MetaRow> = sqlx::query_as(include_str!("../queries/all_meta.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(Episode::try_from).collect()
    }

    /// All audio provenance rows, ordered by `uid` ascending.
    #[instrument(skip(self))]
    pub async fn all_audio(&self) -> Result<Vec<AudioAsset>> {
        let rows: Vec<AudioRow> = sqlx::query_as(include_str!("../queries/all_audio.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(AudioAsset::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use zeitsprung_audio::AudioProperties;

    async fn make_repo() -> Repository {
        let db = Database::connect_in_memory().await.unwrap();
        db.setup_schema().await.unwrap();
        Repository::from(&db)
    }

    fn make_episode(uid: u32) -> Episode {
        Episode {
            uid,
            published_at: datetime!(2019-05-12 08:00 UTC),
            modified_at: datetime!(2019-05-13 09:30 UTC),
            abbreviation: format!("ZS{uid:02}"),
            title: "The Great Test Episode".to_string(),
            description: "A test episode about nothing at all.".to_string(),
            episode_url: format!("https://www.zeitsprung.fm/podcast/zs{uid:02}/"),
            audio_url: Some(format!("https://cdn.zeitsprung.fm/zs{uid:02}.mp3")),
        }
    }

    fn make_asset(uid: u32) -> AudioAsset {
        AudioAsset::new(
            uid,
            format!("data/audio/{uid:03}.wav"),
            AudioProperties { duration: 1721, frame_rate: 44100, frame_width: 4 },
        )
    }

    #[tokio::test]
    async fn test_fresh_store_has_cursor_zero() {
        let repo = make_repo().await;
        assert_eq!(repo.last_episode_id().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_meta_round_trip() {
        let repo = make_repo().await;
        let episode = make_episode(1);
        repo.insert_meta(&episode).await.unwrap();
        let all = repo.all_meta().await.unwrap();
        assert_eq!(all, vec![episode]);
        assert_eq!(repo.last_episode_id().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_all_meta_is_ordered_by_uid() {
        let repo = make_repo().await;
        repo.insert_meta(&make_episode(2)).await.unwrap();
        repo.insert_meta(&make_episode(1)).await.unwrap();
        let uids: Vec<u32> = repo.all_meta().await.unwrap().iter().map(|e| e.uid).collect();
        assert_eq!(uids, vec![1, 2]);
        assert_eq!(repo.last_episode_id().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_meta_is_rejected() {
        let repo = make_repo().await;
        repo.insert_meta(&make_episode(1)).await.unwrap();
        let err = repo.insert_meta(&make_episode(1)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::DuplicateKey(1)));
        // The first row survives untouched.
        assert_eq!(repo.all_meta().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_audio_round_trip() {
        let repo = make_repo().await;
        let asset = make_asset(1);
        repo.insert_audio(&asset).await.unwrap();
        assert_eq!(repo.all_audio().await.unwrap(), vec![asset]);
    }

    #[tokio::test]
    async fn test_duplicate_audio_is_rejected() {
        let repo = make_repo().await;
        repo.insert_audio(&make_asset(1)).await.unwrap();
        let err = repo.insert_audio(&make_asset(1)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::DuplicateKey(1)));
    }

    #[tokio::test]
    async fn test_insert_episode_without_audio() {
        let repo = make_repo().await;
        let episode = Episode { audio_url: None, ..make_episode(1) };
        repo.insert_episode(&episode, None).await.unwrap();
        assert_eq!(repo.all_meta().await.unwrap().len(), 1);
        assert!(repo.all_audio().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_episode_commits_both_rows() {
        let repo = make_repo().await;
        repo.insert_episode(&make_episode(1), Some(&make_asset(1))).await.unwrap();
        assert_eq!(repo.all_meta().await.unwrap().len(), 1);
        assert_eq!(repo.all_audio().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insert_episode_is_atomic() {
        let repo = make_repo().await;
        // Seed a conflicting audio row so the second write of the
        // transaction fails after the metadata insert succeeded.
        repo.insert_audio(&make_asset(1)).await.unwrap();
        let err = repo.insert_episode(&make_episode(1), Some(&make_asset(1))).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::DuplicateKey(1)));
        // The metadata insert was rolled back with it.
        assert!(repo.all_meta().await.unwrap().is_empty());
        assert_eq!(repo.last_episode_id().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bound_parameters_keep_quotes_intact() {
        let repo = make_repo().await;
        let episode = Episode {
            title: "Robert'); DROP TABLE meta;--".to_string(),
            ..make_episode(1)
        };
        repo.insert_episode(&episode, None).await.unwrap();
        let all = repo.all_meta().await.unwrap();
        assert_eq!(all[0].title, "Robert'); DROP TABLE meta;--");
    }
}
