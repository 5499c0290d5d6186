use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use zeitsprung_extract::models::Episode;

/// Row of the `meta` table. Timestamps are stored as RFC 3339 text so that a
/// round-trip through the database is exact to the second, offset included.
#[derive(sqlx::FromRow)]
pub(crate) struct MetaRow {
    pub(crate) uid: i64,
    pub(crate) published_at: String,
    pub(crate) modified_at: String,
    pub(crate) abbreviation: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) url_episode: String,
    // Nullable: some episodes have no downloadable audio.
    pub(crate) url_audio: Option<String>,
}
impl TryFrom<&Episode> for MetaRow {
    type Error = Error;
    fn try_from(episode: &Episode) -> Result<Self, Self::Error> {
        Ok(Self {
            uid: i64::from(episode.uid),
            published_at: episode
                .published_at
                .format(&Rfc3339)
                .or_raise(|| ErrorKind::InvalidData("published_at"))?,
            modified_at: episode.modified_at.format(&Rfc3339).or_raise(|| ErrorKind::InvalidData("modified_at"))?,
            abbreviation: episode.abbreviation.clone(),
            title: episode.title.clone(),
            description: episode.description.clone(),
            url_episode: episode.episode_url.clone(),
            url_audio: episode.audio_url.clone(),
        })
    }
}
impl TryFrom<MetaRow> for Episode {
    type Error = Error;
    fn try_from(row: MetaRow) -> Result<Self, Self::Error> {
        Ok(Self {
            uid: u32::try_from(row.uid).or_raise(|| ErrorKind::InvalidData("uid"))?,
            published_at: OffsetDateTime::parse(&row.published_at, &Rfc3339)
                .or_raise(|| ErrorKind::InvalidData("published_at"))?,
            modified_at: OffsetDateTime::parse(&row.modified_at, &Rfc3339)
                .or_raise(|| ErrorKind::InvalidData("modified_at"))?,
            abbreviation: row.abbreviation,
            title: row.title,
            description: row.description,
            episode_url: row.url_episode,
            audio_url: row.url_audio,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_row_to_model() {
        let row = MetaRow {
            uid: 99,
            published_at: "2019-05-12T08:00:00+02:00".to_string(),
            modified_at: "2019-05-13T09:30:00Z".to_string(),
            abbreviation: "ZS99".to_string(),
            title: "The Great Test Episode".to_string(),
            description: "A test episode about nothing at all.".to_string(),
            url_episode: "https://www.zeitsprung.fm/podcast/zs99/".to_string(),
            url_audio: None,
        };
        let episode = Episode::try_from(row).unwrap();
        assert_eq!(episode.uid, 99);
        assert_eq!(episode.published_at, datetime!(2019-05-12 08:00 +02:00));
        assert_eq!(episode.modified_at, datetime!(2019-05-13 09:30 UTC));
        assert_eq!(episode.audio_url, None);
    }

    #[test]
    fn test_model_to_row() {
        let episode = Episode {
            uid: 1,
            published_at: datetime!(2016-01-24 08:00 UTC),
            modified_at: datetime!(2016-01-24 08:00 UTC),
            abbreviation: "ZS01".to_string(),
            title: "Anfang".to_string(),
            description: "Die erste Folge.".to_string(),
            episode_url: "https://www.zeitsprung.fm/podcast/zs01/".to_string(),
            audio_url: Some("https://cdn.zeitsprung.fm/zs01.mp3".to_string()),
        };
        let row = MetaRow::try_from(&episode).unwrap();
        assert_eq!(row.uid, 1);
        assert!(row.published_at.starts_with("2016-01-24T08:00:00"));
        assert_eq!(OffsetDateTime::parse(&row.published_at, &Rfc3339).unwrap(), episode.published_at);
        assert_eq!(row.url_audio.as_deref(), Some("https://cdn.zeitsprung.fm/zs01.mp3"));
    }

    #[test]
    fn test_negative_uid_is_rejected() {
        let row = MetaRow {
            uid: -3,
            published_at: "2019-05-12T08:00:00Z".to_string(),
            modified_at: "2019-05-12T08:00:00Z".to_string(),
            abbreviation: "ZS".to_string(),
            title: "t".to_string(),
            description: "d".to_string(),
            url_episode: "u".to_string(),
            url_audio: None,
        };
        let err = Episode::try_from(row).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("uid")));
    }
}
