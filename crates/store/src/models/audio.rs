use crate::error::{Error, ErrorKind};
use exn::{OptionExt, ResultExt};
use std::path::PathBuf;
use zeitsprung_audio::AudioProperties;

/// Provenance of one normalized audio file, one-to-one with an episode.
///
/// A row exists if and only if the episode page advertised an audio download
/// and the download plus decode succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioAsset {
    /// Episode number this asset belongs to.
    pub uid: u32,
    /// Location of the normalized WAV file.
    pub file_path: PathBuf,
    /// Properties derived from decoding the original payload.
    pub properties: AudioProperties,
}

impl AudioAsset {
    pub fn new(uid: u32, file_path: impl Into<PathBuf>, properties: AudioProperties) -> Self {
        Self { uid, file_path: file_path.into(), properties }
    }
}

/// Row of the `audio` table.
#[derive(sqlx::FromRow)]
pub(crate) struct AudioRow {
    pub(crate) uid: i64,
    pub(crate) file_path: String,
    pub(crate) duration: i64,
    pub(crate) frame_rate: i64,
    pub(crate) frame_width: i64,
}
impl TryFrom<&AudioAsset> for AudioRow {
    type Error = Error;
    fn try_from(asset: &AudioAsset) -> Result<Self, Self::Error> {
        Ok(Self {
            uid: i64::from(asset.uid),
            file_path: asset.file_path.to_str().ok_or_raise(|| ErrorKind::InvalidData("file path"))?.to_string(),
            duration: i64::from(asset.properties.duration),
            frame_rate: i64::from(asset.properties.frame_rate),
            frame_width: i64::from(asset.properties.frame_width),
        })
    }
}
impl TryFrom<AudioRow> for AudioAsset {
    type Error = Error;
    fn try_from(row: AudioRow) -> Result<Self, Self::Error> {
        Ok(Self {
            uid: u32::try_from(row.uid).or_raise(|| ErrorKind::InvalidData("uid"))?,
            file_path: PathBuf::from(row.file_path),
            properties: AudioProperties {
                duration: u32::try_from(row.duration).or_raise(|| ErrorKind::InvalidData("duration"))?,
                frame_rate: u32::try_from(row.frame_rate).or_raise(|| ErrorKind::InvalidData("frame rate"))?,
                frame_width: u32::try_from(row.frame_width).or_raise(|| ErrorKind::InvalidData("frame width"))?,
            },
        })
    }
}
