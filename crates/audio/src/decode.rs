//! MP3 payload decoding.
//!
//! Episode payloads are small enough (an hour of 128 kbps audio is ~60 MB)
//! that the whole stream is decoded into memory in one go; the decoded PCM is
//! needed in full anyway to write the WAV header up front.

use crate::error::{ErrorKind, Result};
use exn::OptionExt;
use minimp3::{Decoder, Error as Mp3Error};
use std::io::Cursor;
use tracing::instrument;

/// A fully decoded PCM stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAudio {
    /// Interleaved 16-bit samples.
    pub(crate) samples: Vec<i16>,
    /// Sample rate in Hz.
    pub frame_rate: u32,
    /// Channel count.
    pub channels: u16,
}

/// Integer properties persisted alongside the normalized audio file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioProperties {
    /// Decoded duration, rounded to the nearest whole second.
    pub duration: u32,
    /// Sample rate in Hz.
    pub frame_rate: u32,
    /// Bytes per interleaved sample frame (channel count x 2 for 16-bit PCM).
    pub frame_width: u32,
}

impl DecodedAudio {
    /// Exact decoded duration in seconds.
    pub fn duration(&self) -> f64 {
        let frames = self.samples.len() as f64 / f64::from(self.channels);
        frames / f64::from(self.frame_rate)
    }

    /// Properties for persistence.
    ///
    /// The duration is rounded half away from zero, so a decoded 1.5 s
    /// stream records as 2 s.
    pub fn properties(&self) -> AudioProperties {
        AudioProperties {
            duration: self.duration().round() as u32,
            frame_rate: self.frame_rate,
            frame_width: u32::from(self.channels) * 2,
        }
    }
}

/// Decode an MP3 payload into interleaved 16-bit PCM.
///
/// Stream properties are taken from the first decodable frame. Leading
/// garbage (ID3 tags, partial frames) is skipped the way the decoder skips
/// it when streaming; a payload with no decodable frame at all fails with
/// [`ErrorKind::Decode`].
#[instrument(skip(bytes), fields(payload_size = bytes.as_ref().len()))]
pub fn decode(bytes: impl AsRef<[u8]>) -> Result<DecodedAudio> {
    let mut decoder = Decoder::new(Cursor::new(bytes.as_ref()));
    let mut samples: Vec<i16> = Vec::new();
    let mut info: Option<(u32, u16)> = None;
    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if frame.channels == 0 {
                    exn::bail!(ErrorKind::Decode("frame reported zero channels"));
                }
                if info.is_none() {
                    info = Some((frame.sample_rate as u32, frame.channels as u16));
                }
                samples.extend_from_slice(&frame.data);
            },
            Err(Mp3Error::Eof) => break,
            Err(Mp3Error::InsufficientData) | Err(Mp3Error::SkippedData) => continue,
            Err(Mp3Error::Io(_)) => exn::bail!(ErrorKind::Decode("payload read failed")),
        }
    }
    let (frame_rate, channels) = info.ok_or_raise(|| ErrorKind::Decode("no decodable MP3 frames"))?;
    Ok(DecodedAudio { samples, frame_rate, channels })
}
