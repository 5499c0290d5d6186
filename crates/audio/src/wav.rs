//! Minimal RIFF/WAVE writer for 16-bit PCM.
//!
//! The pipeline normalizes every episode to the same canonical container, so
//! the writer only ever deals with one shape: interleaved 16-bit
//! little-endian PCM with the stream's original rate and channel count.

use crate::decode::DecodedAudio;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::path::Path;
use tokio::fs;
use tracing::instrument;

const HEADER_SIZE: u32 = 44;
const FORMAT_PCM: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

impl DecodedAudio {
    /// Serialize the decoded stream as a complete WAV file image.
    pub fn wav_bytes(&self) -> Vec<u8> {
        let data_len = (self.samples.len() * 2) as u32;
        let block_align = self.channels * (BITS_PER_SAMPLE / 8);
        let byte_rate = self.frame_rate * u32::from(block_align);
        let mut out = Vec::with_capacity((HEADER_SIZE + data_len) as usize);
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(HEADER_SIZE - 8 + data_len).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&FORMAT_PCM.to_le_bytes());
        out.extend_from_slice(&self.channels.to_le_bytes());
        out.extend_from_slice(&self.frame_rate.to_le_bytes());
        out.extend_from_slice(&byte_rate.to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&data_len.to_le_bytes());
        for sample in &self.samples {
            out.extend_from_slice(&sample.to_le_bytes());
        }
        out
    }

    /// Write the normalized WAV file at `path`, creating parent directories
    /// if needed.
    #[instrument(skip(self, path))]
    pub async fn export(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Io)?;
        }
        fs::write(path, self.wav_bytes()).await.or_raise(|| ErrorKind::Io)?;
        Ok(())
    }
}
