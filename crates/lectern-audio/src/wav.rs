//! PCM16 RIFF/WAVE segment container.
//!
//! Every captured segment is wrapped as a complete WAV file so a receiver
//! can decode it without having seen any earlier segment.
//!
//! ```text
//! "RIFF" <len> "WAVE"
//!   "fmt " 16  format=1 channels rate byte_rate block_align bits=16
//!   "data" <len> i16 little-endian samples, interleaved
//! ```

use std::time::Duration;

use crate::AudioError;

const HEADER_LEN: usize = 44;
const PCM: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Decoded audio, ready for a [`Speaker`](crate::Speaker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub sample_rate: u32,
    pub channels: u16,
    /// Interleaved samples.
    pub samples: Vec<i16>,
}

impl AudioClip {
    /// Playing time of the clip.
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as u64 / u64::from(self.channels);
        Duration::from_micros(frames * 1_000_000 / u64::from(self.sample_rate))
    }
}

/// Wraps interleaved samples as a standalone WAV file.
///
/// Header fields that do not fit their width saturate instead of wrapping.
pub fn encode(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let data_len = u32::try_from(samples.len().saturating_mul(2)).unwrap_or(u32::MAX);
    let block_align = channels.saturating_mul(BITS_PER_SAMPLE / 8);
    let byte_rate = sample_rate.saturating_mul(u32::from(block_align));

    let mut out = Vec::with_capacity(HEADER_LEN + samples.len() * 2);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&data_len.saturating_add(36).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&PCM.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}

/// Parses a WAV file produced by [`encode`] (or any PCM16 WAV).
///
/// Unknown chunks between `fmt ` and `data` are skipped.
///
/// # Errors
/// [`AudioError::InvalidSegment`] if the bytes are not a PCM16 WAV file.
pub fn decode(bytes: &[u8]) -> Result<AudioClip, AudioError> {
    if bytes.len() < 12 || &bytes[0..4] != b"RIFF" || &bytes[8..12] != b"WAVE" {
        return Err(invalid("missing RIFF/WAVE header"));
    }

    let mut format: Option<(u16, u32)> = None;
    let mut rest = &bytes[12..];

    while rest.len() >= 8 {
        let id = &rest[0..4];
        let len = u32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;
        let body = &rest[8..];
        if body.len() < len {
            return Err(invalid("truncated chunk"));
        }
        let chunk = &body[..len];

        match id {
            b"fmt " => {
                if len < 16 {
                    return Err(invalid("short fmt chunk"));
                }
                let tag = u16::from_le_bytes([chunk[0], chunk[1]]);
                let channels = u16::from_le_bytes([chunk[2], chunk[3]]);
                let rate = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
                let bits = u16::from_le_bytes([chunk[14], chunk[15]]);
                if tag != PCM || bits != BITS_PER_SAMPLE {
                    return Err(invalid("not 16-bit PCM"));
                }
                if channels == 0 {
                    return Err(invalid("zero channels"));
                }
                format = Some((channels, rate));
            }
            b"data" => {
                let Some((channels, sample_rate)) = format else {
                    return Err(invalid("data before fmt"));
                };
                let samples = chunk
                    .chunks_exact(2)
                    .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                return Ok(AudioClip {
                    sample_rate,
                    channels,
                    samples,
                });
            }
            _ => {}
        }

        // Chunks are word aligned.
        let advance = 8 + len + (len & 1);
        rest = rest.get(advance..).unwrap_or_default();
    }

    Err(invalid("no data chunk"))
}

fn invalid(reason: &str) -> AudioError {
    AudioError::InvalidSegment(reason.to_string())
}
