//! Capture and playback settings.

use std::time::Duration;

/// How the publisher's microphone is sampled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Length of one independently playable segment.
    ///
    /// Default: 100 ms.
    pub segment_duration: Duration,

    /// Default: 16 kHz.
    pub sample_rate: u32,

    /// Default: 1 (mono).
    pub channels: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            segment_duration: Duration::from_millis(100),
            sample_rate: 16_000,
            channels: 1,
        }
    }
}

impl CaptureConfig {
    /// Samples (across all channels) in one segment.
    pub fn samples_per_segment(&self) -> usize {
        let frames = self.segment_duration.as_micros() * u128::from(self.sample_rate) / 1_000_000;
        frames as usize * usize::from(self.channels)
    }
}

/// A subscriber's local output settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackConfig {
    /// Output level, 0..=100.
    ///
    /// Default: 80.
    pub volume: u8,

    /// Default: `false`.
    pub muted: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 80,
            muted: false,
        }
    }
}

impl PlaybackConfig {
    /// Linear gain applied to played segments: `volume / 100`, or zero
    /// when muted.
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            f32::from(self.volume.min(100)) / 100.0
        }
    }
}
