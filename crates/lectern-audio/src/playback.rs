//! Subscriber side: inbound segments out to the speaker.

use std::sync::Arc;

use lectern_channel::{ChannelHandler, Role};
use lectern_protocol::{AudioChunk, Envelope};
use tokio::sync::watch;

use crate::{PlaybackConfig, Speaker, wav};

/// Shared handle to a subscriber's volume and mute settings.
///
/// Clones control the same playback; changes apply from the next segment.
#[derive(Clone)]
pub struct PlaybackControls {
    config: Arc<watch::Sender<PlaybackConfig>>,
}

impl PlaybackControls {
    pub fn new(config: PlaybackConfig) -> Self {
        Self {
            config: Arc::new(watch::channel(config).0),
        }
    }

    /// Sets the output level, clamped to 0..=100.
    pub fn set_volume(&self, volume: u8) {
        self.config.send_modify(|c| c.volume = volume.min(100));
    }

    pub fn set_muted(&self, muted: bool) {
        self.config.send_modify(|c| c.muted = muted);
    }

    pub fn toggle_muted(&self) -> bool {
        let mut muted = false;
        self.config.send_modify(|c| {
            c.muted = !c.muted;
            muted = c.muted;
        });
        muted
    }

    pub fn get(&self) -> PlaybackConfig {
        self.config.borrow().clone()
    }

    /// Subscribes to settings changes.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackConfig> {
        self.config.subscribe()
    }
}

impl Default for PlaybackControls {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}

/// Channel handler for the audio channel.
///
/// Each `audio_chunk` is decoded and handed to the speaker straight away,
/// at gain `volume / 100`. Muted segments are dropped, as are segments
/// that fail to decode. Only subscribers play; a publisher hearing its own
/// echo would feed back.
pub struct AudioPlayback<P: Speaker> {
    role: Role,
    speaker: P,
    controls: PlaybackControls,
    played: u64,
}

impl<P: Speaker> AudioPlayback<P> {
    pub fn new(role: Role, speaker: P, controls: PlaybackControls) -> Self {
        Self {
            role,
            speaker,
            controls,
            played: 0,
        }
    }

    pub fn controls(&self) -> &PlaybackControls {
        &self.controls
    }

    /// Segments handed to the speaker so far.
    pub fn played(&self) -> u64 {
        self.played
    }

    /// Decodes and plays one segment unless muted.
    pub fn play(&mut self, chunk: &AudioChunk) {
        let config = self.controls.get();
        if config.muted {
            tracing::trace!(len = chunk.len(), "muted, segment dropped");
            return;
        }

        match wav::decode(chunk.as_bytes()) {
            Ok(clip) => {
                self.speaker.play(clip, config.gain());
                self.played += 1;
            }
            Err(e) => {
                tracing::debug!(error = %e, len = chunk.len(), "undecodable audio segment dropped");
            }
        }
    }
}

impl<P: Speaker> ChannelHandler for AudioPlayback<P> {
    fn on_message(&mut self, envelope: Envelope) {
        match envelope {
            Envelope::AudioChunk(chunk) if self.role.is_subscriber() => self.play(&chunk),
            Envelope::AudioChunk(_) => {}
            other => {
                tracing::trace!(kind = other.kind(), "not an audio envelope");
            }
        }
    }
}
