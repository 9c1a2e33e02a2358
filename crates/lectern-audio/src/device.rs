//! Audio hardware seams.

use std::future::Future;
use std::time::Duration;

use crate::{AudioClip, AudioError, CaptureConfig};

/// A live input source, such as a microphone.
///
/// Opened when the publisher goes live and closed when it stops; between
/// the two, [`read`](Self::read) is called back to back, one segment at a
/// time.
pub trait CaptureDevice: Send + 'static {
    /// Acquires the device.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), AudioError>;

    /// Waits for the next `duration` of audio and returns its interleaved
    /// samples.
    ///
    /// Must be cancel-safe: turning the microphone off drops a pending
    /// read.
    fn read(
        &mut self,
        duration: Duration,
    ) -> impl Future<Output = Result<Vec<i16>, AudioError>> + Send;

    /// Releases the device. Called exactly once per successful `open`.
    fn close(&mut self);
}

/// An output that plays decoded segments.
pub trait Speaker: Send + 'static {
    /// Starts playing `clip` at `gain` (`0.0..=1.0`) and returns
    /// immediately; playback of one clip never waits for another.
    fn play(&mut self, clip: AudioClip, gain: f32);
}

/// Holds an opened device and closes it when dropped.
pub(crate) struct OpenDevice<D: CaptureDevice> {
    device: Option<D>,
}

impl<D: CaptureDevice> OpenDevice<D> {
    pub(crate) fn new(device: D) -> Self {
        Self {
            device: Some(device),
        }
    }

    pub(crate) fn get(&mut self) -> Option<&mut D> {
        self.device.as_mut()
    }

    /// Closes the device and hands it back for the next session.
    pub(crate) fn release(mut self) -> Option<D> {
        let mut device = self.device.take()?;
        device.close();
        Some(device)
    }
}

impl<D: CaptureDevice> Drop for OpenDevice<D> {
    fn drop(&mut self) {
        if let Some(device) = &mut self.device {
            device.close();
            tracing::debug!("capture device closed on drop");
        }
    }
}
