//! Publisher side: microphone segments out to the audio channel.

use std::sync::Arc;

use lectern_channel::{ConnectionStatus, EnvelopeSender};
use lectern_protocol::{AudioChunk, Envelope};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use crate::device::OpenDevice;
use crate::{AudioError, CaptureConfig, CaptureDevice, meter, wav};

/// Whether the publisher's microphone is live.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Off,
    /// Capturing and sending segments.
    Live,
    /// The device failed; capture stopped and will not retry on its own.
    Failed(String),
}

struct Capture<D> {
    stop: oneshot::Sender<()>,
    task: JoinHandle<Option<D>>,
}

/// Captures fixed-length segments and sends each one as an `audio_chunk`
/// the moment it is complete.
///
/// Capture runs on its own task, which owns the opened device. It halts,
/// closing the device, when:
/// - [`stop`](Self::stop) is called (microphone off),
/// - the channel leaves `Open`,
/// - the device fails (state becomes [`CaptureState::Failed`]), or
/// - the publisher is dropped.
pub struct AudioPublisher<D: CaptureDevice> {
    config: CaptureConfig,
    device: Option<D>,
    capture: Option<Capture<D>>,
    state: Arc<watch::Sender<CaptureState>>,
    level: Arc<watch::Sender<f32>>,
}

impl<D: CaptureDevice> AudioPublisher<D> {
    pub fn new(device: D, config: CaptureConfig) -> Self {
        Self {
            config,
            device: Some(device),
            capture: None,
            state: Arc::new(watch::channel(CaptureState::Off).0),
            level: Arc::new(watch::channel(0.0).0),
        }
    }

    /// Turns the microphone on.
    ///
    /// `status` is the audio channel's status feed; capture only starts if
    /// it currently reads `Open`, and ends as soon as it stops doing so.
    /// Returns the resulting state.
    pub async fn start<S>(
        &mut self,
        channel: S,
        mut status: watch::Receiver<ConnectionStatus>,
    ) -> CaptureState
    where
        S: EnvelopeSender + 'static,
    {
        if self.is_running() {
            return self.current_state();
        }
        self.reclaim().await;

        if !status.borrow_and_update().state.is_open() {
            tracing::debug!("audio channel not open, microphone stays off");
            self.state.send_replace(CaptureState::Off);
            return CaptureState::Off;
        }

        let Some(mut device) = self.device.take() else {
            return self.fail(&AudioError::DeviceUnavailable);
        };
        if let Err(e) = device.open(&self.config) {
            self.device = Some(device);
            return self.fail(&e);
        }

        tracing::info!(
            sample_rate = self.config.sample_rate,
            segment_ms = self.config.segment_duration.as_millis() as u64,
            "microphone live"
        );
        self.state.send_replace(CaptureState::Live);

        let (stop_tx, stop_rx) = oneshot::channel();
        let task = tokio::spawn(capture(
            OpenDevice::new(device),
            self.config.clone(),
            channel,
            status,
            stop_rx,
            Arc::clone(&self.state),
            Arc::clone(&self.level),
        ));
        self.capture = Some(Capture {
            stop: stop_tx,
            task,
        });
        CaptureState::Live
    }

    /// Turns the microphone off and waits for the device to be released.
    pub async fn stop(&mut self) {
        let was_running = self.is_running();
        if let Some(capture) = self.capture.take() {
            let _ = capture.stop.send(());
            self.device = join(capture.task).await;
        }
        self.state.send_replace(CaptureState::Off);
        self.level.send_replace(0.0);
        if was_running {
            tracing::info!("microphone off");
        }
    }

    pub fn current_state(&self) -> CaptureState {
        self.state.borrow().clone()
    }

    pub fn is_live(&self) -> bool {
        matches!(*self.state.borrow(), CaptureState::Live)
    }

    /// Subscribes to capture state changes.
    pub fn state(&self) -> watch::Receiver<CaptureState> {
        self.state.subscribe()
    }

    /// Subscribes to the input level meter (`0.0..=1.0`, one update per
    /// segment, reset to 0 when capture ends).
    pub fn level(&self) -> watch::Receiver<f32> {
        self.level.subscribe()
    }

    fn is_running(&self) -> bool {
        self.capture
            .as_ref()
            .is_some_and(|capture| !capture.task.is_finished())
    }

    /// Collects the device from a capture task that ended on its own.
    async fn reclaim(&mut self) {
        if let Some(capture) = self.capture.take() {
            self.device = join(capture.task).await;
        }
    }

    fn fail(&self, error: &AudioError) -> CaptureState {
        tracing::warn!(error = %error, "microphone failed");
        let state = CaptureState::Failed(error.to_string());
        self.state.send_replace(state.clone());
        state
    }
}

async fn join<D>(task: JoinHandle<Option<D>>) -> Option<D> {
    match task.await {
        Ok(device) => device,
        Err(e) => {
            tracing::error!(error = %e, "capture task ended abnormally, device lost");
            None
        }
    }
}

async fn capture<D, S>(
    mut device: OpenDevice<D>,
    config: CaptureConfig,
    channel: S,
    mut status: watch::Receiver<ConnectionStatus>,
    mut stop: oneshot::Receiver<()>,
    state: Arc<watch::Sender<CaptureState>>,
    level: Arc<watch::Sender<f32>>,
) -> Option<D>
where
    D: CaptureDevice,
    S: EnvelopeSender,
{
    let mut segments: u64 = 0;

    loop {
        let Some(mic) = device.get() else {
            state.send_replace(CaptureState::Failed(
                AudioError::DeviceUnavailable.to_string(),
            ));
            break;
        };

        tokio::select! {
            biased;
            _ = &mut stop => break,
            changed = status.changed() => {
                let open = changed.is_ok() && status.borrow_and_update().state.is_open();
                if !open {
                    tracing::info!("audio channel left open, microphone off");
                    state.send_replace(CaptureState::Off);
                    break;
                }
            }
            segment = mic.read(config.segment_duration) => match segment {
                Ok(samples) => {
                    level.send_replace(meter::level(&samples));
                    let chunk = AudioChunk::new(wav::encode(
                        &samples,
                        config.sample_rate,
                        config.channels,
                    ));
                    if channel.send(&Envelope::AudioChunk(chunk)) {
                        segments += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "capture device failed, microphone off");
                    state.send_replace(CaptureState::Failed(e.to_string()));
                    break;
                }
            },
        }
    }

    level.send_replace(0.0);
    tracing::debug!(segments, "capture ended");
    device.release()
}
