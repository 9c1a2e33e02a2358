//! Publisher capture loop against a scripted microphone, with paused time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lectern_audio::{AudioError, AudioPublisher, CaptureConfig, CaptureDevice, CaptureState, wav};
use lectern_channel::{
    ChannelError, ConnectionState, ConnectionStatus, EnvelopeSender,
};
use lectern_protocol::Envelope;
use tokio::sync::watch;

const SEGMENT: Duration = Duration::from_millis(100);

// =========================================================================
// Scripted microphone
// =========================================================================

type Log = Arc<Mutex<Vec<&'static str>>>;

struct Mic {
    script: VecDeque<Result<Vec<i16>, AudioError>>,
    fail_open: bool,
    log: Log,
}

impl Mic {
    fn new(script: Vec<Result<Vec<i16>, AudioError>>) -> (Self, Log) {
        let log = Log::default();
        (
            Self {
                script: script.into(),
                fail_open: false,
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

impl CaptureDevice for Mic {
    fn open(&mut self, _config: &CaptureConfig) -> Result<(), AudioError> {
        if self.fail_open {
            return Err(AudioError::DeviceUnavailable);
        }
        self.log.lock().unwrap().push("open");
        Ok(())
    }

    async fn read(&mut self, duration: Duration) -> Result<Vec<i16>, AudioError> {
        tokio::time::sleep(duration).await;
        // A steady hum once the script runs out.
        self.script.pop_front().unwrap_or_else(|| Ok(vec![100; 4]))
    }

    fn close(&mut self) {
        self.log.lock().unwrap().push("close");
    }
}

// =========================================================================
// Channel stand-in
// =========================================================================

#[derive(Clone, Default)]
struct Outbox {
    sent: Arc<Mutex<Vec<Envelope>>>,
    closed: Arc<AtomicBool>,
}

impl Outbox {
    fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn samples(&self, index: usize) -> Vec<i16> {
        match &self.sent.lock().unwrap()[index] {
            Envelope::AudioChunk(chunk) => wav::decode(chunk.as_bytes()).unwrap().samples,
            other => panic!("expected audio_chunk, got {other:?}"),
        }
    }
}

impl EnvelopeSender for Outbox {
    fn try_send(&self, envelope: &Envelope) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::NotOpen);
        }
        self.sent.lock().unwrap().push(envelope.clone());
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}

fn status(state: ConnectionState) -> ConnectionStatus {
    ConnectionStatus {
        state,
        attempts: 0,
        max_attempts: 3,
        reconnect_interval: Duration::from_secs(5),
    }
}

fn config() -> CaptureConfig {
    CaptureConfig {
        segment_duration: SEGMENT,
        ..CaptureConfig::default()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_start_while_channel_not_open_stays_off() {
    let (mic, log) = Mic::new(vec![]);
    let mut publisher = AudioPublisher::new(mic, config());
    let (_status_tx, status_rx) = watch::channel(status(ConnectionState::Reconnecting));

    let state = publisher.start(Outbox::default(), status_rx).await;

    assert_eq!(state, CaptureState::Off);
    assert!(!publisher.is_live());
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_each_segment_is_sent_as_a_wav_chunk() {
    let (mic, log) = Mic::new(vec![Ok(vec![1_000; 160]), Ok(vec![-2_000; 160])]);
    let mut publisher = AudioPublisher::new(mic, config());
    let (_status_tx, status_rx) = watch::channel(status(ConnectionState::Open));
    let outbox = Outbox::default();
    let level = publisher.level();

    assert_eq!(
        publisher.start(outbox.clone(), status_rx).await,
        CaptureState::Live
    );

    tokio::time::sleep(SEGMENT * 2 + SEGMENT / 2).await;
    assert_eq!(outbox.count(), 2);
    assert_eq!(outbox.samples(0), vec![1_000; 160]);
    assert_eq!(outbox.samples(1), vec![-2_000; 160]);

    let reading = *level.borrow();
    assert!((reading - 2_000.0 / 32_767.0).abs() < 1e-4);

    publisher.stop().await;
    assert_eq!(publisher.current_state(), CaptureState::Off);
    assert_eq!(*level.borrow(), 0.0);
    assert_eq!(*log.lock().unwrap(), vec!["open", "close"]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_capture_and_allows_restart() {
    let (mic, log) = Mic::new(vec![]);
    let mut publisher = AudioPublisher::new(mic, config());
    let (_status_tx, status_rx) = watch::channel(status(ConnectionState::Open));
    let outbox = Outbox::default();

    publisher.start(outbox.clone(), status_rx.clone()).await;
    tokio::time::sleep(SEGMENT + SEGMENT / 2).await;
    publisher.stop().await;
    let sent = outbox.count();
    assert_eq!(sent, 1);

    tokio::time::sleep(SEGMENT * 10).await;
    assert_eq!(outbox.count(), sent);

    assert_eq!(
        publisher.start(outbox.clone(), status_rx).await,
        CaptureState::Live
    );
    assert_eq!(*log.lock().unwrap(), vec!["open", "close", "open"]);
    publisher.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_device_failure_reports_failed_and_does_not_retry() {
    let (mic, log) = Mic::new(vec![
        Ok(vec![1; 4]),
        Err(AudioError::Device("unplugged".into())),
    ]);
    let mut publisher = AudioPublisher::new(mic, config());
    let (_status_tx, status_rx) = watch::channel(status(ConnectionState::Open));
    let outbox = Outbox::default();
    let mut state = publisher.state();

    publisher.start(outbox.clone(), status_rx).await;
    let failed = state
        .wait_for(|s| matches!(s, CaptureState::Failed(_)))
        .await
        .unwrap()
        .clone();
    assert_eq!(
        failed,
        CaptureState::Failed("capture device failed: unplugged".into())
    );

    tokio::time::sleep(SEGMENT * 10).await;
    assert_eq!(outbox.count(), 1);
    assert_eq!(*log.lock().unwrap(), vec!["open", "close"]);
    assert!(!state.has_changed().unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_channel_leaving_open_halts_capture() {
    let (mic, log) = Mic::new(vec![]);
    let mut publisher = AudioPublisher::new(mic, config());
    let (status_tx, status_rx) = watch::channel(status(ConnectionState::Open));
    let outbox = Outbox::default();
    let mut state = publisher.state();

    publisher.start(outbox.clone(), status_rx).await;
    tokio::time::sleep(SEGMENT + SEGMENT / 2).await;
    assert_eq!(outbox.count(), 1);

    status_tx.send_replace(status(ConnectionState::Reconnecting));
    state.wait_for(|s| *s == CaptureState::Off).await.unwrap();

    tokio::time::sleep(SEGMENT * 10).await;
    assert_eq!(outbox.count(), 1);
    assert_eq!(*log.lock().unwrap(), vec!["open", "close"]);
}

#[tokio::test(start_paused = true)]
async fn test_open_failure_reports_failed() {
    let (mut mic, log) = Mic::new(vec![]);
    mic.fail_open = true;
    let mut publisher = AudioPublisher::new(mic, config());
    let (_status_tx, status_rx) = watch::channel(status(ConnectionState::Open));

    let state = publisher.start(Outbox::default(), status_rx).await;

    assert_eq!(
        state,
        CaptureState::Failed("capture device unavailable".into())
    );
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_dropping_publisher_closes_device() {
    let (mic, log) = Mic::new(vec![]);
    let mut publisher = AudioPublisher::new(mic, config());
    let (_status_tx, status_rx) = watch::channel(status(ConnectionState::Open));

    publisher.start(Outbox::default(), status_rx).await;
    drop(publisher);
    tokio::time::sleep(SEGMENT).await;

    assert_eq!(*log.lock().unwrap(), vec!["open", "close"]);
}
