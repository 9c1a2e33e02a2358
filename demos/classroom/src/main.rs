use std::f32::consts::TAU;
use std::time::Duration;

use clap::Parser;
use lectern::prelude::*;
use rand::Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ---------------------------------------------------------------------------
// Command line
// ---------------------------------------------------------------------------

/// Joins a classroom as the instructor (scribbles and hums) or a student.
#[derive(Parser, Debug)]
#[command(name = "classroom", version)]
struct Args {
    /// publisher (teacher) or subscriber (student)
    #[arg(long, default_value = "subscriber")]
    role: Role,

    #[arg(long, default_value = "demo")]
    room: String,

    /// Relay URL, ws:// or wss://
    #[arg(long, default_value = "ws://localhost:9001/")]
    relay: String,

    /// How long to stay in the room
    #[arg(long, default_value_t = 30)]
    seconds: u64,
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

/// A microphone that hums a 440 Hz tone.
#[derive(Default)]
struct SineMic {
    config: Option<CaptureConfig>,
    phase: f32,
}

impl CaptureDevice for SineMic {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), AudioError> {
        self.config = Some(config.clone());
        Ok(())
    }

    async fn read(&mut self, duration: Duration) -> Result<Vec<i16>, AudioError> {
        tokio::time::sleep(duration).await;
        let config = self.config.as_ref().ok_or(AudioError::DeviceUnavailable)?;
        let step = TAU * 440.0 / config.sample_rate as f32;

        let samples = (0..config.samples_per_segment())
            .map(|_| {
                self.phase = (self.phase + step) % TAU;
                (self.phase.sin() * 8_000.0) as i16
            })
            .collect();
        Ok(samples)
    }

    fn close(&mut self) {
        self.config = None;
    }
}

/// Logs each segment instead of playing it.
struct LogSpeaker;

impl Speaker for LogSpeaker {
    fn play(&mut self, clip: AudioClip, gain: f32) {
        tracing::debug!(
            samples = clip.samples.len(),
            ms = clip.duration().as_millis() as u64,
            gain,
            "playing segment"
        );
    }
}

// ---------------------------------------------------------------------------
// Publisher scribbles
// ---------------------------------------------------------------------------

const COLORS: [&str; 4] = ["#000000", "#d62828", "#1d3557", "#2a9d8f"];

/// A short random wiggle across an 800x600 board.
fn random_stroke() -> (StrokeStyle, Vec<Point>) {
    let mut rng = rand::rng();
    let color = COLORS[rng.random_range(0..COLORS.len())];
    let style = StrokeStyle::new(color, rng.random_range(1.0..8.0));

    let mut at = Point::new(rng.random_range(0.0..800.0), rng.random_range(0.0..600.0));
    let mut points = vec![at];
    for _ in 0..rng.random_range(3..12) {
        at = Point::new(
            (at.x + rng.random_range(-40.0..40.0)).clamp(0.0, 800.0),
            (at.y + rng.random_range(-40.0..40.0)).clamp(0.0, 600.0),
        );
        points.push(at);
    }
    (style, points)
}

fn scribble(session: &mut ClassroomSession<WebSocketConnector, RecordingSurface, SineMic>) {
    let (style, points) = random_stroke();
    session.set_tool(style);

    let mut points = points.into_iter();
    if let Some(first) = points.next() {
        session.pointer_down(first);
    }
    for point in points {
        session.pointer_move(point);
    }
    session.pointer_up();
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    tracing::info!(role = %args.role, room = %args.room, relay = %args.relay, "joining");

    let microphone = args.role.is_publisher().then(SineMic::default);
    let (mut session, mut notices) = SessionBuilder::new()
        .relay(&args.relay)
        .room(&args.room)
        .role(args.role)
        .join(WebSocketConnector, RecordingSurface::new(), LogSpeaker, microphone)
        .await?;

    let deadline = tokio::time::sleep(Duration::from_secs(args.seconds));
    tokio::pin!(deadline);
    let mut tick = tokio::time::interval(Duration::from_millis(500));
    let mut strokes = 0_u32;

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => break,
            notice = notices.recv() => match notice {
                Some(Notice::Connected(Concern::Audio)) if args.role.is_publisher() => {
                    tracing::info!("audio connected");
                    let state = session.microphone_on().await;
                    tracing::info!(?state, "microphone");
                }
                Some(Notice::ReconnectExhausted(concern)) => {
                    tracing::error!(%concern, "relay unreachable, giving up");
                    break;
                }
                Some(notice) => tracing::info!(?notice, "notice"),
                None => break,
            },
            _ = tick.tick() => {
                if args.role.is_publisher() {
                    if session.is_connected(Concern::Whiteboard) {
                        scribble(&mut session);
                        strokes += 1;
                        if strokes % 20 == 0 {
                            session.clear_board();
                        }
                    }
                } else {
                    let drawn = session.whiteboard().with_surface(|s| s.strokes().len());
                    tracing::info!(strokes = drawn, "whiteboard");
                }
            }
        }
    }

    session.shutdown().await;
    Ok(())
}
