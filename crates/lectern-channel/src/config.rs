//! Channel configuration and the connection state machine.

use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConnectionConfig
// ---------------------------------------------------------------------------

/// Reconnect behaviour of one Connection Manager.
///
/// Start from `ConnectionConfig::default()` (or [`relay`](Self::relay) for
/// the whiteboard/audio channels) and override what you need:
///
/// ```rust
/// use std::time::Duration;
/// use lectern_channel::ConnectionConfig;
///
/// let config = ConnectionConfig {
///     reconnect_interval: Duration::from_secs(2),
///     ..ConnectionConfig::relay()
/// };
/// assert_eq!(config.max_reconnect_attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Reconnect automatically after an unexpected closure.
    ///
    /// Default: `true`.
    pub auto_reconnect: bool,

    /// Delay between a closure and the next connect attempt.
    ///
    /// Default: 5 seconds.
    pub reconnect_interval: Duration,

    /// Consecutive failed reconnects tolerated before the channel gives up
    /// for good. The counter resets on every successful open.
    ///
    /// Default: 5.
    pub max_reconnect_attempts: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: true,
            reconnect_interval: Duration::from_millis(5_000),
            max_reconnect_attempts: 5,
        }
    }
}

impl ConnectionConfig {
    /// The settings the whiteboard and audio channels use: defaults, but
    /// only three reconnect attempts.
    pub fn relay() -> Self {
        Self {
            max_reconnect_attempts: 3,
            ..Self::default()
        }
    }

    /// Fixes out-of-range values so the config is safe to use.
    ///
    /// Called by [`ConnectionManager::new`](crate::ConnectionManager::new).
    /// A zero `reconnect_interval` is raised to 1 ms so a relay that
    /// refuses instantly cannot spin the driver.
    pub fn validated(mut self) -> Self {
        if self.reconnect_interval.is_zero() {
            tracing::warn!("reconnect_interval is zero, using 1ms");
            self.reconnect_interval = Duration::from_millis(1);
        }
        self
    }
}

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// Why a channel is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosedReason {
    /// The connection dropped (or an attempt failed); a reconnect may follow.
    Lost,
    /// Every reconnect attempt failed. Terminal.
    Exhausted,
    /// The owner called `close()`. Terminal.
    ByCaller,
    /// The connection dropped and `auto_reconnect` is off. Terminal.
    ReconnectDisabled,
}

/// Lifecycle of one channel.
///
/// ```text
///   Idle ─(open)→ Connecting ──→ Open ──(drop)──→ Closed(Lost)
///                                  ↑                   │
///                                  │            attempts < max?
///                                  │             yes │      │ no
///                                  └── Reconnecting ←┘      ↓
///                                                    Closed(Exhausted)
///
///   close() from any state ──→ Closed(ByCaller)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// Never opened.
    #[default]
    Idle,
    /// First connect attempt in flight.
    Connecting,
    /// Connected; sends are transmitted.
    Open,
    /// Waiting out the reconnect delay, or a reconnect attempt in flight.
    Reconnecting,
    /// Not connected; see [`ClosedReason`].
    Closed(ClosedReason),
}

impl ConnectionState {
    /// Returns `true` if sends are currently transmitted.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }

    /// Returns `true` if the channel is working its way back to `Open`.
    pub fn is_reconnecting(&self) -> bool {
        matches!(self, Self::Reconnecting | Self::Closed(ClosedReason::Lost))
    }

    /// Returns `true` if nothing will happen without a new `open()`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Closed(
                ClosedReason::Exhausted
                    | ClosedReason::ByCaller
                    | ClosedReason::ReconnectDisabled
            )
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Connecting => f.write_str("connecting"),
            Self::Open => f.write_str("open"),
            Self::Reconnecting => f.write_str("reconnecting"),
            Self::Closed(ClosedReason::Lost) => f.write_str("closed (lost)"),
            Self::Closed(ClosedReason::Exhausted) => {
                f.write_str("closed (reconnect attempts exhausted)")
            }
            Self::Closed(ClosedReason::ByCaller) => f.write_str("closed"),
            Self::Closed(ClosedReason::ReconnectDisabled) => {
                f.write_str("closed (reconnect disabled)")
            }
        }
    }
}

/// A snapshot of a channel, as published to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// Current lifecycle state.
    pub state: ConnectionState,
    /// Reconnect attempts fired since the last successful open.
    pub attempts: u32,
    /// The configured maximum.
    pub max_attempts: u32,
    /// The configured delay between attempts.
    pub reconnect_interval: Duration,
}

impl ConnectionStatus {
    pub(crate) fn initial(config: &ConnectionConfig) -> Self {
        Self {
            state: ConnectionState::Idle,
            attempts: 0,
            max_attempts: config.max_reconnect_attempts,
            reconnect_interval: config.reconnect_interval,
        }
    }
}
