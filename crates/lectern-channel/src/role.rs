//! Participant roles.

use std::fmt;
use std::str::FromStr;

/// What a participant may do in a session. Fixed for the session's
/// lifetime and never negotiated over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Originates strokes and audio (the instructor).
    Publisher,
    /// Only consumes relayed events (a student).
    Subscriber,
}

impl Role {
    pub fn is_publisher(self) -> bool {
        matches!(self, Self::Publisher)
    }

    pub fn is_subscriber(self) -> bool {
        matches!(self, Self::Subscriber)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Publisher => f.write_str("publisher"),
            Self::Subscriber => f.write_str("subscriber"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    /// Accepts `publisher`/`teacher` and `subscriber`/`student`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "publisher" | "teacher" => Ok(Self::Publisher),
            "subscriber" | "student" => Ok(Self::Subscriber),
            other => Err(format!("unknown role `{other}`")),
        }
    }
}
