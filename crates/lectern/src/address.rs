//! Channel addressing: one relay URL per room and concern.

use std::fmt;

use url::Url;

use crate::LecternError;

/// What a channel carries. Each concern of a room is its own connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concern {
    Whiteboard,
    Audio,
}

impl Concern {
    /// The suffix that qualifies the room id on the wire.
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Whiteboard => "whiteboard",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for Concern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Where one channel connects: `<relay>?room=<room>-<concern>`.
///
/// ```rust
/// use lectern::{ChannelAddress, Concern};
///
/// let addr = ChannelAddress::new("wss://relay.example/ws", "math-101", Concern::Audio)?;
/// assert_eq!(addr.to_string(), "wss://relay.example/ws?room=math-101-audio");
/// # Ok::<(), lectern::LecternError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelAddress {
    url: Url,
    room: String,
    concern: Concern,
}

impl ChannelAddress {
    /// # Errors
    /// - [`LecternError::InvalidRelay`] unless `relay` parses as a `ws://`
    ///   or `wss://` URL with a host.
    /// - [`LecternError::InvalidRoom`] if `room` is blank.
    pub fn new(
        relay: impl Into<String>,
        room: impl Into<String>,
        concern: Concern,
    ) -> Result<Self, LecternError> {
        let relay = relay.into();
        let room = room.into();

        let invalid = |reason: String| LecternError::InvalidRelay {
            url: relay.clone(),
            reason,
        };
        let mut url = Url::parse(&relay).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".into()));
        }
        if room.trim().is_empty() {
            return Err(LecternError::InvalidRoom(room));
        }

        url.query_pairs_mut()
            .append_pair("room", &format!("{room}-{concern}"));

        Ok(Self { url, room, concern })
    }

    /// The full channel URL, room query included.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn room(&self) -> &str {
        &self.room
    }

    pub fn concern(&self) -> Concern {
        self.concern
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl From<ChannelAddress> for String {
    fn from(address: ChannelAddress) -> Self {
        address.url.into()
    }
}
