/// Errors from the audio relay.
///
/// None of these escape to the session as a `Result`: a capture failure
/// moves the publisher to `CaptureState::Failed`, and a bad inbound
/// segment is dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AudioError {
    /// No capture device is present, or it was lost.
    #[error("capture device unavailable")]
    DeviceUnavailable,

    /// The device reported a failure.
    #[error("capture device failed: {0}")]
    Device(String),

    /// An audio segment could not be decoded.
    #[error("invalid audio segment: {0}")]
    InvalidSegment(String),
}
