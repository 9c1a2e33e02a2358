//! Codec trait and the JSON implementation.
//!
//! A codec turns an [`Envelope`] into one transport frame and back. The
//! two directions are deliberately asymmetric:
//!
//! - `encode` can fail (in principle) and reports it.
//! - `decode` cannot fail. The relay on the other end of the wire is not
//!   under our control and may emit anything, so every inbound frame is
//!   classified into some envelope, degrading to [`Envelope::Text`] or
//!   [`Envelope::Error`] when it does not conform.

use serde::Serialize;
use serde_json::Value;

use crate::{Envelope, ProtocolError};

/// Converts envelopes to frames and frames to envelopes.
pub trait Codec: Send + Sync + 'static {
    /// Serializes an envelope into a single self-describing frame.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the payload cannot be
    /// represented in this format.
    fn encode(&self, envelope: &Envelope) -> Result<String, ProtocolError>;

    /// Classifies an inbound frame. Never fails.
    fn decode(&self, frame: &str) -> Envelope;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// The `{"type": ..., "payload": ...}` JSON codec.
///
/// ## Example
///
/// ```rust
/// use lectern_protocol::{Codec, Envelope, JsonCodec};
///
/// let codec = JsonCodec;
///
/// let frame = codec.encode(&Envelope::ClearCanvas).unwrap();
/// assert_eq!(frame, r#"{"type":"clear_canvas","payload":{}}"#);
///
/// assert_eq!(codec.decode(&frame), Envelope::ClearCanvas);
/// assert_eq!(codec.decode("hello"), Envelope::Text("hello".into()));
/// assert_eq!(codec.decode("{bad"), Envelope::Error);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

/// Field order is fixed (`type` first) so encoding is deterministic.
#[derive(Serialize)]
struct WireFrame<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    payload: Value,
}

impl Codec for JsonCodec {
    fn encode(&self, envelope: &Envelope) -> Result<String, ProtocolError> {
        let frame = WireFrame {
            kind: envelope.kind(),
            payload: envelope.payload()?,
        };
        serde_json::to_string(&frame).map_err(ProtocolError::Encode)
    }

    fn decode(&self, frame: &str) -> Envelope {
        let trimmed = frame.trim();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            tracing::debug!(len = frame.len(), "non-JSON frame wrapped as text");
            return Envelope::Text(frame.to_string());
        }

        let value: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "malformed JSON frame");
                return Envelope::Error;
            }
        };

        // Well-formed JSON that is not an object with a string `type`
        // (an array, or an object missing the tag) is not an envelope.
        let Value::Object(mut fields) = value else {
            tracing::debug!("JSON frame is not an object");
            return Envelope::Error;
        };
        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            _ => {
                tracing::debug!("JSON frame has no string `type`");
                return Envelope::Error;
            }
        };
        let payload = fields.remove("payload").unwrap_or(Value::Null);

        Envelope::from_parts(&kind, payload)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{AudioChunk, DrawOperation, StrokeKind};

    fn op(kind: StrokeKind, x: f64, y: f64) -> DrawOperation {
        DrawOperation {
            kind,
            x,
            y,
            color: "#1e88e5".into(),
            stroke_width: 4.5,
        }
    }

    // =====================================================================
    // Round trips for every recognized kind
    // =====================================================================

    #[test]
    fn test_round_trip_preserves_type_and_payload() {
        let codec = JsonCodec;
        let envelopes = [
            Envelope::DrawOperation(op(StrokeKind::Start, 10.0, 10.0)),
            Envelope::DrawOperation(op(StrokeKind::End, 0.0, 0.0)),
            Envelope::ClearCanvas,
            Envelope::AudioChunk(AudioChunk::new(vec![0, 1, 2, 250, 251, 255])),
            Envelope::Text("plain words".into()),
            Envelope::Error,
            Envelope::Other {
                kind: "chat".into(),
                payload: json!({"from": "teacher", "lines": [1, 2]}),
            },
        ];

        for envelope in envelopes {
            let frame = codec.encode(&envelope).expect("encode");
            assert_eq!(codec.decode(&frame), envelope, "frame: {frame}");
        }
    }

    #[test]
    fn test_encode_is_deterministic_and_tag_first() {
        let codec = JsonCodec;
        let env = Envelope::DrawOperation(op(StrokeKind::Move, 20.0, 20.0));

        let a = codec.encode(&env).unwrap();
        let b = codec.encode(&env).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with(r#"{"type":"draw_operation","payload":{"#));
    }

    #[test]
    fn test_encode_audio_chunk_payload_is_a_string() {
        let frame = JsonCodec
            .encode(&Envelope::AudioChunk(AudioChunk::new(b"RIFF".to_vec())))
            .unwrap();
        assert_eq!(frame, r#"{"type":"audio_chunk","payload":"UklGRg=="}"#);
    }

    // =====================================================================
    // Graceful degradation
    // =====================================================================

    #[test]
    fn test_decode_non_json_is_text_with_raw_content() {
        let codec = JsonCodec;
        for raw in ["hello", "  padded  ", "", "42", "\"quoted\"", "null"] {
            assert_eq!(codec.decode(raw), Envelope::Text(raw.to_string()));
        }
    }

    #[test]
    fn test_decode_invalid_json_is_error() {
        let codec = JsonCodec;
        for raw in ["{bad", "[1, 2", "{\"type\": }", "  {"] {
            assert_eq!(codec.decode(raw), Envelope::Error, "input: {raw}");
        }
    }

    #[test]
    fn test_decode_json_array_is_error() {
        assert_eq!(JsonCodec.decode("[1, 2, 3]"), Envelope::Error);
    }

    #[test]
    fn test_decode_object_without_type_is_error() {
        assert_eq!(JsonCodec.decode(r#"{"payload": {}}"#), Envelope::Error);
        assert_eq!(JsonCodec.decode(r#"{"type": 7, "payload": {}}"#), Envelope::Error);
    }

    #[test]
    fn test_decode_missing_payload_defaults_to_null() {
        let env = JsonCodec.decode(r#"{"type": "presence"}"#);
        assert_eq!(
            env,
            Envelope::Other {
                kind: "presence".into(),
                payload: Value::Null,
            }
        );
    }

    #[test]
    fn test_decode_tolerates_surrounding_whitespace() {
        let env = JsonCodec.decode("\n  {\"type\":\"clear_canvas\",\"payload\":{}}  \n");
        assert_eq!(env, Envelope::ClearCanvas);
    }

    #[test]
    fn test_decode_browser_style_draw_frame() {
        // What a browser publisher puts on the wire.
        let frame = r##"{"type":"draw_operation","payload":{"kind":"move","x":20,"y":20,"color":"#000000","strokeWidth":3}}"##;
        match JsonCodec.decode(frame) {
            Envelope::DrawOperation(op) => {
                assert_eq!(op.kind, StrokeKind::Move);
                assert_eq!((op.x, op.y), (20.0, 20.0));
                assert_eq!(op.color, "#000000");
            }
            other => panic!("expected DrawOperation, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_bad_audio_payload_is_error() {
        let env = JsonCodec.decode(r#"{"type":"audio_chunk","payload":"%%%"}"#);
        assert_eq!(env, Envelope::Error);
    }
}
