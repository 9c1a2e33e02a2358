//! Core protocol types for Lectern's wire format.
//!
//! Every frame on a classroom channel is one JSON object of the shape
//! `{"type": <tag>, "payload": <kind-specific data>}`. This module defines
//! the closed set of tags the system understands and a typed payload for
//! each of them.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::ProtocolError;

/// Wire tags for every recognized envelope kind.
pub mod tag {
    /// A whiteboard stroke step, publisher → subscribers.
    pub const DRAW_OPERATION: &str = "draw_operation";
    /// Clear the whole surface, publisher → everyone.
    pub const CLEAR_CANVAS: &str = "clear_canvas";
    /// One independently decodable audio segment, publisher → subscribers.
    pub const AUDIO_CHUNK: &str = "audio_chunk";
    /// A non-JSON frame, wrapped on the way in.
    pub const TEXT: &str = "text";
    /// A frame that looked like JSON but did not parse as an envelope.
    pub const ERROR: &str = "error";
}

// ---------------------------------------------------------------------------
// Draw operations
// ---------------------------------------------------------------------------

/// The step a draw operation represents within its stroke.
///
/// A stroke is exactly one `Start`, zero or more `Move`, one `End`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeKind {
    /// Opens a stroke at `(x, y)`.
    Start,
    /// Extends the open stroke to `(x, y)`.
    Move,
    /// Closes the open stroke. Coordinates are not meaningful.
    End,
}

impl fmt::Display for StrokeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::Move => "move",
            Self::End => "end",
        };
        f.write_str(s)
    }
}

/// One step of a whiteboard stroke.
///
/// Coordinates are surface-local and not normalized. The operation carries
/// its own style so a receiver can render it without knowing the sender's
/// tool state.
///
/// JSON: `{"kind":"move","x":20,"y":20,"color":"#ff0000","strokeWidth":3}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawOperation {
    /// Which stroke step this is.
    pub kind: StrokeKind,
    /// Surface x coordinate.
    pub x: f64,
    /// Surface y coordinate.
    pub y: f64,
    /// Stroke color, as the surface understands it (e.g. `#rrggbb`).
    pub color: String,
    /// Stroke width in surface units.
    pub stroke_width: f64,
}

// ---------------------------------------------------------------------------
// Audio chunks
// ---------------------------------------------------------------------------

/// A short, independently decodable audio segment.
///
/// Carries no sequence number: ordering is whatever the transport
/// delivers. On the wire the bytes travel as a standard-alphabet base64
/// string, which is the entire `payload` of an `audio_chunk` envelope.
#[derive(Clone, PartialEq, Eq)]
pub struct AudioChunk {
    data: Vec<u8>,
}

impl AudioChunk {
    /// Wraps raw segment bytes.
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Decodes a chunk from its text-safe form.
    pub fn from_base64(text: &str) -> Result<Self, ProtocolError> {
        STANDARD
            .decode(text)
            .map(Self::new)
            .map_err(|e| {
                ProtocolError::InvalidMessage(format!(
                    "audio chunk is not valid base64: {e}"
                ))
            })
    }

    /// Encodes the chunk into its text-safe form.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.data)
    }

    /// The raw segment bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the chunk, returning the raw segment bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Size of the raw segment in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the segment is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

// Audio payloads can be tens of kilobytes; print the size, not the bytes.
impl fmt::Debug for AudioChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioChunk")
            .field("len", &self.data.len())
            .finish()
    }
}

impl Serialize for AudioChunk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}

impl<'de> Deserialize<'de> for AudioChunk {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::from_base64(&text).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The atomic unit exchanged over a channel.
///
/// A closed set of variants, one per recognized `type`, each with a
/// structurally typed payload. [`Envelope::Other`] is the catch-all for
/// tags this crate does not know, keeping the payload as parsed JSON.
///
/// ```text
/// {"type":"draw_operation","payload":{"kind":"start",...}} → DrawOperation
/// {"type":"clear_canvas","payload":{}}                     → ClearCanvas
/// {"type":"audio_chunk","payload":"UklGR..."}              → AudioChunk
/// hello                                                    → Text("hello")
/// {bad                                                     → Error
/// {"type":"chat","payload":{"msg":"hi"}}                   → Other
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// A whiteboard stroke step.
    DrawOperation(DrawOperation),
    /// Clear the entire surface. Payload is `{}`.
    ClearCanvas,
    /// One audio segment.
    AudioChunk(AudioChunk),
    /// A frame that was not JSON, kept verbatim.
    Text(String),
    /// A frame that looked like JSON but could not be read as an envelope.
    Error,
    /// Any other `type`, payload kept as JSON.
    Other { kind: String, payload: Value },
}

impl Envelope {
    /// Builds an envelope from a dynamic `(type, payload)` pair.
    ///
    /// Recognized tags get their typed variant. A recognized tag whose
    /// payload does not fit the expected shape yields [`Envelope::Error`].
    /// Unknown tags yield [`Envelope::Other`].
    pub fn from_parts(kind: &str, payload: Value) -> Self {
        match kind {
            tag::DRAW_OPERATION => {
                match serde_json::from_value::<DrawOperation>(payload) {
                    Ok(op) => Self::DrawOperation(op),
                    Err(e) => {
                        tracing::debug!(error = %e, "malformed draw_operation payload");
                        Self::Error
                    }
                }
            }
            // Receivers clear unconditionally, whatever the payload says.
            tag::CLEAR_CANVAS => Self::ClearCanvas,
            tag::AUDIO_CHUNK => match serde_json::from_value::<AudioChunk>(payload) {
                Ok(chunk) => Self::AudioChunk(chunk),
                Err(e) => {
                    tracing::debug!(error = %e, "malformed audio_chunk payload");
                    Self::Error
                }
            },
            tag::TEXT => match payload {
                Value::String(text) => Self::Text(text),
                other => Self::Text(other.to_string()),
            },
            tag::ERROR => Self::Error,
            other => Self::Other {
                kind: other.to_string(),
                payload,
            },
        }
    }

    /// The wire tag for this envelope.
    pub fn kind(&self) -> &str {
        match self {
            Self::DrawOperation(_) => tag::DRAW_OPERATION,
            Self::ClearCanvas => tag::CLEAR_CANVAS,
            Self::AudioChunk(_) => tag::AUDIO_CHUNK,
            Self::Text(_) => tag::TEXT,
            Self::Error => tag::ERROR,
            Self::Other { kind, .. } => kind,
        }
    }

    /// The payload as JSON, exactly as it goes on the wire.
    pub fn payload(&self) -> Result<Value, ProtocolError> {
        let value = match self {
            Self::DrawOperation(op) => {
                serde_json::to_value(op).map_err(ProtocolError::Encode)?
            }
            Self::ClearCanvas => Value::Object(serde_json::Map::new()),
            Self::AudioChunk(chunk) => Value::String(chunk.to_base64()),
            Self::Text(text) => Value::String(text.clone()),
            Self::Error => Value::Null,
            Self::Other { payload, .. } => payload.clone(),
        };
        Ok(value)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draw(kind: StrokeKind, x: f64, y: f64) -> DrawOperation {
        DrawOperation {
            kind,
            x,
            y,
            color: "#ff0000".into(),
            stroke_width: 3.0,
        }
    }

    // =====================================================================
    // DrawOperation
    // =====================================================================

    #[test]
    fn test_draw_operation_json_uses_camel_case_width() {
        let json = serde_json::to_value(draw(StrokeKind::Move, 20.0, 20.0)).unwrap();

        assert_eq!(json["kind"], "move");
        assert_eq!(json["x"], 20.0);
        assert_eq!(json["color"], "#ff0000");
        assert_eq!(json["strokeWidth"], 3.0);
        assert!(json.get("stroke_width").is_none());
    }

    #[test]
    fn test_draw_operation_accepts_integer_coordinates() {
        // Browsers send offsetX/offsetY as plain integers.
        let op: DrawOperation = serde_json::from_value(json!({
            "kind": "start", "x": 10, "y": 12, "color": "#000", "strokeWidth": 3
        }))
        .unwrap();
        assert_eq!(op.kind, StrokeKind::Start);
        assert_eq!(op.x, 10.0);
        assert_eq!(op.stroke_width, 3.0);
    }

    #[test]
    fn test_stroke_kind_rejects_unknown_step() {
        let result: Result<StrokeKind, _> = serde_json::from_str("\"wiggle\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_stroke_kind_display_matches_wire_tag() {
        assert_eq!(StrokeKind::End.to_string(), "end");
        let json = serde_json::to_string(&StrokeKind::End).unwrap();
        assert_eq!(json, "\"end\"");
    }

    // =====================================================================
    // AudioChunk
    // =====================================================================

    #[test]
    fn test_audio_chunk_serializes_as_base64_string() {
        let chunk = AudioChunk::new(b"RIFF".to_vec());
        let json = serde_json::to_value(&chunk).unwrap();
        assert_eq!(json, json!("UklGRg=="));
    }

    #[test]
    fn test_audio_chunk_from_invalid_base64_is_invalid_message() {
        let result = AudioChunk::from_base64("not*base64");
        assert!(matches!(result, Err(ProtocolError::InvalidMessage(_))));
    }

    #[test]
    fn test_audio_chunk_debug_hides_bytes() {
        let chunk = AudioChunk::new(vec![7; 4096]);
        assert_eq!(format!("{chunk:?}"), "AudioChunk { len: 4096 }");
    }

    // =====================================================================
    // Envelope::from_parts / kind / payload
    // =====================================================================

    #[test]
    fn test_from_parts_recognizes_draw_operation() {
        let payload = serde_json::to_value(draw(StrokeKind::Start, 1.0, 2.0)).unwrap();
        let env = Envelope::from_parts("draw_operation", payload);
        assert_eq!(env, Envelope::DrawOperation(draw(StrokeKind::Start, 1.0, 2.0)));
    }

    #[test]
    fn test_from_parts_malformed_draw_payload_is_error() {
        let env = Envelope::from_parts("draw_operation", json!({"kind": "start"}));
        assert_eq!(env, Envelope::Error);
    }

    #[test]
    fn test_from_parts_clear_canvas_ignores_payload() {
        assert_eq!(Envelope::from_parts("clear_canvas", json!({})), Envelope::ClearCanvas);
        assert_eq!(Envelope::from_parts("clear_canvas", Value::Null), Envelope::ClearCanvas);
    }

    #[test]
    fn test_from_parts_unknown_kind_is_other() {
        let env = Envelope::from_parts("chat", json!({"msg": "hi"}));
        assert_eq!(
            env,
            Envelope::Other {
                kind: "chat".into(),
                payload: json!({"msg": "hi"}),
            }
        );
        assert_eq!(env.kind(), "chat");
    }

    #[test]
    fn test_from_parts_text_with_non_string_payload_is_stringified() {
        let env = Envelope::from_parts("text", json!(42));
        assert_eq!(env, Envelope::Text("42".into()));
    }

    #[test]
    fn test_kind_matches_wire_tags() {
        assert_eq!(Envelope::ClearCanvas.kind(), "clear_canvas");
        assert_eq!(Envelope::Error.kind(), "error");
        assert_eq!(Envelope::Text("x".into()).kind(), "text");
        assert_eq!(Envelope::AudioChunk(AudioChunk::new(vec![])).kind(), "audio_chunk");
    }

    #[test]
    fn test_payload_shapes() {
        assert_eq!(Envelope::ClearCanvas.payload().unwrap(), json!({}));
        assert_eq!(Envelope::Error.payload().unwrap(), Value::Null);
        assert_eq!(Envelope::Text("hi".into()).payload().unwrap(), json!("hi"));
        assert_eq!(
            Envelope::AudioChunk(AudioChunk::new(b"RIFF".to_vec())).payload().unwrap(),
            json!("UklGRg==")
        );
    }
}
