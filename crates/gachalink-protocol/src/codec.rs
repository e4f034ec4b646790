//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A "codec" converts between Rust types and raw bytes. On top of the two
//! primitive operations ([`Codec::encode`], [`Codec::decode`]) the trait
//! provides the envelope-level operations the client actually uses:
//!
//! - [`Codec::encode_message`] builds an [`Envelope`], serializing the
//!   payload into the `data` *string* first (the double encoding the
//!   server expects), then serializes the envelope.
//! - [`Codec::decode_envelope`] parses only the outer structure. A missing
//!   `data` field is not an error at this stage.
//! - [`Codec::decode_payload`] parses the nested `data` string into a
//!   concrete type and reports failures as
//!   [`ProtocolError::PayloadDecode`], so a bad payload can be told apart
//!   from a bad envelope.

use serde::{de::DeserializeOwned, Serialize};

use crate::error::PayloadFault;
use crate::{Envelope, OutboundKind, ProtocolError};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the client may hand the codec to
/// background tasks; codecs are stateless so this costs nothing.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value can't be represented
    /// in this format.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;

    /// Encodes a full wire message of the given type.
    ///
    /// The payload (if any) is encoded on its own and stored in the
    /// envelope's `data` field as a string.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the payload or the envelope
    /// can't be serialized.
    fn encode_message<T: Serialize>(
        &self,
        kind: &str,
        payload: Option<&T>,
    ) -> Result<Vec<u8>, ProtocolError> {
        let data = match payload {
            Some(value) => Some(into_text(self.encode(value)?)?),
            None => None,
        };
        self.encode(&Envelope {
            kind: kind.to_owned(),
            data,
            error: None,
        })
    }

    /// Encodes a request that carries no payload.
    fn encode_request(&self, kind: OutboundKind) -> Result<Vec<u8>, ProtocolError> {
        self.encode_message::<()>(kind.as_str(), None)
    }

    /// Encodes a request with a payload.
    fn encode_request_with<T: Serialize>(
        &self,
        kind: OutboundKind,
        payload: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        self.encode_message(kind.as_str(), Some(payload))
    }

    /// Parses the outer envelope only.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the envelope is malformed.
    fn decode_envelope(&self, bytes: &[u8]) -> Result<Envelope, ProtocolError> {
        self.decode(bytes)
    }

    /// Parses the envelope's nested `data` string as `T`.
    ///
    /// # Errors
    /// Returns [`ProtocolError::PayloadDecode`] if `data` is null/empty or
    /// does not parse as `T`.
    fn decode_payload<T: DeserializeOwned>(
        &self,
        envelope: &Envelope,
    ) -> Result<T, ProtocolError> {
        let data = envelope.payload().ok_or_else(|| ProtocolError::PayloadDecode {
            kind: envelope.kind.clone(),
            fault: PayloadFault::Missing,
        })?;
        self.decode(data.as_bytes())
            .map_err(|e| ProtocolError::PayloadDecode {
                kind: envelope.kind.clone(),
                fault: PayloadFault::Malformed(e.to_string()),
            })
    }
}

/// The nested payload travels as a JSON string, so the encoded bytes
/// must be valid UTF-8.
fn into_text(bytes: Vec<u8>) -> Result<String, ProtocolError> {
    String::from_utf8(bytes).map_err(|e| {
        ProtocolError::InvalidMessage(format!("payload is not valid UTF-8: {e}"))
    })
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// This is the codec the gacha server speaks. It is behind the `json`
/// feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use gachalink_protocol::{Codec, JsonCodec, AddCurrencyRequest, OutboundKind};
///
/// let codec = JsonCodec;
/// let bytes = codec
///     .encode_request_with(OutboundKind::AddCurrency, &AddCurrencyRequest { amount: 500 })
///     .unwrap();
///
/// let envelope = codec.decode_envelope(&bytes).unwrap();
/// assert_eq!(envelope.kind, "add_currency");
/// assert_eq!(envelope.data.as_deref(), Some(r#"{"amount":500}"#));
///
/// let payload: AddCurrencyRequest = codec.decode_payload(&envelope).unwrap();
/// assert_eq!(payload.amount, 500);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{Character, InboundKind, PullResult, UserInfo};

    #[test]
    fn test_request_without_payload_has_no_data_field() {
        let bytes = JsonCodec.encode_request(OutboundKind::TenPull).unwrap();
        assert_eq!(bytes, br#"{"type":"ten_pull"}"#);
    }

    #[test]
    fn test_payload_is_double_encoded() {
        let info = UserInfo {
            username: "mika".into(),
            currency: 160,
            pity_count: 3,
        };
        let bytes = JsonCodec.encode_message("user_info", Some(&info)).unwrap();

        // The outer JSON must carry `data` as a string, not an object.
        let outer: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        let data = outer["data"].as_str().expect("data must be a JSON string");
        let inner: serde_json::Value = serde_json::from_str(data).unwrap();
        assert_eq!(inner["currency"], 160);
        assert_eq!(inner["pityCount"], 3);
    }

    #[test]
    fn test_round_trip_reproduces_type_and_payload() {
        let result = PullResult {
            characters: vec![Character {
                id: 9,
                name: "Sol".into(),
                rarity: 5,
                image_url: "sol.png".into(),
                rate: 0.6,
            }],
            is_new: vec![true],
            timestamp: 42,
        };
        let bytes = JsonCodec
            .encode_message(InboundKind::GachaResult.as_str(), Some(&result))
            .unwrap();

        let envelope = JsonCodec.decode_envelope(&bytes).unwrap();
        assert_eq!(envelope.kind, "gacha_result");
        let decoded: PullResult = JsonCodec.decode_payload(&envelope).unwrap();
        assert_eq!(decoded, result);
    }

    #[test]
    fn test_encode_non_serializable_payload_fails() {
        // JSON object keys must be strings; a tuple key can't be written.
        let mut map = HashMap::new();
        map.insert((1, 2), "x");
        let err = JsonCodec.encode_message("add_currency", Some(&map)).unwrap_err();
        assert!(matches!(err, ProtocolError::Encode(_)));
    }

    #[test]
    fn test_decode_garbage_is_envelope_error() {
        let err = JsonCodec.decode_envelope(b"not json at all").unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
        assert!(!err.is_payload_error());
    }

    #[test]
    fn test_decode_envelope_without_data_succeeds() {
        let env = JsonCodec.decode_envelope(br#"{"type":"pong"}"#).unwrap();
        assert_eq!(env.kind, "pong");
        assert!(env.data.is_none());
    }

    #[test]
    fn test_missing_payload_is_payload_error() {
        let env = JsonCodec.decode_envelope(br#"{"type":"user_info"}"#).unwrap();
        let err = JsonCodec.decode_payload::<UserInfo>(&env).unwrap_err();
        match err {
            ProtocolError::PayloadDecode { kind, fault } => {
                assert_eq!(kind, "user_info");
                assert_eq!(fault, PayloadFault::Missing);
            }
            other => panic!("expected PayloadDecode, got {other:?}"),
        }
    }

    #[test]
    fn test_unparseable_payload_is_payload_error() {
        let env = JsonCodec
            .decode_envelope(br#"{"type":"user_info","data":"{\"username\":1}"}"#)
            .unwrap();
        let err = JsonCodec.decode_payload::<UserInfo>(&env).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::PayloadDecode {
                fault: PayloadFault::Malformed(_),
                ..
            }
        ));
    }

    #[test]
    fn test_error_envelope_keeps_error_text() {
        let env = JsonCodec
            .decode_envelope(br#"{"type":"error","error":"Insufficient currency"}"#)
            .unwrap();
        assert_eq!(env.error.as_deref(), Some("Insufficient currency"));
    }
}
