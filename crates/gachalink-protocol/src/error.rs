//! Error types for the protocol layer.
//!
//! The protocol layer has three distinct ways to fail, and callers care
//! about the difference:
//!
//! - the outer envelope is malformed ([`ProtocolError::Decode`]), so the
//!   message cannot even be routed;
//! - the envelope is fine but its nested `data` string is absent or does
//!   not parse as the expected type ([`ProtocolError::PayloadDecode`]);
//! - a local value could not be serialized ([`ProtocolError::Encode`]).

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The outer envelope could not be parsed.
    ///
    /// Common causes: not JSON at all, a missing `type` field, or a
    /// truncated frame.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope was structurally valid but its nested payload was not.
    #[error("payload decode failed for `{kind}`: {fault}")]
    PayloadDecode {
        /// The envelope's `type` string.
        kind: String,
        /// What was wrong with the `data` field.
        fault: PayloadFault,
    },

    /// The message parsed but breaks a protocol rule, e.g. a pull result
    /// whose `isNew` list is shorter than its character list.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Why a nested payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadFault {
    /// `data` was null, missing, or an empty string.
    #[error("no data")]
    Missing,

    /// `data` was present but did not parse as the expected type.
    #[error("{0}")]
    Malformed(String),
}

impl ProtocolError {
    /// Returns `true` if this error came from a nested payload rather than
    /// the envelope itself.
    pub fn is_payload_error(&self) -> bool {
        matches!(self, Self::PayloadDecode { .. })
    }
}
