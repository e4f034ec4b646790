//! The envelope and the message kinds that travel on the wire.
//!
//! Every frame exchanged with the gacha server is one [`Envelope`]:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ type:  "gacha_result"                        │  ← routes the message
//! │ data:  "{\"characters\":[...],\"isNew\":...}" │  ← payload, JSON *as a string*
//! │ error: null                                  │  ← set on `error` messages
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Note that `data` is a string holding JSON, not a nested object. The
//! server encodes twice and expects the client to do the same, so the
//! envelope keeps `data` as an opaque `String` and payloads are decoded
//! in a second step (see [`Codec::decode_payload`](crate::Codec::decode_payload)).

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The top-level message wrapper. Every message on the wire is an Envelope.
///
/// `kind` stays a plain `String` instead of an enum: the server may add new
/// message types at any time, and an unknown type must be logged and
/// dropped rather than fail the whole decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// The message type, e.g. `"single_pull"` or `"user_info"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// The serialized payload, if any.
    ///
    /// `#[serde(default)]` lets the field be missing entirely;
    /// `skip_serializing_if` keeps outbound requests without a payload
    /// down to `{"type":"ping"}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// Server-reported error text. Only meaningful on `error` messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    /// Creates an envelope with no payload and no error.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: None,
            error: None,
        }
    }

    /// Returns the payload string, treating an empty string like `null`.
    pub fn payload(&self) -> Option<&str> {
        self.data.as_deref().filter(|d| !d.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Outbound (client → server)
// ---------------------------------------------------------------------------

/// Requests the client can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutboundKind {
    /// Spend currency on one pull.
    SinglePull,
    /// Spend currency on ten pulls.
    TenPull,
    /// Ask for a fresh [`UserInfo`](crate::UserInfo) snapshot.
    GetUserInfo,
    /// Ask for the owned character list.
    GetInventory,
    /// Ask for the pool contents and published rates.
    GetPool,
    /// Grant currency. Test servers only; carries `{ amount }`.
    AddCurrency,
    /// Keep-alive; answered with `pong`.
    Ping,
}

impl OutboundKind {
    /// The string used in the envelope's `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SinglePull => "single_pull",
            Self::TenPull => "ten_pull",
            Self::GetUserInfo => "get_user_info",
            Self::GetInventory => "get_inventory",
            Self::GetPool => "get_pool",
            Self::AddCurrency => "add_currency",
            Self::Ping => "ping",
        }
    }
}

impl fmt::Display for OutboundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Inbound (server → client)
// ---------------------------------------------------------------------------

/// Message types the client knows how to handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundKind {
    /// `data` is a [`PullResult`](crate::PullResult).
    GachaResult,
    /// `data` is a [`UserInfo`](crate::UserInfo).
    UserInfo,
    /// `data` is an [`Inventory`](crate::Inventory).
    Inventory,
    /// `data` is a [`PoolInfo`](crate::PoolInfo).
    PoolInfo,
    /// Balance changed server-side; `data` is ignored.
    CurrencyUpdate,
    /// The `error` field carries the message.
    Error,
    /// Reply to `ping`; no data.
    Pong,
}

impl InboundKind {
    /// Every inbound kind, in wire-table order.
    pub const ALL: [InboundKind; 7] = [
        Self::GachaResult,
        Self::UserInfo,
        Self::Inventory,
        Self::PoolInfo,
        Self::CurrencyUpdate,
        Self::Error,
        Self::Pong,
    ];

    /// Parses an envelope `type` string. Returns `None` for unknown types.
    pub fn from_wire(kind: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == kind)
    }

    /// The string used in the envelope's `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GachaResult => "gacha_result",
            Self::UserInfo => "user_info",
            Self::Inventory => "inventory",
            Self::PoolInfo => "pool_info",
            Self::CurrencyUpdate => "currency_update",
            Self::Error => "error",
            Self::Pong => "pong",
        }
    }
}

impl fmt::Display for InboundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_serializes_type_field() {
        let json: serde_json::Value =
            serde_json::to_value(Envelope::new("ping")).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "ping" }));
    }

    #[test]
    fn test_envelope_missing_fields_decode_as_none() {
        let env: Envelope =
            serde_json::from_str(r#"{"type":"currency_update"}"#).unwrap();
        assert_eq!(env.kind, "currency_update");
        assert!(env.data.is_none());
        assert!(env.error.is_none());
    }

    #[test]
    fn test_envelope_explicit_nulls_decode_as_none() {
        let env: Envelope =
            serde_json::from_str(r#"{"type":"pong","data":null,"error":null}"#)
                .unwrap();
        assert!(env.data.is_none());
    }

    #[test]
    fn test_empty_data_counts_as_absent() {
        let env = Envelope {
            kind: "user_info".into(),
            data: Some(String::new()),
            error: None,
        };
        assert_eq!(env.payload(), None);
    }

    #[test]
    fn test_envelope_without_type_is_rejected() {
        let result: Result<Envelope, _> =
            serde_json::from_str(r#"{"data":"{}"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_inbound_kind_parses_every_wire_name() {
        for kind in InboundKind::ALL {
            assert_eq!(InboundKind::from_wire(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_inbound_kind_unknown_is_none() {
        assert_eq!(InboundKind::from_wire("fly_to_moon"), None);
        // Outbound names are not inbound types.
        assert_eq!(InboundKind::from_wire("single_pull"), None);
    }

    #[test]
    fn test_outbound_kind_wire_names() {
        assert_eq!(OutboundKind::SinglePull.as_str(), "single_pull");
        assert_eq!(OutboundKind::TenPull.as_str(), "ten_pull");
        assert_eq!(OutboundKind::GetUserInfo.as_str(), "get_user_info");
        assert_eq!(OutboundKind::GetInventory.as_str(), "get_inventory");
        assert_eq!(OutboundKind::GetPool.as_str(), "get_pool");
        assert_eq!(OutboundKind::AddCurrency.as_str(), "add_currency");
        assert_eq!(OutboundKind::Ping.to_string(), "ping");
    }
}
