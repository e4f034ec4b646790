//! Wire protocol for gachalink.
//!
//! This crate defines the "language" the client and the gacha server speak:
//!
//! - **Types** ([`Envelope`], [`OutboundKind`], [`InboundKind`]) — the
//!   wrapper every frame travels in and the message types it can carry.
//! - **Model** ([`PullResult`], [`Character`], [`UserInfo`], ...) — the
//!   payloads nested inside an envelope's `data` string.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to and from bytes, including the two-stage payload decode.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the session
//! (connection state, dispatch). It knows nothing about sockets or UI.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope → payload) → Session (dispatch)
//! ```

mod codec;
mod error;
mod model;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::{PayloadFault, ProtocolError};
pub use model::{
    AddCurrencyRequest, Character, Inventory, PoolInfo, PullKind, PullResult,
    RateInfo, Rarity, UserInfo,
};
pub use types::{Envelope, InboundKind, OutboundKind};
