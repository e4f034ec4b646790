//! # gachalink
//!
//! Client for real-time gacha pulls over a persistent socket.
//!
//! gachalink keeps one connection to a gacha server, gates pull requests
//! against the connection state and the last balance the server reported,
//! and plays each result back one character at a time with a cooperative
//! skip. Outcomes always come from the server: the client never rolls a
//! rarity of its own.
//!
//! The whole client is driven by [`GachaClient::tick`]. Call it once per
//! frame with the elapsed time and implement [`ClientObserver`] to hear
//! about what happened.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use gachalink::prelude::*;
//!
//! struct Ui;
//!
//! impl ClientObserver for Ui {
//!     fn on_playback_step(&mut self, index: usize, character: &Character) {
//!         println!("#{index}: {} ({})", character.name, RarityStyle::for_level(character.rarity).label);
//!     }
//! }
//!
//! # #[tokio::main] async fn main() {
//! let mut client = GachaClient::builder()
//!     .url("ws://localhost:8080/ws")
//!     .observer(Ui)
//!     .build();
//! client.connect();
//!
//! let mut frame = tokio::time::interval(Duration::from_millis(16));
//! loop {
//!     frame.tick().await;
//!     client.tick(Duration::from_millis(16));
//!     if client.can_pull(PullKind::Ten) {
//!         client.request_pull(PullKind::Ten).ok();
//!     }
//! }
//! # }
//! ```
//!
//! ## Crates
//!
//! | Layer     | Crate                  | Provides                                  |
//! |-----------|------------------------|-------------------------------------------|
//! | protocol  | `gachalink-protocol`   | envelope, payload model, [`JsonCodec`]    |
//! | transport | `gachalink-transport`  | links, inbound queue, WebSocket connector |
//! | session   | `gachalink-session`    | connection state machine, dispatcher      |
//! | reveal    | `gachalink-reveal`     | tick-driven reveal playback               |
//! | client    | `gachalink` (this one) | admission, [`GachaClient`], errors        |

mod admission;
mod client;
mod config;
mod error;
mod observer;

pub use admission::PullController;
pub use client::{GachaClient, GachaClientBuilder};
pub use config::{ClientConfig, PullCosts};
pub use error::{GachaError, PullRejection};
pub use observer::ClientObserver;

pub use gachalink_protocol::{
    Character, InboundKind, Inventory, JsonCodec, PoolInfo, PullKind, PullResult, RateInfo,
    Rarity, UserInfo,
};
pub use gachalink_reveal::{Frame, Phase, RarityStyle, RevealConfig, RevealCue, Rgb};
pub use gachalink_session::{ConnectionState, DisconnectReason, ServerEvent, SubscriptionId};
pub use gachalink_transport::{Connector, Link, WebSocketConnector};

/// The types most applications need.
pub mod prelude {
    pub use crate::{
        Character, ClientConfig, ClientObserver, ConnectionState, GachaClient, GachaError,
        InboundKind, PullKind, PullRejection, PullResult, RarityStyle, RevealConfig, RevealCue,
        ServerEvent, UserInfo,
    };
}
