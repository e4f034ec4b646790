//! Connection lifecycle and message dispatch for gachalink.
//!
//! This crate turns what the transport observes into something the
//! client can act on:
//!
//! 1. **Connection state** — a [`Connection`] walks
//!    `Disconnected → Connecting → Open → Closing → Disconnected` and
//!    raises a [`ConnectionEvent`] on every change
//! 2. **Dispatch** — an [`EventDispatcher`] decodes each message into a
//!    [`ServerEvent`] and delivers it to the callbacks subscribed to its
//!    type
//!
//! # How it fits in the stack
//!
//! ```text
//! Client (above)  ← admission, playback, observer notifications
//!     ↕
//! Session Layer (this crate)  ← connection state, typed dispatch
//!     ↕
//! Protocol + Transport (below)  ← envelopes, links, inbound queue
//! ```
//!
//! Nothing here spawns tasks or takes locks. The owner drains the
//! inbound queue on its own tick and feeds each item through
//! [`Connection::handle`] and then [`EventDispatcher::dispatch`].

mod connection;
mod dispatcher;
mod error;

pub use connection::{Connection, ConnectionEvent, ConnectionState, DisconnectReason};
pub use dispatcher::{EventDispatcher, ServerEvent, SubscriptionId, UNSPECIFIED_SERVER_ERROR};
pub use error::{ConnectionError, DispatchError};
