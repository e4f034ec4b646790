//! Client transport layer for gachalink.
//!
//! Provides the [`Connector`] and [`Link`] traits that abstract over how
//! the client reaches the server, the [`InboundQueue`] that hands
//! delivered data to the application's tick, and a WebSocket
//! implementation.
//!
//! A link never calls back into application code. Everything it observes
//! (open, message, close, failure) becomes an [`Inbound`] item pushed into
//! the queue, tagged with the link's [`ConnectionId`]:
//!
//! ```text
//! Connector::open(url, id, sender) ──▶ Link
//!        link task ──▶ Inbound { link: id, event } ──▶ InboundQueue
//! ```
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket link via `tokio-tungstenite`
//! - `test-util` — [`testing`] module with a scripted in-memory connector

mod error;
mod queue;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
pub use queue::{InboundQueue, InboundSender};
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnector, WebSocketLink};

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one connection attempt.
///
/// Every call to [`Connector::open`] gets a fresh id, so events still in
/// flight from an earlier, abandoned link can be recognised and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-unique id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Something a link observed.
#[derive(Debug)]
pub enum LinkEvent {
    /// The handshake completed; the link can carry messages.
    Opened,
    /// One complete inbound message.
    Message(Vec<u8>),
    /// The link closed cleanly, with the peer's reason if it gave one.
    Closed(Option<String>),
    /// The link failed and is gone.
    Failed(TransportError),
}

/// A [`LinkEvent`] tagged with the link that produced it.
#[derive(Debug)]
pub struct Inbound {
    pub link: ConnectionId,
    pub event: LinkEvent,
}

impl Inbound {
    pub fn new(link: ConnectionId, event: LinkEvent) -> Self {
        Self { link, event }
    }
}

/// Opens links to a server.
pub trait Connector: 'static {
    /// The link type produced by this connector.
    type Link: Link;

    /// Starts connecting to `url` and returns immediately.
    ///
    /// The outcome is reported later through `events`: `Opened` on
    /// success, `Failed` or `Closed` otherwise.
    ///
    /// # Errors
    /// Returns an error only if the attempt could not even be started.
    fn open(
        &mut self,
        url: &str,
        id: ConnectionId,
        events: InboundSender<Inbound>,
    ) -> Result<Self::Link, TransportError>;
}

/// One open (or opening) link to the server.
pub trait Link {
    /// Queues `data` for sending. Does not wait for the write.
    ///
    /// # Errors
    /// Fails if the link has already shut down.
    fn send(&self, data: Vec<u8>) -> Result<(), TransportError>;

    /// Starts a graceful close. Completion is reported as
    /// [`LinkEvent::Closed`].
    fn close(&self);

    /// Returns the identifier this link was opened with.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_next_is_unique() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(b.into_inner() > a.into_inner());
    }
}
