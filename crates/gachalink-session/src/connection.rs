//! The connection state machine.
//!
//! ```text
//!                 connect()            Opened
//!  Disconnected ───────────▶ Connecting ───────▶ Open
//!       ▲                     │    │               │
//!       │   Failed / Closed   │    │ disconnect()  │ disconnect()
//!       ├─────────────────────┘    ▼               ▼
//!       │                         Closing ◀────────┘
//!       │   Closed / Failed          │
//!       └────────────────────────────┘
//!       ▲                                          │
//!       └──────────── Failed / Closed ─────────────┘
//! ```
//!
//! The machine never touches the socket directly from another thread.
//! The link reports everything through the inbound queue, and the owner
//! feeds each drained item to [`Connection::handle`] on its own tick.
//! That call performs the transition and returns what the rest of the
//! client should hear about.
//!
//! Reconnecting is always a caller decision: there is no retry loop here.

use std::fmt;

use gachalink_transport::{
    ConnectionId, Connector, Inbound, InboundSender, Link, LinkEvent,
};

use crate::ConnectionError;

// ---------------------------------------------------------------------------
// ConnectionState
// ---------------------------------------------------------------------------

/// Where the connection is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    /// No link. The initial state, and the state after every close.
    #[default]
    Disconnected,
    /// A link is being opened.
    Connecting,
    /// The link is up; sends are allowed.
    Open,
    /// A close was requested and is in progress.
    Closing,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Open => "open",
            Self::Closing => "closing",
        })
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Why the connection ended up `Disconnected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The caller asked for it via [`Connection::disconnect`].
    Requested,
    /// The server closed the link, with its reason if it gave one.
    ClosedByPeer(Option<String>),
    /// The link failed (connect refused, reset, write error, ...).
    Failed(String),
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requested => f.write_str("closed by client"),
            Self::ClosedByPeer(Some(reason)) => write!(f, "closed by server: {reason}"),
            Self::ClosedByPeer(None) => f.write_str("closed by server"),
            Self::Failed(error) => write!(f, "connection failed: {error}"),
        }
    }
}

/// What [`Connection::handle`] surfaces to the rest of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Raised once when the state becomes `Open`.
    Connected,
    /// Raised once when the state becomes `Disconnected`.
    Disconnected(DisconnectReason),
    /// An inbound message, still encoded.
    Message(Vec<u8>),
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Owns the link to the server and its lifecycle.
///
/// Generic over the [`Connector`] so tests can script link behavior
/// without a network.
pub struct Connection<C: Connector> {
    connector: C,
    url: String,
    state: ConnectionState,
    /// Id of the current connection attempt. Events tagged with any other
    /// id come from an abandoned link and are ignored.
    current: Option<ConnectionId>,
    /// The live link handle. `None` while disconnected, and also when a
    /// connect attempt failed before a link existed.
    link: Option<C::Link>,
    /// Where links report. Cloned into every link we open.
    events: InboundSender<Inbound>,
}

impl<C: Connector> Connection<C> {
    /// Creates a disconnected connection that will dial `url`.
    pub fn new(
        connector: C,
        url: impl Into<String>,
        events: InboundSender<Inbound>,
    ) -> Self {
        Self {
            connector,
            url: url.into(),
            state: ConnectionState::Disconnected,
            current: None,
            link: None,
            events,
        }
    }

    /// The current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Shorthand for `state() == Open`.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// The server URL this connection dials.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The id of the current connection attempt, if any.
    pub fn current_id(&self) -> Option<ConnectionId> {
        self.current
    }

    /// Starts connecting. Only valid from `Disconnected`; anywhere else it
    /// is a logged no-op.
    ///
    /// The outcome arrives later through [`handle`](Self::handle) as
    /// either `Connected` or `Disconnected`.
    pub fn connect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            tracing::info!(state = %self.state, "connect ignored, connection already active");
            return;
        }

        let id = ConnectionId::next();
        self.current = Some(id);
        self.state = ConnectionState::Connecting;

        match self.connector.open(&self.url, id, self.events.clone()) {
            Ok(link) => {
                tracing::info!(%id, url = %self.url, "connecting");
                self.link = Some(link);
            }
            Err(e) => {
                // Report through the queue like any other link outcome so
                // it surfaces on the next tick as Connecting → Disconnected.
                tracing::warn!(%id, error = %e, "could not start connecting");
                self.events.enqueue(Inbound::new(id, LinkEvent::Failed(e)));
            }
        }
    }

    /// Starts a graceful close from `Open` or `Connecting`.
    ///
    /// The state moves to `Closing` now and to `Disconnected` once the
    /// link confirms. Calling it while `Disconnected` or `Closing` does
    /// nothing.
    pub fn disconnect(&mut self) {
        match self.state {
            ConnectionState::Disconnected | ConnectionState::Closing => {
                tracing::debug!(state = %self.state, "disconnect ignored");
            }
            ConnectionState::Connecting | ConnectionState::Open => {
                tracing::info!(id = ?self.current, from = %self.state, "closing connection");
                self.state = ConnectionState::Closing;
                if let Some(link) = &self.link {
                    link.close();
                }
            }
        }
    }

    /// Sends an encoded message.
    ///
    /// # Errors
    /// - [`ConnectionError::NotConnected`] unless the state is `Open`.
    /// - [`ConnectionError::Transport`] if the link already went away.
    pub fn send(&self, data: Vec<u8>) -> Result<(), ConnectionError> {
        match (&self.link, self.state) {
            (Some(link), ConnectionState::Open) => {
                link.send(data)?;
                Ok(())
            }
            (_, state) => Err(ConnectionError::NotConnected(state)),
        }
    }

    /// Applies one item drained from the inbound queue.
    ///
    /// Returns the notification or message the rest of the client should
    /// see, or `None` if the item caused nothing observable.
    pub fn handle(&mut self, inbound: Inbound) -> Option<ConnectionEvent> {
        let Inbound { link: id, event } = inbound;
        if self.current != Some(id) {
            tracing::debug!(%id, current = ?self.current, "ignoring event from stale link");
            return None;
        }

        match event {
            LinkEvent::Opened => match self.state {
                ConnectionState::Connecting => {
                    tracing::info!(%id, "connection open");
                    self.state = ConnectionState::Open;
                    Some(ConnectionEvent::Connected)
                }
                // A close was requested before the open landed; the link's
                // own Closed event finishes the job.
                _ => None,
            },
            LinkEvent::Message(bytes) => match self.state {
                // Frames the server sent before it saw our close are
                // still authoritative.
                ConnectionState::Open | ConnectionState::Closing => {
                    Some(ConnectionEvent::Message(bytes))
                }
                state => {
                    tracing::warn!(%id, %state, "dropping message received outside an open connection");
                    None
                }
            },
            LinkEvent::Closed(reason) => {
                let reason = if self.state == ConnectionState::Closing {
                    DisconnectReason::Requested
                } else {
                    DisconnectReason::ClosedByPeer(reason)
                };
                Some(self.finish(reason))
            }
            LinkEvent::Failed(error) => {
                let reason = if self.state == ConnectionState::Closing {
                    DisconnectReason::Requested
                } else {
                    DisconnectReason::Failed(error.to_string())
                };
                Some(self.finish(reason))
            }
        }
    }

    /// Moves to `Disconnected` and drops the link.
    fn finish(&mut self, reason: DisconnectReason) -> ConnectionEvent {
        tracing::info!(id = ?self.current, from = %self.state, %reason, "disconnected");
        self.state = ConnectionState::Disconnected;
        self.current = None;
        self.link = None;
        ConnectionEvent::Disconnected(reason)
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use gachalink_transport::testing::{MockConnector, MockServer, mock_link};
    use gachalink_transport::{InboundQueue, TransportError};

    use super::*;

    fn setup() -> (Connection<MockConnector>, MockServer, InboundQueue<Inbound>) {
        let queue = InboundQueue::new();
        let (connector, server) = mock_link();
        let conn = Connection::new(connector, "ws://test/ws", queue.sender());
        (conn, server, queue)
    }

    /// Drains the queue through the state machine, like one client tick.
    fn pump(
        conn: &mut Connection<MockConnector>,
        queue: &mut InboundQueue<Inbound>,
    ) -> Vec<ConnectionEvent> {
        let mut out = Vec::new();
        queue.drain_all(|item| out.extend(conn.handle(item)));
        out
    }

    fn open(conn: &mut Connection<MockConnector>, server: &MockServer, queue: &mut InboundQueue<Inbound>) {
        conn.connect();
        server.accept();
        assert_eq!(pump(conn, queue), vec![ConnectionEvent::Connected]);
    }

    #[test]
    fn test_starts_disconnected() {
        let (conn, _server, _queue) = setup();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!conn.is_open());
        assert_eq!(conn.current_id(), None);
    }

    #[test]
    fn test_connect_then_open() {
        let (mut conn, server, mut queue) = setup();

        conn.connect();
        assert_eq!(conn.state(), ConnectionState::Connecting);
        assert_eq!(server.attempts(), 1);
        assert_eq!(server.last_url().as_deref(), Some("ws://test/ws"));

        server.accept();
        let events = pump(&mut conn, &mut queue);
        assert_eq!(events, vec![ConnectionEvent::Connected]);
        assert!(conn.is_open());
    }

    #[test]
    fn test_connect_while_not_disconnected_is_noop() {
        let (mut conn, server, mut queue) = setup();
        conn.connect();
        conn.connect();
        assert_eq!(server.attempts(), 1);

        server.accept();
        pump(&mut conn, &mut queue);
        conn.connect();
        assert_eq!(server.attempts(), 1);
        assert!(conn.is_open());
    }

    #[test]
    fn test_failure_before_open_disconnects() {
        let (mut conn, server, mut queue) = setup();
        conn.connect();
        server.fail("connection refused");

        let events = pump(&mut conn, &mut queue);
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            ConnectionEvent::Disconnected(DisconnectReason::Failed(msg)) if msg.contains("refused")
        ));
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_open_that_cannot_start_surfaces_on_next_tick() {
        let (mut conn, server, mut queue) = setup();
        server.refuse_next_open("no runtime");

        conn.connect();
        assert_eq!(conn.state(), ConnectionState::Connecting);

        let events = pump(&mut conn, &mut queue);
        assert!(matches!(
            events.as_slice(),
            [ConnectionEvent::Disconnected(DisconnectReason::Failed(_))]
        ));
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_peer_close_before_open_disconnects() {
        let (mut conn, server, mut queue) = setup();
        conn.connect();
        server.close_from_server(None);
        let events = pump(&mut conn, &mut queue);
        assert_eq!(
            events,
            vec![ConnectionEvent::Disconnected(DisconnectReason::ClosedByPeer(None))]
        );
    }

    #[test]
    fn test_error_while_open_disconnects() {
        let (mut conn, server, mut queue) = setup();
        open(&mut conn, &server, &mut queue);

        server.fail("reset by peer");
        let events = pump(&mut conn, &mut queue);
        assert!(matches!(
            events.as_slice(),
            [ConnectionEvent::Disconnected(DisconnectReason::Failed(_))]
        ));
        assert!(!conn.is_open());
    }

    #[test]
    fn test_messages_pass_through_while_open() {
        let (mut conn, server, mut queue) = setup();
        open(&mut conn, &server, &mut queue);

        server.push(b"one".to_vec());
        server.push(b"two".to_vec());
        let events = pump(&mut conn, &mut queue);
        assert_eq!(
            events,
            vec![
                ConnectionEvent::Message(b"one".to_vec()),
                ConnectionEvent::Message(b"two".to_vec()),
            ]
        );
    }

    #[test]
    fn test_disconnect_goes_through_closing() {
        let (mut conn, server, mut queue) = setup();
        server.hold_closes();
        open(&mut conn, &server, &mut queue);

        conn.disconnect();
        assert_eq!(conn.state(), ConnectionState::Closing);
        assert!(server.close_requested());

        // Disconnect again while closing: nothing changes.
        conn.disconnect();
        assert_eq!(conn.state(), ConnectionState::Closing);

        server.complete_close();
        let events = pump(&mut conn, &mut queue);
        assert_eq!(
            events,
            vec![ConnectionEvent::Disconnected(DisconnectReason::Requested)]
        );
        assert_eq!(conn.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_disconnect_while_connecting() {
        let (mut conn, server, mut queue) = setup();
        conn.connect();
        conn.disconnect();
        assert_eq!(conn.state(), ConnectionState::Closing);
        assert!(server.close_requested());

        let events = pump(&mut conn, &mut queue);
        assert_eq!(
            events,
            vec![ConnectionEvent::Disconnected(DisconnectReason::Requested)]
        );
    }

    #[test]
    fn test_disconnect_when_disconnected_is_noop() {
        let (mut conn, server, mut queue) = setup();
        conn.disconnect();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(pump(&mut conn, &mut queue).is_empty());
        assert_eq!(server.attempts(), 0);
    }

    #[test]
    fn test_send_requires_open() {
        let (mut conn, server, mut queue) = setup();
        server.hold_closes();

        let err = conn.send(b"x".to_vec()).unwrap_err();
        assert!(matches!(err, ConnectionError::NotConnected(ConnectionState::Disconnected)));

        conn.connect();
        let err = conn.send(b"x".to_vec()).unwrap_err();
        assert!(matches!(err, ConnectionError::NotConnected(ConnectionState::Connecting)));

        server.accept();
        pump(&mut conn, &mut queue);
        conn.send(b"x".to_vec()).expect("send while open");
        assert_eq!(server.sent(), vec![b"x".to_vec()]);

        conn.disconnect();
        let err = conn.send(b"y".to_vec()).unwrap_err();
        assert!(matches!(err, ConnectionError::NotConnected(ConnectionState::Closing)));
        assert_eq!(server.sent().len(), 1);
    }

    #[test]
    fn test_send_on_dead_link_is_transport_error() {
        let (mut conn, server, mut queue) = setup();
        open(&mut conn, &server, &mut queue);
        server.kill_link();

        let err = conn.send(b"x".to_vec()).unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::Transport(TransportError::ConnectionClosed(_))
        ));
    }

    #[test]
    fn test_reconnect_ignores_stale_link_events() {
        let (mut conn, server, mut queue) = setup();
        open(&mut conn, &server, &mut queue);
        let old = conn.current_id().unwrap();

        conn.disconnect();
        pump(&mut conn, &mut queue);
        conn.connect();
        assert_ne!(conn.current_id(), Some(old));

        // A late frame from the old link must not leak into the new one.
        queue.sender().enqueue(Inbound::new(old, LinkEvent::Message(b"late".to_vec())));
        queue.sender().enqueue(Inbound::new(old, LinkEvent::Closed(None)));
        assert!(pump(&mut conn, &mut queue).is_empty());
        assert_eq!(conn.state(), ConnectionState::Connecting);

        server.accept();
        assert_eq!(pump(&mut conn, &mut queue), vec![ConnectionEvent::Connected]);
    }

    #[test]
    fn test_disconnect_reason_display() {
        assert_eq!(DisconnectReason::Requested.to_string(), "closed by client");
        assert_eq!(
            DisconnectReason::ClosedByPeer(Some("maintenance".into())).to_string(),
            "closed by server: maintenance"
        );
    }
}
