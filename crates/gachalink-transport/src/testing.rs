//! Scripted in-memory connector for tests.
//!
//! [`mock_link`] returns a [`MockConnector`] to hand to the code under
//! test and a [`MockServer`] the test keeps to play the server's part:
//! accepting the handshake, pushing messages, closing, failing, and
//! inspecting what the client sent.
//!
//! Everything is single-threaded and deterministic. Events land in the
//! client's inbound queue immediately and are observed on its next drain.
//!
//! ```
//! use gachalink_transport::testing::mock_link;
//! use gachalink_transport::{ConnectionId, Connector, InboundQueue, LinkEvent};
//!
//! let mut queue = InboundQueue::new();
//! let (mut connector, server) = mock_link();
//!
//! let _link = connector
//!     .open("ws://test", ConnectionId::next(), queue.sender())
//!     .unwrap();
//! server.accept();
//! server.push_text(r#"{"type":"pong"}"#);
//!
//! let mut seen = Vec::new();
//! queue.drain_all(|item| seen.push(item.event));
//! assert!(matches!(seen[0], LinkEvent::Opened));
//! assert!(matches!(seen[1], LinkEvent::Message(_)));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use crate::{ConnectionId, Connector, Inbound, InboundSender, Link, LinkEvent, TransportError};

/// One call to [`Connector::open`].
struct Attempt {
    id: ConnectionId,
    url: String,
    events: InboundSender<Inbound>,
    sent: Vec<Vec<u8>>,
    close_requested: bool,
    dead: bool,
}

#[derive(Default)]
struct MockState {
    attempts: Vec<Attempt>,
    refuse_next: Option<String>,
    hold_closes: bool,
}

type Shared = Rc<RefCell<MockState>>;

/// Creates a connected connector/server pair.
pub fn mock_link() -> (MockConnector, MockServer) {
    let shared = Shared::default();
    (
        MockConnector {
            shared: Rc::clone(&shared),
        },
        MockServer { shared },
    )
}

/// A [`Connector`] whose links are driven by a [`MockServer`].
pub struct MockConnector {
    shared: Shared,
}

impl Connector for MockConnector {
    type Link = MockLink;

    fn open(
        &mut self,
        url: &str,
        id: ConnectionId,
        events: InboundSender<Inbound>,
    ) -> Result<MockLink, TransportError> {
        let mut state = self.shared.borrow_mut();
        if let Some(reason) = state.refuse_next.take() {
            return Err(TransportError::Unavailable(reason));
        }
        state.attempts.push(Attempt {
            id,
            url: url.to_owned(),
            events,
            sent: Vec::new(),
            close_requested: false,
            dead: false,
        });
        Ok(MockLink {
            id,
            shared: Rc::clone(&self.shared),
        })
    }
}

/// Link handle returned by [`MockConnector`].
pub struct MockLink {
    id: ConnectionId,
    shared: Shared,
}

impl Link for MockLink {
    fn send(&self, data: Vec<u8>) -> Result<(), TransportError> {
        let mut state = self.shared.borrow_mut();
        let attempt = state
            .attempts
            .iter_mut()
            .find(|a| a.id == self.id)
            .ok_or_else(|| TransportError::ConnectionClosed("unknown link".into()))?;
        if attempt.dead {
            return Err(TransportError::ConnectionClosed("link task ended".into()));
        }
        attempt.sent.push(data);
        Ok(())
    }

    fn close(&self) {
        let mut state = self.shared.borrow_mut();
        let hold = state.hold_closes;
        if let Some(attempt) = state.attempts.iter_mut().find(|a| a.id == self.id) {
            attempt.close_requested = true;
            if !hold && !attempt.dead {
                attempt.dead = true;
                attempt
                    .events
                    .enqueue(Inbound::new(self.id, LinkEvent::Closed(None)));
            }
        }
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// The test's side of a mocked link. Every method acts on the most
/// recent connection attempt.
pub struct MockServer {
    shared: Shared,
}

impl MockServer {
    fn with_last<R>(&self, f: impl FnOnce(&mut Attempt) -> R) -> Option<R> {
        self.shared.borrow_mut().attempts.last_mut().map(f)
    }

    fn emit(&self, event: LinkEvent) {
        self.with_last(|a| a.events.enqueue(Inbound::new(a.id, event)));
    }

    /// Completes the handshake.
    pub fn accept(&self) {
        self.emit(LinkEvent::Opened);
    }

    /// Delivers one message to the client.
    pub fn push(&self, bytes: Vec<u8>) {
        self.emit(LinkEvent::Message(bytes));
    }

    /// Delivers one text message to the client.
    pub fn push_text(&self, text: &str) {
        self.push(text.as_bytes().to_vec());
    }

    /// Closes the link from the server side.
    pub fn close_from_server(&self, reason: Option<&str>) {
        self.with_last(|a| a.dead = true);
        self.emit(LinkEvent::Closed(reason.map(str::to_owned)));
    }

    /// Fails the link with a receive error.
    pub fn fail(&self, message: &str) {
        self.with_last(|a| a.dead = true);
        let error = std::io::Error::new(std::io::ErrorKind::ConnectionReset, message.to_owned());
        self.emit(LinkEvent::Failed(TransportError::ReceiveFailed(error)));
    }

    /// Makes the link reject further sends without reporting anything,
    /// like a link task that died with its close event still in flight.
    pub fn kill_link(&self) {
        self.with_last(|a| a.dead = true);
    }

    /// Makes the next [`Connector::open`] fail synchronously.
    pub fn refuse_next_open(&self, reason: &str) {
        self.shared.borrow_mut().refuse_next = Some(reason.to_owned());
    }

    /// Stops links from confirming client-initiated closes on their own.
    /// Use [`complete_close`](Self::complete_close) to confirm.
    pub fn hold_closes(&self) {
        self.shared.borrow_mut().hold_closes = true;
    }

    /// Confirms a held close.
    pub fn complete_close(&self) {
        self.with_last(|a| a.dead = true);
        self.emit(LinkEvent::Closed(None));
    }

    /// Number of connection attempts so far.
    pub fn attempts(&self) -> usize {
        self.shared.borrow().attempts.len()
    }

    /// URL of the latest attempt.
    pub fn last_url(&self) -> Option<String> {
        self.shared.borrow().attempts.last().map(|a| a.url.clone())
    }

    /// Whether the client asked the latest link to close.
    pub fn close_requested(&self) -> bool {
        self.shared
            .borrow()
            .attempts
            .last()
            .is_some_and(|a| a.close_requested)
    }

    /// Everything the client sent on the latest link, in order.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.shared
            .borrow()
            .attempts
            .last()
            .map(|a| a.sent.clone())
            .unwrap_or_default()
    }

    /// Like [`sent`](Self::sent), as text.
    pub fn sent_text(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|b| String::from_utf8_lossy(&b).into_owned())
            .collect()
    }

    /// Forgets what was sent so far on the latest link.
    pub fn clear_sent(&self) {
        self.with_last(|a| a.sent.clear());
    }
}
