//! Drives a connection and dispatcher together the way the client tick
//! does, over a scripted link.

use std::cell::RefCell;
use std::rc::Rc;

use gachalink_protocol::{Codec, InboundKind, JsonCodec, OutboundKind, UserInfo};
use gachalink_session::{
    Connection, ConnectionEvent, ConnectionState, DisconnectReason, EventDispatcher,
    ServerEvent,
};
use gachalink_transport::testing::{MockConnector, MockServer, mock_link};
use gachalink_transport::{Inbound, InboundQueue};

struct Harness {
    connection: Connection<MockConnector>,
    dispatcher: EventDispatcher,
    server: MockServer,
    queue: InboundQueue<Inbound>,
}

impl Harness {
    fn new() -> Self {
        let queue = InboundQueue::new();
        let (connector, server) = mock_link();
        Self {
            connection: Connection::new(connector, "ws://localhost:8080/ws", queue.sender()),
            dispatcher: EventDispatcher::default(),
            server,
            queue,
        }
    }

    /// One tick: lifecycle notifications plus every decoded message.
    fn tick(&mut self) -> (Vec<ConnectionEvent>, Vec<ServerEvent>) {
        let mut lifecycle = Vec::new();
        let mut messages = Vec::new();
        let Self {
            connection,
            dispatcher,
            queue,
            ..
        } = self;
        queue.drain_all(|item| match connection.handle(item) {
            Some(ConnectionEvent::Message(bytes)) => {
                if let Ok(Some(event)) = dispatcher.dispatch(&bytes) {
                    messages.push(event);
                }
            }
            Some(other) => lifecycle.push(other),
            None => {}
        });
        (lifecycle, messages)
    }
}

fn user_info(currency: u32) -> Vec<u8> {
    let info = UserInfo {
        username: "traveler".into(),
        currency,
        pity_count: 0,
    };
    JsonCodec
        .encode_message(InboundKind::UserInfo.as_str(), Some(&info))
        .unwrap()
}

#[test]
fn test_messages_keep_their_order_relative_to_lifecycle_events() {
    let mut h = Harness::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    h.dispatcher.subscribe(InboundKind::UserInfo, move |event| {
        if let ServerEvent::UserInfo(info) = event {
            sink.borrow_mut().push(info.currency);
        }
    });

    h.connection.connect();
    h.server.accept();
    h.server.push(user_info(100));
    h.server.push(b"garbage".to_vec());
    h.server.push(user_info(200));
    h.server.close_from_server(Some("restart"));

    let (lifecycle, messages) = h.tick();
    assert_eq!(
        lifecycle,
        vec![
            ConnectionEvent::Connected,
            ConnectionEvent::Disconnected(DisconnectReason::ClosedByPeer(Some("restart".into()))),
        ]
    );
    assert_eq!(messages.len(), 2);
    assert_eq!(*seen.borrow(), vec![100, 200]);
    assert_eq!(h.connection.state(), ConnectionState::Disconnected);
}

#[test]
fn test_nothing_is_processed_until_the_tick() {
    let mut h = Harness::new();
    h.connection.connect();
    h.server.accept();
    h.server.push(user_info(1));

    assert_eq!(h.connection.state(), ConnectionState::Connecting);
    assert_eq!(h.queue.len(), 2);

    h.tick();
    assert!(h.connection.is_open());
    assert!(h.queue.is_empty());
}

#[test]
fn test_outbound_requests_go_out_as_envelopes() {
    let mut h = Harness::new();
    h.connection.connect();
    h.server.accept();
    h.tick();

    let bytes = JsonCodec.encode_request(OutboundKind::GetUserInfo).unwrap();
    h.connection.send(bytes).unwrap();

    assert_eq!(h.server.sent_text(), vec![r#"{"type":"get_user_info"}"#.to_owned()]);
}

#[test]
fn test_manual_reconnect_after_peer_close() {
    let mut h = Harness::new();
    h.connection.connect();
    h.server.accept();
    h.tick();
    h.server.close_from_server(None);
    h.tick();
    assert_eq!(h.connection.state(), ConnectionState::Disconnected);
    assert_eq!(h.server.attempts(), 1);

    h.connection.connect();
    h.server.accept();
    let (lifecycle, _) = h.tick();
    assert_eq!(lifecycle, vec![ConnectionEvent::Connected]);
    assert_eq!(h.server.attempts(), 2);
}
