//! WebSocket link implementation using `tokio-tungstenite`.
//!
//! Each link is one Tokio task that owns the socket. The [`WebSocketLink`]
//! handle talks to it over an unbounded channel, so `send` and `close`
//! return immediately; everything the task sees goes into the inbound
//! queue.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::{
    ConnectionId, Connector, Inbound, InboundSender, Link, LinkEvent,
    TransportError,
};

/// How long a client-initiated close waits for the server's close frame.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

/// A [`Connector`] that dials `ws://` / `wss://` URLs.
///
/// Links are spawned on the Tokio runtime that is current when
/// [`Connector::open`] is called.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl Connector for WebSocketConnector {
    type Link = WebSocketLink;

    fn open(
        &mut self,
        url: &str,
        id: ConnectionId,
        events: InboundSender<Inbound>,
    ) -> Result<Self::Link, TransportError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        let (commands, rx) = mpsc::unbounded_channel();
        runtime.spawn(run_link(url.to_owned(), id, events, rx));
        tracing::debug!(%id, url, "WebSocket link spawned");

        Ok(WebSocketLink { id, commands })
    }
}

enum Command {
    Send(Vec<u8>),
    Close,
}

/// Handle to a running WebSocket link task.
///
/// Dropping the handle closes the link.
pub struct WebSocketLink {
    id: ConnectionId,
    commands: mpsc::UnboundedSender<Command>,
}

impl Link for WebSocketLink {
    fn send(&self, data: Vec<u8>) -> Result<(), TransportError> {
        self.commands.send(Command::Send(data)).map_err(|_| {
            TransportError::ConnectionClosed("link task has exited".into())
        })
    }

    fn close(&self) {
        // If the task is already gone there is nothing to close.
        let _ = self.commands.send(Command::Close);
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

/// The body of a link task: connect, then pump frames both ways until
/// either side closes.
async fn run_link(
    url: String,
    id: ConnectionId,
    events: InboundSender<Inbound>,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let emit = |event| events.enqueue(Inbound::new(id, event));

    let ws = match tokio_tungstenite::connect_async(url.as_str()).await {
        Ok((ws, _response)) => ws,
        Err(e) => {
            tracing::debug!(%id, error = %e, "WebSocket connect failed");
            emit(LinkEvent::Failed(TransportError::ConnectFailed(
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, e),
            )));
            return;
        }
    };
    tracing::info!(%id, url = %url, "WebSocket connected");
    emit(LinkEvent::Opened);

    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Send(data)) => {
                    if let Err(e) = sink.send(to_frame(data)).await {
                        emit(LinkEvent::Failed(TransportError::SendFailed(
                            std::io::Error::new(std::io::ErrorKind::BrokenPipe, e),
                        )));
                        return;
                    }
                }
                // `None`: the handle was dropped, which also means close.
                Some(Command::Close) | None => {
                    let _ = sink.close().await;
                    // Let the server's close frame come back so the close
                    // handshake completes, but don't wait forever for it.
                    let _ = tokio::time::timeout(CLOSE_TIMEOUT, async {
                        while let Some(Ok(_)) = stream.next().await {}
                    })
                    .await;
                    tracing::debug!(%id, "WebSocket closed by client");
                    emit(LinkEvent::Closed(None));
                    return;
                }
            },
            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    emit(LinkEvent::Message(text.as_bytes().to_vec()));
                }
                Some(Ok(Message::Binary(data))) => {
                    emit(LinkEvent::Message(data.into()));
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame.map(|f| f.reason.as_str().to_owned());
                    tracing::debug!(%id, ?reason, "WebSocket closed by server");
                    emit(LinkEvent::Closed(reason));
                    return;
                }
                None => {
                    emit(LinkEvent::Closed(None));
                    return;
                }
                Some(Ok(_)) => continue, // skip ping/pong/frame
                Some(Err(e)) => {
                    emit(LinkEvent::Failed(TransportError::ReceiveFailed(
                        std::io::Error::new(std::io::ErrorKind::ConnectionReset, e),
                    )));
                    return;
                }
            },
        }
    }
}

/// The server speaks JSON text frames; anything that isn't UTF-8 goes out
/// as binary rather than being mangled.
fn to_frame(data: Vec<u8>) -> Message {
    match String::from_utf8(data) {
        Ok(text) => Message::Text(text.into()),
        Err(e) => Message::Binary(e.into_bytes().into()),
    }
}
