//! Error types for the session layer.

use gachalink_protocol::{InboundKind, ProtocolError};
use gachalink_transport::TransportError;

use crate::ConnectionState;

/// Errors from the connection state machine.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// A send was attempted while the connection was not `Open`.
    ///
    /// Nothing is queued or retried; the caller decides what to do.
    #[error("not connected (connection is {0})")]
    NotConnected(ConnectionState),

    /// The link refused the data, typically because it just died. The
    /// matching disconnect notification follows on the next tick.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A message that reached the dispatcher but could not be delivered.
///
/// `kind` is `None` when the envelope itself was unreadable, and set when
/// the envelope was fine but its payload was not. Either way the message
/// is dropped and the next one is processed normally.
#[derive(Debug, thiserror::Error)]
#[error("dropped {} message: {source}", .kind.map_or("unreadable", InboundKind::as_str))]
pub struct DispatchError {
    pub kind: Option<InboundKind>,
    #[source]
    pub source: ProtocolError,
}
