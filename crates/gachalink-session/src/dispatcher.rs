//! Typed dispatch of inbound server messages.
//!
//! The [`EventDispatcher`] turns raw message bytes into a [`ServerEvent`]
//! and hands it to every callback subscribed to that message type.
//!
//! ```text
//! bytes ──decode_envelope──▶ Envelope ──InboundKind::from_wire──▶ kind
//!       ──decode_payload──▶ ServerEvent ──▶ subscribers[kind]
//! ```
//!
//! Failures are isolated per message: a bad envelope or payload is
//! reported as a [`DispatchError`] and nothing is delivered, but the
//! dispatcher is ready for the next message.

use std::collections::HashMap;
use std::fmt;

use gachalink_protocol::{
    Codec, Envelope, InboundKind, Inventory, JsonCodec, PoolInfo, ProtocolError,
    PullResult, UserInfo,
};

use crate::DispatchError;

/// Shown when the server sends an `error` envelope without an error text.
pub const UNSPECIFIED_SERVER_ERROR: &str = "server reported an unspecified error";

/// A decoded server message.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Outcome of a pull. Always validated: characters and `is_new` have
    /// the same length.
    PullResult(PullResult),
    /// Fresh account snapshot.
    UserInfo(UserInfo),
    /// Owned characters.
    Inventory(Inventory),
    /// Pool contents and rates.
    PoolInfo(PoolInfo),
    /// The balance changed server-side. Carries no payload; the client
    /// reacts by requesting a fresh [`UserInfo`].
    CurrencyUpdate,
    /// The server rejected something. Carries the server's text verbatim.
    Error(String),
    /// Reply to a keep-alive ping.
    Pong,
}

impl ServerEvent {
    /// The message type this event was decoded from.
    pub fn kind(&self) -> InboundKind {
        match self {
            Self::PullResult(_) => InboundKind::GachaResult,
            Self::UserInfo(_) => InboundKind::UserInfo,
            Self::Inventory(_) => InboundKind::Inventory,
            Self::PoolInfo(_) => InboundKind::PoolInfo,
            Self::CurrencyUpdate => InboundKind::CurrencyUpdate,
            Self::Error(_) => InboundKind::Error,
            Self::Pong => InboundKind::Pong,
        }
    }

    /// Whether subscribers ever see this kind of event.
    ///
    /// `currency_update` and `pong` are handled by the client itself and
    /// never reach application callbacks.
    pub fn is_deliverable(&self) -> bool {
        !matches!(self, Self::CurrencyUpdate | Self::Pong)
    }
}

/// Handle returned by [`EventDispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

type Callback = Box<dyn FnMut(&ServerEvent)>;

/// Decodes inbound messages and fans them out to subscribers.
///
/// Callbacks are plain `FnMut` closures and run on the caller's thread,
/// inside [`dispatch`](Self::dispatch). They are kept in subscription
/// order and each one runs exactly once per matching event.
pub struct EventDispatcher<C: Codec = JsonCodec> {
    codec: C,
    subscribers: HashMap<InboundKind, Vec<(SubscriptionId, Callback)>>,
    next_id: u64,
}

impl Default for EventDispatcher<JsonCodec> {
    fn default() -> Self {
        Self::new(JsonCodec)
    }
}

impl<C: Codec> EventDispatcher<C> {
    /// Creates a dispatcher with no subscribers.
    pub fn new(codec: C) -> Self {
        Self {
            codec,
            subscribers: HashMap::new(),
            next_id: 1,
        }
    }

    /// Registers `callback` for every event of `kind`.
    ///
    /// Subscribing to `CurrencyUpdate` or `Pong` is allowed but the
    /// callback never runs.
    pub fn subscribe(
        &mut self,
        kind: InboundKind,
        callback: impl FnMut(&ServerEvent) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers
            .entry(kind)
            .or_default()
            .push((id, Box::new(callback)));
        tracing::debug!(%id, %kind, "subscribed");
        id
    }

    /// Removes the callback registered under `id`.
    ///
    /// Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for callbacks in self.subscribers.values_mut() {
            if let Some(pos) = callbacks.iter().position(|(sub, _)| *sub == id) {
                callbacks.remove(pos);
                tracing::debug!(%id, "unsubscribed");
                return true;
            }
        }
        false
    }

    /// Number of callbacks registered for `kind`.
    pub fn subscriber_count(&self, kind: InboundKind) -> usize {
        self.subscribers.get(&kind).map_or(0, Vec::len)
    }

    /// Decodes one message without delivering it.
    ///
    /// Returns `Ok(None)` for message types this client does not know.
    ///
    /// # Errors
    /// Returns a [`DispatchError`] if the envelope is unreadable, or if
    /// the payload is missing or malformed for its type.
    pub fn decode(&self, bytes: &[u8]) -> Result<Option<ServerEvent>, DispatchError> {
        let envelope = self
            .codec
            .decode_envelope(bytes)
            .map_err(|source| DispatchError { kind: None, source })?;

        let Some(kind) = InboundKind::from_wire(&envelope.kind) else {
            tracing::warn!(kind = %envelope.kind, "ignoring unknown message type");
            return Ok(None);
        };

        self.decode_kind(kind, &envelope)
            .map(Some)
            .map_err(|source| DispatchError {
                kind: Some(kind),
                source,
            })
    }

    fn decode_kind(
        &self,
        kind: InboundKind,
        envelope: &Envelope,
    ) -> Result<ServerEvent, ProtocolError> {
        Ok(match kind {
            InboundKind::GachaResult => {
                let result: PullResult = self.codec.decode_payload(envelope)?;
                result.validate()?;
                ServerEvent::PullResult(result)
            }
            InboundKind::UserInfo => {
                ServerEvent::UserInfo(self.codec.decode_payload::<UserInfo>(envelope)?)
            }
            InboundKind::Inventory => {
                ServerEvent::Inventory(self.codec.decode_payload::<Inventory>(envelope)?)
            }
            InboundKind::PoolInfo => {
                ServerEvent::PoolInfo(self.codec.decode_payload::<PoolInfo>(envelope)?)
            }
            InboundKind::CurrencyUpdate => ServerEvent::CurrencyUpdate,
            InboundKind::Error => ServerEvent::Error(
                envelope
                    .error
                    .clone()
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| UNSPECIFIED_SERVER_ERROR.to_owned()),
            ),
            InboundKind::Pong => ServerEvent::Pong,
        })
    }

    /// Decodes one message and delivers it to its subscribers.
    ///
    /// The decoded event is returned as well, so the owner can react to
    /// it (admission bookkeeping, playback) after the callbacks ran.
    ///
    /// # Errors
    /// Same as [`decode`](Self::decode). Nothing is delivered on error.
    pub fn dispatch(&mut self, bytes: &[u8]) -> Result<Option<ServerEvent>, DispatchError> {
        let event = self.decode(bytes)?;
        if let Some(event) = &event {
            self.deliver(event);
        }
        Ok(event)
    }

    /// Runs the callbacks subscribed to `event`'s kind.
    pub fn deliver(&mut self, event: &ServerEvent) {
        let kind = event.kind();
        if !event.is_deliverable() {
            tracing::debug!(%kind, "handled internally, not delivered");
            return;
        }
        let Some(callbacks) = self.subscribers.get_mut(&kind) else {
            tracing::debug!(%kind, "no subscribers");
            return;
        };
        for (_, callback) in callbacks.iter_mut() {
            callback(event);
        }
    }
}

impl<C: Codec> fmt::Debug for EventDispatcher<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<_, _> = self
            .subscribers
            .iter()
            .map(|(kind, subs)| (kind.as_str(), subs.len()))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("subscribers", &counts)
            .finish_non_exhaustive()
    }
}
