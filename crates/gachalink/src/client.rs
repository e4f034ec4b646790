//! `GachaClient`: the tick-driven client facade.
//!
//! This ties all the layers together:
//!
//! ```text
//! commands ──▶ PullController ──▶ Codec ──▶ Connection::send ──▶ link
//!
//! link ──▶ InboundQueue ══ tick(dt) ══▶ Connection::handle
//!                                          │
//!                                          ├─ lifecycle ──▶ observer
//!                                          └─ message ──▶ EventDispatcher
//!                                                            │
//!                                   ┌────────────────────────┤
//!                                   ▼                        ▼
//!                            PullController           RevealPlayback ──▶ observer
//! ```
//!
//! All client state lives on the thread that calls [`GachaClient::tick`].
//! The link may run on a runtime worker; it only ever touches the
//! inbound queue.

use std::time::Duration;

use gachalink_protocol::{
    AddCurrencyRequest, Codec, InboundKind, JsonCodec, OutboundKind, PullKind, PullResult,
    UserInfo,
};
use gachalink_reveal::{Frame, PlaybackEvent, RevealPlayback};
use gachalink_session::{
    Connection, ConnectionEvent, ConnectionState, DispatchError, EventDispatcher, ServerEvent,
    SubscriptionId,
};
use gachalink_transport::{Connector, Inbound, InboundQueue, WebSocketConnector};
use tracing::{debug, info, warn};

use crate::{ClientConfig, ClientObserver, GachaError, PullController};

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for configuring a [`GachaClient`].
///
/// # Example
///
/// ```rust,no_run
/// use gachalink::prelude::*;
///
/// let client = GachaClient::builder()
///     .url("ws://localhost:8080/ws")
///     .build();
/// assert_eq!(client.state(), ConnectionState::Disconnected);
/// ```
pub struct GachaClientBuilder<O = (), C = WebSocketConnector> {
    config: ClientConfig,
    observer: O,
    connector: C,
}

impl GachaClientBuilder {
    /// Creates a builder with the default config, no observer and the
    /// WebSocket connector.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            observer: (),
            connector: WebSocketConnector,
        }
    }
}

impl Default for GachaClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ClientObserver, C: Connector> GachaClientBuilder<O, C> {
    /// Replaces the whole config.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the server URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.url = url.into();
        self
    }

    /// Sets the observer that receives UI notifications.
    pub fn observer<O2: ClientObserver>(self, observer: O2) -> GachaClientBuilder<O2, C> {
        GachaClientBuilder {
            config: self.config,
            observer,
            connector: self.connector,
        }
    }

    /// Sets how links to the server are opened.
    pub fn connector<C2: Connector>(self, connector: C2) -> GachaClientBuilder<O, C2> {
        GachaClientBuilder {
            config: self.config,
            observer: self.observer,
            connector,
        }
    }

    /// Builds a disconnected client. Call
    /// [`connect`](GachaClient::connect) to start.
    pub fn build(self) -> GachaClient<O, C> {
        let queue = InboundQueue::new();
        let connection = Connection::new(self.connector, self.config.url.clone(), queue.sender());
        GachaClient {
            admission: PullController::new(self.config.costs),
            playback: RevealPlayback::new(self.config.reveal.clone()),
            ping_interval: self.config.ping_interval(),
            since_ping: Duration::ZERO,
            dispatcher: EventDispatcher::new(JsonCodec),
            codec: JsonCodec,
            observer: self.observer,
            config: self.config,
            queue,
            connection,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A gacha pull client.
///
/// Owns the connection, the admission controller, the dispatcher and the
/// reveal playback, and advances them all from [`tick`](Self::tick).
/// Commands (`request_pull`, `connect`, ...) take effect immediately;
/// their outcomes are observed on later ticks.
pub struct GachaClient<O = (), C: Connector = WebSocketConnector> {
    config: ClientConfig,
    codec: JsonCodec,
    queue: InboundQueue<Inbound>,
    connection: Connection<C>,
    dispatcher: EventDispatcher,
    admission: PullController,
    playback: RevealPlayback,
    observer: O,
    ping_interval: Option<Duration>,
    since_ping: Duration,
}

impl GachaClient {
    /// Creates a new builder.
    pub fn builder() -> GachaClientBuilder {
        GachaClientBuilder::new()
    }
}

impl<O: ClientObserver, C: Connector> GachaClient<O, C> {
    // -- commands -----------------------------------------------------------

    /// Starts connecting. A no-op unless disconnected.
    pub fn connect(&mut self) {
        let before = self.connection.state();
        self.connection.connect();
        self.notify_if_changed(before);
    }

    /// Starts a graceful close. A no-op when already disconnected or
    /// closing.
    pub fn disconnect(&mut self) {
        let before = self.connection.state();
        self.connection.disconnect();
        self.notify_if_changed(before);
    }

    /// Requests a pull of `kind`.
    ///
    /// On success the request is on the wire and the pull is in flight
    /// until its reveal completes, the server answers with an error, or
    /// the connection drops.
    ///
    /// # Errors
    /// - [`GachaError::Pull`] if admission refused it. Nothing was sent.
    /// - [`GachaError::Connection`] or [`GachaError::Protocol`] if the
    ///   send itself failed. The pull is not in flight.
    pub fn request_pull(&mut self, kind: PullKind) -> Result<(), GachaError> {
        let cost = match self.admission.check(kind, self.connection.state()) {
            Ok(cost) => cost,
            Err(rejection) => {
                info!(%kind, %rejection, "pull refused");
                return Err(rejection.into());
            }
        };

        self.admission.begin(kind);
        if let Err(e) = self.send_request(kind.outbound()) {
            self.admission.finish();
            warn!(%kind, error = %e, "pull request could not be sent");
            return Err(e);
        }
        info!(%kind, cost, "pull requested");
        Ok(())
    }

    /// Whether a pull of `kind` would be admitted right now.
    pub fn can_pull(&self, kind: PullKind) -> bool {
        self.admission.can_pull(kind, self.connection.state())
    }

    /// Asks the running reveal to jump to the end. Ignored when nothing
    /// is playing.
    pub fn request_skip(&mut self) {
        self.playback.request_skip();
    }

    /// Asks the server for a fresh [`UserInfo`].
    ///
    /// # Errors
    /// Fails if the connection is not open.
    pub fn refresh_user_info(&mut self) -> Result<(), GachaError> {
        self.send_request(OutboundKind::GetUserInfo)
    }

    /// Asks the server for the player's inventory.
    ///
    /// # Errors
    /// Fails if the connection is not open.
    pub fn request_inventory(&mut self) -> Result<(), GachaError> {
        self.send_request(OutboundKind::GetInventory)
    }

    /// Asks the server for the pool contents and rates.
    ///
    /// # Errors
    /// Fails if the connection is not open.
    pub fn request_pool_info(&mut self) -> Result<(), GachaError> {
        self.send_request(OutboundKind::GetPool)
    }

    /// Grants currency. Only test servers honor this.
    ///
    /// # Errors
    /// Fails if the connection is not open.
    pub fn add_currency(&mut self, amount: u32) -> Result<(), GachaError> {
        let bytes = self
            .codec
            .encode_request_with(OutboundKind::AddCurrency, &AddCurrencyRequest { amount })?;
        self.connection.send(bytes)?;
        debug!(amount, "add_currency sent");
        Ok(())
    }

    /// Sends a keep-alive ping.
    ///
    /// # Errors
    /// Fails if the connection is not open.
    pub fn ping(&mut self) -> Result<(), GachaError> {
        self.send_request(OutboundKind::Ping)
    }

    /// Registers a callback for every delivered event of `kind`.
    ///
    /// Callbacks run inside [`tick`](Self::tick), before the observer
    /// hears about the same event.
    pub fn subscribe(
        &mut self,
        kind: InboundKind,
        callback: impl FnMut(&ServerEvent) + 'static,
    ) -> SubscriptionId {
        self.dispatcher.subscribe(kind, callback)
    }

    /// Removes a callback. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.dispatcher.unsubscribe(id)
    }

    // -- tick ---------------------------------------------------------------

    /// Advances the client by `dt`.
    ///
    /// In order:
    /// 1. the running reveal moves forward by `dt`;
    /// 2. everything the link delivered since the last tick is processed;
    /// 3. the keep-alive ping is sent if due.
    pub fn tick(&mut self, dt: Duration) {
        let events = self.playback.advance(dt);
        self.apply_playback(events);

        let mut inbound = Vec::new();
        self.queue.drain_all(|item| inbound.push(item));
        for item in inbound {
            self.handle_inbound(item);
        }

        self.keep_alive(dt);
    }

    // -- accessors ----------------------------------------------------------

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_open()
    }

    /// The last account snapshot the server pushed.
    pub fn user_info(&self) -> Option<&UserInfo> {
        self.admission.user_info()
    }

    pub fn is_pull_in_flight(&self) -> bool {
        self.admission.is_in_flight()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    /// Where the running reveal is, for animation.
    pub fn frame(&self) -> Option<Frame> {
        self.playback.frame()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    // -- internals ----------------------------------------------------------

    fn send_request(&mut self, kind: OutboundKind) -> Result<(), GachaError> {
        let bytes = self.codec.encode_request(kind)?;
        self.connection.send(bytes)?;
        debug!(%kind, "request sent");
        Ok(())
    }

    fn notify_if_changed(&mut self, before: ConnectionState) {
        let now = self.connection.state();
        if now != before {
            self.observer.on_connection_changed(now);
        }
    }

    fn handle_inbound(&mut self, item: Inbound) {
        match self.connection.handle(item) {
            None => {}
            Some(ConnectionEvent::Connected) => {
                self.since_ping = Duration::ZERO;
                self.observer.on_connection_changed(ConnectionState::Open);
                if let Err(e) = self.refresh_user_info() {
                    warn!(error = %e, "could not request user info after connecting");
                }
            }
            Some(ConnectionEvent::Disconnected(reason)) => {
                self.observer
                    .on_connection_changed(ConnectionState::Disconnected);
                if self.admission.is_in_flight() && !self.playback.is_playing() {
                    let pull = self.admission.finish();
                    warn!(?pull, %reason, "connection lost with a pull in flight");
                    self.observer
                        .on_error(&format!("connection lost: {reason}"));
                }
            }
            Some(ConnectionEvent::Message(bytes)) => self.handle_message(&bytes),
        }
    }

    fn handle_message(&mut self, bytes: &[u8]) {
        match self.dispatcher.dispatch(bytes) {
            Ok(Some(event)) => self.apply_server_event(event),
            Ok(None) => {}
            Err(e) => self.handle_dispatch_error(e),
        }
    }

    fn handle_dispatch_error(&mut self, error: DispatchError) {
        warn!(error = %error, "dropping inbound message");
        // An unreadable result is still the answer to the pending pull.
        if error.kind == Some(InboundKind::GachaResult)
            && self.admission.is_in_flight()
            && !self.playback.is_playing()
        {
            self.admission.finish();
            self.observer.on_error(&error.to_string());
        }
    }

    fn apply_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::PullResult(result) => self.start_reveal(result),
            ServerEvent::UserInfo(info) => {
                debug!(currency = info.currency, pity = info.pity_count, "user info updated");
                self.observer.on_user_info(&info);
                self.admission.update_user_info(info);
            }
            ServerEvent::Inventory(inventory) => self.observer.on_inventory(&inventory),
            ServerEvent::PoolInfo(pool) => self.observer.on_pool_info(&pool),
            ServerEvent::CurrencyUpdate => {
                if let Err(e) = self.refresh_user_info() {
                    warn!(error = %e, "could not refresh user info after currency update");
                }
            }
            ServerEvent::Error(message) => {
                warn!(%message, "server error");
                if !self.playback.is_playing() {
                    self.admission.finish();
                }
                self.observer.on_error(&message);
            }
            ServerEvent::Pong => debug!("pong"),
        }
    }

    fn start_reveal(&mut self, result: PullResult) {
        if !self.admission.is_in_flight() {
            debug!(count = result.len(), "result arrived without a pending pull");
        }
        match self.playback.start(&result) {
            Ok(events) => {
                self.admission.reveal_started();
                self.observer.on_pull_result(&result);
                self.apply_playback(events);
            }
            Err(e) => {
                warn!(error = %e, count = result.len(), "result not played");
                self.observer
                    .on_error(&format!("pull result not shown: {e}"));
            }
        }
    }

    fn apply_playback(&mut self, events: Vec<PlaybackEvent>) {
        for event in events {
            match event {
                PlaybackEvent::Cue(cue) => self.observer.on_reveal_cue(&cue),
                PlaybackEvent::Step {
                    index, character, ..
                } => self.observer.on_playback_step(index, &character),
                PlaybackEvent::Complete { .. } => self.finish_reveal(),
            }
        }
    }

    fn finish_reveal(&mut self) {
        self.admission.finish();
        self.observer.on_playback_complete();
        if self.connection.is_open() {
            if let Err(e) = self.refresh_user_info() {
                warn!(error = %e, "could not refresh user info after reveal");
            }
        } else {
            info!(state = %self.connection.state(), "reveal complete, not connected, skipping user info refresh");
        }
    }

    fn keep_alive(&mut self, dt: Duration) {
        let Some(interval) = self.ping_interval else {
            return;
        };
        if !self.connection.is_open() {
            return;
        }
        self.since_ping = self.since_ping.saturating_add(dt);
        if self.since_ping >= interval {
            self.since_ping = Duration::ZERO;
            if let Err(e) = self.ping() {
                warn!(error = %e, "keep-alive ping failed");
            }
        }
    }
}
