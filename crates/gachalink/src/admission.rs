//! Pull admission: decides whether a pull request may be sent.
//!
//! The controller is the only owner of the in-flight flag and of the last
//! [`UserInfo`] the server pushed. It never predicts a balance locally;
//! every check runs against the last snapshot as received.
//!
//! A pull stays in flight from the moment it is sent until its reveal
//! completes. A reveal that starts after the request was already cleared
//! (by an unrelated server error, say) holds the flag on its own.

use gachalink_protocol::{PullKind, UserInfo};
use gachalink_session::ConnectionState;

use crate::{PullCosts, PullRejection};

/// Gates pull requests. At most one pull is in flight at a time.
#[derive(Debug, Default)]
pub struct PullController {
    costs: PullCosts,
    in_flight: Option<PullKind>,
    revealing: bool,
    user_info: Option<UserInfo>,
}

impl PullController {
    pub fn new(costs: PullCosts) -> Self {
        Self {
            costs,
            in_flight: None,
            revealing: false,
            user_info: None,
        }
    }

    /// Checks a pull of `kind` against the current state, in order:
    /// in-flight, connection, balance.
    ///
    /// Returns the cost on success. Does not change anything.
    ///
    /// # Errors
    /// The first [`PullRejection`] that applies.
    pub fn check(&self, kind: PullKind, state: ConnectionState) -> Result<u32, PullRejection> {
        if self.is_in_flight() {
            return Err(PullRejection::AlreadyInFlight);
        }
        if state != ConnectionState::Open {
            return Err(PullRejection::NotConnected(state));
        }
        let required = self.costs.cost(kind);
        match &self.user_info {
            Some(info) if info.currency >= required => Ok(required),
            other => Err(PullRejection::InsufficientCurrency {
                required,
                available: other.as_ref().map(|info| info.currency),
            }),
        }
    }

    /// Whether [`check`](Self::check) would pass.
    pub fn can_pull(&self, kind: PullKind, state: ConnectionState) -> bool {
        self.check(kind, state).is_ok()
    }

    /// Marks `kind` as sent.
    pub fn begin(&mut self, kind: PullKind) {
        self.in_flight = Some(kind);
    }

    /// Marks a reveal as running. Admission stays closed until
    /// [`finish`](Self::finish).
    pub fn reveal_started(&mut self) {
        self.revealing = true;
    }

    /// Clears the in-flight flag and any running reveal. Returns the
    /// request that was pending, if any.
    pub fn finish(&mut self) -> Option<PullKind> {
        self.revealing = false;
        self.in_flight.take()
    }

    pub fn in_flight(&self) -> Option<PullKind> {
        self.in_flight
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some() || self.revealing
    }

    /// Replaces the balance snapshot wholesale.
    pub fn update_user_info(&mut self, info: UserInfo) {
        self.user_info = Some(info);
    }

    pub fn user_info(&self) -> Option<&UserInfo> {
        self.user_info.as_ref()
    }

    pub fn costs(&self) -> &PullCosts {
        &self.costs
    }
}
