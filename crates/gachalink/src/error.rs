//! Unified error type for the gachalink client.

use gachalink_protocol::ProtocolError;
use gachalink_session::{ConnectionError, ConnectionState};

/// Why a pull request was not sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PullRejection {
    /// A pull is already waiting for its result or still being revealed.
    #[error("a pull is already in progress")]
    AlreadyInFlight,

    /// The connection is not open.
    #[error("not connected (connection is {0})")]
    NotConnected(ConnectionState),

    /// The last balance the server reported does not cover the cost.
    /// `available` is `None` when no balance has been reported yet.
    #[error("insufficient currency: need {required}, have {}", balance(.available))]
    InsufficientCurrency {
        required: u32,
        available: Option<u32>,
    },
}

impl PullRejection {
    /// Whether this is just the UI being ahead of the client state, as
    /// opposed to a condition the player has to act on.
    ///
    /// `AlreadyInFlight` and `InsufficientCurrency` are advisory: a
    /// well-behaved UI has its pull buttons disabled in those states.
    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            Self::AlreadyInFlight | Self::InsufficientCurrency { .. }
        )
    }
}

fn balance(available: &Option<u32>) -> String {
    available.map_or_else(|| "unknown".to_owned(), |a| a.to_string())
}

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `gachalink` crate you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum GachaError {
    /// A pull request was refused before anything was sent.
    #[error(transparent)]
    Pull(#[from] PullRejection),

    /// A send was refused by the connection.
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A message could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl GachaError {
    /// The pull rejection inside, if this is one.
    pub fn as_rejection(&self) -> Option<&PullRejection> {
        match self {
            Self::Pull(rejection) => Some(rejection),
            _ => None,
        }
    }
}
