use gachalink_protocol::{Character, Inventory, PoolInfo, PullResult, UserInfo};
use gachalink_reveal::RevealCue;
use gachalink_session::ConnectionState;

/// Receives everything a UI needs to render the client.
///
/// Every method has an empty default, so an implementation only writes
/// the ones it cares about. All calls happen inside
/// [`GachaClient::tick`](crate::GachaClient::tick) or a client command,
/// on the caller's thread.
pub trait ClientObserver {
    /// The connection moved to `state`.
    fn on_connection_changed(&mut self, state: ConnectionState) {
        let _ = state;
    }

    /// A pull result arrived and is about to be revealed. A result that
    /// cannot be played is reported through [`on_error`](Self::on_error)
    /// instead.
    fn on_pull_result(&mut self, result: &PullResult) {
        let _ = result;
    }

    /// A fresh account snapshot arrived.
    fn on_user_info(&mut self, info: &UserInfo) {
        let _ = info;
    }

    /// Something went wrong that the player should hear about: a server
    /// error, a connection lost while waiting for a result, or a result
    /// that arrived while another reveal was still running.
    fn on_error(&mut self, message: &str) {
        let _ = message;
    }

    /// `characters[index]` of the current result is now on screen with
    /// its authoritative rarity.
    fn on_playback_step(&mut self, index: usize, character: &Character) {
        let _ = (index, character);
    }

    /// The reveal finished, played through or skipped.
    fn on_playback_complete(&mut self) {}

    /// A purely presentational cue (sound, flash).
    fn on_reveal_cue(&mut self, cue: &RevealCue) {
        let _ = cue;
    }

    fn on_inventory(&mut self, inventory: &Inventory) {
        let _ = inventory;
    }

    fn on_pool_info(&mut self, pool: &PoolInfo) {
        let _ = pool;
    }
}

/// Ignores everything.
impl ClientObserver for () {}
