//! Sequenced reveal playback for gachalink.
//!
//! Turns a [`PullResult`](gachalink_protocol::PullResult) into a timed
//! sequence of presentation events, one character at a time, with a
//! cooperative skip.
//!
//! # Tick-driven
//!
//! Nothing here waits on a timer. The owner passes the elapsed time to
//! [`RevealPlayback::advance`] on every frame and renders whatever events
//! come back:
//!
//! ```ignore
//! loop {
//!     let dt = clock.tick();
//!     for event in playback.advance(dt) {
//!         match event {
//!             PlaybackEvent::Cue(cue) => renderer.cue(cue),
//!             PlaybackEvent::Step { index, character, style, .. } => renderer.show(index, &character, style),
//!             PlaybackEvent::Complete { .. } => break,
//!         }
//!     }
//! }
//! ```
//!
//! # Authoritative rarity
//!
//! What is shown for index `i` is derived from `characters[i].rarity`
//! through [`RarityStyle::for_level`] and nothing else. There is no
//! randomness source in this crate.

mod config;
mod error;
mod playback;
mod style;

pub use config::RevealConfig;
pub use error::RevealError;
pub use playback::{Frame, Phase, PlaybackEvent, RevealCue, RevealPlayback};
pub use style::{RarityStyle, Rgb};
