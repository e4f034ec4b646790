use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Timing of the reveal sequence, in seconds.
///
/// Every index plays the same phases:
///
/// ```text
/// PreReveal ─reveal_delay─▶ Flash ─flash_duration─▶ Reveal ─fade_in + text_scale─▶
///     Hold ─display_duration─▶ Pause ─between_pause─▶ (next index)
/// ```
///
/// The pause is skipped after the last index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    /// Wait between the pre-reveal cue and the flash. Default: 1.0.
    pub reveal_delay: f64,
    /// Length of the flash transition. Default: 0.3.
    pub flash_duration: f64,
    /// Card fade-in once the rarity is shown. Default: 0.5.
    pub fade_in_duration: f64,
    /// Rarity label scale-in, after the fade. Default: 0.5.
    pub text_scale_duration: f64,
    /// How long the finished card stays up. Default: 1.5.
    pub display_duration: f64,
    /// Gap between two characters. Default: 0.3.
    pub between_pause: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            reveal_delay: 1.0,
            flash_duration: 0.3,
            fade_in_duration: 0.5,
            text_scale_duration: 0.5,
            display_duration: 1.5,
            between_pause: 0.3,
        }
    }
}

impl RevealConfig {
    /// Longest any single phase may last.
    pub const MAX_PHASE_SECS: f64 = 30.0;

    /// A config where every phase takes zero time. A run plays out
    /// completely on the first advance.
    pub fn instant() -> Self {
        Self {
            reveal_delay: 0.0,
            flash_duration: 0.0,
            fade_in_duration: 0.0,
            text_scale_duration: 0.0,
            display_duration: 0.0,
            between_pause: 0.0,
        }
    }

    /// Sets the pre-reveal delay.
    pub fn with_reveal_delay(mut self, secs: f64) -> Self {
        self.reveal_delay = secs;
        self
    }

    /// Sets the hold time of a finished card.
    pub fn with_display_duration(mut self, secs: f64) -> Self {
        self.display_duration = secs;
        self
    }

    /// Sets the gap between characters.
    pub fn with_between_pause(mut self, secs: f64) -> Self {
        self.between_pause = secs;
        self
    }

    /// Fix any out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`RevealPlayback::new`](crate::RevealPlayback::new).
    /// Rules:
    /// - NaN or infinite durations fall back to their default.
    /// - Everything is clamped to `0.0..=MAX_PHASE_SECS`.
    pub fn validated(self) -> Self {
        let defaults = Self::default();
        Self {
            reveal_delay: sanitize("reveal_delay", self.reveal_delay, defaults.reveal_delay),
            flash_duration: sanitize("flash_duration", self.flash_duration, defaults.flash_duration),
            fade_in_duration: sanitize(
                "fade_in_duration",
                self.fade_in_duration,
                defaults.fade_in_duration,
            ),
            text_scale_duration: sanitize(
                "text_scale_duration",
                self.text_scale_duration,
                defaults.text_scale_duration,
            ),
            display_duration: sanitize(
                "display_duration",
                self.display_duration,
                defaults.display_duration,
            ),
            between_pause: sanitize("between_pause", self.between_pause, defaults.between_pause),
        }
    }

    /// Time the authoritative display animates for: fade-in, then the
    /// label scale.
    pub fn reveal_duration(&self) -> Duration {
        secs(self.fade_in_duration) + secs(self.text_scale_duration)
    }

    pub(crate) fn pre_reveal(&self) -> Duration {
        secs(self.reveal_delay)
    }

    pub(crate) fn flash(&self) -> Duration {
        secs(self.flash_duration)
    }

    pub(crate) fn hold(&self) -> Duration {
        secs(self.display_duration)
    }

    pub(crate) fn pause(&self) -> Duration {
        secs(self.between_pause)
    }
}

fn sanitize(field: &str, value: f64, default: f64) -> f64 {
    if !value.is_finite() {
        warn!(field, value, default, "non-finite reveal duration, using default");
        return default;
    }
    let clamped = value.clamp(0.0, RevealConfig::MAX_PHASE_SECS);
    if clamped != value {
        warn!(field, value, clamped, "reveal duration out of range, clamping");
    }
    clamped
}

/// Only ever called on validated values.
fn secs(value: f64) -> Duration {
    Duration::from_secs_f64(value.max(0.0))
}
