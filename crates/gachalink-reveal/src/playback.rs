//! The reveal state machine.
//!
//! One run plays the characters of one [`PullResult`] in order. The run
//! never sleeps or spawns: the owner calls [`RevealPlayback::advance`]
//! with the time that passed since the last call, and gets back every
//! [`PlaybackEvent`] whose moment fell inside that window.

use std::time::Duration;

use gachalink_protocol::{Character, PullResult};
use tracing::{debug, info, warn};

use crate::{RarityStyle, RevealConfig, RevealError};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Where within one index a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Anticipation: start sound and particles, rarity still hidden.
    PreReveal,
    /// Flash transition.
    Flash,
    /// The authoritative rarity is on screen and animating in.
    Reveal,
    /// The finished card stays up.
    Hold,
    /// Gap before the next index.
    Pause,
}

impl Phase {
    /// Whether the rarity of the current index is already on screen.
    pub fn is_revealed(self) -> bool {
        matches!(self, Self::Reveal | Self::Hold | Self::Pause)
    }
}

/// Presentation cues that carry no authoritative data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevealCue {
    /// Index `index` begins: play the start sound, start particles.
    PreReveal { index: usize },
    /// Start the flash transition.
    Flash { index: usize },
    /// Play the reveal sound for the index's rarity.
    RaritySound { index: usize, style: RarityStyle },
}

/// Something the renderer should do now.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    Cue(RevealCue),
    /// `characters[index]` is shown with its authoritative style.
    ///
    /// `skipped` is true when the run was short-circuited to this display
    /// and the animation should jump to its end state.
    Step {
        index: usize,
        character: Character,
        style: RarityStyle,
        skipped: bool,
    },
    /// The run is over. Emitted exactly once per run.
    Complete { shown: usize, skipped: bool },
}

/// Snapshot of a playing run for interpolating animations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub index: usize,
    pub len: usize,
    pub phase: Phase,
    /// How far through `phase` the run is, `0.0..=1.0`.
    pub progress: f32,
}

// ---------------------------------------------------------------------------
// Playback
// ---------------------------------------------------------------------------

struct Run {
    characters: Vec<Character>,
    index: usize,
    phase: Phase,
    /// Time spent in `phase` so far.
    elapsed: Duration,
    skip: bool,
    shown: usize,
}

/// Plays pull results one character at a time, advanced by the caller's
/// clock.
///
/// ```
/// use std::time::Duration;
/// use gachalink_protocol::{Character, PullResult};
/// use gachalink_reveal::{PlaybackEvent, RevealConfig, RevealPlayback};
///
/// let result = PullResult {
///     characters: vec![Character {
///         id: 1,
///         name: "Xiangling".into(),
///         rarity: 4,
///         image_url: String::new(),
///         rate: 0.0,
///     }],
///     is_new: vec![true],
///     timestamp: 0,
/// };
///
/// let mut playback = RevealPlayback::new(RevealConfig::default());
/// playback.start(&result).unwrap();
///
/// let events = playback.advance(Duration::from_secs(10));
/// assert!(matches!(events.last(), Some(PlaybackEvent::Complete { shown: 1, skipped: false })));
/// assert!(!playback.is_playing());
/// ```
pub struct RevealPlayback {
    config: RevealConfig,
    run: Option<Run>,
}

impl RevealPlayback {
    /// Creates an idle playback. The config is validated first.
    pub fn new(config: RevealConfig) -> Self {
        Self {
            config: config.validated(),
            run: None,
        }
    }

    pub fn config(&self) -> &RevealConfig {
        &self.config
    }

    /// Whether a run is in progress.
    pub fn is_playing(&self) -> bool {
        self.run.is_some()
    }

    /// Starts a run over `result.characters`.
    ///
    /// Returns the events due at time zero: the first pre-reveal cue, or
    /// `Complete` right away for an empty result. The skip flag of the
    /// previous run never carries over.
    ///
    /// # Errors
    /// [`RevealError::AlreadyPlaying`] if a run is active. That run is
    /// left untouched.
    pub fn start(&mut self, result: &PullResult) -> Result<Vec<PlaybackEvent>, RevealError> {
        if let Some(run) = &self.run {
            warn!(
                index = run.index,
                len = run.characters.len(),
                "result arrived during playback, not playing it"
            );
            return Err(RevealError::AlreadyPlaying {
                index: run.index,
                len: run.characters.len(),
            });
        }

        info!(count = result.len(), "reveal started");
        self.run = Some(Run {
            characters: result.characters.clone(),
            index: 0,
            phase: Phase::PreReveal,
            elapsed: Duration::ZERO,
            skip: false,
            shown: 0,
        });

        let mut events = Vec::new();
        if result.is_empty() {
            self.complete(&mut events, false);
        } else {
            events.push(PlaybackEvent::Cue(RevealCue::PreReveal { index: 0 }));
            self.step(Duration::ZERO, &mut events);
        }
        Ok(events)
    }

    /// Asks the run to jump to the end.
    ///
    /// Takes effect on the next [`advance`](Self::advance). A no-op while
    /// idle.
    pub fn request_skip(&mut self) {
        match &mut self.run {
            Some(run) => {
                if !run.skip {
                    debug!(index = run.index, "skip requested");
                }
                run.skip = true;
            }
            None => debug!("skip ignored, nothing playing"),
        }
    }

    /// Moves the run forward by `dt` and returns the events crossed, in
    /// order. Returns nothing while idle.
    ///
    /// A pending skip is honored before any time is applied: the index in
    /// progress is shown in its final state (if it was not yet), later
    /// indices are dropped, and the run completes.
    pub fn advance(&mut self, dt: Duration) -> Vec<PlaybackEvent> {
        let mut events = Vec::new();
        let Some(run) = &mut self.run else {
            return events;
        };

        if run.skip {
            if !run.phase.is_revealed() {
                let index = run.index;
                Self::show(run, &mut events, true);
                debug!(index, "short-circuited to final display");
            }
            self.complete(&mut events, true);
            return events;
        }

        self.step(dt, &mut events);
        events
    }

    /// Current position, or `None` while idle.
    pub fn frame(&self) -> Option<Frame> {
        let run = self.run.as_ref()?;
        let total = phase_duration(&self.config, run.phase);
        let progress = if total.is_zero() {
            1.0
        } else {
            (run.elapsed.as_secs_f64() / total.as_secs_f64()).min(1.0) as f32
        };
        Some(Frame {
            index: run.index,
            len: run.characters.len(),
            phase: run.phase,
            progress,
        })
    }

    /// The character at the current index, or `None` while idle.
    pub fn current(&self) -> Option<&Character> {
        let run = self.run.as_ref()?;
        run.characters.get(run.index)
    }

    // -- internals ----------------------------------------------------------

    /// Applies `dt` and crosses as many phase boundaries as it covers.
    fn step(&mut self, dt: Duration, events: &mut Vec<PlaybackEvent>) {
        if let Some(run) = &mut self.run {
            run.elapsed = run.elapsed.saturating_add(dt);
        }

        loop {
            let Some(run) = &mut self.run else {
                return;
            };
            let due = phase_duration(&self.config, run.phase);
            if run.elapsed < due {
                return;
            }
            run.elapsed -= due;

            let last = run.index + 1 == run.characters.len();
            let phase = run.phase;
            match phase {
                Phase::PreReveal => {
                    run.phase = Phase::Flash;
                    events.push(PlaybackEvent::Cue(RevealCue::Flash { index: run.index }));
                }
                Phase::Flash => {
                    run.phase = Phase::Reveal;
                    Self::show(run, events, false);
                }
                Phase::Reveal => run.phase = Phase::Hold,
                Phase::Hold if last => {
                    self.complete(events, false);
                    return;
                }
                Phase::Hold => run.phase = Phase::Pause,
                Phase::Pause => {
                    run.index += 1;
                    run.phase = Phase::PreReveal;
                    events.push(PlaybackEvent::Cue(RevealCue::PreReveal { index: run.index }));
                }
            }
        }
    }

    /// Puts `characters[index]` on screen with its authoritative style.
    fn show(run: &mut Run, events: &mut Vec<PlaybackEvent>, skipped: bool) {
        let Some(character) = run.characters.get(run.index) else {
            return;
        };
        let style = RarityStyle::for_level(character.rarity);
        let index = run.index;
        events.push(PlaybackEvent::Step {
            index,
            character: character.clone(),
            style,
            skipped,
        });
        if !skipped && style.sound.is_some() {
            events.push(PlaybackEvent::Cue(RevealCue::RaritySound { index, style }));
        }
        run.shown += 1;
    }

    fn complete(&mut self, events: &mut Vec<PlaybackEvent>, skipped: bool) {
        let Some(run) = self.run.take() else {
            return;
        };
        info!(
            shown = run.shown,
            total = run.characters.len(),
            skipped,
            "reveal complete"
        );
        events.push(PlaybackEvent::Complete {
            shown: run.shown,
            skipped,
        });
    }
}

fn phase_duration(config: &RevealConfig, phase: Phase) -> Duration {
    match phase {
        Phase::PreReveal => config.pre_reveal(),
        Phase::Flash => config.flash(),
        Phase::Reveal => config.reveal_duration(),
        Phase::Hold => config.hold(),
        Phase::Pause => config.pause(),
    }
}
