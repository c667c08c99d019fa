//! Decision engine state machine.
//!
//! ```text
//!            sample                      trigger
//!   IDLE ───────────────▶ TRACKING ───────────────▶ COOLDOWN
//!    ▲                     │  no sample / departing     │
//!    │                     │  / denied                  │ now >= until
//!    └─────────────────────┴────────────────────────────┘
//! ```
//!
//! The engine is a plain synchronous value: it is fed observations and
//! identification outcomes and answers with [`EngineAction`]s that the
//! processing loop carries out. It never awaits anything itself, so a
//! check-then-start of identification cannot race.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use super::history::History;
use super::trend::{self, TrendParams};
use super::trigger::{self, TriggerParams, TriggerVerdict};
use crate::config::defaults::DIAGNOSTIC_LOG_Y_THRESHOLD_MM;
use crate::config::DecisionConfig;
use crate::types::{AuthStatus, Intent, Observation, Phase, Sample, TrackId};

// ============================================================================
// Engine I/O
// ============================================================================

/// Side effects requested by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    /// Start the (single) identification check for this track.
    StartIdentification { track: TrackId },
    /// Abandon the in-flight check; its result will be ignored anyway.
    CancelIdentification { track: TrackId },
    /// Open the door (after the comfort delay).
    OpenDoor { track: TrackId, sample: Sample },
}

/// Result of one identification check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentificationOutcome {
    Authorized,
    Denied,
}

impl From<bool> for IdentificationOutcome {
    fn from(authorized: bool) -> Self {
        if authorized {
            Self::Authorized
        } else {
            Self::Denied
        }
    }
}

/// Counters accumulated over the engine's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub observations: u64,
    pub samples: u64,
    pub tracks_started: u64,
    pub identifications_started: u64,
    pub authorizations: u64,
    pub denials: u64,
    pub stale_outcomes: u64,
    pub rejected_crossings: u64,
    pub doors_opened: u64,
}

/// Observable engine state, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub phase: Phase,
    pub intent: Intent,
    pub auth: AuthStatus,
    pub history_len: usize,
    pub identification_in_flight: bool,
}

// ============================================================================
// Decision Engine
// ============================================================================

pub struct DecisionEngine {
    trend: TrendParams,
    trigger: TriggerParams,
    cooldown: Duration,

    phase: Phase,
    intent: Intent,
    auth: AuthStatus,
    history: History,
    identification_in_flight: bool,
    track: TrackId,

    stats: EngineStats,
}

impl DecisionEngine {
    /// `poll_interval` is the reader cadence, used when sample timestamps
    /// cannot separate samples.
    pub fn new(config: &DecisionConfig, poll_interval: Duration) -> Self {
        Self {
            trend: TrendParams::from_config(config, poll_interval),
            trigger: TriggerParams::from_config(config),
            cooldown: config.cooldown(),
            phase: Phase::Idle,
            intent: Intent::Neutral,
            auth: AuthStatus::Unknown,
            history: History::new(config.history_size),
            identification_in_flight: false,
            track: TrackId::default(),
            stats: EngineStats::default(),
        }
    }

    // --- accessors ---

    pub const fn phase(&self) -> Phase {
        self.phase
    }

    pub const fn intent(&self) -> Intent {
        self.intent
    }

    pub const fn auth(&self) -> AuthStatus {
        self.auth
    }

    pub const fn history(&self) -> &History {
        &self.history
    }

    /// Id of the current (or most recent) track.
    pub const fn track(&self) -> TrackId {
        self.track
    }

    pub const fn stats(&self) -> EngineStats {
        self.stats
    }

    pub const fn identification_in_flight(&self) -> bool {
        self.identification_in_flight
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.phase,
            intent: self.intent,
            auth: self.auth,
            history_len: self.history.len(),
            identification_in_flight: self.identification_in_flight,
        }
    }

    // --- inputs ---

    /// Apply one observation taken at `now`.
    pub fn observe(&mut self, now: Instant, observation: Observation) -> Vec<EngineAction> {
        let mut actions = Vec::new();
        self.stats.observations += 1;

        if let Phase::Cooldown { until } = self.phase {
            if now < until {
                return actions;
            }
            info!(track = %self.track, "⏱️  Cooldown over");
            self.reset(&mut actions, "cooldown expired");
        }

        let Some(sample) = observation else {
            if self.phase.is_tracking() {
                self.reset(&mut actions, "target lost");
            }
            return actions;
        };

        self.stats.samples += 1;
        if self.phase.is_idle() {
            self.start_track(&sample);
        }
        self.track_sample(now, sample, &mut actions);
        actions
    }

    /// Apply the outcome of the identification check started for `track`,
    /// arriving at `now`.
    ///
    /// Stale outcomes are counted and discarded. An authorization re-runs the
    /// trigger against the newest sample pair, so a crossing made while the
    /// check was pending still opens the door.
    pub fn on_identification(
        &mut self,
        now: Instant,
        track: TrackId,
        outcome: IdentificationOutcome,
    ) -> Vec<EngineAction> {
        let mut actions = Vec::new();
        if track != self.track || !self.phase.is_tracking() || !self.identification_in_flight {
            self.stats.stale_outcomes += 1;
            debug!(%track, current = %self.track, ?outcome, "Discarding stale identification result");
            return actions;
        }
        self.identification_in_flight = false;

        match outcome {
            IdentificationOutcome::Authorized => {
                self.stats.authorizations += 1;
                self.auth = AuthStatus::Authorized;
                info!(%track, intent = %self.intent, "🔑 Identification: AUTHORIZED");
                if self.intent == Intent::Approaching {
                    self.evaluate_trigger(now, &mut actions);
                }
            }
            IdentificationOutcome::Denied => {
                self.stats.denials += 1;
                self.auth = AuthStatus::Denied;
                // No feedback towards the visitor; just stop tracking them
                info!(%track, "Identification: DENIED");
                self.reset(&mut actions, "identification denied");
            }
        }
        actions
    }

    /// Return to IDLE from any phase (shutdown, operator reset).
    pub fn reset_to_idle(&mut self) -> Vec<EngineAction> {
        let mut actions = Vec::new();
        if !self.phase.is_idle() || self.identification_in_flight || !self.history.is_empty() {
            self.reset(&mut actions, "reset requested");
        }
        actions
    }

    // --- transitions ---

    fn start_track(&mut self, sample: &Sample) {
        self.track = self.track.next();
        self.phase = Phase::Tracking;
        self.stats.tracks_started += 1;
        info!(
            track = %self.track,
            x = sample.x,
            y = sample.y,
            "👤 Target acquired: TRACKING"
        );
    }

    fn track_sample(&mut self, now: Instant, sample: Sample, actions: &mut Vec<EngineAction>) {
        self.history.push(sample);

        if !self.identification_in_flight && self.auth.needs_check() {
            self.auth = AuthStatus::Pending;
            self.identification_in_flight = true;
            self.stats.identifications_started += 1;
            debug!(track = %self.track, "Starting identification");
            actions.push(EngineAction::StartIdentification { track: self.track });
        }

        let intent = trend::classify(&self.history, &self.trend);
        if intent != self.intent {
            debug!(track = %self.track, from = %self.intent, to = %intent, y = sample.y, "Intent changed");
        }
        self.intent = intent;

        if intent == Intent::Departing {
            self.reset(actions, "departing");
            return;
        }

        if self.auth == AuthStatus::Authorized && intent == Intent::Approaching {
            self.evaluate_trigger(now, actions);
        }
    }

    /// Check the two newest samples for a door-axis crossing.
    fn evaluate_trigger(&mut self, now: Instant, actions: &mut Vec<EngineAction>) {
        let (Some(prev), Some(sample)) =
            (self.history.previous().copied(), self.history.latest().copied())
        else {
            return;
        };

        match trigger::evaluate(&prev, &sample, &self.trigger) {
            TriggerVerdict::NoCandidate => {}
            TriggerVerdict::Rejected(crossing, reason) => {
                self.stats.rejected_crossings += 1;
                if sample.y < DIAGNOSTIC_LOG_Y_THRESHOLD_MM {
                    debug!(track = %self.track, ?crossing, x_prev = prev.x, x = sample.x, y = sample.y, "Crossing rejected: {}", reason);
                } else {
                    trace!(track = %self.track, ?crossing, x_prev = prev.x, x = sample.x, y = sample.y, "Crossing rejected: {}", reason);
                }
            }
            TriggerVerdict::Fire(crossing) => {
                let until = now + self.cooldown;
                self.phase = Phase::Cooldown { until };
                self.stats.doors_opened += 1;
                info!(
                    track = %self.track,
                    ?crossing,
                    x_prev = prev.x,
                    x = sample.x,
                    y = sample.y,
                    cooldown_ms = self.cooldown.as_millis(),
                    "🚪 Trigger: opening door"
                );
                actions.push(EngineAction::OpenDoor {
                    track: self.track,
                    sample,
                });
            }
        }
    }

    fn reset(&mut self, actions: &mut Vec<EngineAction>, reason: &str) {
        if self.identification_in_flight {
            actions.push(EngineAction::CancelIdentification { track: self.track });
        }
        if !self.phase.is_idle() {
            info!(track = %self.track, reason, "Back to IDLE");
        }
        self.phase = Phase::Idle;
        self.intent = Intent::Neutral;
        self.auth = AuthStatus::Unknown;
        self.history.clear();
        self.identification_in_flight = false;
    }
}
