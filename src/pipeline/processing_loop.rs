//! Decision loop: drives the [`DecisionEngine`] from the handoff slot and
//! carries out the actions it requests.
//!
//! The engine itself is synchronous. This loop owns the async side effects,
//! but never awaits them on the engine path: identification checks (one at a
//! time) and door commands (comfort delay plus actuator) run as spawned tasks
//! under child cancellation tokens and report back over channels.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::handoff::HandoffReceiver;
use crate::config::defaults::STATS_LOG_EVERY_SAMPLES;
use crate::config::GateConfig;
use crate::engine::{DecisionEngine, EngineAction, IdentificationOutcome};
use crate::gateways::{
    ActuatorError, DoorActuator, Identifier, OpenOutcome, StatusEvent, StatusSink,
};
use crate::types::{Observation, Sample, TrackId};

// ============================================================================
// Statistics
// ============================================================================

/// Totals reported when the gate shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    pub observations: u64,
    pub samples: u64,
    pub observations_overwritten: u64,
    pub tracks_started: u64,
    pub identifications_started: u64,
    pub authorizations: u64,
    pub denials: u64,
    pub stale_outcomes: u64,
    pub triggers: u64,
    pub door_commands_sent: u64,
    pub door_commands_suppressed: u64,
    pub actuator_errors: u64,
    pub status_dropped: u64,
}

// ============================================================================
// Task reports
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct IdentificationReport {
    track: TrackId,
    outcome: IdentificationOutcome,
}

struct InFlight {
    track: TrackId,
    token: CancellationToken,
}

#[derive(Debug)]
struct DoorReport {
    track: TrackId,
    y: i32,
    result: Result<OpenOutcome, ActuatorError>,
}

// ============================================================================
// Processing Loop
// ============================================================================

pub struct ProcessingLoop {
    engine: DecisionEngine,
    handoff: HandoffReceiver,
    identifier: Arc<dyn Identifier>,
    actuator: Arc<Mutex<Box<dyn DoorActuator>>>,
    actuator_name: String,
    status: StatusSink,
    cancel_token: CancellationToken,

    identification_budget: Duration,
    comfort_delay: Duration,
    proximity_feed: bool,

    reports_tx: mpsc::Sender<IdentificationReport>,
    reports_rx: mpsc::Receiver<IdentificationReport>,
    in_flight: Option<InFlight>,
    last_x: Option<i32>,

    doors_tx: mpsc::Sender<DoorReport>,
    doors_rx: mpsc::Receiver<DoorReport>,
    doors_pending: usize,

    door_commands_sent: u64,
    door_commands_suppressed: u64,
    actuator_errors: u64,
}

impl ProcessingLoop {
    pub fn new(
        config: &GateConfig,
        handoff: HandoffReceiver,
        identifier: Arc<dyn Identifier>,
        actuator: Box<dyn DoorActuator>,
        status: StatusSink,
        cancel_token: CancellationToken,
    ) -> Self {
        let (reports_tx, reports_rx) = mpsc::channel(4);
        let (doors_tx, doors_rx) = mpsc::channel(4);
        let actuator_name = actuator.name().to_string();
        Self {
            engine: DecisionEngine::new(&config.decision, config.radar.poll_interval()),
            handoff,
            identifier,
            actuator: Arc::new(Mutex::new(actuator)),
            actuator_name,
            status,
            cancel_token,
            identification_budget: config.identification.max_duration(),
            comfort_delay: config.decision.comfort_delay(),
            proximity_feed: config.status.proximity_feed,
            reports_tx,
            reports_rx,
            in_flight: None,
            last_x: None,
            doors_tx,
            doors_rx,
            doors_pending: 0,
            door_commands_sent: 0,
            door_commands_suppressed: 0,
            actuator_errors: 0,
        }
    }

    /// Run until cancelled or the reader stage has gone away.
    pub async fn run(mut self) -> GateStats {
        info!(
            identifier = self.identifier.name(),
            actuator = %self.actuator_name,
            "[DecisionLoop] Task starting"
        );

        loop {
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    info!("[DecisionLoop] Shutdown signal received");
                    break;
                }
                Some(report) = self.reports_rx.recv() => {
                    self.on_report(report);
                }
                Some(report) = self.doors_rx.recv() => {
                    self.on_door_report(report);
                }
                next = self.handoff.next() => {
                    let Some(observation) = next else {
                        info!("[DecisionLoop] Reader stage finished");
                        break;
                    };
                    self.on_observation(observation);
                }
            }
        }

        self.finish_door_commands().await;
        for action in self.engine.reset_to_idle() {
            self.cancel_identification(action);
        }
        if let Some(flight) = self.in_flight.take() {
            flight.token.cancel();
        }

        let stats = self.stats();
        info!(
            observations = stats.observations,
            samples = stats.samples,
            tracks = stats.tracks_started,
            identifications = stats.identifications_started,
            denials = stats.denials,
            doors_opened = stats.door_commands_sent,
            "📊 Decision loop stopped"
        );
        stats
    }

    /// Snapshot of the counters so far.
    pub fn stats(&self) -> GateStats {
        let engine = self.engine.stats();
        GateStats {
            observations: engine.observations,
            samples: engine.samples,
            observations_overwritten: self.handoff.overwritten(),
            tracks_started: engine.tracks_started,
            identifications_started: engine.identifications_started,
            authorizations: engine.authorizations,
            denials: engine.denials,
            stale_outcomes: engine.stale_outcomes,
            triggers: engine.doors_opened,
            door_commands_sent: self.door_commands_sent,
            door_commands_suppressed: self.door_commands_suppressed,
            actuator_errors: self.actuator_errors,
            status_dropped: self.status.dropped(),
        }
    }

    // --- observation path ---

    fn on_observation(&mut self, observation: Observation) {
        let actions = self.engine.observe(Instant::now(), observation);
        self.feed_proximity(observation);
        self.execute(actions);

        let observations = self.engine.stats().observations;
        if observations % STATS_LOG_EVERY_SAMPLES == 0 {
            let stats = self.stats();
            info!(
                observations,
                samples = stats.samples,
                tracks = stats.tracks_started,
                doors_opened = stats.door_commands_sent,
                overwritten = stats.observations_overwritten,
                phase = %self.engine.phase(),
                "📈 Decision loop progress"
            );
        }
    }

    fn execute(&mut self, actions: Vec<EngineAction>) {
        for action in actions {
            match action {
                EngineAction::StartIdentification { track } => self.spawn_identification(track),
                EngineAction::CancelIdentification { .. } => self.cancel_identification(action),
                EngineAction::OpenDoor { track, sample } => self.spawn_door_command(track, sample),
            }
        }
    }

    fn feed_proximity(&mut self, observation: Observation) {
        let previous_x = self.last_x;
        self.last_x = observation.map(|s| s.x);

        if !self.proximity_feed || self.engine.phase().is_idle() {
            return;
        }
        let Some(sample) = observation else {
            return;
        };
        let axis_crossed = sample.is_on_axis()
            || previous_x.is_some_and(|px| i64::from(px) * i64::from(sample.x) < 0);
        self.status.notify(StatusEvent::Proximity {
            distance_mm: sample.distance_mm(),
            axis_crossed,
        });
    }

    // --- door path ---

    fn spawn_door_command(&mut self, track: TrackId, sample: Sample) {
        let token = self.cancel_token.child_token();
        let actuator = Arc::clone(&self.actuator);
        let reports = self.doors_tx.clone();
        let delay = self.comfort_delay;
        self.doors_pending += 1;

        tokio::spawn(async move {
            let command = async {
                if !delay.is_zero() {
                    debug!(%track, delay_ms = delay.as_millis(), "Comfort delay");
                    tokio::time::sleep(delay).await;
                }
                actuator.lock().await.open().await
            };
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!(%track, "Shutdown before the door command completed, door not opened");
                    return;
                }
                result = command => result,
            };
            let report = DoorReport {
                track,
                y: sample.y,
                result,
            };
            if reports.send(report).await.is_err() {
                debug!(%track, "Decision loop gone, door result dropped");
            }
        });
    }

    fn on_door_report(&mut self, report: DoorReport) {
        self.doors_pending = self.doors_pending.saturating_sub(1);
        let track = report.track;
        match report.result {
            Ok(OpenOutcome::Sent) => {
                self.door_commands_sent += 1;
                info!(%track, y = report.y, "🚪 Door opened");
                self.status.notify(StatusEvent::AccessGranted);
            }
            Ok(OpenOutcome::Suppressed) => {
                self.door_commands_suppressed += 1;
                self.status.notify(StatusEvent::AccessGranted);
            }
            Err(e) => {
                self.actuator_errors += 1;
                error!(%track, actuator = %self.actuator_name, "Door command failed: {}", e);
            }
        }
    }

    /// Wait for door commands issued before the reader stage ended.
    /// Shutdown abandons them.
    async fn finish_door_commands(&mut self) {
        while self.doors_pending > 0 {
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => return,
                Some(report) = self.doors_rx.recv() => self.on_door_report(report),
            }
        }
    }

    // --- identification path ---

    fn spawn_identification(&mut self, track: TrackId) {
        if let Some(previous) = self.in_flight.take() {
            previous.token.cancel();
        }

        let token = self.cancel_token.child_token();
        let task_token = token.clone();
        let identifier = Arc::clone(&self.identifier);
        let reports = self.reports_tx.clone();
        let budget = self.identification_budget;

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = task_token.cancelled() => {
                    debug!(%track, "Identification cancelled");
                    return;
                }
                result = identifier.identify(budget) => match result {
                    Ok(authorized) => IdentificationOutcome::from(authorized),
                    Err(e) => {
                        warn!(%track, identifier = identifier.name(), "Identification failed, treating as denied: {}", e);
                        IdentificationOutcome::Denied
                    }
                },
            };
            if reports.send(IdentificationReport { track, outcome }).await.is_err() {
                debug!(%track, "Decision loop gone, identification result dropped");
            }
        });

        self.in_flight = Some(InFlight { track, token });
    }

    fn cancel_identification(&mut self, action: EngineAction) {
        let EngineAction::CancelIdentification { track } = action else {
            return;
        };
        if !self.in_flight.as_ref().is_some_and(|f| f.track == track) {
            return;
        }
        if let Some(flight) = self.in_flight.take() {
            debug!(%track, "Cancelling identification");
            flight.token.cancel();
        }
    }

    fn on_report(&mut self, report: IdentificationReport) {
        if self.in_flight.as_ref().is_some_and(|f| f.track == report.track) {
            self.in_flight = None;
        }
        let actions = self
            .engine
            .on_identification(Instant::now(), report.track, report.outcome);
        self.execute(actions);
    }
}
