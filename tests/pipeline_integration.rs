//! Pipeline Integration Tests
//!
//! Runs the complete gate (reader stage, decision loop, status logger) under
//! the supervisor with paused tokio time, a scripted radar and a recording
//! door actuator.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use radar_entry::acquisition::{SampleSource, SimulatedSource, SourceError, SourceEvent};
use radar_entry::config::GateConfig;
use radar_entry::gateways::{ActuatorError, DoorActuator, OpenOutcome, StaticIdentifier};
use radar_entry::pipeline::run_gate;
use radar_entry::types::{ApproachSign, Sample};

// ============================================================================
// Test doubles
// ============================================================================

enum End {
    Eof,
    Fail,
}

struct ScriptedRadar {
    script: VecDeque<Option<(i32, i32)>>,
    end: End,
}

impl ScriptedRadar {
    fn new(script: Vec<Option<(i32, i32)>>, end: End) -> Box<Self> {
        Box::new(Self {
            script: script.into(),
            end,
        })
    }
}

#[async_trait]
impl SampleSource for ScriptedRadar {
    async fn poll_latest(&mut self) -> Result<SourceEvent, SourceError> {
        match self.script.pop_front() {
            Some(pos) => Ok(SourceEvent::Observation(
                pos.map(|(x, y)| Sample::new(x, y, -60, Instant::now())),
            )),
            None => match self.end {
                End::Eof => Ok(SourceEvent::Eof),
                End::Fail => Err(SourceError::Disconnected),
            },
        }
    }

    fn source_name(&self) -> &str {
        "scripted"
    }
}

#[derive(Clone, Default)]
struct RecordingActuator {
    opened_at: Arc<Mutex<Vec<Instant>>>,
}

impl RecordingActuator {
    fn opens(&self) -> Vec<Instant> {
        self.opened_at.lock().unwrap().clone()
    }
}

#[async_trait]
impl DoorActuator for RecordingActuator {
    async fn open(&mut self) -> Result<OpenOutcome, ActuatorError> {
        self.opened_at.lock().unwrap().push(Instant::now());
        Ok(OpenOutcome::Sent)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Door command that never completes.
struct StuckActuator;

#[async_trait]
impl DoorActuator for StuckActuator {
    async fn open(&mut self) -> Result<OpenOutcome, ActuatorError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(OpenOutcome::Sent)
    }

    fn name(&self) -> &str {
        "stuck"
    }
}

fn config() -> GateConfig {
    let mut config = GateConfig::default();
    config.decision.expected_approach_sign = ApproachSign::Positive;
    config
}

/// Walk in from 2.3 m on the positive side and cross the axis at 420 mm.
fn crossing_walk() -> Vec<Option<(i32, i32)>> {
    let mut walk: Vec<_> = (0..7).map(|i| Some((300, 2300 - 300 * i))).collect();
    walk.push(Some((50, 470)));
    walk.push(Some((-50, 420)));
    walk
}

fn walk_then_leave() -> Vec<Option<(i32, i32)>> {
    let mut script = crossing_walk();
    script.extend([Some((-120, 300)), Some((-200, 200))]);
    script.extend(std::iter::repeat(None).take(5));
    script
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test(start_paused = true)]
async fn authorized_walk_opens_door_once_after_comfort_delay() {
    let actuator = RecordingActuator::default();
    let start = Instant::now();

    let stats = run_gate(
        &config(),
        ScriptedRadar::new(walk_then_leave(), End::Eof),
        Arc::new(StaticIdentifier::new(true).with_latency(Duration::from_millis(100))),
        Box::new(actuator.clone()),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(stats.tracks_started, 1);
    assert_eq!(stats.identifications_started, 1);
    assert_eq!(stats.authorizations, 1);
    assert_eq!(stats.triggers, 1);
    assert_eq!(stats.door_commands_sent, 1);

    let opens = actuator.opens();
    assert_eq!(opens.len(), 1);
    // Crossing sample is the ninth poll (first tick fires immediately)
    let crossing_at = start + Duration::from_millis(8 * 50);
    assert!(opens[0] >= crossing_at + Duration::from_millis(500));
}

#[tokio::test(start_paused = true)]
async fn second_crossing_within_cooldown_is_ignored() {
    let actuator = RecordingActuator::default();
    let mut script = crossing_walk();
    script.extend(crossing_walk());
    script.push(None);

    let stats = run_gate(
        &config(),
        ScriptedRadar::new(script, End::Eof),
        Arc::new(StaticIdentifier::new(true)),
        Box::new(actuator.clone()),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(stats.triggers, 1);
    assert_eq!(actuator.opens().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn denied_walk_never_opens_door() {
    let actuator = RecordingActuator::default();

    let stats = run_gate(
        &config(),
        ScriptedRadar::new(walk_then_leave(), End::Eof),
        Arc::new(StaticIdentifier::new(false).with_latency(Duration::from_millis(100))),
        Box::new(actuator.clone()),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(stats.denials >= 1);
    assert_eq!(stats.authorizations, 0);
    assert_eq!(stats.triggers, 0);
    assert!(actuator.opens().is_empty());
}

#[tokio::test(start_paused = true)]
async fn slow_identification_still_opens_when_it_lands_before_crossing() {
    let actuator = RecordingActuator::default();
    let mut script: Vec<_> = (0..20).map(|i| Some((300, 2500 - 100 * i))).collect();
    script.extend([Some((40, 480)), Some((-40, 430)), None]);

    let stats = run_gate(
        &config(),
        ScriptedRadar::new(script, End::Eof),
        Arc::new(StaticIdentifier::new(true).with_latency(Duration::from_millis(900))),
        Box::new(actuator.clone()),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(stats.identifications_started, 1);
    assert_eq!(actuator.opens().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn radar_failure_terminates_gate() {
    let cancel = CancellationToken::new();
    let result = run_gate(
        &config(),
        ScriptedRadar::new(vec![Some((300, 2000)), Some((300, 1800))], End::Fail),
        Arc::new(StaticIdentifier::new(true)),
        Box::new(RecordingActuator::default()),
        cancel.clone(),
    )
    .await;

    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("zero-length read"), "{err:#}");
    assert!(cancel.is_cancelled());
}

#[tokio::test(start_paused = true)]
async fn stuck_door_command_does_not_hold_up_shutdown() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let cancelled_at = Arc::new(Mutex::new(None));
    let stamp = Arc::clone(&cancelled_at);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        *stamp.lock().unwrap() = Some(Instant::now());
        trigger.cancel();
    });

    let mut script = crossing_walk();
    script.extend(std::iter::repeat(None).take(200));

    let stats = run_gate(
        &config(),
        ScriptedRadar::new(script, End::Eof),
        Arc::new(StaticIdentifier::new(true)),
        Box::new(StuckActuator),
        cancel,
    )
    .await
    .unwrap();

    let cancelled_at = cancelled_at.lock().unwrap().unwrap();
    assert!(cancelled_at.elapsed() < Duration::from_millis(500));
    assert_eq!(stats.triggers, 1);
    assert_eq!(stats.door_commands_sent, 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_stops_a_live_gate() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        trigger.cancel();
    });

    let config = config();
    let source =
        SimulatedSource::new(ApproachSign::Positive, config.radar.poll_interval(), 11).unwrap();
    let actuator = RecordingActuator::default();

    let stats = run_gate(
        &config,
        Box::new(source),
        Arc::new(StaticIdentifier::new(true).with_latency(Duration::from_millis(200))),
        Box::new(actuator.clone()),
        cancel,
    )
    .await
    .unwrap();

    assert!(stats.observations > 100);
    assert!(stats.tracks_started >= 1);
}
