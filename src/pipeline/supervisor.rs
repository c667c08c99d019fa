//! Task supervision for a running gate.
//!
//! Spawns the reader stage, decision loop and status logger into one
//! `JoinSet`. The first task failure cancels everything; remaining tasks get
//! a bounded grace period and are then aborted.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::handoff::handoff;
use super::processing_loop::{GateStats, ProcessingLoop};
use super::reader::run_reader;
use crate::acquisition::SampleSource;
use crate::config::defaults::SHUTDOWN_JOIN_TIMEOUT_SECS;
use crate::config::GateConfig;
use crate::gateways::{run_status_logger, status_channel, DoorActuator, Identifier};

// ============================================================================
// Task Names for Supervisor Logging
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskName {
    Reader,
    DecisionLoop,
    StatusLogger,
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskName::Reader => write!(f, "Reader"),
            TaskName::DecisionLoop => write!(f, "DecisionLoop"),
            TaskName::StatusLogger => write!(f, "StatusLogger"),
        }
    }
}

// ============================================================================
// Gate Runner
// ============================================================================

/// Run the entry gate until the source ends, a task fails, or `cancel_token`
/// fires.
///
/// Returns the decision loop's final statistics, or the first task error.
pub async fn run_gate(
    config: &GateConfig,
    source: Box<dyn SampleSource>,
    identifier: Arc<dyn Identifier>,
    actuator: Box<dyn DoorActuator>,
    cancel_token: CancellationToken,
) -> Result<GateStats> {
    info!("🚀 Starting entry gate");
    info!("   Source: {}", source.source_name());
    info!("   Identification: {} (max {:?})", identifier.name(), config.identification.max_duration());
    info!("   Actuator: {}", actuator.name());
    info!("");

    let (handoff_tx, handoff_rx) = handoff();
    let (status_sink, status_rx) = status_channel(config.status.queue_capacity);
    let (stats_tx, stats_rx) = oneshot::channel();

    info!("🔒 Supervisor: Initializing task monitoring");
    let mut task_set: JoinSet<Result<TaskName>> = JoinSet::new();

    // Task 1: Reader stage
    let poll_interval = config.radar.poll_interval();
    let reader_cancel = cancel_token.clone();
    task_set.spawn(async move {
        let stats = run_reader(source, handoff_tx, poll_interval, reader_cancel)
            .await
            .context("Radar reader failed")?;
        info!(polls = stats.polls, objects = stats.objects, "[Reader] Task finished");
        Ok(TaskName::Reader)
    });

    // Task 2: Decision loop
    let processing_loop = ProcessingLoop::new(
        config,
        handoff_rx,
        identifier,
        actuator,
        status_sink,
        cancel_token.clone(),
    );
    task_set.spawn(async move {
        let stats = processing_loop.run().await;
        if stats_tx.send(stats).is_err() {
            warn!("[DecisionLoop] Nobody waiting for final statistics");
        }
        Ok(TaskName::DecisionLoop)
    });

    // Task 3: Status logger
    let status_cancel = cancel_token.clone();
    task_set.spawn(async move {
        run_status_logger(status_rx, status_cancel).await;
        Ok(TaskName::StatusLogger)
    });

    let outcome = run_supervisor(&mut task_set, cancel_token).await;
    drain_tasks(&mut task_set, Duration::from_secs(SHUTDOWN_JOIN_TIMEOUT_SECS)).await;

    outcome?;
    let stats = stats_rx.await.unwrap_or_else(|_| {
        warn!("Decision loop ended without reporting statistics");
        GateStats::default()
    });
    info!(
        samples = stats.samples,
        tracks = stats.tracks_started,
        identifications = stats.identifications_started,
        denials = stats.denials,
        doors_opened = stats.door_commands_sent,
        "🏁 Entry gate stopped"
    );
    Ok(stats)
}

/// Monitor tasks until all finish, one fails, or shutdown is requested.
async fn run_supervisor(
    task_set: &mut JoinSet<Result<TaskName>>,
    cancel_token: CancellationToken,
) -> Result<()> {
    info!("🔒 Supervisor: All tasks spawned, monitoring...");

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                info!("🛑 Supervisor: Shutdown signal received");
                break;
            }
            result = task_set.join_next() => {
                match result {
                    Some(Ok(Ok(task_name))) => {
                        info!("🔒 Supervisor: Task {} completed normally", task_name);
                    }
                    Some(Ok(Err(e))) => {
                        error!("🔒 Supervisor: Task failed with error: {:#}", e);
                        cancel_token.cancel();
                        return Err(e);
                    }
                    Some(Err(e)) => {
                        error!("🔒 Supervisor: Task panicked: {}", e);
                        cancel_token.cancel();
                        return Err(anyhow::anyhow!("Task panicked: {}", e));
                    }
                    None => {
                        info!("🔒 Supervisor: All tasks completed");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

/// Join what is left within `grace`, then abort the stragglers.
async fn drain_tasks(task_set: &mut JoinSet<Result<TaskName>>, grace: Duration) {
    let joined = tokio::time::timeout(grace, async {
        while let Some(result) = task_set.join_next().await {
            match result {
                Ok(Ok(task_name)) => info!("🔒 Supervisor: Task {} stopped", task_name),
                Ok(Err(e)) => warn!("🔒 Supervisor: Task failed during shutdown: {:#}", e),
                Err(e) => warn!("🔒 Supervisor: Task ended abnormally during shutdown: {}", e),
            }
        }
    })
    .await;

    if joined.is_err() {
        warn!(
            remaining = task_set.len(),
            "🔒 Supervisor: Tasks did not stop within {:?}, aborting", grace
        );
        task_set.abort_all();
        while task_set.join_next().await.is_some() {}
    }
}
