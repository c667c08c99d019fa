//! Reader stage: polls the sample source on a fixed cadence and publishes the
//! latest observation into the handoff slot.

use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::handoff::HandoffSender;
use crate::acquisition::{SampleSource, SourceError, SourceEvent};

/// Counters reported when the reader stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub polls: u64,
    pub objects: u64,
    pub empty: u64,
    pub reached_eof: bool,
}

/// Run until cancelled, the consumer disappears, or the source ends.
///
/// A source failure is returned as the task's error. At end of data a final
/// "no object" is published so the decision loop leaves TRACKING.
pub async fn run_reader(
    mut source: Box<dyn SampleSource>,
    mut handoff: HandoffSender,
    poll_interval: Duration,
    cancel_token: CancellationToken,
) -> Result<ReaderStats, SourceError> {
    let mut stats = ReaderStats::default();
    let mut ticker = interval(poll_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        source = source.source_name(),
        poll_ms = poll_interval.as_millis(),
        "[Reader] Task starting"
    );

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                info!("[Reader] Shutdown signal received");
                break;
            }
            _ = ticker.tick() => {}
        }

        let event = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                info!("[Reader] Shutdown signal received");
                break;
            }
            result = source.poll_latest() => match result {
                Ok(ev) => ev,
                Err(e) => {
                    error!(source = source.source_name(), "[Reader] Source failed: {}", e);
                    return Err(e);
                }
            },
        };

        stats.polls += 1;
        let observation = match event {
            SourceEvent::Observation(obs) => obs,
            SourceEvent::Eof => {
                info!(source = source.source_name(), polls = stats.polls, "[Reader] End of data");
                handoff.publish(None);
                stats.reached_eof = true;
                break;
            }
        };

        if observation.is_some() {
            stats.objects += 1;
        } else {
            stats.empty += 1;
        }

        if !handoff.publish(observation) {
            info!("[Reader] Decision loop gone, stopping");
            break;
        }
    }

    Ok(stats)
}
