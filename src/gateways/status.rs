//! Status sink: best-effort notifications towards a display or indicator.
//!
//! Events never block the decision loop. A full or closed queue drops the
//! event and bumps a counter. Denials produce no event.

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::defaults::ACCESS_GRANTED_DISPLAY_SECS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// The door was commanded open.
    AccessGranted,
    /// Distance to the tracked person, emitted per sample when enabled.
    Proximity { distance_mm: i32, axis_crossed: bool },
}

/// Producer half held by the decision loop.
pub struct StatusSink {
    tx: mpsc::Sender<StatusEvent>,
    dropped: u64,
}

impl StatusSink {
    /// Queue `event` without waiting. Returns false when it was dropped.
    pub fn notify(&mut self, event: StatusEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(ev)) => {
                self.dropped += 1;
                debug!(?ev, dropped = self.dropped, "Status queue full, event dropped");
                false
            }
            Err(TrySendError::Closed(ev)) => {
                self.dropped += 1;
                debug!(?ev, "Status consumer gone, event dropped");
                false
            }
        }
    }

    pub const fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Bounded status channel; capacity is clamped to at least 1.
pub fn status_channel(capacity: usize) -> (StatusSink, mpsc::Receiver<StatusEvent>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (StatusSink { tx, dropped: 0 }, rx)
}

/// Default status consumer: logs each event until cancelled or the sink
/// is dropped. Returns the number of events consumed.
pub async fn run_status_logger(
    mut rx: mpsc::Receiver<StatusEvent>,
    cancel_token: CancellationToken,
) -> u64 {
    let mut consumed = 0u64;
    loop {
        let event = tokio::select! {
            _ = cancel_token.cancelled() => break,
            ev = rx.recv() => match ev {
                Some(ev) => ev,
                None => break,
            },
        };
        consumed += 1;
        match event {
            StatusEvent::AccessGranted => {
                info!(display_secs = ACCESS_GRANTED_DISPLAY_SECS, "✅ ACCESS GRANTED");
            }
            StatusEvent::Proximity {
                distance_mm,
                axis_crossed,
            } => {
                debug!(distance_mm, axis_crossed, "Proximity");
            }
        }
    }
    debug!(consumed, "[StatusLogger] Stopped");
    consumed
}
