//! Single-slot handoff between the reader stage and the decision loop.
//!
//! Backed by `tokio::sync::watch`: the producer overwrites the slot and never
//! waits, the consumer always sees the newest observation. Every publish
//! carries a sequence number so the consumer can count what it never saw.

use tokio::sync::watch;

use crate::types::Observation;

/// Create a connected handoff pair.
pub fn handoff() -> (HandoffSender, HandoffReceiver) {
    let (tx, rx) = watch::channel((0u64, None));
    (
        HandoffSender { tx, seq: 0 },
        HandoffReceiver {
            rx,
            last_seq: 0,
            overwritten: 0,
        },
    )
}

pub struct HandoffSender {
    tx: watch::Sender<(u64, Observation)>,
    seq: u64,
}

impl HandoffSender {
    /// Replace the slot content. Returns false once the consumer is gone.
    pub fn publish(&mut self, observation: Observation) -> bool {
        self.seq += 1;
        self.tx.send_replace((self.seq, observation));
        !self.tx.is_closed()
    }

    pub const fn published(&self) -> u64 {
        self.seq
    }
}

pub struct HandoffReceiver {
    rx: watch::Receiver<(u64, Observation)>,
    last_seq: u64,
    overwritten: u64,
}

impl HandoffReceiver {
    /// Wait for an observation newer than the last one taken.
    ///
    /// Returns `None` once the sender is dropped and the final value has
    /// been consumed.
    pub async fn next(&mut self) -> Option<Observation> {
        self.rx.changed().await.ok()?;
        let (seq, observation) = *self.rx.borrow_and_update();
        self.overwritten += seq.saturating_sub(self.last_seq + 1);
        self.last_seq = seq;
        Some(observation)
    }

    /// Observations replaced before the consumer got to them.
    pub const fn overwritten(&self) -> u64 {
        self.overwritten
    }
}
