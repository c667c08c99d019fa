//! Minimum-interval limiter for door open commands

use std::time::Duration;
use tokio::time::Instant;

/// Rejects commands that follow the previous one too closely.
#[derive(Debug, Clone)]
pub struct MinIntervalLimiter {
    min_interval: Duration,
    last_sent: Option<Instant>,
}

impl MinIntervalLimiter {
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_sent: None,
        }
    }

    /// Check if a command may be issued at `now`.
    pub fn permits(&self, now: Instant) -> bool {
        match self.last_sent {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        }
    }

    /// Record that a command was issued at `now`.
    pub fn record(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }

    /// Time left until the next command would be permitted.
    pub fn remaining(&self, now: Instant) -> Duration {
        self.last_sent.map_or(Duration::ZERO, |last| {
            self.min_interval
                .saturating_sub(now.saturating_duration_since(last))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_first_command() {
        let limiter = MinIntervalLimiter::new(Duration::from_secs(5));
        assert!(limiter.permits(Instant::now()));
    }

    #[test]
    fn suppresses_rapid_repeat() {
        let mut limiter = MinIntervalLimiter::new(Duration::from_secs(5));
        let t0 = Instant::now();
        limiter.record(t0);
        assert!(!limiter.permits(t0 + Duration::from_secs(2)));
        assert_eq!(limiter.remaining(t0 + Duration::from_secs(2)), Duration::from_secs(3));
    }

    #[test]
    fn allows_after_interval() {
        let mut limiter = MinIntervalLimiter::new(Duration::from_secs(5));
        let t0 = Instant::now();
        limiter.record(t0);
        assert!(limiter.permits(t0 + Duration::from_secs(5)));
    }

    #[test]
    fn zero_interval_never_blocks() {
        let mut limiter = MinIntervalLimiter::new(Duration::ZERO);
        let t0 = Instant::now();
        limiter.record(t0);
        assert!(limiter.permits(t0));
    }
}
