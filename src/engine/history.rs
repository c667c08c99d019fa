//! Bounded sample history of the tracked object

use std::collections::VecDeque;

use crate::types::Sample;

/// Fixed-capacity window of the most recent samples, oldest first.
///
/// Timestamps never go backwards: a sample older than the newest entry is
/// stored with the newest entry's timestamp.
#[derive(Debug, Clone)]
pub struct History {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a sample, evicting the oldest one when full.
    pub fn push(&mut self, sample: Sample) {
        let sample = match self.samples.back() {
            Some(last) if sample.timestamp < last.timestamp => sample.at(last.timestamp),
            _ => sample,
        };
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// The sample before the latest one.
    pub fn previous(&self) -> Option<&Sample> {
        self.samples.len().checked_sub(2).and_then(|i| self.samples.get(i))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Sample> + '_ {
        self.samples.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    fn sample(y: i32, at: Instant) -> Sample {
        Sample::new(0, y, 0, at)
    }

    #[test]
    fn evicts_oldest_when_full() {
        let t0 = Instant::now();
        let mut h = History::new(3);
        for (i, y) in [1000, 900, 800, 700].into_iter().enumerate() {
            h.push(sample(y, t0 + Duration::from_millis(50 * i as u64)));
        }
        assert_eq!(h.len(), 3);
        let ys: Vec<i32> = h.iter().map(|s| s.y).collect();
        assert_eq!(ys, vec![900, 800, 700]);
    }

    #[test]
    fn previous_and_latest() {
        let t0 = Instant::now();
        let mut h = History::new(5);
        assert!(h.previous().is_none());
        h.push(sample(600, t0));
        assert!(h.previous().is_none());
        h.push(sample(550, t0 + Duration::from_millis(50)));
        assert_eq!(h.previous().unwrap().y, 600);
        assert_eq!(h.latest().unwrap().y, 550);
    }

    #[test]
    fn out_of_order_timestamp_is_clamped() {
        let t0 = Instant::now();
        let mut h = History::new(4);
        h.push(sample(800, t0 + Duration::from_millis(100)));
        h.push(sample(750, t0));
        let stamps: Vec<Instant> = h.iter().map(|s| s.timestamp).collect();
        assert_eq!(stamps[0], stamps[1]);
    }

    #[test]
    fn zero_capacity_still_holds_one() {
        let mut h = History::new(0);
        h.push(sample(1, Instant::now()));
        h.push(sample(2, Instant::now()));
        assert_eq!(h.len(), 1);
        assert_eq!(h.capacity(), 1);
    }
}
