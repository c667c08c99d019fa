//! Synthetic walker for bench runs without radar hardware.
//!
//! Repeatedly lets a person appear at ~2.6 m on the configured approach side,
//! walk to the door crossing the axis at ~400 mm and vanish. Every fourth
//! walker turns around halfway and leaves instead. Positions carry Gaussian
//! noise similar to what the RD-03D reports at walking speed.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, NormalError};
use std::time::Duration;
use tokio::time::Instant;

use super::{SampleSource, SourceError, SourceEvent};
use crate::config::defaults::{
    SIM_END_DISTANCE_MM, SIM_IDLE_GAP_SECS, SIM_START_DISTANCE_MM, SIM_WALK_SPEED_MM_S,
};
use crate::types::{ApproachSign, Sample};

/// Distance at which the walker crosses the door axis (mm).
const CROSSING_Y_MM: f64 = 400.0;
/// Lateral offset at first sighting (mm).
const START_OFFSET_MM: f64 = 450.0;
/// Position noise (mm, one sigma).
const POSITION_SIGMA_MM: f64 = 12.0;

#[derive(Debug, Clone, Copy)]
enum Walker {
    Absent { remaining: f64 },
    Approaching { y: f64, turns_at: Option<f64> },
    Leaving { y: f64, x: f64 },
}

pub struct SimulatedSource {
    rng: StdRng,
    noise: Normal<f64>,
    side: f64,
    step: Duration,
    walker: Walker,
    walkers_started: u64,
}

impl SimulatedSource {
    /// `step` is the simulated time between two polls.
    pub fn new(approach: ApproachSign, step: Duration, seed: u64) -> Result<Self, NormalError> {
        let side = match approach {
            ApproachSign::Positive => 1.0,
            ApproachSign::Negative => -1.0,
        };
        Ok(Self {
            rng: StdRng::seed_from_u64(seed),
            side,
            step,
            walker: Walker::Absent { remaining: 0.5 },
            walkers_started: 0,
            noise: Normal::new(0.0, POSITION_SIGMA_MM)?,
        })
    }

    pub const fn walkers_started(&self) -> u64 {
        self.walkers_started
    }

    /// Lateral offset on a straight line through the crossing point.
    fn lateral(&self, y: f64) -> f64 {
        self.side * START_OFFSET_MM * (y - CROSSING_Y_MM) / (SIM_START_DISTANCE_MM - CROSSING_Y_MM)
    }

    fn advance(&mut self) -> Option<(f64, f64, f64)> {
        let dt = self.step.as_secs_f64();
        let stride = SIM_WALK_SPEED_MM_S * dt;
        let speed_cm_s = SIM_WALK_SPEED_MM_S / 10.0;

        self.walker = match self.walker {
            Walker::Absent { remaining } if remaining - dt > 0.0 => Walker::Absent {
                remaining: remaining - dt,
            },
            Walker::Absent { .. } => {
                self.walkers_started += 1;
                let turns_at = (self.walkers_started % 4 == 0).then(|| {
                    self.rng.gen_range(1_200.0..1_800.0)
                });
                Walker::Approaching {
                    y: SIM_START_DISTANCE_MM,
                    turns_at,
                }
            }
            Walker::Approaching { y, turns_at } => {
                let y = y - stride;
                match turns_at {
                    Some(turn) if y <= turn => Walker::Leaving {
                        y,
                        x: self.lateral(y),
                    },
                    _ if y <= SIM_END_DISTANCE_MM => Walker::Absent {
                        remaining: SIM_IDLE_GAP_SECS,
                    },
                    _ => Walker::Approaching { y, turns_at },
                }
            }
            Walker::Leaving { y, x } => {
                let y = y + stride;
                if y >= SIM_START_DISTANCE_MM {
                    Walker::Absent {
                        remaining: SIM_IDLE_GAP_SECS,
                    }
                } else {
                    Walker::Leaving { y, x }
                }
            }
        };

        match self.walker {
            Walker::Absent { .. } => None,
            Walker::Approaching { y, .. } => Some((self.lateral(y), y, -speed_cm_s)),
            Walker::Leaving { y, x } => Some((x, y, speed_cm_s)),
        }
    }
}

#[async_trait]
impl SampleSource for SimulatedSource {
    async fn poll_latest(&mut self) -> Result<SourceEvent, SourceError> {
        let Some((x, y, speed)) = self.advance() else {
            return Ok(SourceEvent::Observation(None));
        };
        let jx = self.noise.sample(&mut self.rng);
        let jy = self.noise.sample(&mut self.rng);
        #[allow(clippy::cast_possible_truncation)]
        let sample = Sample::new(
            (x + jx).round() as i32,
            (y + jy).round().max(0.0) as i32,
            speed.round() as i32,
            Instant::now(),
        );
        Ok(SourceEvent::Observation(Some(sample)))
    }

    fn source_name(&self) -> &str {
        "simulated"
    }
}
