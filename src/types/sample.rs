//! Radar position samples

use tokio::time::Instant;

/// One normalized position report of the tracked object.
///
/// Coordinates are in the radar's frame: `x` is the signed lateral offset
/// from the door axis and `y` the distance from the sensor, both in mm.
/// `speed` is in cm/s, negative while the object moves towards the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub x: i32,
    pub y: i32,
    pub speed: i32,
    pub timestamp: Instant,
}

impl Sample {
    pub const fn new(x: i32, y: i32, speed: i32, timestamp: Instant) -> Self {
        Self {
            x,
            y,
            speed,
            timestamp,
        }
    }

    /// Copy of this sample stamped with a different acquisition time.
    #[must_use]
    pub const fn at(self, timestamp: Instant) -> Self {
        Self { timestamp, ..self }
    }

    /// True when the object sits exactly on the door axis.
    pub const fn is_on_axis(&self) -> bool {
        self.x == 0
    }

    /// Straight-line distance to the sensor in mm.
    pub fn distance_mm(&self) -> i32 {
        let (x, y) = (f64::from(self.x), f64::from(self.y));
        // hypot(i32::MIN, i32::MIN) exceeds i32::MAX
        x.hypot(y).round().min(f64::from(i32::MAX)) as i32
    }
}

/// Latest radar observation; `None` means "no object in view".
pub type Observation = Option<Sample>;
