//! Door trigger detection: the moment an approaching, authorized person
//! crosses the door axis close to the door.

use crate::config::DecisionConfig;
use crate::types::Sample;

/// Geometric limits for a valid crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerParams {
    /// Crossings farther than this distance (mm) are ignored.
    pub y_max_mm: i32,
    /// The lateral offset before the crossing must be within this (mm).
    pub x_max_mm: i32,
}

impl TriggerParams {
    pub const fn from_config(config: &DecisionConfig) -> Self {
        Self {
            y_max_mm: config.sign_change_y_max_mm,
            x_max_mm: config.sign_change_x_max_mm,
        }
    }
}

/// How the door axis was crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crossing {
    /// Lateral offset changed sign between two samples.
    SignFlip,
    /// Object sits exactly on the axis.
    OnAxis,
}

/// Why a crossing candidate was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    TooFar { y: i32 },
    TooWide { x_prev: i32 },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::TooFar { y } => write!(f, "crossing too far from door (y={y} mm)"),
            Rejection::TooWide { x_prev } => {
                write!(f, "approach too wide before crossing (x_prev={x_prev} mm)")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerVerdict {
    /// No crossing between the two samples.
    NoCandidate,
    /// Crossing seen but outside the geometric limits.
    Rejected(Crossing, Rejection),
    /// Open the door.
    Fire(Crossing),
}

/// Evaluate the step from `prev` to `now`.
pub fn evaluate(prev: &Sample, now: &Sample, params: &TriggerParams) -> TriggerVerdict {
    let crossing = if now.is_on_axis() {
        Crossing::OnAxis
    } else if i64::from(prev.x) * i64::from(now.x) < 0 {
        Crossing::SignFlip
    } else {
        return TriggerVerdict::NoCandidate;
    };

    if now.y > params.y_max_mm {
        TriggerVerdict::Rejected(crossing, Rejection::TooFar { y: now.y })
    } else if prev.x.unsigned_abs() > params.x_max_mm.unsigned_abs() {
        TriggerVerdict::Rejected(crossing, Rejection::TooWide { x_prev: prev.x })
    } else {
        TriggerVerdict::Fire(crossing)
    }
}
