//! Core state types: Phase, Intent, AuthStatus, ApproachSign, TrackId

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

// ============================================================================
// Engine Phase
// ============================================================================

/// Top-level phase of the decision engine.
///
/// The cooldown deadline only exists while the engine is cooling down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Tracking,
    Cooldown { until: Instant },
}

impl Phase {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_tracking(&self) -> bool {
        matches!(self, Self::Tracking)
    }

    pub const fn is_cooldown(&self) -> bool {
        matches!(self, Self::Cooldown { .. })
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Idle => write!(f, "IDLE"),
            Phase::Tracking => write!(f, "TRACKING"),
            Phase::Cooldown { .. } => write!(f, "COOLDOWN"),
        }
    }
}

// ============================================================================
// Movement Intent (Trend Analysis Output)
// ============================================================================

/// Classified movement of the tracked object relative to the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Intent {
    #[default]
    Neutral,
    Approaching,
    Departing,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Neutral => write!(f, "NEUTRAL"),
            Intent::Approaching => write!(f, "APPROACHING"),
            Intent::Departing => write!(f, "DEPARTING"),
        }
    }
}

// ============================================================================
// Authorization Status
// ============================================================================

/// Cached identification result for the current track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum AuthStatus {
    #[default]
    Unknown,
    Pending,
    Authorized,
    Denied,
}

impl AuthStatus {
    /// Whether a new identification check may be started from this status.
    pub const fn needs_check(&self) -> bool {
        matches!(self, Self::Unknown | Self::Denied)
    }
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthStatus::Unknown => write!(f, "UNKNOWN"),
            AuthStatus::Pending => write!(f, "PENDING"),
            AuthStatus::Authorized => write!(f, "AUTHORIZED"),
            AuthStatus::Denied => write!(f, "DENIED"),
        }
    }
}

// ============================================================================
// Approach Side
// ============================================================================

/// Lateral side from which an approaching person is expected.
///
/// Depends on how the sensor is mounted relative to the walkway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApproachSign {
    Positive,
    #[default]
    Negative,
}

impl ApproachSign {
    /// Does a mean lateral offset lie on the expected side?
    ///
    /// Zero lies on neither side.
    pub fn matches(self, mean_x: f64) -> bool {
        match self {
            Self::Positive => mean_x > 0.0,
            Self::Negative => mean_x < 0.0,
        }
    }
}

impl std::fmt::Display for ApproachSign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApproachSign::Positive => write!(f, "positive"),
            ApproachSign::Negative => write!(f, "negative"),
        }
    }
}

// ============================================================================
// Track Identity
// ============================================================================

/// Identity of one approach episode, from first sighting to the next IDLE.
///
/// Identification results carry the id of the track that requested them so
/// late answers for a vanished track can be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TrackId(pub u64);

impl TrackId {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}
