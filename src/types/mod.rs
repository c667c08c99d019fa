//! Shared data structures for the radar entry controller
//!
//! - Sample / Observation: normalized radar position reports
//! - Phase, Intent, AuthStatus: the decision engine's per-track state
//! - ApproachSign: which lateral side counts as "coming towards the door"
//! - TrackId: identity of one approach episode

mod sample;
mod state;

pub use sample::*;
pub use state::*;
