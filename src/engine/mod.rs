//! Decision Engine
//!
//! Turns the stream of radar observations into door-open decisions:
//! - `history`: bounded window of recent samples
//! - `trend`: approach / departure classification
//! - `trigger`: door-axis crossing detection
//! - `state_machine`: IDLE / TRACKING / COOLDOWN orchestration

pub mod history;
pub mod state_machine;
pub mod trend;
pub mod trigger;

pub use history::History;
pub use state_machine::{
    DecisionEngine, EngineAction, EngineSnapshot, EngineStats, IdentificationOutcome,
};
pub use trend::{TrendFit, TrendParams};
pub use trigger::{Crossing, Rejection, TriggerParams, TriggerVerdict};
