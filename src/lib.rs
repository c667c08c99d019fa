//! radar-entry: radar-driven door entry controller
//!
//! Watches a person approaching a door with a 24 GHz mmWave radar, checks
//! their credential on demand and opens the door when an authorized person
//! actually crosses the door axis.
//!
//! ## Architecture
//!
//! - **Acquisition**: RD-03D / LD2450 UART radars, JSON-lines replay, simulator
//! - **Engine**: IDLE / TRACKING / COOLDOWN state machine with trend and trigger blocks
//! - **Gateways**: beacon identification, 433 MHz door actuator, status sink
//! - **Pipeline**: reader stage, decision loop and task supervision

pub mod acquisition;
pub mod config;
pub mod engine;
pub mod gateways;
pub mod pipeline;
pub mod types;

// Re-export configuration
pub use config::{ConfigError, GateConfig};

// Re-export commonly used types
pub use types::{ApproachSign, AuthStatus, Intent, Observation, Phase, Sample, TrackId};

// Re-export the engine
pub use engine::{DecisionEngine, EngineAction, IdentificationOutcome};

// Re-export sources and gateways
pub use acquisition::{open_source, SampleSource, SourceError, SourceEvent};
pub use gateways::{DoorActuator, Identifier, OpenOutcome, StatusEvent};

// Re-export the runtime
pub use pipeline::{run_gate, GateStats};
