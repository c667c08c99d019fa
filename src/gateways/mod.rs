//! External gateways: identification, door actuator and status sink.

pub mod actuator;
pub mod identification;
pub mod rate_limiter;
pub mod status;

pub use actuator::{
    build_actuator, ActuatorError, CodesendActuator, DoorActuator, LogActuator, OpenOutcome,
};
pub use identification::{
    build_identifier, CommandIdentifier, IdentificationError, Identifier, StaticIdentifier,
};
pub use rate_limiter::MinIntervalLimiter;
pub use status::{run_status_logger, status_channel, StatusEvent, StatusSink};
