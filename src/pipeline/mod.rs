//! Runtime Pipeline
//!
//! ```text
//! SampleSource ─▶ Reader ─▶ handoff (watch, newest wins) ─▶ DecisionLoop
//!                                                             │
//!                      Identifier (child task) ◀──────────────┤
//!                      DoorActuator ◀─────────────────────────┤
//!                      StatusSink (mpsc, try_send) ◀──────────┘
//! ```
//!
//! The reader never blocks on the decision loop; the decision loop only
//! waits on the handoff, the comfort delay and the door command.

pub mod handoff;
pub mod processing_loop;
pub mod reader;
pub mod supervisor;

pub use handoff::{handoff, HandoffReceiver, HandoffSender};
pub use processing_loop::{GateStats, ProcessingLoop};
pub use reader::{run_reader, ReaderStats};
pub use supervisor::{run_gate, TaskName};
