//! Gate Configuration Module
//!
//! Per-installation configuration loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `RADAR_ENTRY_CONFIG` environment variable (path to TOML file)
//! 2. `radar_entry.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The loaded [`GateConfig`] is handed to each component at construction;
//! there is no process-wide config handle.

mod gate_config;
pub mod defaults;
pub mod validation;

pub use gate_config::*;
