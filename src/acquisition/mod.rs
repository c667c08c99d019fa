//! Radar Sample Acquisition
//!
//! Provides a unified trait for obtaining the latest position observation from
//! different sources: the RD-03D and LD2450 UART radars, a JSON-lines replay
//! (file or stdin) and a synthetic walker for bench runs.
//!
//! Hardware is picked once at startup by [`open_source`]; everything
//! downstream only sees `Box<dyn SampleSource>`.

pub mod frame;
pub mod ld2450;
pub mod rd03d;
pub mod replay;
pub mod serial;
pub mod simulated;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::config::{GateConfig, RadarModel};
use crate::types::Observation;

pub use replay::ReplaySource;
pub use serial::SerialRadarSource;
pub use simulated::SimulatedSource;

// ============================================================================
// Source Events
// ============================================================================

/// Events produced by a sample source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEvent {
    /// Latest view of the scene; `None` means no object detected.
    Observation(Observation),
    /// Source reached end of data (replay files / stdin).
    Eof,
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to open radar device {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Radar link closed (zero-length read)")]
    Disconnected,

    #[error("No complete radar frame for {silent_for:?}")]
    Stalled { silent_for: Duration },

    #[error("Radar configuration step '{step}' was not acknowledged")]
    Handshake { step: &'static str },
}

// ============================================================================
// Source Trait
// ============================================================================

/// Trait abstracting where position samples come from.
///
/// Implementations handle framing, decoding and hardware quirks internally.
/// The reader stage calls [`poll_latest`](SampleSource::poll_latest) once per
/// tick and publishes whatever it returns.
#[async_trait]
pub trait SampleSource: Send + 'static {
    /// Return the most recent observation.
    ///
    /// Returns `SourceEvent::Eof` when no more data is available.
    /// Returns `Err` on unrecoverable failures (link lost, radar stalled).
    async fn poll_latest(&mut self) -> Result<SourceEvent, SourceError>;

    /// Human-readable name for logging (e.g. "RD-03D", "replay", "simulated").
    fn source_name(&self) -> &str;
}

/// Open the radar configured in `config.radar`.
///
/// Runs the module's configuration handshake before returning.
pub async fn open_source(config: &GateConfig) -> Result<Box<dyn SampleSource>, SourceError> {
    let radar = &config.radar;
    let protocol = match radar.model {
        RadarModel::Rd03d => &rd03d::RD03D,
        RadarModel::Ld2450 => &ld2450::LD2450,
    };
    let source = SerialRadarSource::open(&radar.device, protocol, radar.frame_timeout()).await?;
    Ok(Box::new(source))
}
