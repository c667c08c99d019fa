//! System-wide default constants.
//!
//! Values that are not operator-tunable but still need a single home.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Radar Link
// ============================================================================

/// UART baud rate of both supported radar modules (8N1).
pub const RADAR_BAUD_RATE: u32 = 256_000;

/// Length of one report frame (header + 3 target slots + tail).
pub const FRAME_LEN: usize = 30;

/// Receive buffer limit; once exceeded only the newest bytes are kept.
pub const RX_BUFFER_LIMIT: usize = 300;

/// Bytes kept when the receive buffer overflows.
pub const RX_BUFFER_KEEP: usize = 150;

/// Upper bound for a single UART read while polling (ms).
pub const READ_SLICE_MS: u64 = 20;

/// How long to wait for a configuration ACK from the LD2450 (ms).
pub const ACK_TIMEOUT_MS: u64 = 1_000;

// ============================================================================
// Decision Engine
// ============================================================================

/// Rejected trigger candidates closer than this (mm) log at debug, farther at trace.
pub const DIAGNOSTIC_LOG_Y_THRESHOLD_MM: i32 = 2_200;

// ============================================================================
// Status Feedback
// ============================================================================

/// How long the display keeps an "access granted" notice (seconds).
pub const ACCESS_GRANTED_DISPLAY_SECS: u64 = 5;

// ============================================================================
// Supervision
// ============================================================================

/// Bounded join applied to remaining tasks during shutdown (seconds).
pub const SHUTDOWN_JOIN_TIMEOUT_SECS: u64 = 5;

/// Engine statistics are logged every this many processed samples.
pub const STATS_LOG_EVERY_SAMPLES: u64 = 1_200;

// ============================================================================
// Simulation
// ============================================================================

/// Distance at which a simulated walker appears (mm).
pub const SIM_START_DISTANCE_MM: f64 = 2_600.0;

/// Distance at which a simulated walker vanishes behind the door (mm).
pub const SIM_END_DISTANCE_MM: f64 = 150.0;

/// Walking speed of the simulated person (mm/s).
pub const SIM_WALK_SPEED_MM_S: f64 = 1_000.0;

/// Empty-scene pause between simulated walkers (seconds).
pub const SIM_IDLE_GAP_SECS: f64 = 4.0;
