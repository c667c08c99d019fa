//! Gate Configuration - every tunable of the entry controller as TOML values
//!
//! Each struct implements `Default` with the values the controller was
//! commissioned with, so a missing config file yields a working gate.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::types::ApproachSign;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "RADAR_ENTRY_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "radar_entry.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one door installation.
///
/// Load with `GateConfig::load()` which searches:
/// 1. `$RADAR_ENTRY_CONFIG` env var
/// 2. `./radar_entry.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateConfig {
    /// Radar hardware and polling
    #[serde(default)]
    pub radar: RadarConfig,

    /// Decision engine tuning
    #[serde(default)]
    pub decision: DecisionConfig,

    /// On-demand identification
    #[serde(default)]
    pub identification: IdentificationConfig,

    /// Door actuator
    #[serde(default)]
    pub actuator: ActuatorConfig,

    /// Status feedback channel
    #[serde(default)]
    pub status: StatusConfig,
}

impl GateConfig {
    /// Load configuration using the standard search order:
    /// 1. `$RADAR_ENTRY_CONFIG` environment variable
    /// 2. `./radar_entry.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), model = %config.radar.model, "Loaded gate config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./radar_entry.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(model = %config.radar.model, "Loaded gate config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys and suspicious values are logged as warnings; impossible
    /// values are rejected.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all values for internal consistency.
    ///
    /// Hard errors block startup; suspicious values are only logged.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!(field = %w.field, "{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Convert validated seconds into a `Duration`.
///
/// Invalid values (negative, NaN, overflow) collapse to zero; `validate()`
/// rejects them before they reach this point.
pub(crate) fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Radar
// ============================================================================

/// Supported radar modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadarModel {
    #[default]
    Rd03d,
    Ld2450,
}

impl std::fmt::Display for RadarModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RadarModel::Rd03d => write!(f, "RD-03D"),
            RadarModel::Ld2450 => write!(f, "LD2450"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadarConfig {
    /// Which module is wired to the UART
    #[serde(default)]
    pub model: RadarModel,

    /// Serial device node
    #[serde(default = "default_device")]
    pub device: String,

    /// Reader stage poll cadence (seconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: f64,

    /// No complete frame for this long means the radar is gone (seconds)
    #[serde(default = "default_frame_timeout")]
    pub frame_timeout_secs: f64,
}

fn default_device() -> String {
    "/dev/ttyAMA2".to_string()
}
fn default_poll_interval() -> f64 { 0.05 }
fn default_frame_timeout() -> f64 { 2.0 }

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            model: RadarModel::default(),
            device: default_device(),
            poll_interval_secs: default_poll_interval(),
            frame_timeout_secs: default_frame_timeout(),
        }
    }
}

impl RadarConfig {
    pub fn poll_interval(&self) -> Duration {
        secs(self.poll_interval_secs)
    }

    pub fn frame_timeout(&self) -> Duration {
        secs(self.frame_timeout_secs)
    }
}

// ============================================================================
// Decision Engine
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Samples retained for trend analysis
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Minimum samples before a trend is classified
    #[serde(default = "default_trend_min_samples")]
    pub trend_min_samples: usize,

    /// Distance slopes below this magnitude are noise (cm/s)
    #[serde(default = "default_speed_noise_threshold")]
    pub speed_noise_threshold_cm_s: f64,

    /// Lateral side an approaching person is expected on
    #[serde(default)]
    pub expected_approach_sign: ApproachSign,

    /// Axis crossings farther away than this are ignored (mm)
    #[serde(default = "default_sign_change_y_max")]
    pub sign_change_y_max_mm: i32,

    /// Lateral offset before the crossing must be within this (mm)
    #[serde(default = "default_sign_change_x_max")]
    pub sign_change_x_max_mm: i32,

    /// Quiet period after the door opened (seconds)
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: f64,

    /// Pause between trigger and open command (seconds)
    #[serde(default = "default_comfort_delay")]
    pub comfort_delay_secs: f64,
}

fn default_history_size() -> usize { 7 }
fn default_trend_min_samples() -> usize { 7 }
fn default_speed_noise_threshold() -> f64 { 5.0 }
fn default_sign_change_y_max() -> i32 { 500 }
fn default_sign_change_x_max() -> i32 { 700 }
fn default_cooldown() -> f64 { 3.0 }
fn default_comfort_delay() -> f64 { 0.5 }

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            trend_min_samples: default_trend_min_samples(),
            speed_noise_threshold_cm_s: default_speed_noise_threshold(),
            expected_approach_sign: ApproachSign::default(),
            sign_change_y_max_mm: default_sign_change_y_max(),
            sign_change_x_max_mm: default_sign_change_x_max(),
            cooldown_secs: default_cooldown(),
            comfort_delay_secs: default_comfort_delay(),
        }
    }
}

impl DecisionConfig {
    pub fn cooldown(&self) -> Duration {
        secs(self.cooldown_secs)
    }

    pub fn comfort_delay(&self) -> Duration {
        secs(self.comfort_delay_secs)
    }

    /// Slope threshold in mm/s.
    pub fn slope_threshold_mm_s(&self) -> f64 {
        self.speed_noise_threshold_cm_s * 10.0
    }
}

// ============================================================================
// Identification
// ============================================================================

/// How identification requests are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentificationMode {
    /// Run an external beacon scanner command
    #[default]
    Command,
    /// Every request is authorized (bench testing)
    AlwaysAuthorized,
    /// Every request is denied
    AlwaysDenied,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentificationConfig {
    #[serde(default)]
    pub mode: IdentificationMode,

    /// Upper bound for one identification check (seconds)
    #[serde(default = "default_identification_duration")]
    pub max_duration_secs: f64,

    /// Scanner executable; exit status 0 means a known beacon was seen
    #[serde(default = "default_scanner_command")]
    pub command: String,

    /// Extra scanner arguments; `--duration <secs>` is appended
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_identification_duration() -> f64 { 1.5 }
fn default_scanner_command() -> String {
    "/usr/local/bin/beacon-scan".to_string()
}

impl Default for IdentificationConfig {
    fn default() -> Self {
        Self {
            mode: IdentificationMode::default(),
            max_duration_secs: default_identification_duration(),
            command: default_scanner_command(),
            args: Vec::new(),
        }
    }
}

impl IdentificationConfig {
    pub fn max_duration(&self) -> Duration {
        secs(self.max_duration_secs)
    }
}

// ============================================================================
// Actuator
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorMode {
    /// Send a 433 MHz relay code through `codesend`
    #[default]
    Codesend,
    /// Only log open commands (dry run)
    LogOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActuatorConfig {
    #[serde(default)]
    pub mode: ActuatorMode,

    #[serde(default = "default_codesend_path")]
    pub codesend_path: String,

    /// Code for the shortest relay activation
    #[serde(default = "default_code_base")]
    pub code_base: u32,

    #[serde(default = "default_min_relay")]
    pub min_relay_secs: u32,

    #[serde(default = "default_max_relay")]
    pub max_relay_secs: u32,

    /// How long the relay holds the door open
    #[serde(default = "default_relay_activation")]
    pub relay_activation_secs: u32,

    /// Open commands closer together than this are suppressed (seconds)
    #[serde(default = "default_min_interval")]
    pub min_interval_secs: f64,
}

fn default_codesend_path() -> String {
    "/usr/local/bin/codesend".to_string()
}
fn default_code_base() -> u32 { 1012 }
fn default_min_relay() -> u32 { 3 }
fn default_max_relay() -> u32 { 10 }
fn default_relay_activation() -> u32 { 4 }
fn default_min_interval() -> f64 { 5.0 }

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            mode: ActuatorMode::default(),
            codesend_path: default_codesend_path(),
            code_base: default_code_base(),
            min_relay_secs: default_min_relay(),
            max_relay_secs: default_max_relay(),
            relay_activation_secs: default_relay_activation(),
            min_interval_secs: default_min_interval(),
        }
    }
}

impl ActuatorConfig {
    /// Relay code for the configured activation time.
    ///
    /// `code_base` selects `min_relay_secs`; each extra second adds one.
    pub fn relay_code(&self) -> u32 {
        self.code_base + self.relay_activation_secs.saturating_sub(self.min_relay_secs)
    }

    pub fn min_interval(&self) -> Duration {
        secs(self.min_interval_secs)
    }
}

// ============================================================================
// Status Feedback
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Bounded queue towards the display; overflow drops events
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Also publish distance / axis-crossing updates for every tracked sample
    #[serde(default)]
    pub proximity_feed: bool,
}

fn default_queue_capacity() -> usize { 16 }

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            proximity_feed: false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
