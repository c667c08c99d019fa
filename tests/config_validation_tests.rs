//! Config Validation Tests
//!
//! Exercises typo detection and range validation of `GateConfig` through the
//! public loading API, independently from the rest of the gate.

use std::io::Write;

use radar_entry::config::validation::{
    known_config_keys, suggest_correction, validate_ranges, validate_unknown_keys,
};
use radar_entry::config::{ActuatorMode, ConfigError, GateConfig, IdentificationMode, RadarModel};
use radar_entry::types::ApproachSign;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_decision_section_warns_with_suggestion() {
    let toml_str = r#"
[decision]
sign_change_y_max = 450
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert_eq!(warnings[0].field, "decision.sign_change_y_max");
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("decision.sign_change_y_max_mm")
    );
}

#[test]
fn full_installation_config_produces_zero_warnings() {
    let toml_str = r#"
[radar]
model = "ld2450"
device = "/dev/ttyUSB0"
poll_interval_secs = 0.04
frame_timeout_secs = 1.5

[decision]
history_size = 9
trend_min_samples = 6
speed_noise_threshold_cm_s = 4.0
expected_approach_sign = "positive"
sign_change_y_max_mm = 450
sign_change_x_max_mm = 650
cooldown_secs = 4.0
comfort_delay_secs = 0.3

[identification]
mode = "command"
max_duration_secs = 1.2
command = "/opt/gate/beacon-scan"
args = ["--uuid", "f7826da6-4fa2-4e98-8024-bc5b71e0893e"]

[actuator]
mode = "codesend"
codesend_path = "/opt/gate/codesend"
code_base = 2000
min_relay_secs = 2
max_relay_secs = 8
relay_activation_secs = 5
min_interval_secs = 6.0

[status]
queue_capacity = 32
proximity_feed = true
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(
        warnings.is_empty(),
        "Valid config should produce 0 warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );

    let config = GateConfig::from_toml_str(toml_str).unwrap();
    assert_eq!(config.radar.model, RadarModel::Ld2450);
    assert_eq!(config.decision.expected_approach_sign, ApproachSign::Positive);
    assert_eq!(config.identification.args.len(), 2);
    assert_eq!(config.actuator.relay_code(), 2003);
    assert!(config.status.proximity_feed);
}

#[test]
fn multiple_typos_all_warned() {
    let toml_str = r#"
[radar]
devise = "/dev/ttyAMA0"

[actuator]
min_intervall_secs = 5.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(
        warnings.len(),
        2,
        "Expected 2 warnings for 2 typos, got {}",
        warnings.len()
    );
}

#[test]
fn default_config_serializes_to_known_keys_only() {
    let toml_str = GateConfig::default().to_toml().unwrap();
    let warnings = validate_unknown_keys(&toml_str);
    assert!(
        warnings.is_empty(),
        "Default config serialization should produce 0 unknown-key warnings, got: {:?}",
        warnings.iter().map(|w| &w.field).collect::<Vec<_>>()
    );
}

#[test]
fn suggest_correction_returns_none_for_garbage() {
    let known = known_config_keys();
    let s = suggest_correction("zzz_completely_invalid_xyz_12345", &known);
    assert!(s.is_none(), "Garbage string should not match anything");
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn defaults_are_valid() {
    let (errors, warnings) = validate_ranges(&GateConfig::default());
    assert!(errors.is_empty(), "{errors:?}");
    assert!(warnings.is_empty());
}

#[test]
fn trend_window_larger_than_history_is_error() {
    let mut config = GateConfig::default();
    config.decision.trend_min_samples = 8;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("trend_min_samples")));
}

#[test]
fn zero_poll_interval_is_error() {
    let mut config = GateConfig::default();
    config.radar.poll_interval_secs = 0.0;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("poll_interval_secs")));
}

#[test]
fn negative_cooldown_is_error() {
    let mut config = GateConfig::default();
    config.decision.cooldown_secs = -1.0;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("cooldown_secs")));
}

#[test]
fn comfort_delay_longer_than_cooldown_only_warns() {
    let mut config = GateConfig::default();
    config.decision.comfort_delay_secs = 5.0;
    let (errors, warnings) = validate_ranges(&config);
    assert!(errors.is_empty(), "{errors:?}");
    assert!(warnings
        .iter()
        .any(|w| w.field == "decision.comfort_delay_secs"));
}

#[test]
fn command_mode_needs_a_command() {
    let mut config = GateConfig::default();
    config.identification.mode = IdentificationMode::Command;
    config.identification.command = "  ".to_string();
    let (errors, _) = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("identification.command")));

    // Static modes do not care
    config.identification.mode = IdentificationMode::AlwaysDenied;
    let (errors, _) = validate_ranges(&config);
    assert!(errors.is_empty(), "{errors:?}");
}

#[test]
fn log_only_actuator_ignores_codesend_path() {
    let mut config = GateConfig::default();
    config.actuator.mode = ActuatorMode::LogOnly;
    config.actuator.codesend_path = String::new();
    let (errors, _) = validate_ranges(&config);
    assert!(errors.is_empty(), "{errors:?}");
}

// ============================================================================
// File Loading
// ============================================================================

#[test]
fn partial_file_keeps_other_defaults() {
    let file = write_config(
        r#"
[decision]
cooldown_secs = 5.0
"#,
    );
    let config = GateConfig::load_from_file(file.path()).unwrap();
    assert!((config.decision.cooldown_secs - 5.0).abs() < f64::EPSILON);
    assert_eq!(config.decision.history_size, 7);
    assert_eq!(config.radar.device, "/dev/ttyAMA2");
}

#[test]
fn invalid_values_block_loading() {
    let file = write_config(
        r#"
[decision]
history_size = 1
"#,
    );
    match GateConfig::load_from_file(file.path()) {
        Err(ConfigError::Validation(errors)) => {
            assert!(errors.iter().any(|e| e.contains("history_size")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn unknown_enum_value_is_parse_error() {
    let file = write_config(
        r#"
[radar]
model = "hlk2410"
"#,
    );
    let err = GateConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(ref path, _) if path == file.path()));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = GateConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}

#[test]
fn rendered_config_loads_back() {
    let mut config = GateConfig::default();
    config.decision.expected_approach_sign = ApproachSign::Positive;
    config.status.proximity_feed = true;
    let file = write_config(&config.to_toml().unwrap());
    let loaded = GateConfig::load_from_file(file.path()).unwrap();
    assert_eq!(loaded.decision.expected_approach_sign, ApproachSign::Positive);
    assert!(loaded.status.proximity_feed);
}
