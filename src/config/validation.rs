//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use super::gate_config::{ActuatorMode, GateConfig, IdentificationMode};

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for GateConfig.
///
/// Maintained by hand to match the struct hierarchy in gate_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [radar]
        "radar",
        "radar.model",
        "radar.device",
        "radar.poll_interval_secs",
        "radar.frame_timeout_secs",
        // [decision]
        "decision",
        "decision.history_size",
        "decision.trend_min_samples",
        "decision.speed_noise_threshold_cm_s",
        "decision.expected_approach_sign",
        "decision.sign_change_y_max_mm",
        "decision.sign_change_x_max_mm",
        "decision.cooldown_secs",
        "decision.comfort_delay_secs",
        // [identification]
        "identification",
        "identification.mode",
        "identification.max_duration_secs",
        "identification.command",
        "identification.args",
        // [actuator]
        "actuator",
        "actuator.mode",
        "actuator.codesend_path",
        "actuator.code_base",
        "actuator.min_relay_secs",
        "actuator.max_relay_secs",
        "actuator.relay_activation_secs",
        "actuator.min_interval_secs",
        // [status]
        "status",
        "status.queue_capacity",
        "status.proximity_feed",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            let message = format!("Unknown config key '{key}'");
            ValidationWarning {
                field: key,
                message,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

fn check_secs(value: f64, name: &str, allow_zero: bool, errors: &mut Vec<String>) {
    // NaN/Inf comparisons silently pass, catch them explicitly
    if !value.is_finite() {
        errors.push(format!("{name} = {value} must be finite"));
    } else if value < 0.0 || (!allow_zero && value == 0.0) {
        let bound = if allow_zero { ">= 0" } else { "> 0" };
        errors.push(format!("{name} = {value:.3} must be {bound}"));
    }
}

fn suspicious(field: &str, message: String) -> ValidationWarning {
    ValidationWarning {
        field: field.to_string(),
        message,
        suggestion: None,
    }
}

/// Validate value ranges on a parsed GateConfig.
///
/// Returns (errors, warnings). Errors are impossible values that must
/// prevent startup; warnings are suspicious but not fatal.
pub fn validate_ranges(config: &GateConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // --- radar ---
    let r = &config.radar;
    if r.device.trim().is_empty() {
        errors.push("radar.device must not be empty".to_string());
    }
    check_secs(r.poll_interval_secs, "radar.poll_interval_secs", false, &mut errors);
    check_secs(r.frame_timeout_secs, "radar.frame_timeout_secs", false, &mut errors);
    if r.frame_timeout_secs.is_finite() && r.frame_timeout_secs <= r.poll_interval_secs {
        errors.push(format!(
            "radar.frame_timeout_secs ({:.3}) must exceed radar.poll_interval_secs ({:.3})",
            r.frame_timeout_secs, r.poll_interval_secs
        ));
    }
    if r.poll_interval_secs > 0.25 {
        warnings.push(suspicious(
            "radar.poll_interval_secs",
            format!(
                "radar.poll_interval_secs = {:.3} is slow for trigger timing (typical 0.02-0.1)",
                r.poll_interval_secs
            ),
        ));
    }

    // --- decision ---
    let d = &config.decision;
    if d.history_size < 2 {
        errors.push(format!(
            "decision.history_size = {} must be >= 2 (a crossing needs two samples)",
            d.history_size
        ));
    }
    if d.trend_min_samples < 2 || d.trend_min_samples > d.history_size {
        errors.push(format!(
            "decision.trend_min_samples = {} must be within 2..={}",
            d.trend_min_samples, d.history_size
        ));
    }
    if !d.speed_noise_threshold_cm_s.is_finite() || d.speed_noise_threshold_cm_s < 0.0 {
        errors.push(format!(
            "decision.speed_noise_threshold_cm_s = {} must be finite and >= 0",
            d.speed_noise_threshold_cm_s
        ));
    }
    if d.sign_change_y_max_mm <= 0 {
        errors.push(format!(
            "decision.sign_change_y_max_mm = {} must be > 0",
            d.sign_change_y_max_mm
        ));
    }
    if d.sign_change_x_max_mm <= 0 {
        errors.push(format!(
            "decision.sign_change_x_max_mm = {} must be > 0",
            d.sign_change_x_max_mm
        ));
    }
    check_secs(d.cooldown_secs, "decision.cooldown_secs", true, &mut errors);
    check_secs(d.comfort_delay_secs, "decision.comfort_delay_secs", true, &mut errors);
    if d.comfort_delay_secs > d.cooldown_secs {
        warnings.push(suspicious(
            "decision.comfort_delay_secs",
            format!(
                "decision.comfort_delay_secs ({:.2}) exceeds decision.cooldown_secs ({:.2})",
                d.comfort_delay_secs, d.cooldown_secs
            ),
        ));
    }
    if d.sign_change_y_max_mm > 2_000 {
        warnings.push(suspicious(
            "decision.sign_change_y_max_mm",
            format!(
                "decision.sign_change_y_max_mm = {} opens the door far from the threshold",
                d.sign_change_y_max_mm
            ),
        ));
    }

    // --- identification ---
    let i = &config.identification;
    check_secs(i.max_duration_secs, "identification.max_duration_secs", false, &mut errors);
    if i.mode == IdentificationMode::Command && i.command.trim().is_empty() {
        errors.push("identification.command must be set when mode = \"command\"".to_string());
    }

    // --- actuator ---
    let a = &config.actuator;
    if a.min_relay_secs > a.max_relay_secs {
        errors.push(format!(
            "actuator.min_relay_secs ({}) must be <= actuator.max_relay_secs ({})",
            a.min_relay_secs, a.max_relay_secs
        ));
    }
    if a.relay_activation_secs < a.min_relay_secs || a.relay_activation_secs > a.max_relay_secs {
        errors.push(format!(
            "actuator.relay_activation_secs = {} must be within {}..={}",
            a.relay_activation_secs, a.min_relay_secs, a.max_relay_secs
        ));
    }
    check_secs(a.min_interval_secs, "actuator.min_interval_secs", true, &mut errors);
    if a.mode == ActuatorMode::Codesend && a.codesend_path.trim().is_empty() {
        errors.push("actuator.codesend_path must be set when mode = \"codesend\"".to_string());
    }

    // --- status ---
    if config.status.queue_capacity == 0 {
        errors.push("status.queue_capacity must be > 0".to_string());
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("radar", "radar"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("cooldwn_secs", "cooldown_secs"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let value: toml::Value = "[radar]\nmodel = \"rd03d\"\n".parse().unwrap();
        let keys = walk_toml_keys(&value, "");
        assert_eq!(keys, vec!["radar".to_string(), "radar.model".to_string()]);
    }

    #[test]
    fn test_typo_gets_suggestion() {
        let warnings = validate_unknown_keys("[decision]\ncooldown_sec = 2.0\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "decision.cooldown_sec");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("decision.cooldown_secs")
        );
    }

    #[test]
    fn test_far_off_key_has_no_suggestion() {
        let warnings = validate_unknown_keys("[webcam_module]\nflash_enabled = true\n");
        assert!(warnings.iter().all(|w| w.suggestion.is_none()));
        assert_eq!(warnings.len(), 2);
    }

    #[test]
    fn test_known_keys_produce_no_warnings() {
        let text = GateConfig::default().to_toml().unwrap();
        assert!(validate_unknown_keys(&text).is_empty());
    }

    #[test]
    fn test_zero_history_rejected() {
        let mut config = GateConfig::default();
        config.decision.history_size = 0;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("history_size")));
        assert!(errors.iter().any(|e| e.contains("trend_min_samples")));
    }

    #[test]
    fn test_nan_delay_rejected() {
        let mut config = GateConfig::default();
        config.decision.comfort_delay_secs = f64::NAN;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("comfort_delay_secs")));
    }

    #[test]
    fn test_relay_out_of_range_rejected() {
        let mut config = GateConfig::default();
        config.actuator.relay_activation_secs = 12;
        let (errors, _) = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("relay_activation_secs")));
    }

    #[test]
    fn test_slow_poll_only_warns() {
        let mut config = GateConfig::default();
        config.radar.poll_interval_secs = 0.5;
        let (errors, warnings) = validate_ranges(&config);
        assert!(errors.is_empty(), "{errors:?}");
        assert!(warnings.iter().any(|w| w.field == "radar.poll_interval_secs"));
    }
}
