//! Approach / departure classification from the sample history.
//!
//! A least-squares line of distance `y` over elapsed time gives the radial
//! velocity estimate; the mean lateral offset tells which side of the door
//! axis the object is on.

use std::time::Duration;

use super::history::History;
use crate::config::DecisionConfig;
use crate::types::{ApproachSign, Intent};

/// Tuning for [`classify`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendParams {
    /// Fewer samples than this classify as `Neutral`.
    pub min_samples: usize,
    /// Slopes within ±threshold (mm/s) are noise.
    pub threshold_mm_s: f64,
    pub expected_sign: ApproachSign,
    /// Spacing assumed between samples that share one timestamp.
    pub fallback_step: Duration,
}

impl TrendParams {
    pub fn from_config(config: &DecisionConfig, poll_interval: Duration) -> Self {
        Self {
            min_samples: config.trend_min_samples,
            threshold_mm_s: config.slope_threshold_mm_s(),
            expected_sign: config.expected_approach_sign,
            fallback_step: poll_interval,
        }
    }
}

/// Result of fitting the history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendFit {
    /// d(y)/dt in mm/s; negative while closing in.
    pub slope_mm_s: f64,
    /// Mean lateral offset in mm.
    pub mean_x: f64,
}

/// Ordinary least-squares slope of `ys` over `ts`.
fn ols_slope(ts: &[f64], ys: &[f64]) -> f64 {
    let n = ts.len() as f64;
    let t_mean = ts.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut sum_ty = 0.0;
    let mut sum_tt = 0.0;
    for (&t, &y) in ts.iter().zip(ys) {
        sum_ty += (t - t_mean) * (y - y_mean);
        sum_tt += (t - t_mean) * (t - t_mean);
    }

    if sum_tt.abs() < 1e-10 {
        return 0.0;
    }
    sum_ty / sum_tt
}

/// Fit the whole history. `None` with fewer than two samples.
pub fn fit(history: &History, fallback_step: Duration) -> Option<TrendFit> {
    if history.len() < 2 {
        return None;
    }
    let first = history.iter().next()?.timestamp;
    let mut ts: Vec<f64> = history
        .iter()
        .map(|s| s.timestamp.duration_since(first).as_secs_f64())
        .collect();
    let ys: Vec<f64> = history.iter().map(|s| f64::from(s.y)).collect();

    // Samples without usable timestamps are taken as one poll apart
    let spread = ts.last().copied().unwrap_or_default();
    if spread < 1e-9 {
        let step = fallback_step.as_secs_f64();
        ts = (0..ys.len()).map(|i| i as f64 * step).collect();
    }

    let mean_x = history.iter().map(|s| f64::from(s.x)).sum::<f64>() / history.len() as f64;
    Some(TrendFit {
        slope_mm_s: ols_slope(&ts, &ys),
        mean_x,
    })
}

/// Classify the current movement.
pub fn classify(history: &History, params: &TrendParams) -> Intent {
    if history.len() < params.min_samples.max(2) {
        return Intent::Neutral;
    }
    let Some(trend) = fit(history, params.fallback_step) else {
        return Intent::Neutral;
    };

    if trend.slope_mm_s < -params.threshold_mm_s && params.expected_sign.matches(trend.mean_x) {
        Intent::Approaching
    } else if trend.slope_mm_s > params.threshold_mm_s {
        Intent::Departing
    } else {
        Intent::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Sample;
    use tokio::time::Instant;

    fn params(sign: ApproachSign) -> TrendParams {
        TrendParams {
            min_samples: 7,
            threshold_mm_s: 50.0,
            expected_sign: sign,
            fallback_step: Duration::from_millis(50),
        }
    }

    fn history(points: &[(i32, i32)], dt_ms: u64) -> History {
        let t0 = Instant::now();
        let mut h = History::new(points.len().max(1));
        for (i, &(x, y)) in points.iter().enumerate() {
            h.push(Sample::new(x, y, 0, t0 + Duration::from_millis(dt_ms * i as u64)));
        }
        h
    }

    #[test]
    fn slope_in_mm_per_second() {
        let h = history(&[(0, 1000), (0, 950), (0, 900), (0, 850)], 50);
        let fit = fit(&h, Duration::from_millis(50)).unwrap();
        assert!((fit.slope_mm_s + 1000.0).abs() < 1e-6, "{}", fit.slope_mm_s);
    }

    #[test]
    fn approaching_on_expected_side() {
        let pts: Vec<(i32, i32)> = (0..7).map(|i| (300, 2300 - 300 * i)).collect();
        let h = history(&pts, 50);
        assert_eq!(classify(&h, &params(ApproachSign::Positive)), Intent::Approaching);
        // Same walk on the wrong side is not an approach
        assert_eq!(classify(&h, &params(ApproachSign::Negative)), Intent::Neutral);
    }

    #[test]
    fn receding_is_departing_on_either_side() {
        let pts: Vec<(i32, i32)> = (0..7).map(|i| (-200, 600 + 100 * i)).collect();
        let h = history(&pts, 50);
        assert_eq!(classify(&h, &params(ApproachSign::Positive)), Intent::Departing);
        assert_eq!(classify(&h, &params(ApproachSign::Negative)), Intent::Departing);
    }

    #[test]
    fn too_few_samples_is_neutral() {
        let pts: Vec<(i32, i32)> = (0..6).map(|i| (300, 2300 - 300 * i)).collect();
        let h = history(&pts, 50);
        assert_eq!(classify(&h, &params(ApproachSign::Positive)), Intent::Neutral);
    }

    #[test]
    fn slow_drift_is_neutral() {
        // 2 mm per 50 ms = 40 mm/s, below a 50 mm/s threshold
        let pts: Vec<(i32, i32)> = (0..7).map(|i| (300, 1500 - 2 * i)).collect();
        let h = history(&pts, 50);
        assert_eq!(classify(&h, &params(ApproachSign::Positive)), Intent::Neutral);
    }

    #[test]
    fn shared_timestamps_fall_back_to_poll_spacing() {
        let pts: Vec<(i32, i32)> = (0..7).map(|i| (300, 2000 - 100 * i)).collect();
        let h = history(&pts, 0);
        let fit = fit(&h, Duration::from_millis(50)).unwrap();
        assert!((fit.slope_mm_s + 2000.0).abs() < 1e-6);
        assert_eq!(classify(&h, &params(ApproachSign::Positive)), Intent::Approaching);
    }

    #[test]
    fn zero_mean_offset_matches_no_side() {
        let xs = [0, 10, -10, 10, -10, 20, -20];
        let pts: Vec<(i32, i32)> = xs.iter().zip(0..).map(|(&x, i)| (x, 2000 - 200 * i)).collect();
        let h = history(&pts, 50);
        let fit = fit(&h, Duration::from_millis(50)).unwrap();
        assert_eq!(fit.mean_x, 0.0);
        assert_eq!(classify(&h, &params(ApproachSign::Positive)), Intent::Neutral);
        assert_eq!(classify(&h, &params(ApproachSign::Negative)), Intent::Neutral);
    }
}
