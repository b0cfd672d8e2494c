//! Per-metric evaluation and per-unit status rollup.

use crate::config::ThresholdConfig;
use crate::model::{MetricDelta, MetricOutcome, UnitStatus};

/// Evaluate a ratio metric. Returns the signed percent deviation (when
/// computable) and the outcome. The acceptance band is boundary
/// inclusive on both sides.
///
/// A primary value of exactly zero makes the deviation undefined: with
/// a non-zero secondary value that is a failure in its own right, with
/// a zero secondary there is nothing to compare.
pub fn ratio_outcome(
    primary: Option<f64>,
    secondary: Option<f64>,
    thresholds: &ThresholdConfig,
) -> (Option<f64>, MetricOutcome) {
    let (Some(p), Some(s)) = (primary, secondary) else {
        return (None, MetricOutcome::Insufficient);
    };
    if p == 0.0 {
        let outcome = if s == 0.0 {
            MetricOutcome::Insufficient
        } else {
            MetricOutcome::Undefined
        };
        return (None, outcome);
    }

    let deviation = (s - p) / p * 100.0;
    let lower = thresholds.lower_margin_pct;
    let upper = thresholds.upper_margin_pct;

    let outcome = if (-lower..=upper).contains(&deviation) {
        MetricOutcome::Pass
    } else if let Some(band) = thresholds.warning_band {
        if (-lower * band..=upper * band).contains(&deviation) {
            MetricOutcome::Marginal
        } else if deviation < 0.0 {
            MetricOutcome::TooLow
        } else {
            MetricOutcome::TooHigh
        }
    } else if deviation < 0.0 {
        MetricOutcome::TooLow
    } else {
        MetricOutcome::TooHigh
    };

    (Some(deviation), outcome)
}

/// Evaluate a magnitude metric: pass when the secondary value is at or
/// below the ceiling. No ratio is computed.
pub fn magnitude_outcome(secondary: Option<f64>, ceiling: f64) -> MetricOutcome {
    match secondary {
        None => MetricOutcome::Insufficient,
        Some(v) if v <= ceiling => MetricOutcome::Pass,
        Some(_) => MetricOutcome::ExceedsCeiling,
    }
}

/// Roll metric outcomes up to one categorical unit status. Multiple
/// failing metrics do not escalate beyond `Fail`.
pub fn overall_status(metrics: &[MetricDelta]) -> UnitStatus {
    let mut marginal = false;
    for m in metrics {
        match m.outcome {
            MetricOutcome::TooLow
            | MetricOutcome::TooHigh
            | MetricOutcome::ExceedsCeiling
            | MetricOutcome::Undefined => return UnitStatus::Fail,
            MetricOutcome::Marginal => marginal = true,
            MetricOutcome::Pass | MetricOutcome::Insufficient => {}
        }
    }
    if marginal {
        UnitStatus::Warning
    } else {
        UnitStatus::Pass
    }
}

/// Human-readable flag line, one entry per out-of-band metric.
pub fn detail_line(metrics: &[MetricDelta]) -> String {
    let mut flags = Vec::new();
    for m in metrics {
        match m.outcome {
            MetricOutcome::TooLow => {
                if let Some(dev) = m.deviation_pct {
                    flags.push(format!("{} {dev:.1}% (too low)", m.metric));
                }
            }
            MetricOutcome::TooHigh => {
                if let Some(dev) = m.deviation_pct {
                    flags.push(format!("{} {dev:.1}% (too high)", m.metric));
                }
            }
            MetricOutcome::Marginal => {
                if let Some(dev) = m.deviation_pct {
                    flags.push(format!("{} {dev:.1}% (marginal)", m.metric));
                }
            }
            MetricOutcome::ExceedsCeiling => {
                if let Some(v) = m.secondary {
                    flags.push(format!("{} {v:.2}", m.metric));
                }
            }
            MetricOutcome::Undefined => {
                flags.push(format!("{} baseline is zero", m.metric));
            }
            MetricOutcome::Pass | MetricOutcome::Insufficient => {}
        }
    }
    if flags.is_empty() {
        "All within range".to_string()
    } else {
        flags.join(", ")
    }
}
