//! Summary of a finished run's sample series.
//!
//! Angles outside the Tukey fences (1.5 IQR beyond the quartiles) are treated
//! as outliers. Outliers and samples of exactly 0° (lost tracking under the
//! zero displacement policy) are dropped before any statistic is computed;
//! the processing time per frame is the time difference between consecutive
//! kept samples.

use serde::Serialize;

use crate::types::SlipAngleSample;

/// Linear interpolation between closest ranks, `p` in [0, 100].
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AngleSummary {
    pub q1: f64,
    pub q3: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    pub outliers: usize,
    pub zero_angles: usize,
    pub kept: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimingSummary {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation, 0 for a single value.
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    /// Frame whose processing took `max`.
    pub max_frame: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleSummary {
    pub samples: usize,
    pub angle: Option<AngleSummary>,
    pub processing_time: Option<TimingSummary>,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

impl SampleSummary {
    pub fn from_samples(samples: &[SlipAngleSample]) -> SampleSummary {
        let mut sorted: Vec<f64> = samples.iter().map(|s| s.angle).collect();
        sorted.sort_by(f64::total_cmp);
        let (Some(q1), Some(q3)) = (percentile(&sorted, 25.0), percentile(&sorted, 75.0)) else {
            return SampleSummary {
                samples: 0,
                angle: None,
                processing_time: None,
            };
        };
        let iqr = q3 - q1;
        let lower_fence = q1 - 1.5 * iqr;
        let upper_fence = q3 + 1.5 * iqr;

        let mut outliers = 0;
        let mut zero_angles = 0;
        let kept: Vec<&SlipAngleSample> = samples
            .iter()
            .filter(|s| {
                if s.angle < lower_fence || s.angle > upper_fence {
                    outliers += 1;
                    false
                } else if s.angle == 0.0 {
                    zero_angles += 1;
                    false
                } else {
                    true
                }
            })
            .collect();

        let mut kept_angles: Vec<f64> = kept.iter().map(|s| s.angle).collect();
        kept_angles.sort_by(f64::total_cmp);
        let angle = AngleSummary {
            q1,
            q3,
            lower_fence,
            upper_fence,
            outliers,
            zero_angles,
            kept: kept.len(),
            mean: (!kept_angles.is_empty()).then(|| mean(&kept_angles)),
            median: percentile(&kept_angles, 50.0),
        };

        SampleSummary {
            samples: samples.len(),
            angle: Some(angle),
            processing_time: timing(&kept),
        }
    }
}

fn timing(kept: &[&SlipAngleSample]) -> Option<TimingSummary> {
    if kept.is_empty() {
        return None;
    }
    let deltas: Vec<f64> = std::iter::once(0.0)
        .chain(kept.windows(2).map(|w| w[1].time - w[0].time))
        .collect();
    // first occurrence wins on ties
    let mut max_idx = 0;
    for (i, d) in deltas.iter().enumerate() {
        if *d > deltas[max_idx] {
            max_idx = i;
        }
    }
    let mean_dt = mean(&deltas);
    let stddev = if deltas.len() > 1 {
        let ss: f64 = deltas.iter().map(|d| (d - mean_dt).powi(2)).sum();
        (ss / (deltas.len() - 1) as f64).sqrt()
    } else {
        0.0
    };
    let mut sorted = deltas.clone();
    sorted.sort_by(f64::total_cmp);
    Some(TimingSummary {
        mean: mean_dt,
        median: percentile(&sorted, 50.0).unwrap_or(0.0),
        stddev,
        min: sorted[0],
        max: deltas[max_idx],
        max_frame: kept[max_idx].frame,
    })
}
