//! Per-frame slip angle from tracked feature displacements.
//!
//! Every tracked feature votes with the direction of its image motion and the
//! frame's angle is the median vote. The median is always one of the votes:
//! for an even count the upper of the two middle elements is taken.

use glam::Vec2;

use crate::config::{EstimatorConfig, FailedTrackPolicy};
use crate::error::EstimationError;
use crate::types::TrackResult;

#[derive(Debug, Clone, PartialEq)]
pub struct SlipAngleEstimate {
    /// Median direction in degrees, (-180, 180].
    pub angle: f64,
    /// Displacement per feature, `None` where tracking failed.
    pub displacements: Vec<Option<Vec2>>,
    /// The votes the median was taken over, ascending.
    pub angles: Vec<f64>,
}

/// Direction of `d` in degrees, (-180, 180]. The zero vector maps to 0.
pub fn displacement_angle(d: Vec2) -> f64 {
    if d == Vec2::ZERO {
        return 0.0;
    }
    let angle = (d.y as f64).atan2(d.x as f64).to_degrees();
    if angle <= -180.0 {
        180.0
    } else if angle == 0.0 {
        // folds -0.0
        0.0
    } else {
        angle
    }
}

/// `sorted[len / 2]`, no interpolation.
pub fn upper_median(sorted: &[f64]) -> Option<f64> {
    sorted.get(sorted.len() / 2).copied()
}

/// Reduces one tracking result to a single angle.
///
/// `features` are the points handed to the tracker and `track` its answer
/// for them, index by index. A `track` of another length is rejected.
pub fn estimate_slip_angle(
    features: &[Vec2],
    track: &TrackResult,
    config: &EstimatorConfig,
) -> Result<SlipAngleEstimate, EstimationError> {
    if features.len() != track.len() {
        return Err(EstimationError::TrackLengthMismatch {
            features: features.len(),
            tracked: track.len(),
        });
    }
    if features.is_empty() {
        return Err(EstimationError::NoFeatures);
    }

    let displacements: Vec<Option<Vec2>> = features
        .iter()
        .zip(track.tracked())
        .map(|(f, q)| q.map(|q| q - *f))
        .collect();

    let mut angles: Vec<f64> = match config.failed_tracks {
        FailedTrackPolicy::Exclude => displacements
            .iter()
            .flatten()
            .map(|d| displacement_angle(*d))
            .collect(),
        FailedTrackPolicy::ZeroDisplacement => displacements
            .iter()
            .map(|d| displacement_angle(d.unwrap_or(Vec2::ZERO)))
            .collect(),
    };
    angles.sort_by(f64::total_cmp);

    let angle =
        upper_median(&angles).ok_or(EstimationError::NoTrackedFeatures(features.len()))?;
    Ok(SlipAngleEstimate {
        angle,
        displacements,
        angles,
    })
}
