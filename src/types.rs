use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Corner locations detected in one grayscale frame, strongest first.
pub type FeatureSet = Vec<Vec2>;

/// One slip angle measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlipAngleSample {
    /// Zero based index of the frame pair, 0 for (frame 0, frame 1).
    pub frame: usize,
    /// Seconds since session start.
    pub time: f64,
    /// Degrees in (-180, 180].
    pub angle: f64,
}

/// Output of a motion tracker, parallel to the feature set it was given.
///
/// `points[i]` is only meaningful for geometry when `status[i]` is true.
/// `error` is tracker specific and not used by the estimator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackResult {
    pub points: Vec<Vec2>,
    pub status: Vec<bool>,
    pub error: Vec<f32>,
}

impl TrackResult {
    pub fn with_capacity(n: usize) -> TrackResult {
        TrackResult {
            points: Vec::with_capacity(n),
            status: Vec::with_capacity(n),
            error: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, point: Vec2, ok: bool, error: f32) {
        self.points.push(point);
        self.status.push(ok);
        self.error.push(error);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Tracked location per feature, `None` where tracking failed.
    pub fn tracked(&self) -> impl Iterator<Item = Option<Vec2>> + '_ {
        self.points
            .iter()
            .zip(&self.status)
            .map(|(p, ok)| ok.then_some(*p))
    }

    pub fn tracked_count(&self) -> usize {
        self.status.iter().filter(|ok| **ok).count()
    }
}
