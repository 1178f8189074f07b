use serde::{Deserialize, Serialize};

/// Image area the feature detector may pick corners from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionOfInterest {
    #[default]
    Full,
    /// Rows from `height / 2` downwards, for forward facing mounts where the
    /// upper half is mostly sky and scenery.
    LowerHalf,
}

/// Corner detection settings, see [`crate::detector::GoodFeatures`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub max_corners: usize,
    /// Fraction of the strongest corner response a corner must reach.
    pub quality_level: f32,
    /// Minimum euclidean distance in pixels between returned corners.
    pub min_distance: f32,
    /// Side of the box the structure tensor is summed over.
    pub block_size: usize,
    /// Harris response instead of the minimum eigenvalue.
    pub use_harris: bool,
    pub harris_k: f32,
    pub region: RegionOfInterest,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_corners: 300,
            quality_level: 0.3,
            min_distance: 7.0,
            block_size: 7,
            use_harris: false,
            harris_k: 0.04,
            region: RegionOfInterest::Full,
        }
    }
}

/// Pyramidal Lucas-Kanade settings, see [`crate::tracker::PyramidalLk`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Side of the square search window, odd.
    pub window_size: usize,
    /// Pyramid levels above the full resolution image.
    pub pyramid_levels: usize,
    pub max_iterations: usize,
    /// Iteration stops once the update is shorter than this, in pixels.
    pub epsilon: f32,
    /// Minimum eigenvalue of the window's normal matrix, divided by the
    /// window area, below which a point is reported as lost.
    pub min_eigen_threshold: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            window_size: 15,
            pyramid_levels: 3,
            max_iterations: 20,
            epsilon: 0.03,
            min_eigen_threshold: 1e-4,
        }
    }
}

/// What a feature the tracker lost contributes to the median.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedTrackPolicy {
    /// Lost features are left out.
    #[default]
    Exclude,
    /// Lost features count as a zero displacement, i.e. an angle of 0°.
    /// Matches recordings processed by the first generation tool.
    ZeroDisplacement,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub failed_tracks: FailedTrackPolicy,
}

/// Clock used to stamp samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBase {
    /// Wall clock seconds since the session started.
    #[default]
    Wall,
    /// Frame index divided by the source frame rate.
    Media,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Log progress every this many frames, 0 disables.
    pub progress_interval: usize,
    /// Abort the run on a frame without any usable feature instead of
    /// skipping it.
    pub strict: bool,
    pub time_base: TimeBase,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            progress_interval: 100,
            strict: false,
            time_base: TimeBase::Wall,
        }
    }
}

/// Overlay drawn on each output frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub track_color: [u8; 3],
    pub line_thickness: u32,
    pub marker_radius: u32,
    pub text_color: [u8; 3],
    /// Pixel size of one glyph dot; glyphs are 5x7 dots.
    pub text_scale: u32,
    pub text_left: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            track_color: [0, 255, 0],
            line_thickness: 2,
            marker_radius: 4,
            text_color: [0, 0, 0],
            text_scale: 8,
            text_left: 10,
        }
    }
}

/// Everything a run can be tuned with. Every section may be omitted from a
/// JSON config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    pub detector: DetectorConfig,
    pub tracker: TrackerConfig,
    pub estimator: EstimatorConfig,
    pub session: SessionConfig,
    pub render: RenderConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: FlowConfig = serde_json::from_str(
            r#"{ "tracker": { "window_size": 21 }, "estimator": { "failed_tracks": "zero_displacement" } }"#,
        )
        .unwrap();
        assert_eq!(config.tracker.window_size, 21);
        assert_eq!(config.tracker.pyramid_levels, 3);
        assert_eq!(config.tracker.max_iterations, 20);
        assert_eq!(
            config.estimator.failed_tracks,
            FailedTrackPolicy::ZeroDisplacement
        );
        assert_eq!(config.detector, DetectorConfig::default());
        assert_eq!(config.session.progress_interval, 100);
    }

    #[test]
    fn detector_defaults() {
        let d = DetectorConfig::default();
        assert_eq!(d.max_corners, 300);
        assert_eq!(d.quality_level, 0.3);
        assert_eq!(d.min_distance, 7.0);
        assert_eq!(d.block_size, 7);
        assert!(!d.use_harris);
        assert_eq!(d.region, RegionOfInterest::Full);
    }
}
