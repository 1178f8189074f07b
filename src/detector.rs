use glam::Vec2;
use image::GrayImage;
use log::trace;

use crate::config::{DetectorConfig, RegionOfInterest};
use crate::image_ops::{FloatImage, min_eigenvalue};
use crate::types::FeatureSet;

/// Picks trackable points in a grayscale frame.
///
/// A uniform image has no corners; implementations return an empty set for
/// it rather than failing.
pub trait FeatureDetector {
    fn detect(&self, gray: &GrayImage) -> FeatureSet;
}

/// Shi-Tomasi "good features to track", optionally with the Harris score.
#[derive(Debug, Clone, Default)]
pub struct GoodFeatures {
    pub config: DetectorConfig,
}

impl GoodFeatures {
    pub fn new(config: DetectorConfig) -> GoodFeatures {
        GoodFeatures { config }
    }

    /// Corner score per pixel.
    pub fn response(&self, img: &FloatImage) -> FloatImage {
        let (gx, gy) = img.sobel();
        let mut gxx = FloatImage::new(img.width, img.height);
        let mut gxy = FloatImage::new(img.width, img.height);
        let mut gyy = FloatImage::new(img.width, img.height);
        for i in 0..img.data.len() {
            gxx.data[i] = gx.data[i] * gx.data[i];
            gxy.data[i] = gx.data[i] * gy.data[i];
            gyy.data[i] = gy.data[i] * gy.data[i];
        }
        let radius = self.config.block_size.max(1) / 2;
        let (a, b, c) = (gxx.box_sum(radius), gxy.box_sum(radius), gyy.box_sum(radius));

        let mut response = FloatImage::new(img.width, img.height);
        for i in 0..response.data.len() {
            let (a, b, c) = (a.data[i], b.data[i], c.data[i]);
            response.data[i] = if self.config.use_harris {
                a * c - b * b - self.config.harris_k * (a + c) * (a + c)
            } else {
                min_eigenvalue(a, b, c)
            };
        }
        response
    }

    fn in_region(&self, y: usize, height: usize) -> bool {
        match self.config.region {
            RegionOfInterest::Full => true,
            RegionOfInterest::LowerHalf => y >= height / 2,
        }
    }
}

impl FeatureDetector for GoodFeatures {
    fn detect(&self, gray: &GrayImage) -> FeatureSet {
        let (w, h) = (gray.width() as usize, gray.height() as usize);
        if w < 3 || h < 3 || self.config.max_corners == 0 {
            return Vec::new();
        }
        let response = self.response(&FloatImage::from_gray(gray));

        let max_response = (1..h - 1)
            .filter(|y| self.in_region(*y, h))
            .flat_map(|y| (1..w - 1).map(move |x| (x, y)))
            .map(|(x, y)| response.at(x, y))
            .fold(0.0f32, f32::max);
        if max_response <= 0.0 {
            return Vec::new();
        }
        let threshold = max_response * self.config.quality_level;

        let mut candidates: Vec<(f32, usize, usize)> = Vec::new();
        for y in 1..h - 1 {
            if !self.in_region(y, h) {
                continue;
            }
            for x in 1..w - 1 {
                let v = response.at(x, y);
                if v < threshold || v <= 0.0 {
                    continue;
                }
                let is_peak = (y - 1..=y + 1)
                    .all(|ny| (x - 1..=x + 1).all(|nx| response.at(nx, ny) <= v));
                if is_peak {
                    candidates.push((v, x, y));
                }
            }
        }
        // stable, so equal scores keep scan order
        candidates.sort_by(|a, b| b.0.total_cmp(&a.0));

        let min_dist_sq = self.config.min_distance * self.config.min_distance;
        let mut corners: FeatureSet = Vec::with_capacity(self.config.max_corners);
        for (_, x, y) in candidates {
            let p = Vec2::new(x as f32, y as f32);
            if corners.iter().all(|c| c.distance_squared(p) >= min_dist_sq) {
                corners.push(p);
                if corners.len() == self.config.max_corners {
                    break;
                }
            }
        }
        trace!("{} corners above {:.1}", corners.len(), threshold);
        corners
    }
}
