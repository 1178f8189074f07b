use glam::Vec2;
use image::GrayImage;
use nalgebra as na;
use rayon::prelude::*;

use crate::config::TrackerConfig;
use crate::image_ops::{FloatImage, build_pyramid, min_eigenvalue};
use crate::types::TrackResult;

/// Finds where points of `prev` went to in `curr`.
///
/// The result is parallel to `features`. Images of different sizes lose
/// every point.
pub trait MotionTracker {
    fn track(&self, prev: &GrayImage, curr: &GrayImage, features: &[Vec2]) -> TrackResult;
}

/// Coarse to fine Lucas-Kanade on image pyramids, translation only.
#[derive(Debug, Clone, Default)]
pub struct PyramidalLk {
    pub config: TrackerConfig,
}

struct LevelTrack {
    flow: Vec2,
    residual: f32,
}

impl PyramidalLk {
    pub fn new(config: TrackerConfig) -> PyramidalLk {
        PyramidalLk { config }
    }

    fn half_window(&self) -> isize {
        (self.config.window_size.max(3) / 2) as isize
    }

    /// Iterates at one level starting from `guess`. `p` is the feature
    /// position scaled to this level. Returns `None` when the window has too
    /// little texture to solve for a displacement.
    fn track_level(
        &self,
        prev: &FloatImage,
        curr: &FloatImage,
        p: Vec2,
        guess: Vec2,
    ) -> Option<LevelTrack> {
        let half = self.half_window();
        let side = (2 * half + 1) as usize;
        let mut template = Vec::with_capacity(side * side);
        let mut grads = Vec::with_capacity(side * side);
        let (mut a, mut b, mut c) = (0.0f32, 0.0f32, 0.0f32);
        for wy in -half..=half {
            for wx in -half..=half {
                let x = p.x + wx as f32;
                let y = p.y + wy as f32;
                let gx = 0.5 * (prev.sample(x + 1.0, y) - prev.sample(x - 1.0, y));
                let gy = 0.5 * (prev.sample(x, y + 1.0) - prev.sample(x, y - 1.0));
                a += gx * gx;
                b += gx * gy;
                c += gy * gy;
                template.push(prev.sample(x, y));
                grads.push((gx, gy));
            }
        }

        let area = (side * side) as f32;
        if min_eigenvalue(a, b, c) / area < self.config.min_eigen_threshold {
            return None;
        }
        let inv = na::Matrix2::new(a, b, b, c).try_inverse()?;

        let mut flow = guess;
        let mut residual = 0.0;
        for _ in 0..self.config.max_iterations.max(1) {
            let mut rhs = na::Vector2::<f32>::zeros();
            residual = 0.0;
            let mut i = 0;
            for wy in -half..=half {
                for wx in -half..=half {
                    let moved = curr.sample(p.x + flow.x + wx as f32, p.y + flow.y + wy as f32);
                    let e = template[i] - moved;
                    rhs.x += grads[i].0 * e;
                    rhs.y += grads[i].1 * e;
                    residual += e.abs();
                    i += 1;
                }
            }
            let delta = inv * rhs;
            flow += Vec2::new(delta.x, delta.y);
            if delta.norm_squared() < self.config.epsilon * self.config.epsilon {
                break;
            }
        }
        Some(LevelTrack {
            flow,
            residual: residual / area,
        })
    }

    fn track_point(&self, prev: &[FloatImage], curr: &[FloatImage], p: Vec2) -> (Vec2, bool, f32) {
        let mut flow = Vec2::ZERO;
        let mut residual = 0.0;
        for level in (0..prev.len().min(curr.len())).rev() {
            let scale = (1u32 << level) as f32;
            match self.track_level(&prev[level], &curr[level], p / scale, flow) {
                Some(t) => {
                    flow = t.flow;
                    residual = t.residual;
                }
                // coarse levels may blur the texture away; keep the guess
                None if level > 0 => {}
                None => return (p + flow, false, 0.0),
            }
            if level > 0 {
                flow *= 2.0;
            }
        }
        let q = p + flow;
        let (w, h) = (prev[0].width as f32, prev[0].height as f32);
        let inside = q.x >= 0.0 && q.y >= 0.0 && q.x <= w - 1.0 && q.y <= h - 1.0;
        (q, inside && q.is_finite(), residual)
    }
}

impl MotionTracker for PyramidalLk {
    fn track(&self, prev: &GrayImage, curr: &GrayImage, features: &[Vec2]) -> TrackResult {
        if features.is_empty() {
            return TrackResult::default();
        }
        let (w, h) = prev.dimensions();
        if prev.dimensions() != curr.dimensions() || w == 0 || h == 0 {
            let mut lost = TrackResult::with_capacity(features.len());
            for p in features {
                lost.push(*p, false, 0.0);
            }
            return lost;
        }
        let min_side = self.config.window_size.max(3);
        let levels = self.config.pyramid_levels;
        let prev_pyr = build_pyramid(FloatImage::from_gray(prev), levels, min_side);
        let curr_pyr = build_pyramid(FloatImage::from_gray(curr), levels, min_side);

        let per_point: Vec<_> = features
            .par_iter()
            .map(|p| self.track_point(&prev_pyr, &curr_pyr, *p))
            .collect();

        let mut result = TrackResult::with_capacity(features.len());
        for (q, ok, err) in per_point {
            result.push(q, ok, err);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn blob(w: u32, h: u32, cx: f32, cy: f32, r: f32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
            Luma([if d < r { 220 } else { 20 }])
        })
    }

    #[test]
    fn recovers_diagonal_shift() {
        let a = blob(96, 96, 48.0, 48.0, 6.0);
        let b = blob(96, 96, 53.0, 45.0, 6.0);
        let tracker = PyramidalLk::default();
        let feature = Vec2::new(48.0, 48.0);
        let result = tracker.track(&a, &b, &[feature]);
        assert_eq!(result.len(), 1);
        assert!(result.status[0]);
        let d = result.points[0] - feature;
        assert!((d.x - 5.0).abs() < 0.3, "dx {}", d.x);
        assert!((d.y + 3.0).abs() < 0.3, "dy {}", d.y);
    }

    #[test]
    fn size_change_loses_every_point() {
        let a = blob(96, 96, 48.0, 48.0, 6.0);
        let b = blob(48, 40, 20.0, 20.0, 6.0);
        let features = [Vec2::new(48.0, 48.0), Vec2::new(40.0, 50.0)];
        let result = PyramidalLk::default().track(&a, &b, &features);
        assert_eq!(result.len(), 2);
        assert_eq!(result.status, vec![false, false]);
        assert_eq!(result.points, features.to_vec());

        let empty = GrayImage::new(0, 0);
        let result = PyramidalLk::default().track(&empty, &empty, &features);
        assert_eq!(result.tracked_count(), 0);
    }
}
