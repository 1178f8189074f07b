use image::{GrayImage, RgbImage};

/// BT.601 luma, the conversion video decoders hand out.
pub fn to_gray(frame: &RgbImage) -> GrayImage {
    image::imageops::grayscale(frame)
}

/// Single channel f32 image, row major.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f32>,
}

const PYR_KERNEL: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

impl FloatImage {
    pub fn new(width: usize, height: usize) -> FloatImage {
        FloatImage {
            width,
            height,
            data: vec![0.0; width * height],
        }
    }

    pub fn from_gray(img: &GrayImage) -> FloatImage {
        FloatImage {
            width: img.width() as usize,
            height: img.height() as usize,
            data: img.as_raw().iter().map(|v| *v as f32).collect(),
        }
    }

    #[inline]
    pub fn at(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    /// Pixel with replicated borders.
    #[inline]
    pub fn at_clamped(&self, x: isize, y: isize) -> f32 {
        let x = x.clamp(0, self.width as isize - 1) as usize;
        let y = y.clamp(0, self.height as isize - 1) as usize;
        self.at(x, y)
    }

    /// Bilinear interpolation with replicated borders.
    pub fn sample(&self, x: f32, y: f32) -> f32 {
        let x = x.clamp(0.0, (self.width - 1) as f32);
        let y = y.clamp(0.0, (self.height - 1) as f32);
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let ax = x - x0 as f32;
        let ay = y - y0 as f32;
        let top = self.at(x0, y0) * (1.0 - ax) + self.at(x1, y0) * ax;
        let bottom = self.at(x0, y1) * (1.0 - ax) + self.at(x1, y1) * ax;
        top * (1.0 - ay) + bottom * ay
    }

    /// 5-tap binomial blur followed by dropping every other row and column.
    /// Pixel (x, y) of the result sits at (2x, 2y) of `self`.
    pub fn pyr_down(&self) -> FloatImage {
        let w2 = self.width.div_ceil(2);
        let h2 = self.height.div_ceil(2);

        let mut rows = FloatImage::new(w2, self.height);
        for y in 0..self.height {
            for x2 in 0..w2 {
                let cx = (2 * x2) as isize;
                rows.data[y * w2 + x2] = PYR_KERNEL
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * self.at_clamped(cx + k as isize - 2, y as isize))
                    .sum();
            }
        }

        let mut out = FloatImage::new(w2, h2);
        for y2 in 0..h2 {
            let cy = (2 * y2) as isize;
            for x2 in 0..w2 {
                out.data[y2 * w2 + x2] = PYR_KERNEL
                    .iter()
                    .enumerate()
                    .map(|(k, w)| w * rows.at_clamped(x2 as isize, cy + k as isize - 2))
                    .sum();
            }
        }
        out
    }

    /// 3x3 Sobel derivatives with replicated borders.
    pub fn sobel(&self) -> (FloatImage, FloatImage) {
        let mut gx = FloatImage::new(self.width, self.height);
        let mut gy = FloatImage::new(self.width, self.height);
        for y in 0..self.height as isize {
            for x in 0..self.width as isize {
                let p = |dx: isize, dy: isize| self.at_clamped(x + dx, y + dy);
                let i = y as usize * self.width + x as usize;
                gx.data[i] = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1))
                    - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
                gy.data[i] = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1))
                    - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
            }
        }
        (gx, gy)
    }

    /// Sum over a `(2 * radius + 1)` square box, borders replicated.
    pub fn box_sum(&self, radius: usize) -> FloatImage {
        let r = radius as isize;
        let mut rows = FloatImage::new(self.width, self.height);
        for y in 0..self.height as isize {
            for x in 0..self.width as isize {
                rows.data[y as usize * self.width + x as usize] =
                    (-r..=r).map(|d| self.at_clamped(x + d, y)).sum();
            }
        }
        let mut out = FloatImage::new(self.width, self.height);
        for y in 0..self.height as isize {
            for x in 0..self.width as isize {
                out.data[y as usize * self.width + x as usize] =
                    (-r..=r).map(|d| rows.at_clamped(x, y + d)).sum();
            }
        }
        out
    }
}

/// Full resolution image followed by up to `levels` halved copies. Stops
/// early once a level would be smaller than `min_side` pixels.
pub fn build_pyramid(base: FloatImage, levels: usize, min_side: usize) -> Vec<FloatImage> {
    let mut pyramid = Vec::with_capacity(levels + 1);
    pyramid.push(base);
    for _ in 0..levels {
        let last = &pyramid[pyramid.len() - 1];
        if last.width.div_ceil(2) < min_side || last.height.div_ceil(2) < min_side {
            break;
        }
        let next = last.pyr_down();
        pyramid.push(next);
    }
    pyramid
}

/// Smaller eigenvalue of the symmetric matrix [[a, b], [b, c]].
#[inline]
pub fn min_eigenvalue(a: f32, b: f32, c: f32) -> f32 {
    let half_trace = 0.5 * (a + c);
    let half_diff = 0.5 * (a - c);
    half_trace - (half_diff * half_diff + b * b).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(w: usize, h: usize) -> FloatImage {
        let mut img = FloatImage::new(w, h);
        for y in 0..h {
            for x in 0..w {
                img.data[y * w + x] = x as f32;
            }
        }
        img
    }

    #[test]
    fn bilinear_on_ramp() {
        let img = ramp(10, 4);
        assert!((img.sample(3.25, 1.5) - 3.25).abs() < 1e-6);
        assert_eq!(img.sample(-4.0, 0.0), 0.0);
        assert_eq!(img.sample(40.0, 0.0), 9.0);
    }

    #[test]
    fn pyramid_sizes() {
        let pyr = build_pyramid(FloatImage::new(101, 60), 3, 8);
        let sizes: Vec<_> = pyr.iter().map(|l| (l.width, l.height)).collect();
        assert_eq!(sizes, vec![(101, 60), (51, 30), (26, 15), (13, 8)]);

        let shallow = build_pyramid(FloatImage::new(20, 20), 3, 8);
        assert_eq!(shallow.len(), 2);
    }

    #[test]
    fn pyr_down_keeps_constant() {
        let mut img = FloatImage::new(9, 7);
        img.data.iter_mut().for_each(|v| *v = 42.0);
        let down = img.pyr_down();
        assert!(down.data.iter().all(|v| (v - 42.0).abs() < 1e-4));
    }

    #[test]
    fn sobel_on_ramp() {
        let (gx, gy) = ramp(8, 8).sobel();
        assert_eq!(gx.at(4, 4), 8.0);
        assert_eq!(gy.at(4, 4), 0.0);
    }

    #[test]
    fn eigenvalue_of_diagonal() {
        assert_eq!(min_eigenvalue(3.0, 0.0, 5.0), 3.0);
        assert!(min_eigenvalue(1.0, 1.0, 1.0).abs() < 1e-6);
    }
}
