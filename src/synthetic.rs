use glam::Vec2;
use image::{Rgb, RgbImage};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::image_ops::FloatImage;

/// Black frame with a white `size` square whose top left corner is at `(x, y)`.
pub fn square_frame(width: u32, height: u32, x: u32, y: u32, size: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |px, py| {
        if px >= x && px < x + size && py >= y && py < y + size {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Seeded random road texture, bilinear upsampled value noise.
pub struct GroundTexture {
    texture: FloatImage,
}

impl GroundTexture {
    /// `cell` is the spacing in pixels between random values.
    pub fn new(width: usize, height: usize, cell: usize, seed: u64) -> GroundTexture {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let cell = cell.max(1);
        let mut coarse = FloatImage::new(width / cell + 2, height / cell + 2);
        coarse
            .data
            .iter_mut()
            .for_each(|v| *v = rng.random_range(20.0..235.0));

        let mut texture = FloatImage::new(width, height);
        for y in 0..height {
            for x in 0..width {
                texture.data[y * width + x] =
                    coarse.sample(x as f32 / cell as f32, y as f32 / cell as f32);
            }
        }
        GroundTexture { texture }
    }

    pub fn width(&self) -> usize {
        self.texture.width
    }

    pub fn height(&self) -> usize {
        self.texture.height
    }

    /// Camera view whose top left corner is at `origin` in texture pixels.
    pub fn view(&self, origin: Vec2, width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = self
                .texture
                .sample(origin.x + x as f32, origin.y + y as f32)
                .round()
                .clamp(0.0, 255.0) as u8;
            Rgb([v, v, v])
        })
    }
}

/// A nadir camera gliding over textured ground in a straight line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfig {
    pub width: u32,
    pub height: u32,
    pub frames: usize,
    /// Direction the ground moves through the image, degrees from +x
    /// towards +y. This is the angle the estimator should report.
    pub angle_deg: f32,
    /// Ground motion in pixels per frame.
    pub speed: f32,
    pub cell: usize,
    pub seed: u64,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            frames: 10,
            angle_deg: 0.0,
            speed: 4.0,
            cell: 6,
            seed: 0,
        }
    }
}

impl DriveConfig {
    pub fn motion(&self) -> Vec2 {
        let a = self.angle_deg.to_radians();
        Vec2::new(a.cos(), a.sin()) * self.speed
    }
}

/// Renders the frames of `config`.
pub fn drive_sequence(config: &DriveConfig) -> Vec<RgbImage> {
    let motion = config.motion();
    let travel = motion.abs() * config.frames as f32;
    let margin = 2.0;
    let width = config.width as usize + travel.x.ceil() as usize + 2 * margin as usize;
    let height = config.height as usize + travel.y.ceil() as usize + 2 * margin as usize;
    let ground = GroundTexture::new(width, height, config.cell, config.seed);

    // image content moves by +motion, so the view moves by -motion
    let start = Vec2::new(
        margin + if motion.x > 0.0 { travel.x } else { 0.0 },
        margin + if motion.y > 0.0 { travel.y } else { 0.0 },
    );
    (0..config.frames)
        .map(|k| ground.view(start - motion * k as f32, config.width, config.height))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_is_reproducible() {
        let a = GroundTexture::new(64, 48, 6, 7).view(Vec2::ZERO, 64, 48);
        let b = GroundTexture::new(64, 48, 6, 7).view(Vec2::ZERO, 64, 48);
        let c = GroundTexture::new(64, 48, 6, 8).view(Vec2::ZERO, 64, 48);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn sequence_shifts_content() {
        let config = DriveConfig {
            width: 40,
            height: 30,
            frames: 2,
            angle_deg: 0.0,
            speed: 3.0,
            ..Default::default()
        };
        let frames = drive_sequence(&config);
        assert_eq!(frames.len(), 2);
        // content moved 3 px to the right
        assert_eq!(frames[0].get_pixel(10, 10), frames[1].get_pixel(13, 10));
    }

    #[test]
    fn square_corners() {
        let f = square_frame(20, 20, 5, 6, 4);
        assert_eq!(*f.get_pixel(5, 6), Rgb([255, 255, 255]));
        assert_eq!(*f.get_pixel(8, 9), Rgb([255, 255, 255]));
        assert_eq!(*f.get_pixel(9, 9), Rgb([0, 0, 0]));
    }
}
