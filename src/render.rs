use glam::Vec2;
use image::{Rgb, RgbImage};

use crate::config::RenderConfig;
use crate::estimator::SlipAngleEstimate;

/// Draws one line and end marker per tracked feature, and the angle with two
/// decimals at the left edge, bottom of the text on the middle row.
pub fn annotate(
    frame: &mut RgbImage,
    features: &[Vec2],
    estimate: &SlipAngleEstimate,
    config: &RenderConfig,
) {
    let track_color = Rgb(config.track_color);
    for (p0, d) in features.iter().zip(&estimate.displacements) {
        let Some(d) = d else {
            continue;
        };
        let p1 = *p0 + *d;
        draw_line(frame, *p0, p1, config.line_thickness, track_color);
        fill_circle(frame, p1, config.marker_radius, track_color);
    }

    let scale = config.text_scale.max(1) as i32;
    let top = frame.height() as i32 / 2 - GLYPH_ROWS as i32 * scale;
    draw_text(
        frame,
        config.text_left as i32,
        top,
        &format!("{:.2}", estimate.angle),
        scale,
        Rgb(config.text_color),
    );
}

fn stamp(frame: &mut RgbImage, x: i32, y: i32, size: i32, color: Rgb<u8>) {
    let (w, h) = (frame.width() as i32, frame.height() as i32);
    let start = -(size - 1) / 2;
    for dy in start..start + size {
        for dx in start..start + size {
            let (px, py) = (x + dx, y + dy);
            if px >= 0 && py >= 0 && px < w && py < h {
                frame.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

pub fn draw_line(frame: &mut RgbImage, p0: Vec2, p1: Vec2, thickness: u32, color: Rgb<u8>) {
    let d = p1 - p0;
    let steps = d.abs().max_element().ceil().max(1.0) as usize;
    for i in 0..=steps {
        let p = p0 + d * (i as f32 / steps as f32);
        stamp(
            frame,
            p.x.round() as i32,
            p.y.round() as i32,
            thickness.max(1) as i32,
            color,
        );
    }
}

pub fn fill_circle(frame: &mut RgbImage, center: Vec2, radius: u32, color: Rgb<u8>) {
    let r = radius as i32;
    let (cx, cy) = (center.x.round() as i32, center.y.round() as i32);
    let (w, h) = (frame.width() as i32, frame.height() as i32);
    for dy in -r..=r {
        for dx in -r..=r {
            let (px, py) = (cx + dx, cy + dy);
            if dx * dx + dy * dy <= r * r && px >= 0 && py >= 0 && px < w && py < h {
                frame.put_pixel(px as u32, py as u32, color);
            }
        }
    }
}

const GLYPH_ROWS: usize = 7;

/// 5x7 dot glyphs, each dot `scale` pixels wide. Unknown characters are
/// skipped but still advance the cursor.
pub fn draw_text(frame: &mut RgbImage, mut x: i32, y: i32, text: &str, scale: i32, color: Rgb<u8>) {
    let (w, h) = (frame.width() as i32, frame.height() as i32);
    for ch in text.chars() {
        if let Some(glyph) = glyph_bits(ch) {
            for (row, pattern) in glyph.iter().enumerate() {
                for col in 0..5 {
                    if (pattern >> (4 - col)) & 1 == 0 {
                        continue;
                    }
                    let left = x + col * scale;
                    let top = y + row as i32 * scale;
                    for py in top.max(0)..(top + scale).min(h) {
                        for px in left.max(0)..(left + scale).min(w) {
                            frame.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
        x += 6 * scale;
    }
}

fn glyph_bits(ch: char) -> Option<[u8; GLYPH_ROWS]> {
    match ch {
        '0' => Some([
            0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110,
        ]),
        '1' => Some([
            0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110,
        ]),
        '2' => Some([
            0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111,
        ]),
        '3' => Some([
            0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110,
        ]),
        '4' => Some([
            0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010,
        ]),
        '5' => Some([
            0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110,
        ]),
        '6' => Some([
            0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110,
        ]),
        '7' => Some([
            0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000,
        ]),
        '8' => Some([
            0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110,
        ]),
        '9' => Some([
            0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100,
        ]),
        '-' => Some([0, 0, 0, 0b11111, 0, 0, 0]),
        '.' => Some([0, 0, 0, 0, 0, 0b00110, 0b00110]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_tracks_and_text() {
        let mut frame = RgbImage::from_pixel(200, 100, Rgb([255, 255, 255]));
        let features = [Vec2::new(100.0, 80.0), Vec2::new(150.0, 20.0)];
        let estimate = SlipAngleEstimate {
            angle: -12.5,
            displacements: vec![Some(Vec2::new(10.0, 0.0)), None],
            angles: vec![0.0],
        };
        annotate(&mut frame, &features, &estimate, &RenderConfig::default());

        let green = Rgb([0, 255, 0]);
        assert_eq!(*frame.get_pixel(105, 80), green);
        assert_eq!(*frame.get_pixel(110, 80), green);
        // lost feature is not drawn
        assert_eq!(*frame.get_pixel(150, 20), Rgb([255, 255, 255]));
        // middle bar of the leading "-": text top is 50 - 7 * 8, bar is row 3
        assert_eq!(*frame.get_pixel(14, 22), Rgb([0, 0, 0]));
    }

    #[test]
    fn clips_at_border() {
        let mut frame = RgbImage::new(10, 10);
        draw_line(&mut frame, Vec2::new(-5.0, 5.0), Vec2::new(20.0, 5.0), 2, Rgb([1, 2, 3]));
        fill_circle(&mut frame, Vec2::new(9.0, 9.0), 4, Rgb([1, 2, 3]));
        assert_eq!(*frame.get_pixel(0, 5), Rgb([1, 2, 3]));
        assert_eq!(*frame.get_pixel(9, 9), Rgb([1, 2, 3]));
    }
}
