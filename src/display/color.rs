/*
 *  display/color.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  Color wheel and pixel color helpers
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

pub use rgb::RGB8;
use serde::{Deserialize, Serialize};

/// All channels off
pub const BLACK: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

/// Convert a 0-255 wheel position into a color.
///
/// The wheel is split into three 85-wide segments, each a linear blend
/// between two primaries. Positions outside 0..=255 are black, they do
/// not wrap.
pub fn wheel(pos: i32) -> RGB8 {
    if !(0..=255).contains(&pos) {
        return BLACK;
    }
    if pos < 85 {
        RGB8::new((pos * 3) as u8, (255 - pos * 3) as u8, 0)
    } else if pos < 170 {
        let pos = pos - 85;
        RGB8::new((255 - pos * 3) as u8, 0, (pos * 3) as u8)
    } else {
        let pos = pos - 170;
        RGB8::new(0, (pos * 3) as u8, (255 - pos * 3) as u8)
    }
}

/// Scale each channel by `factor`, truncating.
pub fn scale(color: RGB8, factor: f64) -> RGB8 {
    let factor = clamp_unit(factor);
    let ch = |c: u8| (c as f64 * factor) as u8;
    RGB8::new(ch(color.r), ch(color.g), ch(color.b))
}

/// Scale each channel by `intensity`, rounding to nearest.
pub fn modulate(color: RGB8, intensity: f64) -> RGB8 {
    let intensity = clamp_unit(intensity);
    let ch = |c: u8| (c as f64 * intensity).round().clamp(0.0, 255.0) as u8;
    RGB8::new(ch(color.r), ch(color.g), ch(color.b))
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Channel order expected by the strip.
/// Some NeoPixels have red and green reversed, RGBW parts carry an extra white byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PixelOrder {
    #[default]
    Rgb,
    Grb,
    Rgbw,
    Grbw,
}

impl PixelOrder {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelOrder::Rgb | PixelOrder::Grb => 3,
            PixelOrder::Rgbw | PixelOrder::Grbw => 4,
        }
    }

    /// Append the wire bytes of `color` to `out`. White is always 0.
    pub fn push_channels(&self, color: RGB8, out: &mut Vec<u8>) {
        match self {
            PixelOrder::Rgb => out.extend_from_slice(&[color.r, color.g, color.b]),
            PixelOrder::Grb => out.extend_from_slice(&[color.g, color.r, color.b]),
            PixelOrder::Rgbw => out.extend_from_slice(&[color.r, color.g, color.b, 0]),
            PixelOrder::Grbw => out.extend_from_slice(&[color.g, color.r, color.b, 0]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_gap(a: RGB8, b: RGB8) -> u8 {
        a.r.abs_diff(b.r).max(a.g.abs_diff(b.g)).max(a.b.abs_diff(b.b))
    }

    #[test]
    fn test_wheel_out_of_range_is_black() {
        assert_eq!(wheel(-1), BLACK);
        assert_eq!(wheel(256), BLACK);
        assert_eq!(wheel(i32::MIN), BLACK);
    }

    #[test]
    fn test_wheel_segment_endpoints() {
        assert_eq!(wheel(0), RGB8::new(0, 255, 0));
        assert_eq!(wheel(85), RGB8::new(255, 0, 0));
        assert_eq!(wheel(170), RGB8::new(0, 0, 255));
        assert_eq!(wheel(255), RGB8::new(0, 255, 0));
    }

    #[test]
    fn test_wheel_continuous_at_boundaries() {
        assert!(channel_gap(wheel(84), wheel(85)) <= 3);
        assert!(channel_gap(wheel(169), wheel(170)) <= 3);
        for p in 0..255 {
            assert!(channel_gap(wheel(p), wheel(p + 1)) <= 3, "jump at {}", p);
        }
    }

    #[test]
    fn test_wheel_truncates() {
        // 160 -> second segment, pos 75
        assert_eq!(wheel(160), RGB8::new(30, 0, 225));
        assert_eq!(wheel(1), RGB8::new(3, 252, 0));
    }

    #[test]
    fn test_scale_truncates_and_modulate_rounds() {
        let c = RGB8::new(0, 255, 0);
        assert_eq!(scale(c, 0.04), RGB8::new(0, 10, 0)); // 10.2
        assert_eq!(modulate(RGB8::new(30, 0, 225), 0.5), RGB8::new(15, 0, 113)); // 112.5 rounds up
        assert_eq!(modulate(c, 2.0), c);
        assert_eq!(modulate(c, f64::NAN), BLACK);
    }

    #[test]
    fn test_pixel_order_channels() {
        let c = RGB8::new(1, 2, 3);
        let mut out = Vec::new();
        PixelOrder::Grb.push_channels(c, &mut out);
        PixelOrder::Rgbw.push_channels(c, &mut out);
        assert_eq!(out, vec![2, 1, 3, 1, 2, 3, 0]);
        assert_eq!(PixelOrder::Grbw.bytes_per_pixel(), 4);
    }
}
