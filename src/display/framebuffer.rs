/*
 *  display/framebuffer.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  Pixel frame covering the ring followed by the linear scale
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

use super::color::{BLACK, RGB8};

/// One full frame of the strip: `ring_size` ring pixels, then `scale_size`
/// scale pixels, in physical wiring order.
///
/// Every slot always holds a valid color; composition writes into a frame
/// owned by the controller and only complete frames are handed to the
/// transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelFrame {
    ring_size: usize,
    pixels: Vec<RGB8>,
}

impl PixelFrame {
    /// Create a blank frame
    pub fn new(ring_size: usize, scale_size: usize) -> Self {
        Self {
            ring_size,
            pixels: vec![BLACK; ring_size + scale_size],
        }
    }

    pub fn ring_size(&self) -> usize {
        self.ring_size
    }

    pub fn scale_size(&self) -> usize {
        self.pixels.len() - self.ring_size
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[RGB8] {
        &self.pixels
    }

    pub fn ring(&self) -> &[RGB8] {
        &self.pixels[..self.ring_size]
    }

    /// Scale pixels in physical order (not HUD-corrected)
    pub fn scale(&self) -> &[RGB8] {
        &self.pixels[self.ring_size..]
    }

    pub fn get(&self, idx: usize) -> Option<RGB8> {
        self.pixels.get(idx).copied()
    }

    /// Set a pixel; out-of-range indices are ignored
    pub fn set(&mut self, idx: usize, color: RGB8) {
        if let Some(p) = self.pixels.get_mut(idx) {
            *p = color;
        }
    }

    /// Physical index of logical scale position `x`.
    /// HUD orientation mirrors the scale so it reads correctly in a reflection.
    pub fn scale_index(&self, x: usize, hud: bool) -> usize {
        if hud {
            self.pixels.len() - 1 - x
        } else {
            self.ring_size + x
        }
    }

    pub fn fill(&mut self, color: RGB8) {
        self.pixels.iter_mut().for_each(|p| *p = color);
    }

    pub fn blank(&mut self) {
        self.fill(BLACK);
    }

    pub fn blank_ring(&mut self) {
        let n = self.ring_size;
        self.pixels[..n].iter_mut().for_each(|p| *p = BLACK);
    }

    pub fn blank_scale(&mut self) {
        let n = self.ring_size;
        self.pixels[n..].iter_mut().for_each(|p| *p = BLACK);
    }

    pub fn is_black(&self) -> bool {
        self.pixels.iter().all(|p| *p == BLACK)
    }
}
