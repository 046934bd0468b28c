/*
 *  display/state.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  Display state owned by the mode controller
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

use serde::{Deserialize, Serialize};
use super::DisplayMode;

/// Brightness limits and step size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrightnessConfig {
    pub initial: f64,
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self {
            initial: crate::constants::BRIGHTNESS,
            min: crate::constants::MIN_BRIGHTNESS,
            max: crate::constants::MAX_BRIGHTNESS,
            step: crate::constants::BRIGHTNESS_STEP,
        }
    }
}

impl BrightnessConfig {
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.min;
        }
        value.clamp(self.min, self.max)
    }
}

/// Everything the composer needs to know about how to draw, mutated only
/// by the mode controller.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayState {
    pub mode: DisplayMode,
    pub hud_orientation: bool,
    pub brightness: f64,
    pub heading_valid: bool,
    pub compass_rose_points: usize,
}

impl DisplayState {
    pub fn new(mode: DisplayMode, hud_orientation: bool, brightness: f64, compass_rose_points: usize) -> Self {
        Self {
            mode,
            hud_orientation,
            brightness,
            heading_valid: true,
            compass_rose_points,
        }
    }

    /// Move brightness by `steps` increments, clamped to the configured limits.
    /// Returns true if the value changed.
    pub fn step_brightness(&mut self, steps: i32, limits: &BrightnessConfig) -> bool {
        let next = limits.clamp(self.brightness + steps as f64 * limits.step);
        if (next - self.brightness).abs() < f64::EPSILON {
            return false;
        }
        self.brightness = next;
        true
    }
}
