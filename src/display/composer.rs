/*
 *  display/composer.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  Frame composition - ring, compass rose and power scale
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

use crate::constants::{SPEED_MAX_KPH, SPEED_MIN_KPH};
use crate::events::{BearingEvent, BearingSource, HeadingEvent};
use super::color::{modulate, scale, wheel, BLACK, RGB8};
use super::framebuffer::PixelFrame;
use super::ring_map::{heading_samples, hud_flip, map_to_ring, reverse};
use super::state::DisplayState;
use super::traits::Capabilities;
use super::{interp_clamped, linspace};

/// Maps a confidence value onto a color wheel position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceColorMap {
    pub min: f64,
    pub max: f64,
    /// Wheel position at `min` confidence
    pub min_color: u8,
    /// Wheel position at `max` confidence
    pub max_color: u8,
}

impl Default for ConfidenceColorMap {
    fn default() -> Self {
        Self {
            min: crate::constants::CONFIDENCE_MIN,
            max: crate::constants::CONFIDENCE_MAX,
            min_color: crate::constants::CONFIDENCE_MIN_COL,
            max_color: crate::constants::CONFIDENCE_MAX_COL,
        }
    }
}

impl ConfidenceColorMap {
    pub fn wheel_position(&self, confidence: f64) -> i32 {
        interp_clamped(
            confidence,
            (self.min, self.max),
            (self.min_color as f64, self.max_color as f64),
        ) as i32
    }

    pub fn color(&self, confidence: f64) -> RGB8 {
        wheel(self.wheel_position(confidence))
    }
}

/// One interval of a multi-band power scale, `min` inclusive, `max` exclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerBand {
    pub min: f64,
    pub max: f64,
    /// Wheel position
    pub color: u8,
}

/// How power values light the linear scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum PowerScale {
    /// Evenly spaced thresholds between `min` and `max`, one color
    Linear { min: f64, max: f64, color: u8 },

    /// Ordered, disjoint bands. Bands below the active one stay fully lit
    /// and the active band's ladder is drawn over them.
    Bands { bands: Vec<PowerBand> },
}

impl Default for PowerScale {
    fn default() -> Self {
        PowerScale::Linear {
            min: crate::constants::POWER_MIN,
            max: crate::constants::POWER_MAX,
            color: crate::constants::POWER_COL,
        }
    }
}

impl PowerScale {
    /// Power range covered by the whole scale
    pub fn range(&self) -> (f64, f64) {
        match self {
            PowerScale::Linear { min, max, .. } => (*min, *max),
            PowerScale::Bands { bands } => match (bands.first(), bands.last()) {
                (Some(first), Some(last)) => (first.min, last.max),
                _ => (0.0, 0.0),
            },
        }
    }

    /// Colors for each scale position in logical order, position 0 lit first
    pub fn render(&self, power: f64, size: usize) -> Vec<RGB8> {
        let mut out = vec![BLACK; size];
        match self {
            PowerScale::Linear { min, max, color } => {
                draw_ladder(&mut out, power, *min, *max, wheel(*color as i32));
            }
            PowerScale::Bands { bands } => {
                for band in bands {
                    let color = wheel(band.color as i32);
                    if power >= band.max {
                        out.iter_mut().for_each(|p| *p = color);
                    } else {
                        if power >= band.min {
                            draw_ladder(&mut out, power, band.min, band.max, color);
                        }
                        break;
                    }
                }
            }
        }
        out
    }
}

/// Light every position whose threshold the power reaches.
/// Unlit positions are left as they are.
fn draw_ladder(out: &mut [RGB8], power: f64, min: f64, max: f64, color: RGB8) {
    let thresholds = linspace(min, max, out.len());
    for (pixel, threshold) in out.iter_mut().zip(thresholds) {
        if power >= threshold {
            *pixel = color;
        }
    }
}

/// Static composition settings
#[derive(Debug, Clone, PartialEq)]
pub struct ComposerConfig {
    pub ring_size: usize,
    pub scale_size: usize,
    pub clip_fraction: f64,
    pub rose_brightness: f64,
    pub confidence: ConfidenceColorMap,
    pub power: PowerScale,
    pub capabilities: Capabilities,
}

/// Turns events plus display state into pixel frames. Never fails;
/// out-of-range values are clamped.
#[derive(Debug, Clone)]
pub struct FrameComposer {
    config: ComposerConfig,
    rose_color: RGB8,
}

impl FrameComposer {
    pub fn new(config: ComposerConfig) -> Self {
        let rose_color = scale(wheel(config.confidence.min_color as i32), config.rose_brightness);
        Self { config, rose_color }
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    /// Blank frame sized for this composer
    pub fn new_frame(&self) -> PixelFrame {
        PixelFrame::new(self.config.ring_size, self.config.scale_size)
    }

    fn rose_visible(&self, state: &DisplayState) -> bool {
        self.config.capabilities.compass_rose && state.heading_valid
    }

    fn hud(&self, state: &DisplayState) -> bool {
        self.config.capabilities.hud && state.hud_orientation
    }

    /// Ring from the DoA samples, scale from power
    pub fn compose_bearing(&self, frame: &mut PixelFrame, event: &BearingEvent, state: &DisplayState) {
        let mut samples = match event.source {
            BearingSource::Mirrored => reverse(&event.samples),
            BearingSource::Generic => event.samples.clone(),
        };
        if self.hud(state) {
            samples = hud_flip(&samples);
        }

        let values = map_to_ring(&samples, self.config.ring_size, self.config.clip_fraction);
        self.compose_ring(frame, &values, event.confidence, state.compass_rose_points, self.rose_visible(state));
        self.compose_power_scale(frame, event.power, self.hud(state));
    }

    /// Ring shows the heading marker, scale shows speed.
    /// Without a heading the ring is blanked.
    pub fn compose_compass(&self, frame: &mut PixelFrame, event: &HeadingEvent, state: &DisplayState) {
        match event.heading {
            Some(heading) if heading.is_finite() => {
                let values = map_to_ring(
                    &heading_samples(heading),
                    self.config.ring_size,
                    self.config.clip_fraction,
                );
                self.compose_ring(
                    frame,
                    &values,
                    self.config.confidence.max,
                    state.compass_rose_points,
                    self.rose_visible(state),
                );
            }
            _ => frame.blank_ring(),
        }
        self.compose_power_scale(frame, self.speed_to_power(event.speed), self.hud(state));
    }

    /// Map speed (kph) onto the power range of the scale
    pub fn speed_to_power(&self, speed: f64) -> f64 {
        interp_clamped(speed, (SPEED_MIN_KPH, SPEED_MAX_KPH), self.config.power.range())
    }

    /// Draw normalized ring values in the confidence color, with rose markers
    /// wherever the data is dimmer than the rose itself.
    pub fn compose_ring(
        &self,
        frame: &mut PixelFrame,
        ring_values: &[f64],
        confidence: f64,
        rose_points: usize,
        rose_visible: bool,
    ) {
        let ring_size = self.config.ring_size;
        let color = self.config.confidence.color(confidence);
        let rose_step = if rose_visible && rose_points > 0 { ring_size / rose_points } else { 0 };

        for i in 0..ring_size {
            let value = ring_values.get(i).copied().unwrap_or(0.0);
            let on_rose = rose_step > 0 && i % rose_step == 0;
            if on_rose && !(value >= self.config.rose_brightness) {
                frame.set(i, self.rose_color);
            } else {
                frame.set(i, modulate(color, value));
            }
        }
    }

    /// Draw the scale. `hud` mirrors the physical pixel order.
    pub fn compose_power_scale(&self, frame: &mut PixelFrame, power: f64, hud: bool) {
        if !self.config.capabilities.power_scale {
            return;
        }
        let size = frame.scale_size();
        let logical = self.config.power.render(power, size);
        for (x, color) in logical.into_iter().enumerate() {
            let idx = frame.scale_index(x, hud);
            frame.set(idx, color);
        }
    }
}
