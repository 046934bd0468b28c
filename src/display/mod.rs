/*
 *  display/mod.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  Rendering and mode arbitration for the LED ring
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod framebuffer;
pub mod color;

// Rendering
pub mod ring_map;
pub mod composer;
pub mod effects;

// LED transports
pub mod drivers;
pub mod factory;

// State and mode arbitration
pub mod state;
pub mod mode_controller;

// Re-exports for convenience
pub use traits::{LedTransport, BoxedTransport, Capabilities};
pub use error::DisplayError;
pub use framebuffer::PixelFrame;
pub use color::{wheel, PixelOrder, RGB8, BLACK};
pub use composer::{ComposerConfig, ConfidenceColorMap, FrameComposer, PowerBand, PowerScale};
pub use state::{BrightnessConfig, DisplayState};
pub use mode_controller::{ModeController, FadeConfig};
pub use factory::TransportFactory;

use serde::{Deserialize, Serialize};

/// Display mode enum - what the ring is showing
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Bearing,    // DoA bearings from the receiver
    Compass,    // Vehicle heading and speed from GPS
}

/// `n` evenly spaced values from `start` to `end` inclusive
pub(crate) fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

/// Linear interpolation of `v` from `from` onto `to`, clamped to the ends of `to`
pub(crate) fn interp_clamped(v: f64, from: (f64, f64), to: (f64, f64)) -> f64 {
    let (x0, x1) = from;
    let (y0, y1) = to;
    if v.is_nan() || v <= x0 {
        return y0;
    }
    if v >= x1 {
        return y1;
    }
    y0 + (v - x0) * (y1 - y0) / (x1 - x0)
}
