/*
 *  display/traits.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  LED transport abstraction
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

use crate::display::error::DisplayError;
use crate::display::framebuffer::PixelFrame;
use serde::{Deserialize, Serialize};

/// Minimal hardware abstraction - every LED strip transport implements this
///
/// A frame is written first and only becomes visible on `show()`.
/// Brightness is a global multiplier applied by the transport when
/// presenting, never baked into the frame by the caller.
pub trait LedTransport: Send {
    /// Total pixels on the strip (ring + scale)
    fn pixel_count(&self) -> usize;

    /// Stage a complete frame for the next `show()`
    fn write(&mut self, frame: &PixelFrame) -> Result<(), DisplayError>;

    /// Set global brightness, 0.0..=1.0
    fn set_brightness(&mut self, brightness: f64) -> Result<(), DisplayError>;

    /// Current global brightness
    fn brightness(&self) -> f64;

    /// Present the staged frame
    fn show(&mut self) -> Result<(), DisplayError>;

    /// Write then present
    fn present(&mut self, frame: &PixelFrame) -> Result<(), DisplayError> {
        self.write(frame)?;
        self.show()
    }
}

impl<T: LedTransport + ?Sized> LedTransport for Box<T> {
    fn pixel_count(&self) -> usize {
        (**self).pixel_count()
    }

    fn write(&mut self, frame: &PixelFrame) -> Result<(), DisplayError> {
        (**self).write(frame)
    }

    fn set_brightness(&mut self, brightness: f64) -> Result<(), DisplayError> {
        (**self).set_brightness(brightness)
    }

    fn brightness(&self) -> f64 {
        (**self).brightness()
    }

    fn show(&mut self) -> Result<(), DisplayError> {
        (**self).show()
    }
}

/// Type alias for boxed transport trait objects
pub type BoxedTransport = Box<dyn LedTransport>;

/// Which parts of the rendering a given build of the hardware supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Linear power/speed scale fitted after the ring
    pub power_scale: bool,

    /// Draw compass rose markers on the ring
    pub compass_rose: bool,

    /// Display can be mounted for windscreen reflection
    pub hud: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            power_scale: true,
            compass_rose: true,
            hud: true,
        }
    }
}
