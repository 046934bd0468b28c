/*
 *  display/drivers/mock.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  Mock LED transport for testing and running without hardware
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

use std::sync::{Arc, Mutex};
use log::debug;

use crate::display::color::BLACK;
use crate::display::error::DisplayError;
use crate::display::framebuffer::PixelFrame;
use crate::display::traits::LedTransport;

/// Mock LED transport
///
/// Simulates a strip without requiring hardware. It's useful for:
/// - Unit tests
/// - Integration tests
/// - Development without hardware (`--emulated`)
///
/// The mock records all operations and keeps the last staged and shown
/// frames for verification in tests.
#[derive(Debug, Clone)]
pub struct MockDriver {
    pixel_count: usize,

    /// Log every presented frame at debug level
    log_frames: bool,

    /// Shared state for testing
    state: Arc<Mutex<MockDriverState>>,
}

/// Internal state for the mock driver (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockDriverState {
    /// Number of times write() was called
    pub write_count: usize,

    /// Number of times show() was called
    pub show_count: usize,

    /// Last brightness value set
    pub last_brightness: f64,

    /// Every brightness value set, in order
    pub brightness_history: Vec<f64>,

    /// Frame staged by the last write()
    pub staged: Option<PixelFrame>,

    /// Frame visible after the last show()
    pub shown: Option<PixelFrame>,

    /// Simulate failures (for error testing)
    pub simulate_write_failure: bool,
}

impl MockDriver {
    /// Create a new mock strip with `pixel_count` pixels
    pub fn new(pixel_count: usize) -> Self {
        Self {
            pixel_count,
            log_frames: false,
            state: Arc::new(Mutex::new(MockDriverState::default())),
        }
    }

    /// Mock strip that logs what it would have lit
    pub fn new_logging(pixel_count: usize) -> Self {
        Self {
            log_frames: true,
            ..Self::new(pixel_count)
        }
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockDriverState>> {
        Arc::clone(&self.state)
    }

    /// Reset state counters (useful between tests)
    pub fn reset_state(&mut self) {
        let mut state = self.state.lock().unwrap();
        *state = MockDriverState::default();
    }

    /// Frame currently visible on the strip
    pub fn shown(&self) -> Option<PixelFrame> {
        self.state.lock().unwrap().shown.clone()
    }

    /// Count lit pixels in the visible frame
    pub fn count_lit_pixels(&self) -> usize {
        self.shown()
            .map(|f| f.pixels().iter().filter(|&&p| p != BLACK).count())
            .unwrap_or(0)
    }
}

/// Compact one-line rendering, `.` for dark pixels, `#` for lit ones
fn sketch(frame: &PixelFrame) -> String {
    let dot = |p: &crate::display::RGB8| if *p == BLACK { '.' } else { '#' };
    let ring: String = frame.ring().iter().map(dot).collect();
    let scale: String = frame.scale().iter().map(dot).collect();
    format!("[{}] [{}]", ring, scale)
}

impl LedTransport for MockDriver {
    fn pixel_count(&self) -> usize {
        self.pixel_count
    }

    fn write(&mut self, frame: &PixelFrame) -> Result<(), DisplayError> {
        if frame.len() != self.pixel_count {
            return Err(DisplayError::BufferSizeMismatch {
                expected: self.pixel_count,
                actual: frame.len(),
            });
        }

        let mut state = self.state.lock().unwrap();
        if state.simulate_write_failure {
            return Err(DisplayError::Other("Simulated write failure".to_string()));
        }
        state.write_count += 1;
        state.staged = Some(frame.clone());
        Ok(())
    }

    fn set_brightness(&mut self, brightness: f64) -> Result<(), DisplayError> {
        let mut state = self.state.lock().unwrap();
        state.last_brightness = brightness;
        state.brightness_history.push(brightness);
        Ok(())
    }

    fn brightness(&self) -> f64 {
        self.state.lock().unwrap().last_brightness
    }

    fn show(&mut self) -> Result<(), DisplayError> {
        let mut state = self.state.lock().unwrap();
        state.show_count += 1;
        state.shown = state.staged.clone();
        if self.log_frames {
            if let Some(frame) = state.shown.as_ref() {
                debug!("strip @{:.2} {}", state.last_brightness, sketch(frame));
            }
        }
        Ok(())
    }
}
