/*
 *  display/effects.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  Startup attract display, fades and the pixel walk test
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

use std::time::Duration;
use log::{debug, error};

use super::color::{wheel, BLACK};
use super::error::DisplayError;
use super::framebuffer::PixelFrame;
use super::linspace;
use super::traits::LedTransport;

async fn pause(wait: Duration) {
    if !wait.is_zero() {
        tokio::time::sleep(wait).await;
    }
}

/// One frame of the rainbow: pixel `i` of `n` sits at wheel position
/// `i * 256 / n + offset`, wrapped to a byte.
pub fn rainbow_frame(frame: &mut PixelFrame, offset: usize) {
    let n = frame.len().max(1);
    for i in 0..frame.len() {
        let pos = (i * 256 / n + offset) & 255;
        frame.set(i, wheel(pos as i32));
    }
}

/// Rotate the rainbow once round the whole strip. Takes 255 * `wait`.
pub async fn rainbow_cycle<T: LedTransport + ?Sized>(
    transport: &mut T,
    frame: &mut PixelFrame,
    wait: Duration,
) -> Result<(), DisplayError> {
    for j in 0..255 {
        rainbow_frame(frame, j);
        transport.present(frame)?;
        pause(wait).await;
    }
    Ok(())
}

/// Ramp global brightness linearly from `brightness` to zero over `steps`
/// presents, then blank the strip and put the brightness back so a later
/// frame shows at the old level.
///
/// Transport errors are logged and the fade carries on; this runs during
/// shutdown where there is nobody left to report to.
pub async fn fade_to_black<T: LedTransport + ?Sized>(
    transport: &mut T,
    frame: &mut PixelFrame,
    brightness: f64,
    steps: usize,
    wait: Duration,
) {
    if brightness > 0.0 {
        debug!("Fading from {:.3} over {} steps", brightness, steps);
        for level in linspace(brightness, 0.0, steps) {
            if let Err(e) = transport.set_brightness(level).and_then(|_| transport.show()) {
                error!("Fade step failed: {}", e);
            }
            pause(wait).await;
        }
    }

    frame.blank();
    if let Err(e) = transport.present(frame) {
        error!("Failed to blank strip: {}", e);
    }
    if let Err(e) = transport.set_brightness(brightness) {
        error!("Failed to restore brightness: {}", e);
    }
}

/// Light each pixel in turn so a miswired strip is obvious. The strip
/// stays dark for `rest` after the pass so passes are told apart.
pub async fn walk_test<T: LedTransport + ?Sized>(
    transport: &mut T,
    frame: &mut PixelFrame,
    wait: Duration,
    rest: Duration,
) -> Result<(), DisplayError> {
    for i in 0..frame.len() {
        frame.blank();
        frame.set(i, wheel(0));
        transport.present(frame)?;
        pause(wait).await;
        frame.set(i, BLACK);
        transport.present(frame)?;
        pause(wait).await;
    }
    pause(rest).await;
    Ok(())
}
