/*
 *  display/drivers/ws281x.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  WS2811/WS2812 (NeoPixel) transport clocked out over SPI
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

// At 2.4 MHz each SPI bit lasts ~417 ns, so a WS281x data bit is sent as
// three SPI bits: 110 for a one, 100 for a zero. Holding MOSI low for the
// reset period latches the frame.

use crate::display::color::{scale, PixelOrder, RGB8};

/// Zero bytes appended after the pixel data, >= 280 us at 2.4 MHz
pub const RESET_BYTES: usize = 90;

/// Expand one data byte into the three SPI bytes that carry it
pub fn encode_byte(byte: u8) -> [u8; 3] {
    let mut bits: u32 = 0;
    for i in (0..8).rev() {
        let pattern = if byte & (1 << i) != 0 { 0b110 } else { 0b100 };
        bits = (bits << 3) | pattern;
    }
    [(bits >> 16) as u8, (bits >> 8) as u8, bits as u8]
}

/// Encode a strip of pixels, brightness applied, into an SPI transfer
pub fn encode_pixels(pixels: &[RGB8], order: PixelOrder, brightness: f64, out: &mut Vec<u8>) {
    out.clear();
    let mut channels = Vec::with_capacity(pixels.len() * order.bytes_per_pixel());
    for &p in pixels {
        order.push_channels(scale(p, brightness), &mut channels);
    }
    out.reserve(channels.len() * 3 + RESET_BYTES);
    for byte in channels {
        out.extend_from_slice(&encode_byte(byte));
    }
    out.extend(std::iter::repeat(0u8).take(RESET_BYTES));
}

#[cfg(feature = "hardware")]
pub use spi_driver::Ws281xSpiDriver;

#[cfg(feature = "hardware")]
mod spi_driver {
    use log::info;
    use rppal::spi::{Bus, Mode, SlaveSelect, Spi};

    use super::encode_pixels;
    use crate::display::color::{PixelOrder, RGB8, BLACK};
    use crate::display::error::DisplayError;
    use crate::display::framebuffer::PixelFrame;
    use crate::display::traits::LedTransport;

    /// NeoPixel strip on the Raspberry Pi SPI MOSI pin
    pub struct Ws281xSpiDriver {
        spi: Spi,
        order: PixelOrder,
        staged: Vec<RGB8>,
        brightness: f64,
        buffer: Vec<u8>,
    }

    impl Ws281xSpiDriver {
        pub fn new(
            bus: u8,
            speed_hz: u32,
            order: PixelOrder,
            pixel_count: usize,
            brightness: f64,
        ) -> Result<Self, DisplayError> {
            let bus = match bus {
                0 => Bus::Spi0,
                1 => Bus::Spi1,
                2 => Bus::Spi2,
                3 => Bus::Spi3,
                4 => Bus::Spi4,
                5 => Bus::Spi5,
                6 => Bus::Spi6,
                other => {
                    return Err(DisplayError::InvalidConfiguration(format!(
                        "no SPI bus {}",
                        other
                    )))
                }
            };
            let spi = Spi::new(bus, SlaveSelect::Ss0, speed_hz, Mode::Mode0)
                .map_err(|e| DisplayError::InitializationFailed(e.to_string()))?;
            info!("WS281x strip of {} pixels on {:?} at {} Hz", pixel_count, bus, speed_hz);

            Ok(Self {
                spi,
                order,
                staged: vec![BLACK; pixel_count],
                brightness: brightness.clamp(0.0, 1.0),
                buffer: Vec::new(),
            })
        }
    }

    impl LedTransport for Ws281xSpiDriver {
        fn pixel_count(&self) -> usize {
            self.staged.len()
        }

        fn write(&mut self, frame: &PixelFrame) -> Result<(), DisplayError> {
            if frame.len() != self.staged.len() {
                return Err(DisplayError::BufferSizeMismatch {
                    expected: self.staged.len(),
                    actual: frame.len(),
                });
            }
            self.staged.copy_from_slice(frame.pixels());
            Ok(())
        }

        fn set_brightness(&mut self, brightness: f64) -> Result<(), DisplayError> {
            self.brightness = brightness.clamp(0.0, 1.0);
            Ok(())
        }

        fn brightness(&self) -> f64 {
            self.brightness
        }

        fn show(&mut self) -> Result<(), DisplayError> {
            encode_pixels(&self.staged, self.order, self.brightness, &mut self.buffer);
            self.spi.write(&self.buffer)?;
            Ok(())
        }
    }
}
