/*
 *  display/factory.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  Builds the LED transport from configuration
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

use crate::config::Config;
use crate::display::drivers::mock::MockDriver;
use crate::display::error::DisplayError;
use crate::display::traits::BoxedTransport;
use log::info;

#[cfg(feature = "hardware")]
use crate::display::drivers::ws281x::Ws281xSpiDriver;

/// Factory for creating LED transports from configuration
pub struct TransportFactory;

impl TransportFactory {
    /// Create the strip transport
    ///
    /// Emulated configs get a logging mock strip. Otherwise the WS281x SPI
    /// driver is used when the crate is built with `hardware`.
    pub fn create_from_config(config: &Config) -> Result<BoxedTransport, DisplayError> {
        let pixels = config.total_pixels();
        let brightness = config.brightness.initial;

        if config.transport.emulated {
            info!("Emulation mode enabled - {} pixel mock strip", pixels);
            return Ok(Self::emulated(pixels));
        }

        #[cfg(feature = "hardware")]
        {
            let driver = Ws281xSpiDriver::new(
                config.transport.spi_bus,
                config.transport.spi_speed_hz,
                config.ring.pixel_order,
                pixels,
                brightness,
            )?;
            Ok(Box::new(driver))
        }

        #[cfg(not(feature = "hardware"))]
        {
            log::warn!(
                "Built without hardware support, using a mock strip (brightness {:.2})",
                brightness
            );
            Ok(Self::emulated(pixels))
        }
    }

    fn emulated(pixels: usize) -> BoxedTransport {
        Box::new(MockDriver::new_logging(pixels))
    }
}
