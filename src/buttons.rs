/*
 *  buttons.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  Push buttons and toggle switches on the GPIO header
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

use std::time::{Duration, Instant};

use crate::config::ControlsConfig;
use crate::events::Control;

/// Drops repeat activations of a control inside the debounce window.
/// Each control keeps its own window.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last: [Option<Instant>; 4],
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self { window, last: [None; 4] }
    }

    /// True if the activation at `now` should be acted on
    pub fn accept(&mut self, control: Control, now: Instant) -> bool {
        let slot = &mut self.last[control.index()];
        if let Some(prev) = *slot {
            if now.saturating_duration_since(prev) < self.window {
                return false;
            }
        }
        *slot = Some(now);
        true
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::constants::DEBOUNCE_MS))
    }
}

/// BCM pin wired to each control
pub fn pin_map(cfg: &ControlsConfig) -> [(Control, u8); 4] {
    [
        (Control::BrightnessUp, cfg.brightness_up),
        (Control::BrightnessDown, cfg.brightness_down),
        (Control::HudToggle, cfg.hud_switch),
        (Control::CompassToggle, cfg.compass_switch),
    ]
}

#[cfg(feature = "hardware")]
pub use gpio_inputs::ButtonInputs;

#[cfg(feature = "hardware")]
mod gpio_inputs {
    use log::{debug, info, warn};
    use rppal::gpio::{Gpio, InputPin, Level, Trigger};
    use tokio::sync::mpsc;

    use super::pin_map;
    use crate::config::ControlsConfig;
    use crate::display::DisplayError;
    use crate::events::{ButtonEvent, Control, Edge};

    /// Interrupt-driven inputs. The pins stay armed for as long as this
    /// value lives.
    pub struct ButtonInputs {
        pins: Vec<(Control, InputPin)>,
    }

    impl ButtonInputs {
        /// Claim the pins with pull-ups and forward both edges as events
        pub fn open(cfg: &ControlsConfig, tx: mpsc::Sender<ButtonEvent>) -> Result<Self, DisplayError> {
            let gpio = Gpio::new()?;
            let mut pins = Vec::with_capacity(4);

            for (control, bcm) in pin_map(cfg) {
                let mut pin = gpio.get(bcm)?.into_input_pullup();
                let tx = tx.clone();
                pin.set_async_interrupt(Trigger::Both, move |level: Level| {
                    let edge = match level {
                        Level::Low => Edge::Falling,
                        Level::High => Edge::Rising,
                    };
                    debug!("{:?} {:?}", control, edge);
                    if let Err(e) = tx.try_send(ButtonEvent::new(control, edge)) {
                        warn!("Button event dropped: {}", e);
                    }
                })?;
                info!("{:?} on GPIO{}", control, bcm);
                pins.push((control, pin));
            }

            Ok(Self { pins })
        }

        /// Current level of a control, true when pulled low
        pub fn is_active(&self, control: Control) -> bool {
            self.pins
                .iter()
                .find(|(c, _)| *c == control)
                .map(|(_, pin)| pin.is_low())
                .unwrap_or(false)
        }
    }
}
