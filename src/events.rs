/*
 *  events.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  Typed events produced by the input adapters
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

use std::time::Instant;
use log::warn;
use tokio::sync::mpsc;

/// Where a bearing came from. Mirrored sources report bearings reflected
/// across the N-S axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BearingSource {
    #[default]
    Generic,
    Mirrored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BearingEvent {
    pub confidence: f64,
    /// Degrees
    pub bearing: f64,
    /// Roughly an SNR value
    pub power: f64,
    /// DoA score per azimuth bin, 0-360 degrees
    pub samples: Vec<f64>,
    pub source: BearingSource,
}

/// Heading fix quality reported alongside GPS data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingStatus {
    Valid,
    /// Heading is still being estimated
    Ongoing,
}

impl HeadingStatus {
    /// Any status mentioning "Ongoing" means the heading cannot be trusted yet.
    pub fn from_status(status: &str) -> Self {
        if status.contains("Ongoing") {
            HeadingStatus::Ongoing
        } else {
            HeadingStatus::Valid
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadingEvent {
    /// kph
    pub speed: f64,
    /// Degrees, None when the receiver has no heading
    pub heading: Option<f64>,
    pub heading_status: Option<HeadingStatus>,
}

impl HeadingEvent {
    pub fn heading_valid(&self) -> bool {
        self.heading_status != Some(HeadingStatus::Ongoing)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    BrightnessUp,
    BrightnessDown,
    HudToggle,
    CompassToggle,
}

impl Control {
    pub(crate) fn index(&self) -> usize {
        match self {
            Control::BrightnessUp => 0,
            Control::BrightnessDown => 1,
            Control::HudToggle => 2,
            Control::CompassToggle => 3,
        }
    }
}

/// Edge seen on an active-low line. Falling means the line was pulled
/// low: button pressed, switch closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
}

impl Edge {
    pub fn is_active(&self) -> bool {
        *self == Edge::Falling
    }
}

/// A control edge, stamped when the line changed so a backlog in the
/// queue does not skew the debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonEvent {
    pub control: Control,
    pub edge: Edge,
    pub timestamp: Instant,
}

impl ButtonEvent {
    /// Edge seen just now
    pub fn new(control: Control, edge: Edge) -> Self {
        Self::at(control, edge, Instant::now())
    }

    pub fn at(control: Control, edge: Edge, timestamp: Instant) -> Self {
        Self { control, edge, timestamp }
    }
}

impl BearingEvent {
    /// Bearing in the receiver's own convention, mirrored sources flipped back
    pub fn corrected_bearing(&self) -> f64 {
        match self.source {
            BearingSource::Mirrored => (360.0 - self.bearing).rem_euclid(360.0),
            BearingSource::Generic => self.bearing,
        }
    }
}

/// Anything the mode controller reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    Bearing(BearingEvent),
    Heading(HeadingEvent),
    Button(ButtonEvent),
}

/// Producer side, one bounded queue per source so a flood of bearings
/// cannot starve the buttons.
#[derive(Debug, Clone)]
pub struct EventSenders {
    pub bearings: mpsc::Sender<BearingEvent>,
    pub headings: mpsc::Sender<HeadingEvent>,
    pub buttons: mpsc::Sender<ButtonEvent>,
}

/// Consumer side, owned by the mode controller
#[derive(Debug)]
pub struct EventSources {
    pub bearings: mpsc::Receiver<BearingEvent>,
    pub headings: mpsc::Receiver<HeadingEvent>,
    pub buttons: mpsc::Receiver<ButtonEvent>,
}

pub fn event_channels(depth: usize) -> (EventSenders, EventSources) {
    let (bearing_tx, bearing_rx) = mpsc::channel(depth);
    let (heading_tx, heading_rx) = mpsc::channel(depth);
    let (button_tx, button_rx) = mpsc::channel(depth);
    (
        EventSenders { bearings: bearing_tx, headings: heading_tx, buttons: button_tx },
        EventSources { bearings: bearing_rx, headings: heading_rx, buttons: button_rx },
    )
}

impl EventSenders {
    /// Queue an event without blocking. A full or closed queue drops it.
    pub fn dispatch(&self, event: DisplayEvent) -> bool {
        let sent = match event {
            DisplayEvent::Bearing(ev) => self.bearings.try_send(ev).map_err(|e| e.to_string()),
            DisplayEvent::Heading(ev) => self.headings.try_send(ev).map_err(|e| e.to_string()),
            DisplayEvent::Button(ev) => self.buttons.try_send(ev).map_err(|e| e.to_string()),
        };
        match sent {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropped event: {}", e);
                false
            }
        }
    }
}
