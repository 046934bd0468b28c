/*
 *  display/mode_controller.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 *
 *  Mode controller - owns the display state and the strip, arbitrates
 *  between bearings, GPS headings and the front panel controls
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
use log::{debug, error, info};
use tokio::sync::watch;

use super::composer::FrameComposer;
use super::effects::fade_to_black;
use super::error::DisplayError;
use super::framebuffer::PixelFrame;
use super::state::{BrightnessConfig, DisplayState};
use super::traits::LedTransport;
use super::DisplayMode;
use crate::buttons::Debouncer;
use crate::constants::{FADE_WAIT_MS, SHUTDOWN_FADE_STEPS};
use crate::events::{BearingEvent, ButtonEvent, Control, EventSources, HeadingEvent};

/// Fade applied when the controller stops
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeConfig {
    pub steps: usize,
    pub wait: Duration,
}

impl Default for FadeConfig {
    fn default() -> Self {
        Self {
            steps: SHUTDOWN_FADE_STEPS,
            wait: Duration::from_millis(FADE_WAIT_MS),
        }
    }
}

/// Single owner of the display state and the transport. Events are
/// handled one at a time so a frame is always composed from a consistent
/// state.
pub struct ModeController<T: LedTransport> {
    state: DisplayState,
    composer: FrameComposer,
    frame: PixelFrame,
    transport: T,
    limits: BrightnessConfig,
    debouncer: Debouncer,
    fade: FadeConfig,
}

impl<T: LedTransport> ModeController<T> {
    pub fn new(
        mut transport: T,
        composer: FrameComposer,
        mut state: DisplayState,
        limits: BrightnessConfig,
        debouncer: Debouncer,
    ) -> Result<Self, DisplayError> {
        let frame = composer.new_frame();
        if transport.pixel_count() != frame.len() {
            return Err(DisplayError::BufferSizeMismatch {
                expected: frame.len(),
                actual: transport.pixel_count(),
            });
        }

        state.brightness = limits.clamp(state.brightness);
        transport.set_brightness(state.brightness)?;

        Ok(Self {
            state,
            composer,
            frame,
            transport,
            limits,
            debouncer,
            fade: FadeConfig::default(),
        })
    }

    pub fn with_fade(mut self, fade: FadeConfig) -> Self {
        self.fade = fade;
        self
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    /// Render a bearing if the ring is showing bearings.
    /// Returns true if a frame was presented.
    pub fn handle_bearing(&mut self, event: &BearingEvent) -> bool {
        debug!(
            "Bearing {:.1} confidence {:.1} power {:.1}",
            event.corrected_bearing(),
            event.confidence,
            event.power
        );
        if self.state.mode != DisplayMode::Bearing {
            return false;
        }
        self.composer.compose_bearing(&mut self.frame, event, &self.state);
        self.present()
    }

    /// Track heading validity always, render only in compass mode
    pub fn handle_heading(&mut self, event: &HeadingEvent) -> bool {
        let valid = event.heading_valid();
        if valid != self.state.heading_valid {
            info!("Heading {}", if valid { "valid" } else { "not yet valid" });
            self.state.heading_valid = valid;
        }
        if self.state.mode != DisplayMode::Compass {
            return false;
        }
        self.composer.compose_compass(&mut self.frame, event, &self.state);
        self.present()
    }

    /// Apply a control edge. Switches follow their level; the brightness
    /// buttons act on press only, debounced on the time the edge was seen.
    pub fn handle_button(&mut self, event: ButtonEvent) -> bool {
        let active = event.edge.is_active();
        match event.control {
            Control::CompassToggle => {
                let mode = if active { DisplayMode::Compass } else { DisplayMode::Bearing };
                self.set_mode(mode)
            }
            Control::HudToggle => {
                if self.state.hud_orientation == active {
                    return false;
                }
                info!("HUD orientation {}", if active { "on" } else { "off" });
                self.state.hud_orientation = active;
                true
            }
            Control::BrightnessUp | Control::BrightnessDown => {
                if !active {
                    return false;
                }
                if !self.debouncer.accept(event.control, event.timestamp) {
                    debug!("Debounced {:?}", event.control);
                    return false;
                }
                let steps = if event.control == Control::BrightnessUp { 1 } else { -1 };
                if !self.state.step_brightness(steps, &self.limits) {
                    return false;
                }
                info!("Brightness {:.2}", self.state.brightness);
                let level = self.state.brightness;
                if let Err(e) = self.transport.set_brightness(level).and_then(|_| self.transport.show()) {
                    error!("Failed to apply brightness: {}", e);
                }
                true
            }
        }
    }

    /// Switch mode, blanking the strip so nothing stale from the old mode remains
    pub fn set_mode(&mut self, mode: DisplayMode) -> bool {
        if self.state.mode == mode {
            return false;
        }
        info!("Display mode changed: {:?} -> {:?}", self.state.mode, mode);
        self.state.mode = mode;
        self.frame.blank();
        self.present();
        true
    }

    fn present(&mut self) -> bool {
        match self.transport.present(&self.frame) {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to present frame: {}", e);
                false
            }
        }
    }

    pub async fn fade_out(&mut self) {
        fade_to_black(
            &mut self.transport,
            &mut self.frame,
            self.state.brightness,
            self.fade.steps,
            self.fade.wait,
        )
        .await;
    }

    /// Event loop. Shutdown is checked first, then controls, headings and
    /// bearings. The strip is faded out before returning.
    pub async fn run(mut self, mut sources: EventSources, mut shutdown: watch::Receiver<bool>) -> Self {
        info!("Mode controller started in {:?} mode", self.state.mode);

        if !*shutdown.borrow() {
            loop {
                tokio::select! {
                    biased;
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                    Some(event) = sources.buttons.recv() => {
                        self.handle_button(event);
                    }
                    Some(event) = sources.headings.recv() => {
                        self.handle_heading(&event);
                    }
                    Some(event) = sources.bearings.recv() => {
                        self.handle_bearing(&event);
                    }
                    else => break,
                }
            }
        }

        info!("Mode controller stopping");
        self.fade_out().await;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use crate::config::Config;
    use crate::display::drivers::mock::MockDriver;
    use crate::events::{event_channels, BearingSource, Edge, HeadingStatus};

    fn controller(mode: DisplayMode) -> (ModeController<MockDriver>, MockDriver) {
        let cfg = Config::default();
        let driver = MockDriver::new(cfg.total_pixels());
        let state = DisplayState::new(mode, false, cfg.brightness.initial, cfg.ring.rose_points);
        let ctrl = ModeController::new(
            driver.clone(),
            FrameComposer::new(cfg.composer_config()),
            state,
            cfg.brightness,
            Debouncer::new(Duration::from_millis(100)),
        )
        .unwrap()
        .with_fade(FadeConfig { steps: 10, wait: Duration::ZERO });
        (ctrl, driver)
    }

    fn bearing() -> BearingEvent {
        let mut samples = vec![0.1; 48];
        samples[20] = 1.0;
        BearingEvent {
            confidence: 45.0,
            bearing: 150.0,
            power: -25.0,
            samples,
            source: BearingSource::Generic,
        }
    }

    fn heading(status: Option<HeadingStatus>) -> HeadingEvent {
        HeadingEvent { speed: 40.0, heading: Some(90.0), heading_status: status }
    }

    #[test]
    fn test_rejects_wrong_strip_length() {
        let cfg = Config::default();
        let state = DisplayState::new(DisplayMode::Bearing, false, 0.1, 4);
        let result = ModeController::new(
            MockDriver::new(24),
            FrameComposer::new(cfg.composer_config()),
            state,
            cfg.brightness,
            Debouncer::default(),
        );
        assert!(matches!(
            result,
            Err(DisplayError::BufferSizeMismatch { expected: 32, actual: 24 })
        ));
    }

    #[test]
    fn test_initial_brightness_applied() {
        let (_ctrl, driver) = controller(DisplayMode::Bearing);
        assert_eq!(driver.brightness(), 0.1);
    }

    #[test]
    fn test_bearing_ignored_in_compass_mode() {
        let (mut ctrl, driver) = controller(DisplayMode::Compass);
        assert!(!ctrl.handle_bearing(&bearing()));
        assert_eq!(driver.state().lock().unwrap().write_count, 0);
    }

    #[test]
    fn test_bearing_rendered_in_bearing_mode() {
        let (mut ctrl, driver) = controller(DisplayMode::Bearing);
        assert!(ctrl.handle_bearing(&bearing()));
        let state = driver.state();
        let s = state.lock().unwrap();
        assert_eq!(s.write_count, 1);
        assert_eq!(s.show_count, 1);
        assert!(!s.shown.as_ref().unwrap().is_black());
    }

    #[test]
    fn test_heading_validity_tracked_in_any_mode() {
        let (mut ctrl, driver) = controller(DisplayMode::Bearing);
        assert!(!ctrl.handle_heading(&heading(Some(HeadingStatus::Ongoing))));
        assert!(!ctrl.state().heading_valid);
        assert_eq!(driver.state().lock().unwrap().write_count, 0);

        assert!(!ctrl.handle_heading(&heading(None)));
        assert!(ctrl.state().heading_valid);
    }

    #[test]
    fn test_heading_rendered_in_compass_mode() {
        let (mut ctrl, driver) = controller(DisplayMode::Compass);
        assert!(ctrl.handle_heading(&heading(Some(HeadingStatus::Valid))));
        assert!(driver.count_lit_pixels() > 0);
    }

    #[test]
    fn test_compass_switch_follows_level_and_blanks() {
        let (mut ctrl, driver) = controller(DisplayMode::Bearing);
        let now = Instant::now();
        ctrl.handle_bearing(&bearing());
        assert!(driver.count_lit_pixels() > 0);

        assert!(ctrl.handle_button(ButtonEvent::at(Control::CompassToggle, Edge::Falling, now)));
        assert_eq!(ctrl.state().mode, DisplayMode::Compass);
        assert_eq!(driver.count_lit_pixels(), 0);

        // same level again is a no-op
        assert!(!ctrl.handle_button(ButtonEvent::at(Control::CompassToggle, Edge::Falling, now)));
        assert!(ctrl.handle_button(ButtonEvent::at(Control::CompassToggle, Edge::Rising, now)));
        assert_eq!(ctrl.state().mode, DisplayMode::Bearing);
    }

    #[test]
    fn test_hud_switch() {
        let (mut ctrl, _driver) = controller(DisplayMode::Bearing);
        let now = Instant::now();
        assert!(ctrl.handle_button(ButtonEvent::at(Control::HudToggle, Edge::Falling, now)));
        assert!(ctrl.state().hud_orientation);
        assert!(ctrl.handle_button(ButtonEvent::at(Control::HudToggle, Edge::Rising, now)));
        assert!(!ctrl.state().hud_orientation);
    }

    #[test]
    fn test_brightness_debounced() {
        let (mut ctrl, driver) = controller(DisplayMode::Bearing);
        let t0 = Instant::now();
        let up = |ms| ButtonEvent::at(Control::BrightnessUp, Edge::Falling, t0 + Duration::from_millis(ms));

        assert!(ctrl.handle_button(up(0)));
        assert!(!ctrl.handle_button(up(50)));
        assert!((ctrl.state().brightness - 0.12).abs() < 1e-9);
        assert!((driver.brightness() - 0.12).abs() < 1e-9);

        // release edge does nothing
        assert!(!ctrl.handle_button(ButtonEvent::at(Control::BrightnessUp, Edge::Rising, t0)));

        assert!(ctrl.handle_button(up(150)));
        assert!((ctrl.state().brightness - 0.14).abs() < 1e-9);
    }

    #[test]
    fn test_brightness_clamped_at_limits() {
        let (mut ctrl, _driver) = controller(DisplayMode::Bearing);
        let t0 = Instant::now();
        for i in 0..10 {
            let down = ButtonEvent::at(Control::BrightnessDown, Edge::Falling, t0 + Duration::from_millis(200 * i));
            ctrl.handle_button(down);
        }
        assert!((ctrl.state().brightness - 0.01).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fade_out_leaves_strip_black() {
        let (mut ctrl, driver) = controller(DisplayMode::Bearing);
        ctrl.handle_bearing(&bearing());
        ctrl.fade_out().await;
        assert_eq!(driver.count_lit_pixels(), 0);
        assert_eq!(driver.brightness(), 0.1);
        assert_eq!(ctrl.state().brightness, 0.1);
    }

    #[tokio::test]
    async fn test_run_until_shutdown() {
        let (ctrl, driver) = controller(DisplayMode::Bearing);
        let (tx, sources) = event_channels(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(ctrl.run(sources, shutdown_rx));
        tx.buttons
            .send(ButtonEvent::new(Control::HudToggle, Edge::Falling))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(true).unwrap();

        let ctrl = handle.await.unwrap();
        assert!(ctrl.state().hud_orientation);
        assert_eq!(driver.count_lit_pixels(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_when_shutdown_dropped() {
        let (ctrl, _driver) = controller(DisplayMode::Compass);
        let (_tx, sources) = event_channels(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(shutdown_tx);
        let ctrl = ctrl.run(sources, shutdown_rx).await;
        assert_eq!(ctrl.state().mode, DisplayMode::Compass);
    }

    #[tokio::test]
    async fn test_run_survives_write_failure() {
        let (ctrl, driver) = controller(DisplayMode::Bearing);
        let state = driver.state();
        let (tx, sources) = event_channels(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(ctrl.run(sources, shutdown_rx));

        state.lock().unwrap().simulate_write_failure = true;
        tx.bearings.send(bearing()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(state.lock().unwrap().shown.is_none());

        state.lock().unwrap().simulate_write_failure = false;
        let mut second = bearing();
        second.samples = vec![0.1; 48];
        second.samples[4] = 1.0;
        tx.bearings.send(second).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        {
            let s = state.lock().unwrap();
            assert_eq!(s.write_count, 1);
            let shown = s.shown.as_ref().unwrap();
            assert_eq!(shown.get(2), Some(crate::display::wheel(207)));
        }

        shutdown_tx.send(true).unwrap();
        handle.await.unwrap();
        assert_eq!(driver.count_lit_pixels(), 0);
        assert_eq!(driver.brightness(), 0.1);
    }

    #[tokio::test]
    async fn test_backlogged_presses_debounced_on_edge_time() {
        let (ctrl, driver) = controller(DisplayMode::Bearing);
        let (tx, sources) = event_channels(8);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // queued before the loop runs, so both are dequeued back to back
        let t0 = Instant::now();
        for ms in [0, 150] {
            let press = ButtonEvent::at(Control::BrightnessUp, Edge::Falling, t0 + Duration::from_millis(ms));
            tx.buttons.send(press).await.unwrap();
        }
        let handle = tokio::spawn(ctrl.run(sources, shutdown_rx));
        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(true).unwrap();

        let ctrl = handle.await.unwrap();
        assert!((ctrl.state().brightness - 0.14).abs() < 1e-9);
        assert!((driver.brightness() - 0.14).abs() < 1e-9);
    }
}
