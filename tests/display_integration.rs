/*
 *  tests/display_integration.rs
 *
 *  Integration tests for the display pipeline, from telemetry datagrams
 *  through the mode controller to the strip
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
 */

use std::time::{Duration, Instant};

use doa_ring::buttons::Debouncer;
use doa_ring::config::Config;
use doa_ring::display::color::scale;
use doa_ring::display::drivers::mock::MockDriver;
use doa_ring::display::{
    wheel, DisplayMode, DisplayState, FadeConfig, FrameComposer, ModeController, PixelFrame,
    PowerBand, PowerScale, BLACK,
};
use doa_ring::events::{event_channels, ButtonEvent, Control, DisplayEvent, Edge};
use doa_ring::listener::{handle_datagram, parse_datagram};
use tokio::sync::watch;

fn controller_for(config: &Config, mode: DisplayMode, hud: bool) -> (ModeController<MockDriver>, MockDriver) {
    let driver = MockDriver::new(config.total_pixels());
    let state = DisplayState::new(mode, hud, config.brightness.initial, config.ring.rose_points);
    let ctrl = ModeController::new(
        driver.clone(),
        FrameComposer::new(config.composer_config()),
        state,
        config.brightness,
        Debouncer::new(Duration::from_millis(config.controls.debounce_ms)),
    )
    .unwrap()
    .with_fade(FadeConfig { steps: 5, wait: Duration::ZERO });
    (ctrl, driver)
}

/// 48 flat samples with a spike at `peak`, as a BEARING datagram
fn bearing_datagram(peak: usize, power: f64, source: Option<&str>) -> String {
    let mut samples = vec![0.0; 48];
    samples[peak] = 1.0;
    let source = source.map(|s| format!(r#","source":"{}""#, s)).unwrap_or_default();
    format!(
        r#"{{"type":"BEARING","confidence":45,"bearing":150,"power":{},"raw_doa":{:?}{}}}"#,
        power, samples, source
    )
}

fn shown(driver: &MockDriver) -> PixelFrame {
    driver.shown().expect("nothing shown")
}

fn lit_ring_pixels(frame: &PixelFrame, rose: doa_ring::display::RGB8) -> Vec<usize> {
    frame
        .ring()
        .iter()
        .enumerate()
        .filter(|(_, p)| **p != BLACK && **p != rose)
        .map(|(i, _)| i)
        .collect()
}

fn rose_color() -> doa_ring::display::RGB8 {
    scale(wheel(255), 0.04)
}

fn apply(ctrl: &mut ModeController<MockDriver>, datagram: &str) {
    match parse_datagram(datagram.as_bytes()).unwrap().into_event() {
        Some(DisplayEvent::Bearing(ev)) => {
            ctrl.handle_bearing(&ev);
        }
        Some(DisplayEvent::Heading(ev)) => {
            ctrl.handle_heading(&ev);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_single_beam_lights_one_pixel() {
    let config = Config::default();
    let (mut ctrl, driver) = controller_for(&config, DisplayMode::Bearing, false);

    apply(&mut ctrl, &bearing_datagram(20, -25.0, None));

    let frame = shown(&driver);
    let rose = rose_color();
    assert_eq!(lit_ring_pixels(&frame, rose), vec![10]);
    assert_eq!(frame.get(10), Some(wheel(207)));
    for i in [0, 6, 12, 18] {
        assert_eq!(frame.get(i), Some(rose));
    }
    // below the bottom of the default scale
    assert!(frame.scale().iter().all(|p| *p == BLACK));
}

#[test]
fn test_mirrored_source_is_reflected() {
    let config = Config::default();
    let (mut ctrl, driver) = controller_for(&config, DisplayMode::Bearing, false);

    apply(&mut ctrl, &bearing_datagram(20, -25.0, Some("kerberos-sdr")));
    // sample 20 of 48 reversed is 27, ring pixel 13
    assert_eq!(lit_ring_pixels(&shown(&driver), rose_color()), vec![13]);
}

#[test]
fn test_hud_flips_ring_and_scale() {
    let config = Config::default();
    let (mut ctrl, driver) = controller_for(&config, DisplayMode::Bearing, true);

    apply(&mut ctrl, &bearing_datagram(20, 12.0, None));
    let frame = shown(&driver);
    // first half reversed, sample 20 lands on 3, ring pixel 1
    assert_eq!(lit_ring_pixels(&frame, rose_color()), vec![1]);

    // 12 dB reaches the first two of eight steps over 5..30, drawn from the far end
    let scale = frame.scale();
    assert_eq!(scale[7], wheel(1));
    assert_eq!(scale[6], wheel(1));
    assert!(scale[..6].iter().all(|p| *p == BLACK));
}

#[test]
fn test_compass_shows_heading_and_speed() {
    let config = Config::default();
    let (mut ctrl, driver) = controller_for(&config, DisplayMode::Compass, false);

    apply(&mut ctrl, r#"{"type":"GPS","speed":40.0,"heading":90.0}"#);
    let frame = shown(&driver);
    assert_eq!(lit_ring_pixels(&frame, rose_color()), vec![18]);
    assert_eq!(frame.get(18), Some(wheel(160)));

    let lit = frame.scale().iter().filter(|p| **p != BLACK).count();
    assert_eq!(lit, 4);
}

#[test]
fn test_ongoing_heading_hides_rose() {
    let config = Config::default();
    let (mut ctrl, driver) = controller_for(&config, DisplayMode::Bearing, false);

    apply(
        &mut ctrl,
        r#"{"type":"GPS","speed":0,"heading":10,"heading_status":"Ongoing"}"#,
    );
    apply(&mut ctrl, &bearing_datagram(20, -25.0, None));

    let frame = shown(&driver);
    assert_eq!(frame.get(0), Some(BLACK));
    assert_eq!(frame.ring().iter().filter(|p| **p != BLACK).count(), 1);
}

#[test]
fn test_power_bands_fill_lower_bands() {
    let mut config = Config::default();
    config.power = PowerScale::Bands {
        bands: vec![
            PowerBand { min: -60.0, max: -40.0, color: 1 },
            PowerBand { min: -40.0, max: -20.0, color: 85 },
            PowerBand { min: -20.0, max: -1.0, color: 170 },
        ],
    };
    let (mut ctrl, driver) = controller_for(&config, DisplayMode::Bearing, false);

    apply(&mut ctrl, &bearing_datagram(20, -30.0, None));
    let frame = shown(&driver);
    let scale = frame.scale();
    assert!(scale[..4].iter().all(|p| *p == wheel(85)));
    assert!(scale[4..].iter().all(|p| *p == wheel(1)));
}

#[test]
fn test_compass_switch_gates_bearings() {
    let config = Config::default();
    let (mut ctrl, driver) = controller_for(&config, DisplayMode::Bearing, false);
    let now = Instant::now();

    ctrl.handle_button(ButtonEvent::at(Control::CompassToggle, Edge::Falling, now));
    let writes = driver.state().lock().unwrap().write_count;
    apply(&mut ctrl, &bearing_datagram(20, -25.0, None));
    assert_eq!(driver.state().lock().unwrap().write_count, writes);
    assert_eq!(driver.count_lit_pixels(), 0);

    ctrl.handle_button(ButtonEvent::at(Control::CompassToggle, Edge::Rising, now));
    apply(&mut ctrl, &bearing_datagram(20, -25.0, None));
    assert!(driver.count_lit_pixels() > 0);
}

#[tokio::test]
async fn test_datagrams_through_running_controller() {
    let config = Config::default();
    let (ctrl, driver) = controller_for(&config, DisplayMode::Bearing, false);
    let (senders, sources) = event_channels(8);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(ctrl.run(sources, shutdown_rx));

    assert!(handle_datagram(bearing_datagram(20, -25.0, None).as_bytes(), &senders));
    assert!(!handle_datagram(br#"{"type":"PAYLOAD_SUMMARY"}"#, &senders));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(lit_ring_pixels(&shown(&driver), rose_color()), vec![10]);

    shutdown_tx.send(true).unwrap();
    let ctrl = task.await.unwrap();
    assert_eq!(driver.count_lit_pixels(), 0);
    assert_eq!(ctrl.state().brightness, config.brightness.initial);
}
