//! This module contains global constants used across the display and other modules.
//! Most of these are defaults; the effective values come from `config.rs`.

/// Number of pixels in the main ring.
/// Pixel #0 is at the top of the ring, numbered clockwise.
pub const RING_NUM_PIXELS: usize = 24;
/// Number of pixels in the linear power scale, wired in after the ring.
pub const SCALE_NUM_PIXELS: usize = 8;

/// Initial global brightness of the strip.
pub const BRIGHTNESS: f64 = 0.1;
pub const MIN_BRIGHTNESS: f64 = 0.01;
pub const MAX_BRIGHTNESS: f64 = 0.2;
/// Brightness change per button press.
pub const BRIGHTNESS_STEP: f64 = 0.02;

// Compass rose markers
/// Relative brightness of a rose marker.
pub const ROSE_BRIGHTNESS: f64 = 0.04;
/// Number of rose points around the ring.
pub const ROSE_POINTS: usize = 4;

// Confidence to color wheel mapping for the ring
pub const CONFIDENCE_MIN: f64 = 20.0;
pub const CONFIDENCE_MAX: f64 = 70.0;
pub const CONFIDENCE_MIN_COL: u8 = 255;
pub const CONFIDENCE_MAX_COL: u8 = 160;

/// Fraction of the data range treated as floor, makes narrow beams show up well.
pub const CLIP_VALUE: f64 = 0.7;

// Linear power scale
pub const POWER_MIN: f64 = 5.0;
pub const POWER_MAX: f64 = 30.0;
pub const POWER_COL: u8 = 1;

/// Speed range (kph) mapped onto the power scale in compass mode.
pub const SPEED_MIN_KPH: f64 = -1.0;
pub const SPEED_MAX_KPH: f64 = 80.0;

/// Bins in a synthesized heading sample array (one per degree).
pub const HEADING_BINS: usize = 360;
/// Value of the heading spike in a synthesized heading sample array.
pub const HEADING_SPIKE: f64 = 0.99;

/// Source tag of receivers whose bearings are reflected across the N-S axis.
pub const MIRRORED_SOURCE: &str = "kerberos-sdr";

// Network
pub const UDP_PORT: u16 = 55672;
/// Largest datagram we accept.
pub const MAX_JSON_LEN: usize = 32768;

/// Quiet window for the brightness buttons.
pub const DEBOUNCE_MS: u64 = 100;

/// Per-source event queue depth.
pub const EVENT_QUEUE_DEPTH: usize = 32;

// Fades and attract modes
pub const FADE_STEPS: usize = 500;
pub const SHUTDOWN_FADE_STEPS: usize = 100;
pub const FADE_WAIT_MS: u64 = 1;
pub const RAINBOW_WAIT_US: u64 = 500;
/// Per-pixel on/off time of the pixel walk test.
pub const WALK_TEST_MS: u64 = 400;
/// Dark gap between walk test passes.
pub const WALK_TEST_PAUSE_MS: u64 = 3000;

// Default BCM pin numbers of the active-low controls
pub const PIN_BRIGHTNESS_UP: u8 = 5;
pub const PIN_BRIGHTNESS_DOWN: u8 = 6;
pub const PIN_HUD_SWITCH: u8 = 13;
pub const PIN_COMPASS_SWITCH: u8 = 19;

/// WS281x bit clock, three SPI bits per data bit.
pub const SPI_SPEED_HZ: u32 = 2_400_000;
