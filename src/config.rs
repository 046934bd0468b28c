use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::constants::*;
use crate::display::{
    BrightnessConfig, Capabilities, ComposerConfig, ConfidenceColorMap, DisplayMode, PixelOrder,
    PowerScale,
};

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// What the process does once the strip is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Render bearings/headings from the network
    #[default]
    Display,
    /// Continuous rainbow
    Rainbow,
    /// Pixel walk test
    WalkTest,
}

/// Top-level app configuration. Every section falls back to the built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// General options
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub ring: RingConfig,
    pub confidence: ConfidenceColorMap,
    pub power: PowerScale,
    pub brightness: BrightnessConfig,
    pub startup: StartupConfig,
    pub controls: ControlsConfig,
    pub network: NetworkConfig,
    pub transport: TransportConfig,
    pub effects: EffectsConfig,

    /// Selected from the command line only
    #[serde(skip)]
    pub run_mode: RunMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RingConfig {
    pub ring_pixels: usize,
    pub scale_pixels: usize,
    pub pixel_order: PixelOrder,
    /// Fraction of the data range clipped to zero, sharpens narrow beams
    pub clip_fraction: f64,
    pub rose_points: usize,
    pub rose_brightness: f64,
    pub capabilities: Capabilities,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            ring_pixels: RING_NUM_PIXELS,
            scale_pixels: SCALE_NUM_PIXELS,
            pixel_order: PixelOrder::default(),
            clip_fraction: CLIP_VALUE,
            rose_points: ROSE_POINTS,
            rose_brightness: ROSE_BRIGHTNESS,
            capabilities: Capabilities::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    pub mode: DisplayMode,
    /// HUD mode - display on the dashboard viewed via the windscreen
    pub hud: bool,
    /// Rainbow attract display before going live
    pub splash: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self { mode: DisplayMode::Bearing, hud: false, splash: true }
    }
}

/// BCM pin numbers of the active-low controls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub enabled: bool,
    pub brightness_up: u8,
    pub brightness_down: u8,
    pub hud_switch: u8,
    pub compass_switch: u8,
    pub debounce_ms: u64,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            brightness_up: PIN_BRIGHTNESS_UP,
            brightness_down: PIN_BRIGHTNESS_DOWN,
            hud_switch: PIN_HUD_SWITCH,
            compass_switch: PIN_COMPASS_SWITCH,
            debounce_ms: DEBOUNCE_MS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub udp_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self { udp_port: UDP_PORT }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Use the logging mock strip instead of SPI hardware
    pub emulated: bool,
    pub spi_bus: u8,
    pub spi_speed_hz: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { emulated: false, spi_bus: 0, spi_speed_hz: SPI_SPEED_HZ }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    pub fade_steps: usize,
    pub shutdown_fade_steps: usize,
    pub fade_wait_ms: u64,
    pub rainbow_wait_us: u64,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            fade_steps: FADE_STEPS,
            shutdown_fade_steps: SHUTDOWN_FADE_STEPS,
            fade_wait_ms: FADE_WAIT_MS,
            rainbow_wait_us: RAINBOW_WAIT_US,
        }
    }
}

impl Config {
    pub fn total_pixels(&self) -> usize {
        self.ring.ring_pixels + self.ring.scale_pixels
    }

    pub fn composer_config(&self) -> ComposerConfig {
        ComposerConfig {
            ring_size: self.ring.ring_pixels,
            scale_size: self.ring.scale_pixels,
            clip_fraction: self.ring.clip_fraction,
            rose_brightness: self.ring.rose_brightness,
            confidence: self.confidence,
            power: self.power.clone(),
            capabilities: self.ring.capabilities,
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "doa-ring", about = "DoA bearing display for an LED ring", disable_help_flag = false)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, short = 'c', value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Verbose output
    #[arg(long, short = 'd', action = ArgAction::SetTrue)]
    pub debug: bool,
    /// UDP port to listen for bearing/GPS broadcasts on
    #[arg(long)]
    pub udp_port: Option<u16>,
    /// Initial brightness setting
    #[arg(long)]
    pub brightness: Option<f64>,
    /// Enable HUD mode
    #[arg(long, action = ArgAction::SetTrue)]
    pub hudmode: bool,
    /// Start in compass mode
    #[arg(long, action = ArgAction::SetTrue)]
    pub compass: bool,
    /// Continuous rainbow mode
    #[arg(long, action = ArgAction::SetTrue)]
    pub rainbow: bool,
    /// Walk a single lit pixel along the strip
    #[arg(long, action = ArgAction::SetTrue)]
    pub test: bool,
    /// Skip the startup rainbow
    #[arg(long, action = ArgAction::SetTrue)]
    pub no_splash: bool,
    /// Run without LED or GPIO hardware
    #[arg(long, action = ArgAction::SetTrue)]
    pub emulated: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = load_from(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Defaults, then YAML file (explicit path or search), then CLI overrides.
pub fn load_from(cli: &Cli) -> Result<Config, ConfigError> {
    let mut cfg = if let Some(p) = cli.config.as_ref() {
        if !p.exists() {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
        read_yaml(p)?
    } else if let Some(p) = find_config_file() {
        read_yaml(&p)?
    } else {
        Config::default()
    };

    apply_cli_overrides(&mut cfg, cli);
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/doa-ring/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/doa-ring/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/doa-ring.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["doa-ring.yaml", "config.yaml", "config/doa-ring.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()       { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                     { cfg.log_level = Some("debug".to_string()); }
    if let Some(port) = cli.udp_port { cfg.network.udp_port = port; }
    if let Some(b) = cli.brightness  { cfg.brightness.initial = b; }
    if cli.hudmode                   { cfg.startup.hud = true; }
    if cli.compass                   { cfg.startup.mode = DisplayMode::Compass; }
    if cli.no_splash                 { cfg.startup.splash = false; }
    if cli.emulated                  { cfg.transport.emulated = true; }

    cfg.run_mode = if cli.test {
        RunMode::WalkTest
    } else if cli.rainbow {
        RunMode::Rainbow
    } else {
        RunMode::Display
    };
}

fn invalid<T: Into<String>>(msg: T) -> Result<(), ConfigError> {
    Err(ConfigError::Validation(msg.into()))
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let ring = &cfg.ring;
    if ring.ring_pixels == 0 {
        return invalid("ring_pixels must be > 0");
    }
    if ring.rose_points > ring.ring_pixels {
        return invalid("rose_points must not exceed ring_pixels");
    }
    if !(0.0..=1.0).contains(&ring.clip_fraction) {
        return invalid("clip_fraction must be 0..=1");
    }
    if !(0.0..=1.0).contains(&ring.rose_brightness) {
        return invalid("rose_brightness must be 0..=1");
    }

    let b = &cfg.brightness;
    if !(0.0 <= b.min && b.min <= b.max && b.max <= 1.0) {
        return invalid("brightness must satisfy 0 <= min <= max <= 1");
    }
    if !(b.min..=b.max).contains(&b.initial) {
        return invalid(format!("initial brightness {} outside {}..={}", b.initial, b.min, b.max));
    }
    if !(b.step > 0.0) {
        return invalid("brightness step must be > 0");
    }

    let c = &cfg.confidence;
    if !(c.min < c.max) {
        return invalid("confidence min must be below max");
    }

    match &cfg.power {
        PowerScale::Linear { min, max, .. } => {
            if !(min < max) {
                return invalid("power min must be below max");
            }
        }
        PowerScale::Bands { bands } => {
            if bands.is_empty() {
                return invalid("power bands must not be empty");
            }
            if bands.iter().any(|band| !(band.min < band.max)) {
                return invalid("each power band needs min < max");
            }
            if bands.windows(2).any(|w| w[0].max > w[1].min) {
                return invalid("power bands must be ordered and disjoint");
            }
        }
    }

    if cfg.effects.fade_steps == 0 || cfg.effects.shutdown_fade_steps == 0 {
        return invalid("fade steps must be > 0");
    }

    if cfg.controls.enabled {
        let c = &cfg.controls;
        let mut pins = [c.brightness_up, c.brightness_down, c.hud_switch, c.compass_switch];
        pins.sort_unstable();
        if pins.windows(2).any(|w| w[0] == w[1]) {
            return invalid("control pins must be distinct");
        }
    }
    Ok(())
}
