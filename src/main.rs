/*
 *  main.rs
 *
 *  DoA Ring - bearing display
 *  (c) 2020-26 The DoA Ring authors
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
use log::{info, error};
use env_logger::Env;
use tokio::sync::watch;

#[cfg(unix)] // Only compile this block on Unix-like systems
use tokio::signal::unix::{signal, SignalKind}; // Import specific Unix signals

use doa_ring::buttons::Debouncer;
use doa_ring::config::{self, Config, EffectsConfig, RunMode};
use doa_ring::constants::{EVENT_QUEUE_DEPTH, WALK_TEST_MS, WALK_TEST_PAUSE_MS};
use doa_ring::display::effects::{fade_to_black, rainbow_cycle, walk_test};
use doa_ring::display::{
    BoxedTransport, DisplayError, DisplayMode, DisplayState, FadeConfig, FrameComposer,
    LedTransport, ModeController, PixelFrame, TransportFactory,
};
use doa_ring::events::event_channels;
use doa_ring::listener;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
/// Once a signal is caught it is logged and we return, allowing for
/// graceful shutdown.
async fn signal_handler() -> std::io::Result<()> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

/// Rainbow or pixel walk, forever
async fn effect_loop(
    transport: &mut BoxedTransport,
    frame: &mut PixelFrame,
    mode: RunMode,
    effects: &EffectsConfig,
) -> Result<(), DisplayError> {
    loop {
        match mode {
            RunMode::WalkTest => {
                walk_test(
                    transport,
                    frame,
                    Duration::from_millis(WALK_TEST_MS),
                    Duration::from_millis(WALK_TEST_PAUSE_MS),
                )
                .await?
            }
            _ => rainbow_cycle(transport, frame, Duration::from_micros(effects.rainbow_wait_us)).await?,
        }
    }
}

/// Initial mode and HUD orientation. Closed switches at boot win over
/// the configured defaults.
#[cfg(feature = "hardware")]
fn open_controls(
    config: &Config,
    tx: tokio::sync::mpsc::Sender<doa_ring::events::ButtonEvent>,
    mode: &mut DisplayMode,
    hud: &mut bool,
) -> Option<doa_ring::buttons::ButtonInputs> {
    use doa_ring::buttons::ButtonInputs;
    use doa_ring::events::Control;

    if !config.controls.enabled || config.transport.emulated {
        return None;
    }
    match ButtonInputs::open(&config.controls, tx) {
        Ok(inputs) => {
            if inputs.is_active(Control::HudToggle) {
                *hud = true;
            }
            if inputs.is_active(Control::CompassToggle) {
                *mode = DisplayMode::Compass;
            }
            Some(inputs)
        }
        Err(e) => {
            log::warn!("Front panel controls unavailable: {}", e);
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: Config = config::load()?;

    let level = config.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("{} - pointing the way", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let effects = config.effects.clone();
    let fade_wait = Duration::from_millis(effects.fade_wait_ms);

    let mut transport = TransportFactory::create_from_config(&config)?;
    transport.set_brightness(config.brightness.initial)?;
    let composer = FrameComposer::new(config.composer_config());
    let mut frame = composer.new_frame();

    if config.run_mode != RunMode::Display {
        info!("Running {:?} until signalled", config.run_mode);
        tokio::select! {
            res = signal_handler() => {
                if let Err(e) = res {
                    error!("Signal handler failed: {}", e);
                }
            }
            res = effect_loop(&mut transport, &mut frame, config.run_mode, &effects) => res?,
        }
        fade_to_black(&mut transport, &mut frame, config.brightness.initial, effects.shutdown_fade_steps, fade_wait).await;
        return Ok(());
    }

    if config.startup.splash {
        rainbow_cycle(&mut transport, &mut frame, Duration::from_micros(effects.rainbow_wait_us)).await?;
        fade_to_black(&mut transport, &mut frame, config.brightness.initial, effects.fade_steps, fade_wait).await;
    }

    let (senders, sources) = event_channels(EVENT_QUEUE_DEPTH);

    #[allow(unused_mut)]
    let mut mode = config.startup.mode;
    #[allow(unused_mut)]
    let mut hud = config.startup.hud;
    #[cfg(feature = "hardware")]
    let _controls = open_controls(&config, senders.buttons.clone(), &mut mode, &mut hud);

    let state = DisplayState::new(mode, hud, config.brightness.initial, config.ring.rose_points);
    let controller = ModeController::new(
        transport,
        composer,
        state,
        config.brightness,
        Debouncer::new(Duration::from_millis(config.controls.debounce_ms)),
    )?
    .with_fade(FadeConfig { steps: effects.shutdown_fade_steps, wait: fade_wait });

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let socket = listener::bind(config.network.udp_port).await?;
    let listener_task = listener::spawn_listener(socket, senders, shutdown_rx.clone());
    let controller_task = tokio::spawn(controller.run(sources, shutdown_rx));

    if let Err(e) = signal_handler().await {
        error!("Signal handler failed: {}", e);
    }

    info!("Main application exiting. Fading out and stopping the listener.");
    let _ = shutdown_tx.send(true);

    if let Err(e) = listener_task.await {
        error!("UDP listener task failed: {}", e);
    }
    if let Err(e) = controller_task.await {
        error!("Mode controller task failed: {}", e);
    }

    Ok(())
}
