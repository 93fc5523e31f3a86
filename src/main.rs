/*
 *  main.rs
 *
 *  MatrixVu - MPD in lights
 *	(c) 2020-25 Stuart Hunter
 *
 *	TODO:
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use env_logger::Env;
use linux_embedded_hal::CdevPin;
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use log::{info, warn};
use tokio::signal::unix::{SignalKind, signal};

mod aip1640;
mod cava;
mod compose;
mod config;
mod glyphs;
mod mpd;
mod render;
mod scroller;

use aip1640::{Aip1640, DISPLAY_COLUMNS};
use cava::{CavaProcess, SharedSpectrum};
use mpd::MpdClient;
use render::RenderPipeline;
use scroller::Scroller;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

const GPIO_CONSUMER: &str = "matrixvu";
const CAVA_OUTPUT_TIMEOUT: Duration = Duration::from_secs(10);

fn claim_pin(chip: &mut Chip, line: u32, label: &str) -> anyhow::Result<CdevPin> {
    let handle = chip
        .get_line(line)
        .with_context(|| format!("claiming GPIO line {line} ({label})"))?
        .request(LineRequestFlags::OUTPUT, 1, GPIO_CONSUMER)
        .with_context(|| format!("requesting output on GPIO line {line} ({label})"))?;
    CdevPin::new(handle).with_context(|| format!("wrapping GPIO line {line} ({label})"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;
    let level = cfg.log_level.as_deref().unwrap_or("info");
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();
    info!(
        "matrixvu v{} (built {})",
        env!("CARGO_PKG_VERSION"),
        BUILD_DATE
    );

    // Hardware first: a failed pin claim is fatal before anything else runs.
    let mut chip = Chip::new(&cfg.gpio.chip)
        .with_context(|| format!("opening GPIO chip {}", cfg.gpio.chip))?;
    let clk = claim_pin(&mut chip, cfg.gpio.clock_pin, "clock")?;
    let dio = claim_pin(&mut chip, cfg.gpio.data_pin, "data")?;
    let mut display =
        Aip1640::new(clk, dio, cfg.brightness.stop).context("initializing AIP1640")?;
    display.clear().context("blanking display")?;
    info!(
        "AIP1640 up on {} (clk {}, dio {}, brightness {})",
        cfg.gpio.chip,
        cfg.gpio.clock_pin,
        cfg.gpio.data_pin,
        display.brightness()
    );

    // Spectrum supply: cava must produce its output file within the
    // startup window or we abort.
    let mut cava_proc = CavaProcess::start(&cfg.cava).context("starting cava")?;
    if let Err(e) = cava_proc.wait_for_output(CAVA_OUTPUT_TIMEOUT) {
        cava_proc.terminate();
        return Err(e).context("waiting for cava output");
    }

    let spectrum: SharedSpectrum = Arc::new(Mutex::new([0u8; DISPLAY_COLUMNS]));
    let stop = Arc::new(AtomicBool::new(false));
    let reader = cava::spawn_reader(cfg.cava.output_path.clone(), spectrum.clone(), stop.clone());

    // One stop flag for everything; the signal task sets it and both loops
    // exit at their next iteration boundary.
    let mut sigint = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    let mut sigterm = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("installing SIGHUP handler")?;
    let stop_on_signal = stop.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => info!("SIGINT received"),
            _ = sigterm.recv() => info!("SIGTERM received"),
            _ = sighup.recv() => info!("SIGHUP received"),
        }
        stop_on_signal.store(true, Ordering::Relaxed);
    });

    let scroller = Scroller::new(
        cfg.scroll.columns_per_second,
        cfg.scroll.intro_columns_per_second,
        cfg.scroll.intro,
    );
    let mpd = MpdClient::new(&cfg.mpd.host, cfg.mpd.port);
    let mut pipeline = RenderPipeline::new(
        display,
        mpd,
        scroller,
        spectrum,
        cfg.brightness,
        cfg.cava.framerate,
    );
    pipeline.run(stop.clone()).await;

    // Ordered teardown: reader join, cava terminate, client disconnect.
    info!("shutting down");
    if reader.join().is_err() {
        warn!("cava reader thread panicked");
    }
    cava_proc.terminate();
    pipeline.shutdown().await;
    info!("cleanup complete, exiting");
    Ok(())
}
