/*
 *  cava.rs
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

//! Spectrum supply: generates a cava config, runs cava as a child process
//! and reads its raw ascii output on a dedicated thread. The latest good
//! sample sits behind a mutex; the render side copies it out and tolerates
//! staleness. Malformed lines and would-block reads are discarded with a
//! short backoff, never surfaced.

use std::fs::File;
use std::io::Read;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use thiserror::Error;

use crate::aip1640::DISPLAY_COLUMNS;
use crate::config::CavaConfig;

/// Ceiling cava is configured to emit per bar.
pub const MAX_BAR_LEVEL: u8 = 8;

/// 16 bar heights, 0..=8: left channel in 0-7, right channel in 8-15.
pub type SpectrumSample = [u8; DISPLAY_COLUMNS];
pub type SharedSpectrum = Arc<Mutex<SpectrumSample>>;

const READ_BACKOFF: Duration = Duration::from_millis(1);
const REOPEN_BACKOFF: Duration = Duration::from_secs(1);
// partial line cap; a stream that never newlines is garbage anyway
const PENDING_LIMIT: usize = 4096;

#[derive(Debug, Error)]
pub enum CavaError {
    #[error("failed to write cava config {path:?}: {source}")]
    Config {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to spawn cava: {0}")]
    Spawn(std::io::Error),
    #[error("cava produced no output at {path:?} within {timeout:?}")]
    OutputTimeout { path: PathBuf, timeout: Duration },
}

/// Renders the cava config text: 16 bars, ascii raw output capped at 8,
/// stereo alsa loopback input.
pub fn render_config(cfg: &CavaConfig) -> String {
    format!(
        "\
[general]
bars = {bars}
framerate = {framerate}

[input]
method = alsa
source = {source}
channels = stereo

[output]
method = raw
raw_target = {target}
data_format = ascii
ascii_max_range = {max_range}

[smoothing]
integral = 36
monstercat = 1
waves = 0
gravity = 420
ignore = 0

[eq]
1 = 1.2
2 = 1.2
3 = 1.1
4 = 1.1
5 = 1
6 = 1
7 = 1
8 = 1
",
        bars = DISPLAY_COLUMNS,
        framerate = cfg.framerate,
        source = cfg.source,
        target = cfg.output_path.display(),
        max_range = MAX_BAR_LEVEL,
    )
}

/// Handle on the running cava child.
pub struct CavaProcess {
    child: Child,
    output_path: PathBuf,
}

impl CavaProcess {
    /// Writes the generated config and spawns cava against it, output
    /// silenced.
    pub fn start(cfg: &CavaConfig) -> Result<Self, CavaError> {
        std::fs::write(&cfg.config_path, render_config(cfg)).map_err(|e| CavaError::Config {
            path: cfg.config_path.clone(),
            source: e,
        })?;
        let child = Command::new("cava")
            .arg("-p")
            .arg(&cfg.config_path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(CavaError::Spawn)?;
        info!("cava started (pid {})", child.id());
        Ok(Self {
            child,
            output_path: cfg.output_path.clone(),
        })
    }

    /// Blocks until the raw output target exists, or fails after `timeout`.
    pub fn wait_for_output(&self, timeout: Duration) -> Result<(), CavaError> {
        let deadline = Instant::now() + timeout;
        while !self.output_path.exists() {
            if Instant::now() >= deadline {
                return Err(CavaError::OutputTimeout {
                    path: self.output_path.clone(),
                    timeout,
                });
            }
            thread::sleep(Duration::from_millis(100));
        }
        Ok(())
    }

    /// Kills and reaps the child. Safe to call on an already-dead child.
    pub fn terminate(&mut self) {
        if let Err(e) = self.child.kill() {
            debug!("cava already stopped: {e}");
        }
        let _ = self.child.wait();
        info!("cava terminated");
    }
}

/// Parses one raw ascii line: exactly 16 non-empty `;`-separated integer
/// fields, values clamped to the configured ceiling. Anything else is
/// rejected.
pub fn parse_line(line: &str) -> Option<SpectrumSample> {
    let mut sample = [0u8; DISPLAY_COLUMNS];
    let mut count = 0usize;
    for field in line.split(';').filter(|f| !f.is_empty()) {
        if count >= DISPLAY_COLUMNS {
            return None;
        }
        let value: u8 = field.trim().parse().ok()?;
        sample[count] = value.min(MAX_BAR_LEVEL);
        count += 1;
    }
    (count == DISPLAY_COLUMNS).then_some(sample)
}

/// Spawns the reader thread. Runs until `stop` is set.
pub fn spawn_reader(
    path: PathBuf,
    shared: SharedSpectrum,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || reader_loop(&path, &shared, &stop))
}

fn reader_loop(path: &Path, shared: &SharedSpectrum, stop: &AtomicBool) {
    let mut pending = String::new();
    while !stop.load(Ordering::Relaxed) {
        let file = match File::open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("cava output {} not readable ({e}), retrying", path.display());
                backoff(stop, REOPEN_BACKOFF);
                continue;
            }
        };
        if let Err(e) = set_nonblocking(&file) {
            warn!("could not set O_NONBLOCK on cava output: {e}");
        }
        pending.clear();
        read_stream(file, &mut pending, shared, stop);
    }
    debug!("cava reader exiting");
}

fn read_stream(mut file: File, pending: &mut String, shared: &SharedSpectrum, stop: &AtomicBool) {
    let mut buf = [0u8; 512];
    while !stop.load(Ordering::Relaxed) {
        match file.read(&mut buf) {
            Ok(0) => thread::sleep(READ_BACKOFF),
            Ok(n) => {
                // lines can straddle reads; accumulate until a newline
                pending.push_str(&String::from_utf8_lossy(&buf[..n]));
                while let Some(idx) = pending.find('\n') {
                    let line: String = pending.drain(..=idx).collect();
                    if let Some(sample) = parse_line(line.trim()) {
                        let mut guard = shared.lock().unwrap_or_else(|p| p.into_inner());
                        *guard = sample;
                    }
                }
                if pending.len() > PENDING_LIMIT {
                    pending.clear();
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => thread::sleep(READ_BACKOFF),
            Err(e) => {
                debug!("cava read error: {e}");
                thread::sleep(READ_BACKOFF);
            }
        }
    }
}

fn backoff(stop: &AtomicBool, total: Duration) {
    let slice = Duration::from_millis(100);
    let deadline = Instant::now() + total;
    while Instant::now() < deadline && !stop.load(Ordering::Relaxed) {
        thread::sleep(slice);
    }
}

fn set_nonblocking(file: &File) -> std::io::Result<()> {
    let fd = file.as_raw_fd();
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(std::io::Error::last_os_error());
    }
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_line() {
        let sample = parse_line("0;1;2;3;4;5;6;7;8;7;6;5;4;3;2;1").unwrap();
        assert_eq!(sample[0], 0);
        assert_eq!(sample[8], 8);
        assert_eq!(sample[15], 1);
    }

    #[test]
    fn trailing_separator_is_tolerated() {
        // cava terminates each ascii frame with a separator
        assert!(parse_line("1;1;1;1;1;1;1;1;1;1;1;1;1;1;1;1;").is_some());
    }

    #[test]
    fn wrong_field_count_is_rejected() {
        assert!(parse_line("1;2;3").is_none());
        assert!(parse_line("0;1;2;3;4;5;6;7;8;7;6;5;4;3;2").is_none());
        assert!(parse_line("0;1;2;3;4;5;6;7;8;7;6;5;4;3;2;1;0").is_none());
        assert!(parse_line("").is_none());
    }

    #[test]
    fn non_integer_fields_are_rejected() {
        assert!(parse_line("a;1;2;3;4;5;6;7;8;7;6;5;4;3;2;1").is_none());
        assert!(parse_line("1.5;1;2;3;4;5;6;7;8;7;6;5;4;3;2;1").is_none());
    }

    #[test]
    fn over_range_values_clamp_to_ceiling() {
        let sample = parse_line("200;1;1;1;1;1;1;1;1;1;1;1;1;1;1;1").unwrap();
        assert_eq!(sample[0], MAX_BAR_LEVEL);
    }

    #[test]
    fn rendered_config_pins_the_contract_fields() {
        let cfg = CavaConfig::default();
        let text = render_config(&cfg);
        assert!(text.contains("bars = 16"));
        assert!(text.contains("data_format = ascii"));
        assert!(text.contains("ascii_max_range = 8"));
        assert!(text.contains(&format!("raw_target = {}", cfg.output_path.display())));
        assert!(text.contains(&format!("framerate = {}", cfg.framerate)));
    }

    #[test]
    fn reader_publishes_latest_sample_and_stops_on_flag() {
        let path = std::env::temp_dir().join(format!("matrixvu-cava-test-{}.raw", std::process::id()));
        std::fs::write(&path, "0;1;2;3;4;5;6;7;8;7;6;5;4;3;2;1\n").unwrap();

        let shared: SharedSpectrum = Arc::new(Mutex::new([0u8; DISPLAY_COLUMNS]));
        let stop = Arc::new(AtomicBool::new(false));
        let handle = spawn_reader(path.clone(), shared.clone(), stop.clone());

        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            let got = *shared.lock().unwrap();
            if got[8] == 8 {
                break;
            }
            if Instant::now() > deadline {
                stop.store(true, Ordering::Relaxed);
                let _ = handle.join();
                panic!("sample never published");
            }
            thread::sleep(Duration::from_millis(10));
        }

        stop.store(true, Ordering::Relaxed);
        handle.join().unwrap();
        let _ = std::fs::remove_file(&path);
    }
}
