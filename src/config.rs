/*
 *  config.rs
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

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

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

/// Top-level app configuration. Every field has a working default; a
/// config file and CLI flags only override.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub log_level: Option<String>, // e.g., "info" | "debug"
    pub gpio: GpioConfig,
    pub mpd: MpdConfig,
    pub brightness: BrightnessConfig,
    pub scroll: ScrollConfig,
    pub cava: CavaConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GpioConfig {
    pub chip: String,
    pub clock_pin: u32,
    pub data_pin: u32,
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            chip: "/dev/gpiochip0".to_string(),
            clock_pin: 3,
            data_pin: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MpdConfig {
    pub host: String,
    pub port: u16,
}

impl Default for MpdConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6600,
        }
    }
}

/// Panel brightness per player state, 0-7.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BrightnessConfig {
    pub play: u8,
    pub pause: u8,
    pub stop: u8,
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self {
            play: 2,
            pause: 0,
            stop: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub columns_per_second: u32,
    pub intro_columns_per_second: u32,
    pub intro: bool,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            columns_per_second: 24,
            intro_columns_per_second: 48,
            intro: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CavaConfig {
    pub config_path: PathBuf,
    pub output_path: PathBuf,
    pub framerate: u32,
    pub source: String,
}

impl Default for CavaConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("/tmp/cava_config"),
            output_path: PathBuf::from("/tmp/cava_output.raw"),
            framerate: 48,
            source: "hw:Loopback,1,0".to_string(),
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "matrixvu",
    about = "MPD marquee and spectrum on an AIP1640 8x16 LED matrix"
)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    #[arg(long)]
    pub clock_pin: Option<u32>,
    #[arg(long)]
    pub data_pin: Option<u32>,
    #[arg(long)]
    pub mpd_host: Option<String>,
    #[arg(long)]
    pub mpd_port: Option<u16>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();

    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            cfg = read_yaml(p)?;
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        cfg = read_yaml(&p)?;
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, &cli);

    // 4) Validate
    validate(&cfg)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/matrixvu/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/matrixvu/config.yaml");
        if p.exists() {
            return Some(p);
        }
        let p = home.join(".config/matrixvu.yaml");
        if p.exists() {
            return Some(p);
        }
    }
    // project local
    for candidate in &["matrixvu.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return Some(p);
        }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() {
        cfg.log_level = cli.log_level.clone();
    }
    if let Some(pin) = cli.clock_pin {
        cfg.gpio.clock_pin = pin;
    }
    if let Some(pin) = cli.data_pin {
        cfg.gpio.data_pin = pin;
    }
    if let Some(host) = cli.mpd_host.as_ref() {
        cfg.mpd.host = host.clone();
    }
    if let Some(port) = cli.mpd_port {
        cfg.mpd.port = port;
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.gpio.clock_pin == cfg.gpio.data_pin {
        return Err(ConfigError::Validation(
            "gpio clock_pin and data_pin must differ".into(),
        ));
    }
    for (name, level) in [
        ("play", cfg.brightness.play),
        ("pause", cfg.brightness.pause),
        ("stop", cfg.brightness.stop),
    ] {
        if level > 7 {
            return Err(ConfigError::Validation(format!(
                "brightness.{name} must be 0..=7, got {level}"
            )));
        }
    }
    if cfg.scroll.columns_per_second == 0 || cfg.scroll.intro_columns_per_second == 0 {
        return Err(ConfigError::Validation(
            "scroll speeds must be > 0 columns per second".into(),
        ));
    }
    if cfg.cava.framerate == 0 || cfg.cava.framerate > 240 {
        return Err(ConfigError::Validation(format!(
            "cava.framerate must be 1..=240, got {}",
            cfg.cava.framerate
        )));
    }
    Ok(())
}
