/*
 *  render.rs
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

//! Owns the render cadence. Each tick polls the player, decides which
//! composer output to show, sets brightness for the state and performs the
//! one and only hardware write. A failed tick is logged and the loop
//! carries on; a bad frame must never take the pipeline down.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use embedded_hal::digital::OutputPin;
use log::{debug, error, info};
use tokio::time::{MissedTickBehavior, interval};

use crate::aip1640::{Aip1640, DriverError};
use crate::cava::SharedSpectrum;
use crate::compose;
use crate::config::BrightnessConfig;
use crate::mpd::{MpdClient, NO_CONNECTION_TEXT, PlayState};
use crate::scroller::Scroller;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameSource {
    Marquee,
    Spectrum,
    Blank,
}

/// Which composer output a tick shows: playing tracks scroll their intro
/// once, then hand over to the spectrum; pause scrolls; stop blanks.
pub fn choose_source(state: PlayState, intro_pending: bool) -> FrameSource {
    match state {
        PlayState::Play if intro_pending => FrameSource::Marquee,
        PlayState::Play => FrameSource::Spectrum,
        PlayState::Pause => FrameSource::Marquee,
        PlayState::Stop => FrameSource::Blank,
    }
}

pub struct RenderPipeline<CLK, DIO> {
    display: Aip1640<CLK, DIO>,
    mpd: MpdClient,
    scroller: Scroller,
    spectrum: SharedSpectrum,
    brightness: BrightnessConfig,
    state: PlayState,
    current_song: String,
    frame_interval: Duration,
}

impl<CLK: OutputPin, DIO: OutputPin> RenderPipeline<CLK, DIO> {
    pub fn new(
        display: Aip1640<CLK, DIO>,
        mpd: MpdClient,
        scroller: Scroller,
        spectrum: SharedSpectrum,
        brightness: BrightnessConfig,
        framerate: u32,
    ) -> Self {
        Self {
            display,
            mpd,
            scroller,
            spectrum,
            brightness,
            state: PlayState::Stop,
            current_song: String::new(),
            frame_interval: Duration::from_secs_f64(1.0 / framerate.max(1) as f64),
        }
    }

    /// Render loop; exits at the next iteration boundary once `stop` is
    /// set. Writes in flight always complete.
    pub async fn run(&mut self, stop: Arc<AtomicBool>) {
        let mut ticker = interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("render pipeline running, {:?} per frame", self.frame_interval);
        while !stop.load(Ordering::Relaxed) {
            ticker.tick().await;
            self.poll_player().await;
            if let Err(e) = self.update_display() {
                error!("display update failed: {e}");
            }
        }
        info!("render pipeline stopped");
    }

    /// Closes the upstream connection. Called after the subprocess side of
    /// shutdown has already happened.
    pub async fn shutdown(&mut self) {
        self.mpd.disconnect().await;
        if let Err(e) = self.display.set_brightness(self.brightness.stop) {
            debug!("final brightness set failed: {e}");
        }
        if let Err(e) = self.display.clear() {
            debug!("final blank failed: {e}");
        }
    }

    async fn poll_player(&mut self) {
        let state = match self.mpd.status().await {
            Ok(state) => state,
            Err(e) => {
                // degraded: blank display until the daemon is back
                debug!("mpd unavailable: {e}");
                PlayState::Stop
            }
        };
        let song = match self.mpd.current_song().await {
            Ok(info) => info.display_line(),
            Err(_) => NO_CONNECTION_TEXT.to_string(),
        };
        if song != self.current_song {
            info!("now playing: {song}");
            self.current_song = song.clone();
            self.scroller.set_text(&song);
        }
        if state != self.state {
            debug!("player state {:?} -> {:?}", self.state, state);
            self.state = state;
            if state == PlayState::Pause {
                self.scroller.restart();
            }
        }
    }

    fn update_display(&mut self) -> Result<(), DriverError> {
        match choose_source(self.state, self.scroller.intro_pending()) {
            FrameSource::Marquee => {
                self.display.set_brightness(self.brightness_for(self.state))?;
                let frame = self.scroller.tick(Instant::now());
                self.display.write(frame, 0)
            }
            FrameSource::Spectrum => {
                self.display.set_brightness(self.brightness.play)?;
                let sample = *self.spectrum.lock().unwrap_or_else(|p| p.into_inner());
                self.display.write(&compose::spectrum_frame(&sample), 0)
            }
            FrameSource::Blank => {
                self.display.set_brightness(self.brightness.stop)?;
                self.display.clear()
            }
        }
    }

    fn brightness_for(&self, state: PlayState) -> u8 {
        match state {
            PlayState::Play => self.brightness.play,
            PlayState::Pause => self.brightness.pause,
            PlayState::Stop => self.brightness.stop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aip1640::mock::{EdgeLog, decode, pins};
    use crate::aip1640::DISPLAY_COLUMNS;
    use std::sync::Mutex;

    #[test]
    fn source_selection_follows_player_state() {
        assert_eq!(choose_source(PlayState::Play, true), FrameSource::Marquee);
        assert_eq!(choose_source(PlayState::Play, false), FrameSource::Spectrum);
        assert_eq!(choose_source(PlayState::Pause, true), FrameSource::Marquee);
        assert_eq!(choose_source(PlayState::Pause, false), FrameSource::Marquee);
        assert_eq!(choose_source(PlayState::Stop, false), FrameSource::Blank);
        assert_eq!(choose_source(PlayState::Stop, true), FrameSource::Blank);
    }

    fn pipeline() -> (
        RenderPipeline<crate::aip1640::mock::MockPin, crate::aip1640::mock::MockPin>,
        EdgeLog,
    ) {
        let (clk, dio, log) = pins();
        let display = Aip1640::new(clk, dio, 0).unwrap();
        let mpd = MpdClient::new("127.0.0.1", 1); // never reached in these tests
        let scroller = Scroller::new(24, 48, true);
        let spectrum: SharedSpectrum = Arc::new(Mutex::new([0u8; DISPLAY_COLUMNS]));
        let pipeline = RenderPipeline::new(display, mpd, scroller, spectrum, BrightnessConfig::default(), 48);
        log.lock().unwrap().clear();
        (pipeline, log)
    }

    #[test]
    fn stop_state_blanks_the_panel_at_stop_brightness() {
        let (mut p, log) = pipeline();
        p.state = PlayState::Stop;
        p.update_display().unwrap();
        let txns = decode(&log.lock().unwrap());
        // brightness write, then the three transactions of clear()
        assert_eq!(txns[0], vec![0x88]);
        let mut blank = vec![0xC0u8];
        blank.extend_from_slice(&[0u8; DISPLAY_COLUMNS]);
        assert_eq!(txns[2], blank);
    }

    #[test]
    fn new_track_scrolls_its_intro_then_hands_over_to_spectrum() {
        let (mut p, log) = pipeline();
        p.state = PlayState::Play;
        p.scroller.set_text("1 - Artist - Title");
        assert_eq!(choose_source(p.state, p.scroller.intro_pending()), FrameSource::Marquee);

        // drive the scroller through one full pass at the intro gate
        let len = p.scroller.buffer_len();
        let t0 = Instant::now();
        for i in 0..len as u32 {
            p.scroller.tick(t0 + Duration::from_millis(25) * i);
        }
        assert!(p.scroller.intro_complete());
        assert_eq!(choose_source(p.state, p.scroller.intro_pending()), FrameSource::Spectrum);

        // a saturated sample now renders as a fully lit panel at play
        // brightness
        *p.spectrum.lock().unwrap() = [8u8; DISPLAY_COLUMNS];
        log.lock().unwrap().clear();
        p.update_display().unwrap();
        let txns = decode(&log.lock().unwrap());
        assert_eq!(txns[0], vec![0x88 | 2]);
        let mut lit = vec![0xC0u8];
        lit.extend_from_slice(&[0xFFu8; DISPLAY_COLUMNS]);
        assert_eq!(txns[2], lit);
    }

    #[test]
    fn pause_scrolls_the_marquee_at_pause_brightness() {
        let (mut p, log) = pipeline();
        p.state = PlayState::Pause;
        p.scroller.set_text("X");
        p.scroller.restart();
        p.update_display().unwrap();
        let txns = decode(&log.lock().unwrap());
        assert_eq!(txns[0], vec![0x88]); // pause brightness defaults to 0
        assert_eq!(txns[1], vec![0x40]);
        assert_eq!(txns[2][0], 0xC0);
        assert_eq!(txns[2].len(), 1 + DISPLAY_COLUMNS);
    }
}
