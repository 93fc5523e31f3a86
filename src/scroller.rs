/*
 *  scroller.rs
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

//! Marquee state machine: text becomes a column buffer (8 glyph columns
//! plus a blank per character, then a full display width of trailing
//! blanks) and a time-gated cursor slides a 16-column window over it.
//! A new track gets one fast intro pass before the slower steady loop.

use std::time::{Duration, Instant};

use log::debug;

use crate::aip1640::DISPLAY_COLUMNS;
use crate::compose::GlyphCache;

/// Columns per character in the buffer: 8 glyph columns + 1 gap.
const COLUMNS_PER_CHAR: usize = 9;

pub struct Scroller {
    text: String,
    buffer: Vec<u8>,
    position: usize,
    last_advance: Option<Instant>,
    intro_enabled: bool,
    intro_active: bool,
    intro_complete: bool,
    steady_interval: Duration,
    intro_interval: Duration,
    cache: GlyphCache,
}

impl Scroller {
    pub fn new(columns_per_second: u32, intro_columns_per_second: u32, intro_enabled: bool) -> Self {
        Self {
            text: String::new(),
            buffer: vec![0u8; DISPLAY_COLUMNS],
            position: 0,
            last_advance: None,
            intro_enabled,
            intro_active: false,
            intro_complete: false,
            steady_interval: Duration::from_secs_f64(1.0 / columns_per_second.max(1) as f64),
            intro_interval: Duration::from_secs_f64(1.0 / intro_columns_per_second.max(1) as f64),
            cache: GlyphCache::new(),
        }
    }

    /// Replaces the marquee text: rebuilds the column buffer, rewinds the
    /// cursor and clears the advance timestamp so the next tick renders
    /// immediately. Arms the intro pass when enabled.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_uppercase();
        debug!("marquee text: {:?}", self.text);
        self.buffer.clear();
        self.buffer
            .reserve(self.text.chars().count() * COLUMNS_PER_CHAR + DISPLAY_COLUMNS);
        for c in self.text.chars() {
            self.buffer.extend_from_slice(&self.cache.rotated(c));
            self.buffer.push(0x00);
        }
        // loop gap: one full display width of blank columns
        self.buffer.extend(std::iter::repeat(0x00).take(DISPLAY_COLUMNS));
        self.position = 0;
        self.last_advance = None;
        if self.intro_enabled {
            self.intro_active = true;
            self.intro_complete = false;
        }
    }

    /// Rewinds to the start of the buffer without rebuilding it.
    pub fn restart(&mut self) {
        self.position = 0;
        self.last_advance = None;
    }

    /// True while the one-shot fast pass for a new track is still running.
    pub fn intro_pending(&self) -> bool {
        self.intro_enabled && self.intro_active && !self.intro_complete
    }

    #[allow(dead_code)]
    pub fn intro_complete(&self) -> bool {
        self.intro_complete
    }

    #[allow(dead_code)]
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// One render tick. Inside the active interval the current window is
    /// re-emitted without advancing, which gates the scroll rate
    /// independently of how often the pipeline polls. Otherwise the window
    /// at the cursor is emitted and the cursor advances modulo the buffer;
    /// wrapping to zero completes an active intro.
    pub fn tick(&mut self, now: Instant) -> &[u8] {
        let interval = if self.intro_active {
            self.intro_interval
        } else {
            self.steady_interval
        };
        if let Some(last) = self.last_advance {
            if now.duration_since(last) < interval {
                return self.window(self.position);
            }
        }
        let emitted = self.position;
        self.position = (self.position + 1) % self.buffer.len();
        self.last_advance = Some(now);
        if self.position == 0 && self.intro_active {
            debug!("intro pass complete after {} columns", self.buffer_len());
            self.intro_complete = true;
            self.intro_active = false;
        }
        self.window(emitted)
    }

    // windows near the wrap may be shorter than the display; the driver
    // accepts partial frames
    fn window(&self, from: usize) -> &[u8] {
        let end = (from + DISPLAY_COLUMNS).min(self.buffer.len());
        &self.buffer[from..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::rotate_glyph;
    use crate::glyphs;

    fn stepped(start: Instant, steps: u32, interval: Duration) -> Instant {
        start + interval * steps
    }

    #[test]
    fn buffer_length_is_nine_per_char_plus_display_width() {
        let mut s = Scroller::new(24, 48, true);
        s.set_text("AB");
        assert_eq!(s.buffer_len(), 2 * COLUMNS_PER_CHAR + DISPLAY_COLUMNS);
        s.set_text("1 - Artist - Title");
        assert_eq!(s.buffer_len(), 18 * COLUMNS_PER_CHAR + DISPLAY_COLUMNS);
    }

    #[test]
    fn empty_text_still_yields_a_full_blank_window() {
        let mut s = Scroller::new(24, 48, false);
        s.set_text("");
        assert_eq!(s.buffer_len(), DISPLAY_COLUMNS);
        let frame = s.tick(Instant::now()).to_vec();
        assert_eq!(frame, vec![0u8; DISPLAY_COLUMNS]);
    }

    #[test]
    fn first_tick_renders_immediately_with_rotated_glyph_columns() {
        let mut s = Scroller::new(24, 48, false);
        s.set_text("a");
        let frame = s.tick(Instant::now()).to_vec();
        // lowercase input is uppercased before glyph lookup
        let glyph = rotate_glyph(glyphs::bitmap_for('A'));
        assert_eq!(&frame[..8], &glyph[..]);
        assert_eq!(frame[8], 0x00);
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn ticks_within_the_interval_do_not_advance() {
        let mut s = Scroller::new(24, 48, false);
        s.set_text("HELLO");
        let t0 = Instant::now();
        s.tick(t0);
        assert_eq!(s.position(), 1);
        s.tick(t0);
        s.tick(t0);
        assert_eq!(s.position(), 1);
        // past the steady interval the cursor moves again
        s.tick(t0 + Duration::from_millis(50));
        assert_eq!(s.position(), 2);
    }

    #[test]
    fn cursor_wraps_after_exactly_buffer_length_advances() {
        let mut s = Scroller::new(24, 48, false);
        s.set_text("XY");
        let len = s.buffer_len();
        let t0 = Instant::now();
        for i in 0..len as u32 {
            s.tick(stepped(t0, i, Duration::from_millis(60)));
        }
        assert_eq!(s.position(), 0);
    }

    #[test]
    fn intro_completes_on_wrap_and_hands_over_to_steady_speed() {
        let mut s = Scroller::new(24, 48, true);
        s.set_text("Z");
        assert!(s.intro_pending());
        let len = s.buffer_len();
        let t0 = Instant::now();
        for i in 0..len as u32 {
            assert!(!s.intro_complete());
            s.tick(stepped(t0, i, Duration::from_millis(30)));
        }
        assert_eq!(s.position(), 0);
        assert!(s.intro_complete());
        assert!(!s.intro_pending());
    }

    #[test]
    fn intro_interval_is_the_faster_gate() {
        let mut s = Scroller::new(10, 100, true);
        s.set_text("Q");
        let t0 = Instant::now();
        s.tick(t0);
        // 20ms is past the 10ms intro interval but far short of the
        // 100ms steady one
        s.tick(t0 + Duration::from_millis(20));
        assert_eq!(s.position(), 2);
    }

    #[test]
    fn disabled_intro_never_arms() {
        let mut s = Scroller::new(24, 48, false);
        s.set_text("W");
        assert!(!s.intro_pending());
        let t0 = Instant::now();
        // steady interval applies from the start: 30ms < 1/24s, no advance
        s.tick(t0);
        s.tick(t0 + Duration::from_millis(30));
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn restart_rewinds_and_renders_immediately() {
        let mut s = Scroller::new(24, 48, false);
        s.set_text("MNO");
        let t0 = Instant::now();
        s.tick(t0);
        s.tick(t0 + Duration::from_millis(60));
        assert_eq!(s.position(), 2);
        s.restart();
        assert_eq!(s.position(), 0);
        s.tick(t0 + Duration::from_millis(61));
        assert_eq!(s.position(), 1);
    }

    #[test]
    fn window_shortens_near_the_wrap() {
        let mut s = Scroller::new(24, 48, false);
        s.set_text("K");
        let len = s.buffer_len(); // 25
        let t0 = Instant::now();
        for i in 0..(len - 1) as u32 {
            s.tick(stepped(t0, i, Duration::from_millis(60)));
        }
        assert_eq!(s.position(), len - 1);
        let frame = s.tick(stepped(t0, (len - 1) as u32, Duration::from_millis(60))).to_vec();
        assert_eq!(frame.len(), 1);
    }
}
