/*
 *  compose.rs
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

//! Turns row-major glyphs and spectrum bar heights into the column-major
//! bytes the AIP1640 expects.

use std::collections::HashMap;

use crate::aip1640::DISPLAY_COLUMNS;
use crate::cava::{SpectrumSample, MAX_BAR_LEVEL};
use crate::glyphs;

/// Rotates a row-major 8x8 glyph into column form.
///
/// Output column `7-i` carries bit `j` iff input row `j` carries bit `i`:
/// a transpose plus a horizontal mirror. The mirror matters; a plain
/// transpose renders every character backwards on this panel.
pub fn rotate_glyph(rows: &[u8; 8]) -> [u8; 8] {
    let mut out = [0u8; 8];
    for i in 0..8 {
        for j in 0..8 {
            if rows[j] & (1 << i) != 0 {
                out[7 - i] |= 1 << j;
            }
        }
    }
    out
}

/// Lazy cache of rotated glyphs. The key space is the character set in
/// use, so entries are never evicted.
#[derive(Default)]
pub struct GlyphCache {
    rotated: HashMap<char, [u8; 8]>,
}

impl GlyphCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Column form of `c`, rotating on first use.
    pub fn rotated(&mut self, c: char) -> [u8; 8] {
        *self
            .rotated
            .entry(c)
            .or_insert_with(|| rotate_glyph(glyphs::bitmap_for(c)))
    }
}

// Filled column for one bar: `v` low bits set, then bit-reversed so the
// fill grows from the bottom of the physical display.
fn bar_column(level: u8) -> u8 {
    let v = level.min(MAX_BAR_LEVEL) as u32;
    (((1u32 << v) - 1) as u8).reverse_bits()
}

/// Composes a 16-bar sample (left channel bars 0-7, right bars 8-15) into
/// a full frame.
///
/// The two halves use mirror-image rotations so the bars meet in the
/// center of the panel and diverge outward as levels rise. The asymmetry
/// is intentional.
pub fn spectrum_frame(sample: &SpectrumSample) -> [u8; DISPLAY_COLUMNS] {
    let mut left = [0u8; 8];
    let mut right = [0u8; 8];
    for i in 0..8 {
        left[i] = bar_column(sample[i]);
        right[i] = bar_column(sample[i + 8]);
    }

    let mut out = [0u8; DISPLAY_COLUMNS];
    for i in 0..8 {
        for j in 0..8 {
            if left[j] & (1 << i) != 0 {
                out[i] |= 1 << (7 - j);
            }
            if right[j] & (1 << (7 - i)) != 0 {
                out[8 + i] |= 1 << j;
            }
        }
    }
    out
}
