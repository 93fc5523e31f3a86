/*
 *  glyphs.rs
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

//! 8x8 marquee font, row-major with the LSB as the leftmost pixel.
//! Uppercase only; the scroller uppercases before lookup and anything
//! unmapped falls back to the blank glyph.

pub const GLYPH_SPACE: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];

const GLYPH_A: [u8; 8] = [0x0C, 0x1E, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x00];
const GLYPH_B: [u8; 8] = [0x3F, 0x66, 0x66, 0x3E, 0x66, 0x66, 0x3F, 0x00];
const GLYPH_C: [u8; 8] = [0x3C, 0x66, 0x03, 0x03, 0x03, 0x66, 0x3C, 0x00];
const GLYPH_D: [u8; 8] = [0x1F, 0x36, 0x66, 0x66, 0x66, 0x36, 0x1F, 0x00];
const GLYPH_E: [u8; 8] = [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x46, 0x7F, 0x00];
const GLYPH_F: [u8; 8] = [0x7F, 0x46, 0x16, 0x1E, 0x16, 0x06, 0x0F, 0x00];
const GLYPH_G: [u8; 8] = [0x3C, 0x66, 0x03, 0x03, 0x73, 0x66, 0x7C, 0x00];
const GLYPH_H: [u8; 8] = [0x33, 0x33, 0x33, 0x3F, 0x33, 0x33, 0x33, 0x00];
const GLYPH_I: [u8; 8] = [0x1E, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00];
const GLYPH_J: [u8; 8] = [0x78, 0x30, 0x30, 0x30, 0x33, 0x33, 0x1E, 0x00];
const GLYPH_K: [u8; 8] = [0x67, 0x66, 0x36, 0x1E, 0x36, 0x66, 0x67, 0x00];
const GLYPH_L: [u8; 8] = [0x0F, 0x06, 0x06, 0x06, 0x46, 0x66, 0x7F, 0x00];
const GLYPH_M: [u8; 8] = [0x63, 0x77, 0x7F, 0x7F, 0x6B, 0x63, 0x63, 0x00];
const GLYPH_N: [u8; 8] = [0x63, 0x67, 0x6F, 0x7B, 0x73, 0x63, 0x63, 0x00];
const GLYPH_O: [u8; 8] = [0x1C, 0x36, 0x63, 0x63, 0x63, 0x36, 0x1C, 0x00];
const GLYPH_P: [u8; 8] = [0x3F, 0x66, 0x66, 0x3E, 0x06, 0x06, 0x0F, 0x00];
const GLYPH_Q: [u8; 8] = [0x1E, 0x33, 0x33, 0x33, 0x3B, 0x1E, 0x38, 0x00];
const GLYPH_R: [u8; 8] = [0x3F, 0x66, 0x66, 0x3E, 0x36, 0x66, 0x67, 0x00];
const GLYPH_S: [u8; 8] = [0x1E, 0x33, 0x07, 0x0E, 0x38, 0x33, 0x1E, 0x00];
const GLYPH_T: [u8; 8] = [0x3F, 0x2D, 0x0C, 0x0C, 0x0C, 0x0C, 0x1E, 0x00];
const GLYPH_U: [u8; 8] = [0x33, 0x33, 0x33, 0x33, 0x33, 0x33, 0x3F, 0x00];
const GLYPH_V: [u8; 8] = [0x33, 0x33, 0x33, 0x33, 0x33, 0x1E, 0x0C, 0x00];
const GLYPH_W: [u8; 8] = [0x63, 0x63, 0x63, 0x6B, 0x7F, 0x77, 0x63, 0x00];
const GLYPH_X: [u8; 8] = [0x63, 0x63, 0x36, 0x1C, 0x1C, 0x36, 0x63, 0x00];
const GLYPH_Y: [u8; 8] = [0x33, 0x33, 0x33, 0x1E, 0x0C, 0x0C, 0x1E, 0x00];
const GLYPH_Z: [u8; 8] = [0x7F, 0x63, 0x31, 0x18, 0x4C, 0x66, 0x7F, 0x00];

const GLYPH_0: [u8; 8] = [0x3E, 0x63, 0x73, 0x7B, 0x6F, 0x67, 0x3E, 0x00];
const GLYPH_1: [u8; 8] = [0x0C, 0x0E, 0x0C, 0x0C, 0x0C, 0x0C, 0x3F, 0x00];
const GLYPH_2: [u8; 8] = [0x1E, 0x33, 0x30, 0x1C, 0x06, 0x33, 0x3F, 0x00];
const GLYPH_3: [u8; 8] = [0x1E, 0x33, 0x30, 0x1C, 0x30, 0x33, 0x1E, 0x00];
const GLYPH_4: [u8; 8] = [0x38, 0x3C, 0x36, 0x33, 0x7F, 0x30, 0x78, 0x00];
const GLYPH_5: [u8; 8] = [0x3F, 0x03, 0x1F, 0x30, 0x30, 0x33, 0x1E, 0x00];
const GLYPH_6: [u8; 8] = [0x1C, 0x06, 0x03, 0x1F, 0x33, 0x33, 0x1E, 0x00];
const GLYPH_7: [u8; 8] = [0x3F, 0x33, 0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x00];
const GLYPH_8: [u8; 8] = [0x1E, 0x33, 0x33, 0x1E, 0x33, 0x33, 0x1E, 0x00];
const GLYPH_9: [u8; 8] = [0x1E, 0x33, 0x33, 0x3E, 0x30, 0x18, 0x0E, 0x00];

const GLYPH_DASH: [u8; 8] = [0x00, 0x00, 0x00, 0x3F, 0x00, 0x00, 0x00, 0x00];
const GLYPH_DOT: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x00];
const GLYPH_COMMA: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C, 0x06];
const GLYPH_COLON: [u8; 8] = [0x00, 0x0C, 0x0C, 0x00, 0x00, 0x0C, 0x0C, 0x00];
const GLYPH_BANG: [u8; 8] = [0x0C, 0x1E, 0x1E, 0x0C, 0x0C, 0x00, 0x0C, 0x00];
const GLYPH_QUERY: [u8; 8] = [0x1E, 0x33, 0x30, 0x18, 0x0C, 0x00, 0x0C, 0x00];
const GLYPH_APOS: [u8; 8] = [0x0C, 0x0C, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00];
const GLYPH_AMP: [u8; 8] = [0x1C, 0x36, 0x1C, 0x6E, 0x3B, 0x33, 0x6E, 0x00];
const GLYPH_LPAREN: [u8; 8] = [0x18, 0x0C, 0x06, 0x06, 0x06, 0x0C, 0x18, 0x00];
const GLYPH_RPAREN: [u8; 8] = [0x06, 0x0C, 0x18, 0x18, 0x18, 0x0C, 0x06, 0x00];
const GLYPH_SLASH: [u8; 8] = [0x60, 0x30, 0x18, 0x0C, 0x06, 0x03, 0x01, 0x00];
const GLYPH_PLUS: [u8; 8] = [0x00, 0x0C, 0x0C, 0x3F, 0x0C, 0x0C, 0x00, 0x00];
const GLYPH_UNDERSCORE: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x7F];

/// Row bitmap for a character, blank for anything unmapped.
pub fn bitmap_for(c: char) -> &'static [u8; 8] {
    match c {
        'A' => &GLYPH_A,
        'B' => &GLYPH_B,
        'C' => &GLYPH_C,
        'D' => &GLYPH_D,
        'E' => &GLYPH_E,
        'F' => &GLYPH_F,
        'G' => &GLYPH_G,
        'H' => &GLYPH_H,
        'I' => &GLYPH_I,
        'J' => &GLYPH_J,
        'K' => &GLYPH_K,
        'L' => &GLYPH_L,
        'M' => &GLYPH_M,
        'N' => &GLYPH_N,
        'O' => &GLYPH_O,
        'P' => &GLYPH_P,
        'Q' => &GLYPH_Q,
        'R' => &GLYPH_R,
        'S' => &GLYPH_S,
        'T' => &GLYPH_T,
        'U' => &GLYPH_U,
        'V' => &GLYPH_V,
        'W' => &GLYPH_W,
        'X' => &GLYPH_X,
        'Y' => &GLYPH_Y,
        'Z' => &GLYPH_Z,
        '0' => &GLYPH_0,
        '1' => &GLYPH_1,
        '2' => &GLYPH_2,
        '3' => &GLYPH_3,
        '4' => &GLYPH_4,
        '5' => &GLYPH_5,
        '6' => &GLYPH_6,
        '7' => &GLYPH_7,
        '8' => &GLYPH_8,
        '9' => &GLYPH_9,
        '-' => &GLYPH_DASH,
        '.' => &GLYPH_DOT,
        ',' => &GLYPH_COMMA,
        ':' => &GLYPH_COLON,
        '!' => &GLYPH_BANG,
        '?' => &GLYPH_QUERY,
        '\'' => &GLYPH_APOS,
        '&' => &GLYPH_AMP,
        '(' => &GLYPH_LPAREN,
        ')' => &GLYPH_RPAREN,
        '/' => &GLYPH_SLASH,
        '+' => &GLYPH_PLUS,
        '_' => &GLYPH_UNDERSCORE,
        _ => &GLYPH_SPACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_characters_fall_back_to_blank() {
        assert_eq!(bitmap_for('~'), &GLYPH_SPACE);
        assert_eq!(bitmap_for('é'), &GLYPH_SPACE);
        assert_eq!(bitmap_for(' '), &GLYPH_SPACE);
    }

    #[test]
    fn mapped_characters_are_distinct_from_blank() {
        for c in "ABCXYZ0189-".chars() {
            assert_ne!(bitmap_for(c), &GLYPH_SPACE, "glyph missing for {c:?}");
        }
    }
}
