/*
 *  aip1640.rs
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

//! Bit-banged two-wire driver for the AIP1640 8x16 LED matrix controller.
//!
//! The controller has no SPI/I2C peripheral behind it; everything is clocked
//! out by hand over two GPIO lines. Each logical command is wrapped in its
//! own start/stop pair, and a data write must be followed by a fresh
//! display-control command or the panel drops its display-on latch.

use std::thread::sleep;
use std::time::Duration;

use embedded_hal::digital::OutputPin;
use thiserror::Error;

/// Column count of the panel; frames are at most this many bytes.
pub const DISPLAY_COLUMNS: usize = 16;

const DATA_COMMAND: u8 = 0x40; // auto-increment address data write
const ADDRESS_COMMAND: u8 = 0xC0; // OR'd with the start column
const DISPLAY_CONTROL_COMMAND: u8 = 0x80;
const DISPLAY_ON: u8 = 0x08;

const MAX_BRIGHTNESS: u8 = 7;
const MAX_POSITION: u8 = 15;

// Minimum settle time the controller needs after a start/stop transition
// and after each full byte.
const SETTLE: Duration = Duration::from_micros(1);

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("brightness out of range (0-7): {0}")]
    Brightness(u8),
    #[error("position out of range (0-15): {0}")]
    Position(u8),
    #[error("too many columns for 8x16 display (max 16): {0}")]
    FrameLength(usize),
    #[error("GPIO line write failed")]
    Pin,
}

/// AIP1640 controller over a clock line and a data line.
///
/// Owns both pins and the current brightness. All validation is pre-flight;
/// nothing is clocked out when an argument is rejected.
pub struct Aip1640<CLK, DIO> {
    clk: CLK,
    dio: DIO,
    brightness: u8,
}

impl<CLK: OutputPin, DIO: OutputPin> Aip1640<CLK, DIO> {
    /// Claims the two lines and runs the bring-up sequence: data command,
    /// then display control with the requested brightness.
    pub fn new(clk: CLK, dio: DIO, brightness: u8) -> Result<Self, DriverError> {
        if brightness > MAX_BRIGHTNESS {
            return Err(DriverError::Brightness(brightness));
        }
        let mut drv = Self { clk, dio, brightness };
        drv.send_data_command()?;
        drv.send_display_control()?;
        Ok(drv)
    }

    /// Current brightness level. Pure query, no I/O.
    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Sets brightness 0-7 and re-sends the display-control command.
    pub fn set_brightness(&mut self, level: u8) -> Result<(), DriverError> {
        if level > MAX_BRIGHTNESS {
            return Err(DriverError::Brightness(level));
        }
        self.brightness = level;
        self.send_display_control()
    }

    /// Writes up to 16 column bytes starting at column `pos`.
    ///
    /// Three independent start/stop transactions go over the wire: the data
    /// command, the addressed payload, and the display-control command. The
    /// trailing display-control is not optional; the controller resets its
    /// display-on state after data has been clocked in.
    pub fn write(&mut self, frame: &[u8], pos: u8) -> Result<(), DriverError> {
        if pos > MAX_POSITION {
            return Err(DriverError::Position(pos));
        }
        if frame.len() > DISPLAY_COLUMNS {
            return Err(DriverError::FrameLength(frame.len()));
        }
        self.send_data_command()?;
        self.start()?;
        self.write_byte(ADDRESS_COMMAND | pos)?;
        for &column in frame {
            self.write_byte(column)?;
        }
        self.stop()?;
        self.send_display_control()
    }

    /// Blanks the whole panel.
    pub fn clear(&mut self) -> Result<(), DriverError> {
        self.write(&[0u8; DISPLAY_COLUMNS], 0)
    }

    // start condition: data low, clock low, settle
    fn start(&mut self) -> Result<(), DriverError> {
        self.dio.set_low().map_err(|_| DriverError::Pin)?;
        self.clk.set_low().map_err(|_| DriverError::Pin)?;
        sleep(SETTLE);
        Ok(())
    }

    // stop condition: data low, clock high, data high, settle
    fn stop(&mut self) -> Result<(), DriverError> {
        self.dio.set_low().map_err(|_| DriverError::Pin)?;
        self.clk.set_high().map_err(|_| DriverError::Pin)?;
        self.dio.set_high().map_err(|_| DriverError::Pin)?;
        sleep(SETTLE);
        Ok(())
    }

    // LSB first; data valid before the rising clock edge, settle only after
    // the full byte.
    fn write_byte(&mut self, byte: u8) -> Result<(), DriverError> {
        for i in 0..8 {
            if (byte >> i) & 1 == 1 {
                self.dio.set_high().map_err(|_| DriverError::Pin)?;
            } else {
                self.dio.set_low().map_err(|_| DriverError::Pin)?;
            }
            self.clk.set_high().map_err(|_| DriverError::Pin)?;
            self.clk.set_low().map_err(|_| DriverError::Pin)?;
        }
        sleep(SETTLE);
        Ok(())
    }

    fn send_data_command(&mut self) -> Result<(), DriverError> {
        self.start()?;
        self.write_byte(DATA_COMMAND)?;
        self.stop()
    }

    fn send_display_control(&mut self) -> Result<(), DriverError> {
        self.start()?;
        self.write_byte(DISPLAY_CONTROL_COMMAND | DISPLAY_ON | self.brightness)?;
        self.stop()
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! Recording pins for tests: every level change on either line lands in
    //! one shared, ordered edge log so the wire protocol can be replayed.

    use embedded_hal::digital::OutputPin;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum Line {
        Clk,
        Dio,
    }

    #[derive(Clone, Copy, Debug)]
    pub struct Edge {
        pub line: Line,
        pub high: bool,
    }

    pub type EdgeLog = Arc<Mutex<Vec<Edge>>>;

    #[derive(Clone)]
    pub struct MockPin {
        line: Line,
        log: EdgeLog,
    }

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.log.lock().unwrap().push(Edge { line: self.line, high: false });
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.log.lock().unwrap().push(Edge { line: self.line, high: true });
            Ok(())
        }
    }

    /// Clock pin, data pin, and the log they share.
    pub fn pins() -> (MockPin, MockPin, EdgeLog) {
        let log: EdgeLog = Arc::new(Mutex::new(Vec::new()));
        let clk = MockPin { line: Line::Clk, log: log.clone() };
        let dio = MockPin { line: Line::Dio, log: log.clone() };
        (clk, dio, log)
    }

    /// Replays the edge log back into byte transactions: data is sampled at
    /// each rising clock edge, 8 bits LSB-first per byte, and a transaction
    /// closes on the stop condition (data rising while the clock is high).
    /// The clock edge inside a stop is framing, not data, so any partial
    /// byte is discarded when the stop is seen.
    pub fn decode(log: &[Edge]) -> Vec<Vec<u8>> {
        let mut clk = false;
        let mut dio = false;
        let mut txns: Vec<Vec<u8>> = Vec::new();
        let mut current: Vec<u8> = Vec::new();
        let mut acc = 0u8;
        let mut bits = 0u8;
        for edge in log {
            match edge.line {
                Line::Dio => {
                    let rising = edge.high && !dio;
                    dio = edge.high;
                    if rising && clk {
                        acc = 0;
                        bits = 0;
                        txns.push(std::mem::take(&mut current));
                    }
                }
                Line::Clk => {
                    let rising = edge.high && !clk;
                    clk = edge.high;
                    if rising {
                        if dio {
                            acc |= 1 << bits;
                        }
                        bits += 1;
                        if bits == 8 {
                            current.push(acc);
                            acc = 0;
                            bits = 0;
                        }
                    }
                }
            }
        }
        txns
    }
}
