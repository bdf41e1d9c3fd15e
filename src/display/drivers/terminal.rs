/*
 *  display/drivers/terminal.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Draw the LCD and LED on a VT100 terminal
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

use std::io::{self, Stdout, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crate::display::error::{check_level, DisplayError};
use crate::display::traits::{LcdDriver, LedDriver};

const SAVE_CURSOR: &str = "\x1B[s";
const RESTORE_CURSOR: &str = "\x1B[u";
const CLEAR_LINE: &str = "\x1B[K";
const NEXT_LINE: &str = "\x1B[B\r";

#[derive(Debug, Clone, Copy)]
struct LedLook {
    value: u8,
    brightness: f64,
}

/// What the LED row shows, shared by [`TerminalLed`] and the
/// [`TerminalLcd`] that redraws it.
#[derive(Debug, Clone)]
pub struct LedRow(Arc<Mutex<LedLook>>);

impl Default for LedRow {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(LedLook { value: 0, brightness: 1.0 })))
    }
}

impl LedRow {
    fn look(&self) -> LedLook {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut LedLook)) {
        f(&mut self.0.lock().unwrap_or_else(PoisonError::into_inner));
    }

    fn label(&self) -> String {
        let look = self.look();
        if look.value != 0 {
            // always at least one star so a lit LED is visible
            let stars = ((look.brightness * 10.0) as usize).max(1);
            format!("LED: {:<10}", "*".repeat(stars))
        } else {
            format!("LED: {:<10}", ".")
        }
    }

    fn draw<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "{}\x1B[1;1H{}{}{}", SAVE_CURSOR, CLEAR_LINE, self.label(), RESTORE_CURSOR)
    }
}

/// Draws the LCD as a framed box from terminal row 2. Row 1 belongs to
/// [`TerminalLed`], and logging is pushed below the box on clear.
#[derive(Debug)]
pub struct TerminalLcd<W: Write + Send = Stdout> {
    out: W,
    columns: usize,
    lines: usize,
    enabled: bool,
    current: Vec<u8>,
    led: Option<LedRow>,
}

impl TerminalLcd<Stdout> {
    pub fn stdout(columns: usize, lines: usize) -> Self {
        Self::new(io::stdout(), columns, lines)
    }
}

impl<W: Write + Send> TerminalLcd<W> {
    pub fn new(out: W, columns: usize, lines: usize) -> Self {
        let blank = vec![b' '; columns];
        let current = vec![blank; lines].join(&b'\n');
        Self { out, columns, lines, enabled: true, current, led: None }
    }

    /// Redraw `row` on every home, since log output can scroll it away.
    pub fn with_led_row(mut self, row: LedRow) -> Self {
        self.led = Some(row);
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    // Screen rows as the terminal shows them
    fn rows(&self) -> Vec<String> {
        if !self.enabled {
            return vec!["#".repeat(self.columns); self.lines];
        }
        self.current
            .split(|&b| b == b'\n')
            .map(|row| row.iter().map(|&b| glyph(b)).collect())
            .collect()
    }

    fn draw(&mut self) -> io::Result<()> {
        let header = format!("+{}+", "-".repeat(self.columns));
        let mut frame = String::new();
        frame.push_str(CLEAR_LINE);
        frame.push_str(&header);
        for row in self.rows() {
            frame.push_str(NEXT_LINE);
            frame.push_str(CLEAR_LINE);
            frame.push('|');
            frame.push_str(&row);
            frame.push('|');
        }
        frame.push_str(NEXT_LINE);
        frame.push_str(CLEAR_LINE);
        frame.push_str(&header);
        frame.push_str(RESTORE_CURSOR);
        self.out.write_all(frame.as_bytes())?;
        self.out.flush()
    }
}

// Character ROM byte to something a terminal can show
fn glyph(b: u8) -> char {
    match b {
        0 => '>',
        1 => '=',
        2..=7 => '*',
        _ => char::from(b),
    }
}

impl<W: Write + Send> LcdDriver for TerminalLcd<W> {
    fn clear(&mut self) -> Result<(), DisplayError> {
        // reset, then park the cursor below the box
        self.out.write_all(b"\x1Bc\x1B[10;1H")?;
        self.out.flush()?;
        Ok(())
    }

    fn home(&mut self) -> Result<(), DisplayError> {
        if let Some(led) = self.led.as_ref() {
            led.draw(&mut self.out)?;
        }
        write!(self.out, "{}\x1B[2;1H", SAVE_CURSOR)?;
        self.out.flush()?;
        Ok(())
    }

    fn message(&mut self, text: &[u8]) -> Result<(), DisplayError> {
        self.current = text.to_vec();
        self.draw()?;
        Ok(())
    }

    fn enable_display(&mut self, enable: bool) -> Result<(), DisplayError> {
        self.enabled = enable;
        self.home()?;
        self.draw()?;
        Ok(())
    }

    fn set_backlight(&mut self, level: f64) -> Result<(), DisplayError> {
        check_level("backlight", level)?;
        Ok(())
    }
}

/// Shows the LED on terminal row 1 as a row of stars scaled by brightness.
#[derive(Debug)]
pub struct TerminalLed<W: Write + Send = Stdout> {
    out: W,
    row: LedRow,
}

impl TerminalLed<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalLed<W> {
    pub fn new(out: W) -> Self {
        Self { out, row: LedRow::default() }
    }

    /// Handle for [`TerminalLcd::with_led_row`].
    pub fn row(&self) -> LedRow {
        self.row.clone()
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn draw(&mut self) -> io::Result<()> {
        self.row.draw(&mut self.out)?;
        self.out.flush()
    }
}

impl<W: Write + Send> LedDriver for TerminalLed<W> {
    fn set(&mut self, value: u8) -> Result<(), DisplayError> {
        self.row.update(|look| look.value = value.min(1));
        self.draw()?;
        Ok(())
    }

    fn set_brightness(&mut self, level: f64) -> Result<(), DisplayError> {
        let level = check_level("LED brightness", level)?;
        self.row.update(|look| look.brightness = level);
        self.draw()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shown(lcd: TerminalLcd<Vec<u8>>) -> String {
        String::from_utf8_lossy(&lcd.into_inner()).into_owned()
    }

    #[test]
    fn test_play_and_pause_glyphs() {
        let mut lcd = TerminalLcd::new(Vec::new(), 4, 2);
        lcd.message(b"\x00 12\n\x01abc").unwrap();
        let out = shown(lcd);
        assert!(out.contains("+----+"));
        assert!(out.contains("|> 12|"));
        assert!(out.contains("|=abc|"));
    }

    #[test]
    fn test_disabled_display_shows_hashes() {
        let mut lcd = TerminalLcd::new(Vec::new(), 3, 2);
        lcd.message(b"abc\ndef").unwrap();
        lcd.enable_display(false).unwrap();
        let out = shown(lcd);
        let last_frame = out.rsplit("\x1B[2;1H").next().unwrap_or_default();
        assert_eq!(last_frame.matches("|###|").count(), 2);
        assert!(!last_frame.contains("abc"));
    }

    #[test]
    fn test_latin1_is_decoded() {
        let mut lcd = TerminalLcd::new(Vec::new(), 5, 1);
        lcd.message(&[b'B', b'j', 0xf6, b'r', b'k']).unwrap();
        assert!(shown(lcd).contains("|Björk|"));
    }

    #[test]
    fn test_led_label() {
        let mut led = TerminalLed::new(Vec::new());
        led.set_brightness(0.5).unwrap();
        led.on().unwrap();
        assert_eq!(led.row().label(), "LED: *****     ");
        led.off().unwrap();
        assert_eq!(led.row().label(), "LED: .         ");
        led.set_brightness(0.0).unwrap();
        led.on().unwrap();
        assert_eq!(led.row().label(), "LED: *         ");
    }

    #[test]
    fn test_home_redraws_led_row() {
        let mut led = TerminalLed::new(Vec::new());
        let mut lcd = TerminalLcd::new(Vec::new(), 4, 2).with_led_row(led.row());
        led.on().unwrap();

        lcd.home().unwrap();
        let out = shown(lcd);
        let (led_part, rest) = out.split_once("\x1B[2;1H").unwrap();
        assert!(led_part.contains("\x1B[1;1H\x1B[KLED: *"), "{:?}", led_part);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_home_without_led_row() {
        let mut lcd = TerminalLcd::new(Vec::new(), 4, 2);
        lcd.home().unwrap();
        assert!(!shown(lcd).contains("LED:"));
    }
}
