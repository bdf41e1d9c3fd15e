/*
 *  display/traits.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Sink traits for the character LCD and the status LED
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

use crate::display::error::DisplayError;

/// Character LCD, HD44780 style.
///
/// The controller owns the sink exclusively. Text arrives already
/// encoded for the character ROM, with rows separated by `\n`. Bytes 0
/// and 1 are the PLAY and PAUSE glyphs, 2 to 7 any custom glyphs.
pub trait LcdDriver: Send {
    /// Clear the screen and move the cursor to the top left
    fn clear(&mut self) -> Result<(), DisplayError>;

    /// Move the cursor to the top left without clearing
    fn home(&mut self) -> Result<(), DisplayError>;

    /// Write rows starting at the cursor
    fn message(&mut self, text: &[u8]) -> Result<(), DisplayError>;

    /// Switch the display on or off. Contents are kept while off.
    fn enable_display(&mut self, enable: bool) -> Result<(), DisplayError>;

    /// Backlight level, 0.0 (unlit) to 1.0
    fn set_backlight(&mut self, level: f64) -> Result<(), DisplayError>;
}

/// Single status LED.
pub trait LedDriver: Send {
    /// Light the LED (1) or switch it off (0)
    fn set(&mut self, value: u8) -> Result<(), DisplayError>;

    /// Brightness used while lit, 0.0 to 1.0
    fn set_brightness(&mut self, level: f64) -> Result<(), DisplayError>;

    fn on(&mut self) -> Result<(), DisplayError> {
        self.set(1)
    }

    fn off(&mut self) -> Result<(), DisplayError> {
        self.set(0)
    }
}

impl<T: LcdDriver + ?Sized> LcdDriver for Box<T> {
    fn clear(&mut self) -> Result<(), DisplayError> {
        (**self).clear()
    }

    fn home(&mut self) -> Result<(), DisplayError> {
        (**self).home()
    }

    fn message(&mut self, text: &[u8]) -> Result<(), DisplayError> {
        (**self).message(text)
    }

    fn enable_display(&mut self, enable: bool) -> Result<(), DisplayError> {
        (**self).enable_display(enable)
    }

    fn set_backlight(&mut self, level: f64) -> Result<(), DisplayError> {
        (**self).set_backlight(level)
    }
}

impl<T: LedDriver + ?Sized> LedDriver for Box<T> {
    fn set(&mut self, value: u8) -> Result<(), DisplayError> {
        (**self).set(value)
    }

    fn set_brightness(&mut self, level: f64) -> Result<(), DisplayError> {
        (**self).set_brightness(level)
    }
}
