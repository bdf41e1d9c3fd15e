/*
 *  display/drivers/hd44780.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  HD44780 character LCD and status LED on Raspberry Pi GPIO pins
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

use std::thread::sleep;
use std::time::Duration;

use log::{debug, info};
use rppal::gpio::{Gpio, Level, OutputPin};

use crate::constants::MAX_CUSTOM_CHARS;
use crate::display::error::{check_level, DisplayError};
use crate::display::traits::{LcdDriver, LedDriver};

/// CGRAM bit patterns, one byte per pixel row
pub type Glyph = [u8; 8];

pub const PLAY_GLYPH: Glyph = [0x10, 0x18, 0x1c, 0x1e, 0x1c, 0x18, 0x10, 0x00];
pub const PAUSE_GLYPH: Glyph = [0x00, 0x1b, 0x1b, 0x1b, 0x1b, 0x1b, 0x00, 0x00];

// Software PWM for backlight and LED
const PWM_FREQUENCY: f64 = 200.0;

// Commands
const CLEAR: u8 = 0x01;
const HOME: u8 = 0x02;
const ENTRY_MODE: u8 = 0x06; // increment cursor, no shift
const DISPLAY_CONTROL: u8 = 0x08;
const DISPLAY_ON: u8 = 0x04;
const FUNCTION_SET: u8 = 0x28; // 4-bit, 2 lines, 5x8 font
const SET_CGRAM: u8 = 0x40;
const SET_DDRAM: u8 = 0x80;

const ROW_OFFSETS: [u8; 4] = [0x00, 0x40, 0x14, 0x54];

/// BCM pin numbers for the LCD
#[derive(Debug, Clone, Copy)]
pub struct LcdPins {
    pub rs: u8,
    pub en: u8,
    pub d4: u8,
    pub d5: u8,
    pub d6: u8,
    pub d7: u8,
    pub backlight: Option<u8>,
}

fn level(high: bool) -> Level {
    if high { Level::High } else { Level::Low }
}

fn output(gpio: &Gpio, pin: u8) -> Result<OutputPin, DisplayError> {
    gpio.get(pin)
        .map(|p| p.into_output_low())
        .map_err(|e| DisplayError::InitializationFailed(format!("BCM pin {}: {}", pin, e)))
}

// The controller addresses at most four rows, CGRAM has room for six extra glyphs
fn check_setup(lines: usize, custom: &[Glyph]) -> Result<(), DisplayError> {
    if lines == 0 || lines > ROW_OFFSETS.len() {
        return Err(DisplayError::InitializationFailed(format!(
            "HD44780 drives 1 to {} lines, not {}",
            ROW_OFFSETS.len(),
            lines
        )));
    }
    if custom.len() > MAX_CUSTOM_CHARS {
        return Err(DisplayError::InvalidConfiguration(format!(
            "{} custom characters, at most {} fit in CGRAM",
            custom.len(),
            MAX_CUSTOM_CHARS
        )));
    }
    Ok(())
}

// Level 0 stops PWM entirely so the pin is really off
fn drive(pin: &mut OutputPin, pwm: bool, value: f64) -> Result<(), DisplayError> {
    if pwm && value > 0.0 && value < 1.0 {
        pin.set_pwm_frequency(PWM_FREQUENCY, value)?;
    } else {
        if pwm {
            pin.clear_pwm()?;
        }
        pin.write(level(value > 0.0));
    }
    Ok(())
}

/// HD44780 compatible LCD in 4-bit mode, write only.
pub struct Hd44780Lcd {
    rs: OutputPin,
    en: OutputPin,
    data: [OutputPin; 4],
    backlight: Option<OutputPin>,
    pwm: bool,
    lines: usize,
}

impl Hd44780Lcd {
    /// Set up the pins, initialize the controller and upload the PLAY,
    /// PAUSE and `custom` glyphs to CGRAM slots 0, 1, 2...
    pub fn new(
        gpio: &Gpio,
        pins: LcdPins,
        lines: usize,
        pwm: bool,
        custom: &[Glyph],
    ) -> Result<Self, DisplayError> {
        check_setup(lines, custom)?;

        let mut lcd = Self {
            rs: output(gpio, pins.rs)?,
            en: output(gpio, pins.en)?,
            data: [
                output(gpio, pins.d4)?,
                output(gpio, pins.d5)?,
                output(gpio, pins.d6)?,
                output(gpio, pins.d7)?,
            ],
            backlight: pins.backlight.map(|p| output(gpio, p)).transpose()?,
            pwm,
            lines,
        };

        lcd.init();
        for (slot, glyph) in [PLAY_GLYPH, PAUSE_GLYPH].iter().chain(custom).enumerate() {
            lcd.create_char(slot as u8, glyph);
        }
        info!("HD44780 ready, {} custom characters", custom.len());
        Ok(lcd)
    }

    fn init(&mut self) {
        sleep(Duration::from_millis(50));

        // three times 8-bit mode, then switch to 4-bit
        self.write_nibble(0x03, false);
        sleep(Duration::from_millis(5));
        self.write_nibble(0x03, false);
        sleep(Duration::from_micros(150));
        self.write_nibble(0x03, false);
        self.write_nibble(0x02, false);

        self.command(FUNCTION_SET);
        self.command(DISPLAY_CONTROL | DISPLAY_ON);
        self.command(CLEAR);
        sleep(Duration::from_millis(2));
        self.command(ENTRY_MODE);
    }

    fn write_nibble(&mut self, nibble: u8, rs: bool) {
        self.rs.write(level(rs));
        for (bit, pin) in self.data.iter_mut().enumerate() {
            pin.write(level(nibble & (1 << bit) != 0));
        }
        self.en.set_high();
        sleep(Duration::from_micros(1));
        self.en.set_low();
        sleep(Duration::from_micros(50));
    }

    fn write_byte(&mut self, byte: u8, rs: bool) {
        self.write_nibble(byte >> 4, rs);
        self.write_nibble(byte & 0x0f, rs);
    }

    fn command(&mut self, cmd: u8) {
        self.write_byte(cmd, false);
    }

    fn create_char(&mut self, slot: u8, glyph: &Glyph) {
        debug!("CGRAM slot {}: {:02x?}", slot, glyph);
        self.command(SET_CGRAM | ((slot & 0x07) << 3));
        for row in glyph {
            self.write_byte(*row, true);
        }
        self.command(SET_DDRAM);
    }
}

impl LcdDriver for Hd44780Lcd {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.command(CLEAR);
        sleep(Duration::from_millis(2));
        Ok(())
    }

    fn home(&mut self) -> Result<(), DisplayError> {
        self.command(HOME);
        sleep(Duration::from_millis(2));
        Ok(())
    }

    fn message(&mut self, text: &[u8]) -> Result<(), DisplayError> {
        for (row, line) in text.split(|&b| b == b'\n').take(self.lines).enumerate() {
            if row > 0 {
                let offset = ROW_OFFSETS.get(row).copied().unwrap_or_default();
                self.command(SET_DDRAM | offset);
            }
            for b in line {
                self.write_byte(*b, true);
            }
        }
        Ok(())
    }

    fn enable_display(&mut self, enable: bool) -> Result<(), DisplayError> {
        self.command(DISPLAY_CONTROL | if enable { DISPLAY_ON } else { 0 });
        Ok(())
    }

    fn set_backlight(&mut self, level: f64) -> Result<(), DisplayError> {
        let level = check_level("backlight", level)?;
        if let Some(pin) = self.backlight.as_mut() {
            drive(pin, self.pwm, level)?;
        }
        Ok(())
    }
}

/// Status LED on a GPIO pin, dimmed with software PWM when enabled.
pub struct GpioLed {
    pin: OutputPin,
    pwm: bool,
    value: u8,
    brightness: f64,
}

impl GpioLed {
    pub fn new(gpio: &Gpio, pin: u8, pwm: bool) -> Result<Self, DisplayError> {
        Ok(Self { pin: output(gpio, pin)?, pwm, value: 0, brightness: 1.0 })
    }
}

impl LedDriver for GpioLed {
    fn set(&mut self, value: u8) -> Result<(), DisplayError> {
        self.value = value.min(1);
        drive(&mut self.pin, self.pwm, self.brightness * f64::from(self.value))
    }

    fn set_brightness(&mut self, level: f64) -> Result<(), DisplayError> {
        // without PWM the LED is simply on or off
        if self.pwm {
            self.brightness = check_level("LED brightness", level)?;
            self.set(self.value)?;
        }
        Ok(())
    }
}
