/*
 *  display/error.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error type shared by the LCD and LED sinks
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

use std::error::Error;
use std::fmt;
use std::io;

/// Errors raised by LCD and LED sinks
#[derive(Debug)]
pub enum DisplayError {
    /// Hardware initialization failed
    InitializationFailed(String),

    /// GPIO pin error
    GpioError(String),

    /// Writing to a terminal or device file failed
    Io(io::Error),

    /// Invalid configuration
    InvalidConfiguration(String),

    /// Value outside what the sink accepts
    OutOfRange { what: &'static str, value: f64 },

    /// Generic error with message
    Other(String),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitializationFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::GpioError(msg) =>
                write!(f, "GPIO error: {}", msg),
            DisplayError::Io(err) =>
                write!(f, "Display I/O error: {}", err),
            DisplayError::InvalidConfiguration(msg) =>
                write!(f, "Invalid configuration: {}", msg),
            DisplayError::OutOfRange { what, value } =>
                write!(f, "{} out of range: {} (must be 0.0 to 1.0)", what, value),
            DisplayError::Other(msg) =>
                write!(f, "{}", msg),
        }
    }
}

impl Error for DisplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for DisplayError {
    fn from(err: io::Error) -> Self {
        DisplayError::Io(err)
    }
}

// Conversion from Raspberry Pi GPIO errors
#[cfg(feature = "rpi")]
impl From<rppal::gpio::Error> for DisplayError {
    fn from(err: rppal::gpio::Error) -> Self {
        DisplayError::GpioError(err.to_string())
    }
}

/// Check a 0.0 to 1.0 level before it reaches hardware.
pub fn check_level(what: &'static str, value: f64) -> Result<f64, DisplayError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DisplayError::OutOfRange { what, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = DisplayError::GpioError("pin 25 busy".to_string());
        assert_eq!(err.to_string(), "GPIO error: pin 25 busy");
        let err = DisplayError::OutOfRange { what: "backlight", value: 1.5 };
        assert_eq!(err.to_string(), "backlight out of range: 1.5 (must be 0.0 to 1.0)");
        let err = DisplayError::InitializationFailed("BCM pin 7: busy".to_string());
        assert_eq!(err.to_string(), "Display initialization failed: BCM pin 7: busy");
    }

    #[test]
    fn test_io_source() {
        let err: DisplayError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(err.source().is_some());
    }

    #[test]
    fn test_check_level() {
        assert_eq!(check_level("led", 0.5).ok(), Some(0.5));
        assert!(check_level("led", -0.1).is_err());
    }
}
