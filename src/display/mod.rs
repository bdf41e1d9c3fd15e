/*
 *  display/mod.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem: formatting, text encoding and sinks
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

// Sink traits and errors
pub mod traits;
pub mod error;

// LCD and LED sinks
pub mod drivers;

// Text for the info line
pub mod scroller;
pub mod info;

// Screen layouts
pub mod formatter;
pub mod layout16x2;

// Character ROM encoding
pub mod encoder;

pub use error::DisplayError;
pub use formatter::{Formatter, FormatterKind, LcdFormatter};
pub use traits::{LcdDriver, LedDriver};
