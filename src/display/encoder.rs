/*
 *  display/encoder.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Squeeze Unicode text into the LCD character ROM
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

use std::collections::HashMap;

use crate::constants::FIRST_CUSTOM_CHAR_SLOT;

/// Fancy punctuation that has a decent plain replacement.
const SIMPLIFY: &[(char, &str)] = &[
    ('\u{2018}', "'"),   // left single quotation mark
    ('\u{2019}', "'"),   // right single quotation mark
    ('\u{201a}', "'"),   // single low-9 quotation mark
    ('\u{201b}', "`"),   // single high-reversed-9 quotation mark
    ('\u{201c}', "\""),  // left double quotation mark
    ('\u{201d}', "\""),  // right double quotation mark
    ('\u{201e}', "\""),  // double low-9 quotation mark
    ('\u{2010}', "-"),   // hyphen
    ('\u{2011}', "-"),   // non-breaking hyphen
    ('\u{2012}', "-"),   // figure dash
    ('\u{2013}', "-"),   // en dash
    ('\u{2014}', "--"),  // em dash
    ('\u{2026}', "..."), // horizontal ellipsis
];

const REPLACEMENT: u8 = b'?';

/// Encodes text for an HD44780 with ROM code A02, which is close
/// enough to ISO-8859-1.
///
/// Characters with a custom glyph go to their CGRAM slot, anything
/// outside Latin-1 is simplified or replaced with `?`. The same input
/// always gives the same bytes.
#[derive(Debug, Clone, Default)]
pub struct TextEncoder {
    custom: HashMap<char, u8>,
}

impl TextEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map the given characters, in order, to the CGRAM slots after the
    /// play and pause glyphs.
    pub fn with_custom_chars<I: IntoIterator<Item = char>>(chars: I) -> Self {
        let custom = chars.into_iter().zip(FIRST_CUSTOM_CHAR_SLOT..).collect();
        Self { custom }
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(text.len());
        for c in text.chars() {
            if let Some(slot) = self.custom.get(&c) {
                out.push(*slot);
            } else if let Ok(b) = u8::try_from(u32::from(c)) {
                out.push(b);
            } else {
                match SIMPLIFY.iter().find(|(from, _)| *from == c) {
                    Some((_, to)) => out.extend_from_slice(to.as_bytes()),
                    None => out.push(REPLACEMENT),
                }
            }
        }
        out
    }
}
