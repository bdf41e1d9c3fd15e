/*
 *  display/formatter.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Turns player state into the text grid shown on the LCD
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

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::display::info::{InfoContext, InfoSequence};
use crate::display::layout16x2::Lcd16x2;
use crate::model::{Disc, PlayerState, RipState};

/// Output of a format pass: the full screen, and when to format again
/// even if nothing external changes (`None` = not until the next state).
pub type Formatted = (String, Option<f64>);

/// Formatting rules for one screen geometry.
pub trait LcdFormatter {
    const COLUMNS: usize;
    const LINES: usize;

    /// Format the current player state into newline separated lines,
    /// exactly `COLUMNS` wide and `LINES` high, without a trailing newline.
    ///
    /// `state` and `rip_state` are only `None` at startup. `disc`, when
    /// given, is the disc currently loaded in the player. `now` is the
    /// time the display considers current and must be used instead of
    /// reading the clock.
    fn format(
        &mut self,
        state: Option<&PlayerState>,
        rip_state: Option<&RipState>,
        disc: Option<&Arc<Disc>>,
        now: f64,
    ) -> Formatted;
}

/// Supported screen geometries, picked once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FormatterKind {
    #[default]
    #[serde(rename = "16x2")]
    Lcd16x2,
}

impl FormatterKind {
    pub fn build(self) -> Formatter {
        match self {
            FormatterKind::Lcd16x2 => Formatter::Lcd16x2(Lcd16x2::new()),
        }
    }
}

#[derive(Debug)]
pub enum Formatter {
    Lcd16x2(Lcd16x2),
}

impl Formatter {
    pub fn columns(&self) -> usize {
        match self {
            Formatter::Lcd16x2(_) => Lcd16x2::COLUMNS,
        }
    }

    pub fn lines(&self) -> usize {
        match self {
            Formatter::Lcd16x2(_) => Lcd16x2::LINES,
        }
    }

    pub fn format(
        &mut self,
        state: Option<&PlayerState>,
        rip_state: Option<&RipState>,
        disc: Option<&Arc<Disc>>,
        now: f64,
    ) -> Formatted {
        match self {
            Formatter::Lcd16x2(f) => f.format(state, rip_state, disc, now),
        }
    }
}

/// Return the lines padded out to the full width and height of the
/// display as a newline separated string. Overlong lines are cut.
pub fn fill<S: AsRef<str>>(lines: &[S], columns: usize, height: usize) -> String {
    let blank = " ".repeat(columns);
    let mut out: Vec<String> = lines
        .iter()
        .take(height)
        .map(|line| format!("{:<width$}", truncate(line.as_ref(), columns), width = columns))
        .collect();
    out.resize(height, blank);
    out.join("\n")
}

pub fn truncate(s: &str, columns: usize) -> String {
    s.chars().take(columns).collect()
}

/// Banner shown until the first player state arrives.
pub fn version_banner() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// Keeps track of what the info region should show, independent of
/// how a particular geometry lays it out.
///
/// Exactly one sequence is active at a time. It is replaced when the
/// disc, the track or the set of errors change, and otherwise keeps
/// running across format passes so scrolling continues smoothly.
#[derive(Debug, Default)]
pub struct InfoRegion {
    disc: Option<Arc<Disc>>,
    current_track: u32,
    errors: Option<Vec<String>>,
    sequence: Option<InfoSequence>,
    text: String,
    next_update: Option<f64>,
}

impl InfoRegion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text produced by the active sequence.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn next_update(&self) -> Option<f64> {
        self.next_update
    }

    /// Restart sequences as required by the new state, then step the
    /// active sequence up to `now`. `columns` is the width available to
    /// scrolled text.
    pub fn update(
        &mut self,
        state: &PlayerState,
        rip_state: Option<&RipState>,
        disc: Option<&Arc<Disc>>,
        columns: usize,
        now: f64,
    ) -> Option<f64> {
        let errors: Vec<String> = state
            .error
            .iter()
            .chain(rip_state.and_then(|r| r.error.as_ref()))
            .filter(|e| !e.is_empty())
            .cloned()
            .collect();

        if !errors.is_empty() {
            if self.errors.as_ref() != Some(&errors) {
                debug!("showing errors: {:?}", errors);
                self.start(InfoSequence::errors(&errors, now, columns), now);
                self.errors = Some(errors);
            }
        } else if self.disc_changed(disc) || self.errors.is_some() {
            // new disc, or coming back from an error
            self.errors = None;
            match disc {
                None => {
                    self.disc = None;
                    self.current_track = 0;
                    self.sequence = None;
                    self.next_update = None;
                    self.text.clear();
                }
                Some(d) => {
                    self.disc = Some(Arc::clone(d));
                    self.current_track = state.track;
                    self.start(InfoSequence::disc(Arc::clone(d), now), now);
                }
            }
        } else if let Some(d) = self.disc.as_ref() {
            if self.current_track != state.track {
                self.current_track = state.track;
                let sequence = InfoSequence::track(d, state.track, now, columns);
                self.start(sequence, now);
            }
        }

        let ctx = InfoContext { track: state.track, columns };
        self.step(&ctx, now);
        self.next_update
    }

    fn start(&mut self, sequence: InfoSequence, now: f64) {
        self.sequence = Some(sequence);
        self.next_update = Some(now);
    }

    fn disc_changed(&self, disc: Option<&Arc<Disc>>) -> bool {
        match (self.disc.as_ref(), disc) {
            (None, None) => false,
            (Some(a), Some(b)) => !Arc::ptr_eq(a, b),
            _ => true,
        }
    }

    // Pull steps until one is due in the future. An exhausted sequence
    // leaves its last text in place.
    fn step(&mut self, ctx: &InfoContext, now: f64) {
        loop {
            let Some(due) = self.next_update else { break };
            if now < due {
                break;
            }
            let Some(sequence) = self.sequence.as_mut() else { break };
            match sequence.advance(ctx) {
                Some((text, next_update)) => {
                    self.text = text;
                    self.next_update = next_update;
                }
                None => {
                    self.sequence = None;
                    self.next_update = None;
                }
            }
        }
    }
}
