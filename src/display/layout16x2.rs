/*
 *  display/layout16x2.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layout rules for a 16x2 character LCD
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

use crate::constants::{PAUSE_CHAR, PLAY_CHAR, UNKNOWN_STATE_CHAR, WAITING_ON_STATE};
use crate::display::formatter::{fill, truncate, version_banner, Formatted, InfoRegion, LcdFormatter};
use crate::model::{Disc, PlayState, PlayerState, RipActivity, RipState};

/// Columns at the end of the info line used by the ripping indicator.
const RIP_INDICATOR_COLUMNS: usize = 4;

/// Format output for a 16x2 LCD display.
///
/// Line 1 shows the player state and track position, line 2 the
/// scrolling disc/track/error info. While ripping, the last four columns
/// of line 2 show the ripping progress instead.
#[derive(Debug, Default)]
pub struct Lcd16x2 {
    info: InfoRegion,
}

impl Lcd16x2 {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LcdFormatter for Lcd16x2 {
    const COLUMNS: usize = 16;
    const LINES: usize = 2;

    fn format(
        &mut self,
        state: Option<&PlayerState>,
        rip_state: Option<&RipState>,
        disc: Option<&Arc<Disc>>,
        now: f64,
    ) -> Formatted {
        let Some(state) = state else {
            return (fill(&[version_banner().as_str(), WAITING_ON_STATE], Self::COLUMNS, Self::LINES), None);
        };

        // Ripping shortens the info line. If it ends mid-track the space
        // is not reclaimed until the next sequence starts.
        let columns = match rip_state {
            Some(r) if r.is_active() => Self::COLUMNS - RIP_INDICATOR_COLUMNS,
            _ => Self::COLUMNS,
        };

        let next_update = self.info.update(state, rip_state, disc, columns, now);
        let screen = fill(
            &[state_line(state), info_line(rip_state, self.info.text())],
            Self::COLUMNS,
            Self::LINES,
        );
        (screen, next_update)
    }
}

fn state_line(s: &PlayerState) -> String {
    match s.state {
        PlayState::Off => "Player shut down".to_string(),
        PlayState::NoDisc => "No disc".to_string(),
        PlayState::Stop => format!("Stop {:>4} tracks", s.no_tracks),
        PlayState::Working => format!("Working {}/{}...", s.track, s.no_tracks),
        PlayState::Play | PlayState::Pause => position_line(s),
    }
}

fn position_line(s: &PlayerState) -> String {
    let state_char = match s.state {
        PlayState::Play => PLAY_CHAR,
        PlayState::Pause => PAUSE_CHAR,
        _ => UNKNOWN_STATE_CHAR,
    };

    let pos = s.position.unsigned_abs();
    let sign = if s.position < 0 { '-' } else { ' ' }; // pregap counts down
    let track_pos = format!("{}{}:{:02}", sign, pos / 60, pos % 60);

    let length = s.length.max(0);
    let track_len = if length >= 600 && (s.track >= 10 || (s.position >= 600 && s.no_tracks >= 10)) {
        // only room for the minutes
        format!("{}+", length / 60)
    } else {
        format!("{}:{:02}", length / 60, length % 60)
    };

    if length < 600 {
        // room to align the track numbers
        format!("{}{:>2}/{:<2}{}/{}", state_char, s.track, s.no_tracks, track_pos, track_len)
    } else {
        // pack the track numbers to the left
        let tracks = format!("{}{}/{}", state_char, s.track, s.no_tracks);
        let pos = format!("{}/{}", track_pos, track_len);
        let gap = Lcd16x2::COLUMNS.saturating_sub(tracks.chars().count() + pos.chars().count());
        format!("{}{}{}", tracks, " ".repeat(gap), pos)
    }
}

fn info_line(rip_state: Option<&RipState>, info: &str) -> String {
    let width = Lcd16x2::COLUMNS - RIP_INDICATOR_COLUMNS;
    match rip_state {
        Some(RipState { state: RipActivity::Audio, progress: Some(pct), .. }) => {
            format!("{:<width$}{:>3}%", truncate(info, width), pct, width = width)
        }
        Some(RipState { state: RipActivity::Audio, progress: None, .. }) => {
            format!("{:<width$} RIP", truncate(info, width), width = width)
        }
        Some(RipState { state: RipActivity::Toc, .. }) => {
            format!("{:<width$} TOC", truncate(info, width), width = width)
        }
        _ => info.to_string(),
    }
}
