/*
 *  display/info.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Disc, track and error sequences shown in the info region
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

use crate::constants::{BAD_TRACK_LIST, DISC_INFO_SWITCH_SPEED};
use crate::display::scroller::{ScrollMode, Scroller};
use crate::model::Disc;

/// What a sequence needs to know about the player when it moves on to a
/// part that was not built up front.
#[derive(Debug, Clone, Copy)]
pub struct InfoContext {
    /// Track number currently reported by the player
    pub track: u32,
    /// Columns available to scrolled text right now
    pub columns: usize,
}

/// One step of an info sequence: the text to show and when to pull the next step.
pub type InfoStep = (String, Option<f64>);

/// The lazily evaluated content of the info region.
#[derive(Debug)]
pub enum InfoSequence {
    Scroll(Scroller),
    Fixed(Option<String>),
    Disc(DiscInfo),
}

impl InfoSequence {
    /// Disc title, then disc artist, then the title of the current track.
    pub fn disc(disc: Arc<Disc>, now: f64) -> Self {
        InfoSequence::Disc(DiscInfo { disc, now, stage: DiscStage::TitlePending })
    }

    /// Title of `track`, prefixed with the track's own number when the
    /// disc numbers its tracks differently from the player.
    pub fn track(disc: &Disc, track: u32, now: f64, columns: usize) -> Self {
        if track == 0 {
            // between tracks or still looking up the disc
            let title = disc.title.as_deref().unwrap_or("");
            return InfoSequence::Scroll(Scroller::new(title, now, "", columns, ScrollMode::Once));
        }

        let info = usize::try_from(track - 1).ok().and_then(|i| disc.tracks.get(i));
        match info {
            None => InfoSequence::Fixed(Some(BAD_TRACK_LIST.to_string())),
            Some(t) => {
                let prefix = if t.number != track {
                    format!("{}. ", t.number)
                } else {
                    String::new()
                };
                let title = t.title.as_deref().unwrap_or("");
                InfoSequence::Scroll(Scroller::new(title, now, &prefix, columns, ScrollMode::Once))
            }
        }
    }

    /// Errors scroll until they are cleared.
    pub fn errors(errors: &[String], now: f64, columns: usize) -> Self {
        let text = errors.join("; ");
        InfoSequence::Scroll(Scroller::new(&text, now, "", columns, ScrollMode::Loop))
    }

    /// Pull the next step, or `None` once the sequence is exhausted.
    pub fn advance(&mut self, ctx: &InfoContext) -> Option<InfoStep> {
        match self {
            InfoSequence::Scroll(scroller) => scroller.next(),
            InfoSequence::Fixed(text) => text.take().map(|t| (t, None)),
            InfoSequence::Disc(info) => info.advance(ctx),
        }
    }
}

#[derive(Debug)]
enum DiscStage {
    TitlePending,
    Title(Scroller),
    ArtistPending,
    Artist(Scroller),
    TrackPending,
    Track(Box<InfoSequence>),
}

#[derive(Debug)]
pub struct DiscInfo {
    disc: Arc<Disc>,
    now: f64,
    stage: DiscStage,
}

impl DiscInfo {
    fn advance(&mut self, ctx: &InfoContext) -> Option<InfoStep> {
        loop {
            let next_stage = match &mut self.stage {
                DiscStage::TitlePending => match non_empty(self.disc.title.as_deref()) {
                    Some(title) => DiscStage::Title(Scroller::new(title, self.now, "", ctx.columns, ScrollMode::Once)),
                    None => DiscStage::ArtistPending,
                },
                DiscStage::Title(scroller) => match hold_at_rest(scroller, &mut self.now) {
                    Some(step) => return Some(step),
                    None => DiscStage::ArtistPending,
                },
                DiscStage::ArtistPending => match non_empty(self.disc.artist.as_deref()) {
                    Some(artist) => DiscStage::Artist(Scroller::new(artist, self.now, "", ctx.columns, ScrollMode::Once)),
                    None => DiscStage::TrackPending,
                },
                DiscStage::Artist(scroller) => match hold_at_rest(scroller, &mut self.now) {
                    Some(step) => return Some(step),
                    None => DiscStage::TrackPending,
                },
                DiscStage::TrackPending => DiscStage::Track(Box::new(InfoSequence::track(
                    &self.disc,
                    ctx.track,
                    self.now,
                    ctx.columns,
                ))),
                DiscStage::Track(track) => return track.advance(ctx),
            };
            self.stage = next_stage;
        }
    }
}

// Pass through scroll steps, but keep the rest position up for a while
// so the next piece of disc info doesn't replace it immediately.
fn hold_at_rest(scroller: &mut Scroller, now: &mut f64) -> Option<InfoStep> {
    let (line, next_update) = scroller.next()?;
    *now = match next_update {
        Some(t) => t,
        None => *now + DISC_INFO_SWITCH_SPEED,
    };
    Some((line, Some(*now)))
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}
