/*
 *  led.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Status LED blink patterns and their selection from player state
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

use crate::model::{PlayState, PlayerState, RipState};

/// One step of a blink pattern: LED value and how long it is held.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedStep {
    pub value: u8,
    pub duration: f64,
}

const fn on(duration: f64) -> LedStep {
    LedStep { value: 1, duration }
}

const fn off(duration: f64) -> LedStep {
    LedStep { value: 0, duration }
}

const NO_PLAYER: &[LedStep] = &[on(0.3), off(0.9)];
const WORKING: &[LedStep] = &[off(0.3), on(0.3)];
const PLAYER_ERROR: &[LedStep] = &[off(0.9), on(0.3), off(0.3), on(0.3)];

/// Named blink patterns.
///
/// Two selections are the same pattern when their tags are equal, and
/// a running pattern is never restarted for an equal selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedPattern {
    NoPlayer,
    Working,
    PlayerError,
}

impl LedPattern {
    pub fn steps(self) -> &'static [LedStep] {
        match self {
            LedPattern::NoPlayer => NO_PLAYER,
            LedPattern::Working => WORKING,
            LedPattern::PlayerError => PLAYER_ERROR,
        }
    }

    /// Start generating the pattern at `now`.
    pub fn generate(self, now: f64) -> PatternGenerator {
        PatternGenerator { steps: self.steps(), index: 0, now }
    }
}

/// Endless `(value, next_change)` sequence for a pattern. The value
/// should be shown until `next_change`, then the next pair pulled.
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    steps: &'static [LedStep],
    index: usize,
    now: f64,
}

impl Iterator for PatternGenerator {
    type Item = (u8, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let step = self.steps.get(self.index)?;
        self.index = (self.index + 1) % self.steps.len();
        self.now += step.duration;
        Some((step.value, self.now))
    }
}

/// Pick the blink pattern for the current state, or `None` for a
/// steady light. Rules are checked in priority order.
pub fn select_pattern(state: Option<&PlayerState>, rip_state: Option<&RipState>) -> Option<LedPattern> {
    if rip_state.is_some_and(|r| r.error.is_some()) {
        return Some(LedPattern::PlayerError);
    }

    match state {
        None => Some(LedPattern::NoPlayer),
        Some(s) if s.state == PlayState::Off => Some(LedPattern::NoPlayer),
        Some(s) if s.error.is_some() => Some(LedPattern::PlayerError),
        Some(s) if s.state == PlayState::Working => Some(LedPattern::Working),
        Some(_) => None,
    }
}
