/*
 *  timers.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  One pending deadline per purpose for the display controller
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

/// What a timer is for. There is never more than one pending timer of each kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Format the display again
    Render,
    /// Step the running LED pattern
    LedStep,
    /// Relight the LED after a button press blink
    ButtonBlink,
    /// Dim the screen after sitting in NO_DISC
    Dim,
}

const KINDS: [TimerKind; 4] = [
    TimerKind::Render,
    TimerKind::LedStep,
    TimerKind::ButtonBlink,
    TimerKind::Dim,
];

#[derive(Debug, Default, Clone)]
pub struct Timers {
    deadlines: [Option<f64>; 4],
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(kind: TimerKind) -> usize {
        match kind {
            TimerKind::Render => 0,
            TimerKind::LedStep => 1,
            TimerKind::ButtonBlink => 2,
            TimerKind::Dim => 3,
        }
    }

    /// Arm `kind` for `at`, replacing any deadline it already had.
    pub fn arm(&mut self, kind: TimerKind, at: f64) {
        self.deadlines[Self::slot(kind)] = Some(at);
    }

    /// Cancel `kind`. Returns whether it was pending.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        self.deadlines[Self::slot(kind)].take().is_some()
    }

    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.deadlines[Self::slot(kind)].is_some()
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<f64> {
        self.deadlines[Self::slot(kind)]
    }

    /// Earliest pending deadline of any kind.
    pub fn next_deadline(&self) -> Option<f64> {
        self.deadlines.iter().flatten().copied().reduce(f64::min)
    }

    /// Remove and return the earliest timer due at `now`, if any.
    pub fn pop_due(&mut self, now: f64) -> Option<TimerKind> {
        let kind = KINDS
            .iter()
            .filter_map(|k| self.deadline(*k).map(|at| (*k, at)))
            .filter(|(_, at)| *at <= now)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(k, _)| k)?;
        self.cancel(kind);
        Some(kind)
    }
}
