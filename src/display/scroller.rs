/*
 *  display/scroller.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Time-stamped scrolling of text that does not fit in a line
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

use crate::constants::{SCROLL_PAUSE, SCROLL_SPEED};

/// Enum for scroll modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScrollMode {
    /// Scroll through once, then come back to rest at the start
    Once,
    /// Keep scrolling until the sequence is dropped
    Loop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    /// Text fits, a single static frame
    Static,
    /// First window, held for the pause
    Start,
    /// Stepping one character at a time
    Scrolling(usize),
    /// Last window, held for the pause
    End,
    /// Back at the first window, no further updates
    Rest,
    Done,
}

/// Produces the visible window of a line of text over time.
///
/// Each item is `(line, next_update)`. The line should be shown until
/// `next_update`, at which point the next item is pulled. A `None`
/// update time means the line is stable. Timestamps are absolute, in the
/// caller's time base, and never go backwards.
///
/// The sequence can only be advanced. Starting over (for instance when
/// the column budget changes) means building a new `Scroller`.
#[derive(Debug, Clone)]
pub struct Scroller {
    text: Vec<char>,
    prefix: String,
    width: usize,
    mode: ScrollMode,
    next_time: f64,
    phase: Phase,
}

impl Scroller {
    pub fn new(text: &str, now: f64, prefix: &str, columns: usize, mode: ScrollMode) -> Self {
        let text: Vec<char> = text.chars().collect();
        let prefix_len = prefix.chars().count();
        let phase = if prefix_len + text.len() <= columns {
            Phase::Static
        } else {
            Phase::Start
        };

        Self {
            text,
            prefix: prefix.to_string(),
            // a prefix wider than the line still leaves a one character window
            width: columns.saturating_sub(prefix_len).max(1),
            mode,
            next_time: now,
            phase,
        }
    }

    fn window(&self, offset: usize) -> String {
        let mut line = self.prefix.clone();
        line.extend(self.text.iter().skip(offset).take(self.width));
        line
    }

    fn last_offset(&self) -> usize {
        self.text.len().saturating_sub(self.width)
    }
}

impl Iterator for Scroller {
    type Item = (String, Option<f64>);

    fn next(&mut self) -> Option<Self::Item> {
        match self.phase {
            Phase::Static => {
                self.phase = Phase::Done;
                Some((self.window(0), None))
            }
            Phase::Start => {
                self.next_time += SCROLL_PAUSE;
                self.phase = if self.last_offset() > 1 {
                    Phase::Scrolling(1)
                } else {
                    Phase::End
                };
                Some((self.window(0), Some(self.next_time)))
            }
            Phase::Scrolling(offset) => {
                self.next_time += SCROLL_SPEED;
                self.phase = if offset + 1 < self.last_offset() {
                    Phase::Scrolling(offset + 1)
                } else {
                    Phase::End
                };
                Some((self.window(offset), Some(self.next_time)))
            }
            Phase::End => {
                self.next_time += SCROLL_PAUSE;
                self.phase = match self.mode {
                    ScrollMode::Once => Phase::Rest,
                    ScrollMode::Loop => Phase::Start,
                };
                Some((self.window(self.last_offset()), Some(self.next_time)))
            }
            Phase::Rest => {
                self.phase = Phase::Done;
                Some((self.window(0), None))
            }
            Phase::Done => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: f64 = 1000.0;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.map(|a| (a - b).abs() < 1e-9).unwrap_or(false)
    }

    #[test]
    fn test_short_text_is_static() {
        let frames: Vec<_> = Scroller::new("Hello", T0, "", 16, ScrollMode::Once).collect();
        assert_eq!(frames, vec![("Hello".to_string(), None)]);

        // exactly fitting with prefix is still static, even when looping
        let frames: Vec<_> = Scroller::new("0123456789abc", T0, "3. ", 16, ScrollMode::Loop).collect();
        assert_eq!(frames, vec![("3. 0123456789abc".to_string(), None)]);
    }

    #[test]
    fn test_scroll_once_sequence() {
        // 8 chars in 5 columns: offsets 0, 1, 2, last=3, then rest
        let frames: Vec<_> = Scroller::new("abcdefgh", T0, "", 5, ScrollMode::Once).collect();
        let lines: Vec<&str> = frames.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(lines, vec!["abcde", "bcdef", "cdefg", "defgh", "abcde"]);

        assert!(approx(frames[0].1, T0 + SCROLL_PAUSE));
        assert!(approx(frames[1].1, T0 + SCROLL_PAUSE + SCROLL_SPEED));
        assert!(approx(frames[2].1, T0 + SCROLL_PAUSE + 2.0 * SCROLL_SPEED));
        assert!(approx(frames[3].1, T0 + 2.0 * SCROLL_PAUSE + 2.0 * SCROLL_SPEED));
        assert_eq!(frames[4].1, None);
    }

    #[test]
    fn test_one_char_overflow_skips_stepping() {
        let frames: Vec<_> = Scroller::new("abcdef", T0, "", 5, ScrollMode::Once).collect();
        let lines: Vec<&str> = frames.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(lines, vec!["abcde", "bcdef", "abcde"]);
    }

    #[test]
    fn test_scroll_reveals_every_char() {
        let text = "The quick brown fox jumps over the lazy dog";
        let frames: Vec<_> = Scroller::new(text, T0, "", 16, ScrollMode::Once).collect();
        for (i, c) in text.chars().enumerate() {
            assert!(
                frames.iter().any(|(line, _)| line.contains(c)),
                "char {} ({:?}) never shown",
                i,
                c
            );
        }
        assert_eq!(frames.first().map(|f| f.0.clone()), frames.last().map(|f| f.0.clone()));
    }

    #[test]
    fn test_times_non_decreasing() {
        let mut last = T0;
        for (_, t) in Scroller::new("a rather long line of text to scroll", T0, "", 16, ScrollMode::Once) {
            if let Some(t) = t {
                assert!(t >= last);
                last = t;
            }
        }
    }

    #[test]
    fn test_loop_is_cyclic() {
        let mut s = Scroller::new("abcdefgh", T0, "", 5, ScrollMode::Loop);
        let first: Vec<_> = s.by_ref().take(4).collect();
        let second: Vec<_> = s.by_ref().take(4).collect();
        assert_eq!(first[0].0, second[0].0);
        assert_eq!(first[3].0, "defgh");
        assert!(approx(second[0].1, T0 + 3.0 * SCROLL_PAUSE + 2.0 * SCROLL_SPEED));
        // never terminates
        assert_eq!(s.take(100).count(), 100);
    }

    #[test]
    fn test_prefix_reduces_width() {
        let mut s = Scroller::new("abcdefgh", T0, "3. ", 8, ScrollMode::Once);
        assert_eq!(s.next().map(|f| f.0), Some("3. abcde".to_string()));
        assert_eq!(s.next().map(|f| f.0), Some("3. bcdef".to_string()));
    }

    #[test]
    fn test_unicode_counts_chars() {
        let frames: Vec<_> = Scroller::new("Björk Guðmundsdóttir", T0, "", 16, ScrollMode::Once).collect();
        assert_eq!(frames[0].0, "Björk Guðmundsdó");
        assert_eq!(frames[frames.len() - 2].0, "k Guðmundsdóttir");
    }
}
