//! This module contains global constants used across the display, LED and controller modules.

// Times are seconds, in the same time base as the `now` passed around
// (seconds since the Unix epoch as f64).

/// Seconds between each scroll step of the info line.
pub const SCROLL_SPEED: f64 = 0.3;
/// Seconds scrolled text is held at its start and end positions.
pub const SCROLL_PAUSE: f64 = 1.0;
/// Seconds the disc title and artist stay visible before moving on.
pub const DISC_INFO_SWITCH_SPEED: f64 = 3.0;

/// Longest accepted NO_DISC dimming delay, one day.
pub const MAX_INACTIVE_TIMEOUT: f64 = 86_400.0;

/// LED off time when acknowledging a button press.
pub const BUTTON_BLINK: f64 = 0.2;
/// Display toggle presses older than this are considered stale and ignored.
pub const STALE_BUTTON_AGE: f64 = 0.5;

/// CGRAM slot of the play glyph.
pub const PLAY_CHAR: char = '\x00';
/// CGRAM slot of the pause glyph.
pub const PAUSE_CHAR: char = '\x01';
/// Shown in place of the play/pause glyph for any other state.
pub const UNKNOWN_STATE_CHAR: char = '?';

/// Number of CGRAM slots available for user supplied glyphs (slots 2..=7).
pub const MAX_CUSTOM_CHARS: usize = 6;
/// First CGRAM slot available for user supplied glyphs.
pub const FIRST_CUSTOM_CHAR_SLOT: u8 = 2;

/// Button name of the display brightness toggle.
pub const DISPLAY_TOGGLE_BUTTON: &str = "DISPLAYTOGGLE";

pub const BAD_TRACK_LIST: &str = "Bad track list!";
pub const WAITING_ON_STATE: &str = "Waiting on state";
