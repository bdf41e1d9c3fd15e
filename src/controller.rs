/*
 *  controller.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Reacts to player state, buttons and timers by driving the LCD and LED
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

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::{BUTTON_BLINK, STALE_BUTTON_AGE};
use crate::display::encoder::TextEncoder;
use crate::display::error::DisplayError;
use crate::display::formatter::Formatter;
use crate::display::traits::{LcdDriver, LedDriver};
use crate::led::{select_pattern, LedPattern, PatternGenerator};
use crate::model::{Disc, PlayState, PlayerState, RipState};
use crate::timers::{TimerKind, Timers};

/// LCD backlight and LED brightness, each 0.0 (unlit) to 1.0.
/// An LCD level of 0 also switches the display off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrightnessLevel {
    pub lcd: f64,
    pub led: f64,
}

impl BrightnessLevel {
    pub const fn new(lcd: f64, led: f64) -> Self {
        Self { lcd, led }
    }
}

pub const DEFAULT_BRIGHTNESS_LEVELS: [BrightnessLevel; 2] = [
    BrightnessLevel::new(1.0, 1.0),
    BrightnessLevel::new(0.0, 1.0),
];

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Seconds in NO_DISC before dimming to the last level, 0 to never dim
    pub inactive_timeout: f64,
    /// Levels cycled by the display toggle button, brightest first
    pub brightness_levels: Vec<BrightnessLevel>,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            inactive_timeout: 0.0,
            brightness_levels: DEFAULT_BRIGHTNESS_LEVELS.to_vec(),
        }
    }
}

// Sink failures must not stop the display from updating later
fn report(what: &str, result: Result<(), DisplayError>) {
    if let Err(e) = result {
        error!("{} failed: {}", what, e);
    }
}

/// Owns the LCD and LED and everything shown on them.
///
/// Every entry point takes the current time so the controller never
/// reads the clock itself. The caller must call [`fire_due`] when
/// [`next_deadline`] passes.
///
/// [`fire_due`]: DisplayController::fire_due
/// [`next_deadline`]: DisplayController::next_deadline
pub struct DisplayController<L: LcdDriver, D: LedDriver> {
    lcd: L,
    led: D,
    formatter: Formatter,
    encoder: TextEncoder,

    state: Option<PlayerState>,
    rip_state: Option<RipState>,
    disc: Option<Arc<Disc>>,

    levels: Vec<BrightnessLevel>,
    brightness_index: usize,
    inactive_timeout: f64,

    pattern: Option<LedPattern>,
    generator: Option<PatternGenerator>,

    timers: Timers,
}

impl<L: LcdDriver, D: LedDriver> DisplayController<L, D> {
    pub fn new(lcd: L, led: D, formatter: Formatter, encoder: TextEncoder, options: ControllerOptions) -> Self {
        let levels = if options.brightness_levels.is_empty() {
            DEFAULT_BRIGHTNESS_LEVELS.to_vec()
        } else {
            options.brightness_levels
        };

        Self {
            lcd,
            led,
            formatter,
            encoder,
            state: None,
            rip_state: None,
            disc: None,
            levels,
            brightness_index: 0,
            inactive_timeout: options.inactive_timeout,
            pattern: None,
            generator: None,
            timers: Timers::new(),
        }
    }

    /// Light up at the brightest level and show the splash screen.
    pub fn start(&mut self, now: f64) {
        info!("display controller starting, {} brightness levels", self.levels.len());
        self.set_brightness(self.levels[0]);
        report("LCD clear", self.lcd.clear());
        self.render(now);
        self.update_led(now);
    }

    /// Blank the display and switch the LED off.
    pub fn shutdown(&mut self) {
        info!("display controller shutting down");
        self.timers = Timers::new();
        self.generator = None;
        report("LCD clear", self.lcd.clear());
        report("LED off", self.led.off());
    }

    pub fn on_state(&mut self, state: PlayerState, now: f64) {
        debug!("got state: {:?}", state);

        if self.inactive_timeout > 0.0 {
            let was_no_disc = self.state.as_ref().is_some_and(|s| s.state == PlayState::NoDisc);
            let is_no_disc = state.state == PlayState::NoDisc;

            if !was_no_disc && is_no_disc {
                debug!("transitioned to NO_DISC, dimming screen in {}s", self.inactive_timeout);
                self.timers.arm(TimerKind::Dim, now + self.inactive_timeout);
            } else if was_no_disc && !is_no_disc {
                debug!("transitioned from NO_DISC, enabling screen");
                self.timers.cancel(TimerKind::Dim);

                // leave it alone if the user picked another level
                if self.brightness_index == self.last_level() {
                    self.brightness_index = 0;
                    self.set_brightness(self.levels[0]);
                }
            }
        }

        self.state = Some(state);
        self.render(now);
        self.update_led(now);
    }

    pub fn on_rip_state(&mut self, rip_state: RipState, now: f64) {
        debug!("got rip state: {:?}", rip_state);
        self.rip_state = Some(rip_state);
        self.render(now);
        self.update_led(now);
    }

    pub fn on_disc(&mut self, disc: Disc, now: f64) {
        debug!("got disc: {}", disc.disc_id);
        self.disc = Some(Arc::new(disc));
        self.render(now);
    }

    /// Feedback for any button: blink the steady LED off briefly.
    /// Repeated presses flicker it instead of stacking blinks.
    pub fn on_button_press(&mut self, now: f64) {
        if self.pattern.is_some() {
            return;
        }

        if self.timers.cancel(TimerKind::ButtonBlink) {
            report("LED on", self.led.on());
        } else {
            self.timers.arm(TimerKind::ButtonBlink, now + BUTTON_BLINK);
            report("LED off", self.led.off());
        }
    }

    /// Step to the next brightness level. `args[0]` is the time of the
    /// physical press, and presses queued for too long are ignored.
    pub fn on_display_toggle(&mut self, args: &[String], now: f64) {
        let ts = match args.first().map(|a| a.trim().parse::<f64>()) {
            Some(Ok(ts)) if ts.is_finite() => ts,
            _ => {
                error!("no timestamp in button message: {:?}", args);
                now
            }
        };

        if ts > now || now - ts < STALE_BUTTON_AGE {
            self.brightness_index = (self.brightness_index + 1) % self.levels.len();
            self.set_brightness(self.levels[self.brightness_index]);
        } else {
            warn!("ignoring {:.3}s old display toggle", now - ts);
        }
    }

    /// Run the handlers of every timer due at `now`, earliest first.
    pub fn fire_due(&mut self, now: f64) {
        while let Some(kind) = self.timers.pop_due(now) {
            match kind {
                TimerKind::Render => self.render(now),
                TimerKind::LedStep => self.step_led(),
                TimerKind::ButtonBlink => self.stop_button_blink(),
                TimerKind::Dim => self.dim_on_inactivity(),
            }
        }
    }

    pub fn next_deadline(&self) -> Option<f64> {
        self.timers.next_deadline()
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn brightness_index(&self) -> usize {
        self.brightness_index
    }

    pub fn led_pattern(&self) -> Option<LedPattern> {
        self.pattern
    }

    fn last_level(&self) -> usize {
        self.levels.len() - 1
    }

    fn render(&mut self, now: f64) {
        // only a disc matching the player state is worth showing
        let disc = match (self.state.as_ref(), self.disc.as_ref()) {
            (Some(s), Some(d)) if s.disc_id.as_deref() == Some(d.disc_id.as_str()) => Some(d),
            _ => None,
        };

        let (text, next_update) = self.formatter.format(self.state.as_ref(), self.rip_state.as_ref(), disc, now);
        match next_update {
            Some(at) => self.timers.arm(TimerKind::Render, at),
            None => {
                self.timers.cancel(TimerKind::Render);
            }
        }

        let encoded = self.encoder.encode(&text);
        report("LCD home", self.lcd.home());
        report("LCD message", self.lcd.message(&encoded));
    }

    fn update_led(&mut self, now: f64) {
        let pattern = select_pattern(self.state.as_ref(), self.rip_state.as_ref());
        if pattern == self.pattern {
            return;
        }

        debug!("LED pattern {:?} -> {:?}", self.pattern, pattern);
        self.pattern = pattern;
        self.generator = None;
        self.timers.cancel(TimerKind::LedStep);
        self.timers.cancel(TimerKind::ButtonBlink);

        match pattern {
            None => report("LED on", self.led.on()),
            Some(p) => {
                self.generator = Some(p.generate(now));
                self.step_led();
            }
        }
    }

    fn step_led(&mut self) {
        let Some(generator) = self.generator.as_mut() else { return };
        if let Some((value, next_change)) = generator.next() {
            report("LED set", self.led.set(value));
            self.timers.arm(TimerKind::LedStep, next_change);
        }
    }

    fn stop_button_blink(&mut self) {
        if self.pattern.is_none() {
            report("LED on", self.led.on());
        }
    }

    fn dim_on_inactivity(&mut self) {
        debug!("inactive, dimming screen");
        self.brightness_index = self.last_level();
        self.set_brightness(self.levels[self.brightness_index]);
    }

    fn set_brightness(&mut self, level: BrightnessLevel) {
        debug!("changing brightness: lcd = {}, led = {}", level.lcd, level.led);
        report("LCD enable", self.lcd.enable_display(level.lcd != 0.0));
        report("LCD backlight", self.lcd.set_backlight(level.lcd));
        report("LED brightness", self.led.set_brightness(level.led));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::{MockLcd, MockLed};
    use crate::display::formatter::FormatterKind;
    use crate::model::RipActivity;

    const T0: f64 = 1_700_000_000.0;

    fn controller(options: ControllerOptions) -> (DisplayController<MockLcd, MockLed>, MockLcd, MockLed) {
        let lcd = MockLcd::new();
        let led = MockLed::new();
        let mut c = DisplayController::new(
            lcd.clone(),
            led.clone(),
            FormatterKind::Lcd16x2.build(),
            TextEncoder::new(),
            options,
        );
        c.start(T0);
        (c, lcd, led)
    }

    fn led_value(led: &MockLed) -> Option<u8> {
        led.state().lock().unwrap().value()
    }

    fn screen(lcd: &MockLcd) -> String {
        lcd.state().lock().unwrap().screen().unwrap_or_default()
    }

    #[test]
    fn test_start_shows_splash_and_no_player_pattern() {
        let (c, lcd, led) = controller(ControllerOptions::default());
        assert!(screen(&lcd).ends_with("Waiting on state"));
        assert_eq!(lcd.state().lock().unwrap().clear_count, 1);
        assert_eq!(lcd.state().lock().unwrap().backlight, Some(1.0));
        assert_eq!(c.led_pattern(), Some(LedPattern::NoPlayer));
        assert_eq!(led_value(&led), Some(1));
        assert_eq!(c.timers().deadline(TimerKind::LedStep), Some(T0 + 0.3));
    }

    #[test]
    fn test_pattern_steps_on_timer() {
        let (mut c, _lcd, led) = controller(ControllerOptions::default());
        c.fire_due(T0 + 0.3);
        assert_eq!(led_value(&led), Some(0));
        let next = c.timers().deadline(TimerKind::LedStep).unwrap();
        assert!((next - (T0 + 1.2)).abs() < 1e-6);
    }

    #[test]
    fn test_steady_state_stops_pattern() {
        let (mut c, _lcd, led) = controller(ControllerOptions::default());
        c.on_state(PlayerState::new(PlayState::Stop), T0 + 0.1);
        assert_eq!(c.led_pattern(), None);
        assert_eq!(led_value(&led), Some(1));
        assert!(!c.timers().is_pending(TimerKind::LedStep));
    }

    #[test]
    fn test_same_pattern_is_not_restarted() {
        let (mut c, _lcd, led) = controller(ControllerOptions::default());
        c.on_state(PlayerState::new(PlayState::Working), T0);
        let deadline = c.timers().deadline(TimerKind::LedStep);
        let writes = led.state().lock().unwrap().values.len();

        let mut again = PlayerState::new(PlayState::Working);
        again.track = 3;
        c.on_state(again, T0 + 0.1);
        assert_eq!(c.timers().deadline(TimerKind::LedStep), deadline);
        assert_eq!(led.state().lock().unwrap().values.len(), writes);
    }

    #[test]
    fn test_button_blink() {
        let (mut c, _lcd, led) = controller(ControllerOptions::default());
        c.on_state(PlayerState::new(PlayState::Stop), T0);

        c.on_button_press(T0 + 1.0);
        assert_eq!(led_value(&led), Some(0));
        assert_eq!(c.timers().deadline(TimerKind::ButtonBlink), Some(T0 + 1.0 + BUTTON_BLINK));

        c.fire_due(T0 + 1.0 + BUTTON_BLINK);
        assert_eq!(led_value(&led), Some(1));
        assert!(!c.timers().is_pending(TimerKind::ButtonBlink));
    }

    #[test]
    fn test_pattern_start_cancels_button_blink() {
        let (mut c, _lcd, led) = controller(ControllerOptions::default());
        c.on_state(PlayerState::new(PlayState::Stop), T0);
        c.on_button_press(T0 + 1.0);
        assert!(c.timers().is_pending(TimerKind::ButtonBlink));

        c.on_state(PlayerState::new(PlayState::Working), T0 + 1.1);
        assert_eq!(c.led_pattern(), Some(LedPattern::Working));
        assert!(!c.timers().is_pending(TimerKind::ButtonBlink));
        assert_eq!(c.timers().deadline(TimerKind::LedStep), Some(T0 + 1.1 + 0.3));
        assert_eq!(led_value(&led), Some(0));

        // nothing relights the LED when the blink would have ended
        let writes = led.state().lock().unwrap().values.len();
        c.fire_due(T0 + 1.0 + BUTTON_BLINK);
        assert_eq!(led.state().lock().unwrap().values.len(), writes);
        assert_eq!(led_value(&led), Some(0));
    }

    #[test]
    fn test_repeated_press_flickers() {
        let (mut c, _lcd, led) = controller(ControllerOptions::default());
        c.on_state(PlayerState::new(PlayState::Stop), T0);

        c.on_button_press(T0 + 1.0);
        c.on_button_press(T0 + 1.1);
        assert_eq!(led_value(&led), Some(1));
        assert!(!c.timers().is_pending(TimerKind::ButtonBlink));

        c.on_button_press(T0 + 1.15);
        assert_eq!(led_value(&led), Some(0));
        assert_eq!(c.timers().deadline(TimerKind::ButtonBlink), Some(T0 + 1.15 + BUTTON_BLINK));
    }

    #[test]
    fn test_no_blink_while_pattern_runs() {
        let (mut c, _lcd, led) = controller(ControllerOptions::default());
        let writes = led.state().lock().unwrap().values.len();
        c.on_button_press(T0 + 0.1);
        assert_eq!(led.state().lock().unwrap().values.len(), writes);
        assert!(!c.timers().is_pending(TimerKind::ButtonBlink));
    }

    #[test]
    fn test_toggle_cycles_and_wraps() {
        let levels = vec![
            BrightnessLevel::new(1.0, 1.0),
            BrightnessLevel::new(0.5, 0.5),
            BrightnessLevel::new(0.0, 0.2),
        ];
        let (mut c, lcd, led) = controller(ControllerOptions { inactive_timeout: 0.0, brightness_levels: levels });
        let now = T0 + 5.0;
        let ts = vec![now.to_string()];

        c.on_display_toggle(&ts, now);
        assert_eq!(c.brightness_index(), 1);
        assert_eq!(lcd.state().lock().unwrap().backlight, Some(0.5));

        c.on_display_toggle(&ts, now);
        assert_eq!(c.brightness_index(), 2);
        assert_eq!(lcd.state().lock().unwrap().enabled, Some(false));
        assert_eq!(led.state().lock().unwrap().brightness, Some(0.2));

        c.on_display_toggle(&ts, now);
        assert_eq!(c.brightness_index(), 0);
        assert_eq!(lcd.state().lock().unwrap().enabled, Some(true));
    }

    #[test]
    fn test_stale_toggle_is_ignored() {
        let (mut c, _lcd, _led) = controller(ControllerOptions::default());
        let now = T0 + 10.0;
        c.on_display_toggle(&[(now - 0.6).to_string()], now);
        assert_eq!(c.brightness_index(), 0);

        // future presses are always accepted
        c.on_display_toggle(&[(now + 30.0).to_string()], now);
        assert_eq!(c.brightness_index(), 1);
    }

    #[test]
    fn test_malformed_timestamp_counts_as_now() {
        let (mut c, _lcd, _led) = controller(ControllerOptions::default());
        c.on_display_toggle(&[], T0);
        assert_eq!(c.brightness_index(), 1);
        c.on_display_toggle(&["yesterday".to_string()], T0);
        assert_eq!(c.brightness_index(), 0);
    }

    #[test]
    fn test_render_timer_cancelled_when_text_settles() {
        let (mut c, _lcd, _led) = controller(ControllerOptions::default());
        let mut disc = Disc::with_titles("d1", &["One"]);
        disc.title = Some("Album".to_string());
        c.on_disc(disc, T0);

        let mut s = PlayerState::new(PlayState::Play);
        s.disc_id = Some("d1".to_string());
        s.track = 1;
        s.no_tracks = 1;
        c.on_state(s, T0);
        assert!(c.timers().is_pending(TimerKind::Render));

        c.fire_due(T0 + 10.0);
        assert!(!c.timers().is_pending(TimerKind::Render));
    }

    #[test]
    fn test_disc_for_other_id_is_not_shown() {
        let (mut c, lcd, _led) = controller(ControllerOptions::default());
        let mut disc = Disc::with_titles("other", &["One"]);
        disc.title = Some("Album".to_string());
        c.on_disc(disc, T0);

        let mut s = PlayerState::new(PlayState::Play);
        s.disc_id = Some("d1".to_string());
        c.on_state(s, T0);
        assert!(!screen(&lcd).contains("Album"));
    }

    #[test]
    fn test_rip_error_drives_error_pattern() {
        let (mut c, _lcd, _led) = controller(ControllerOptions::default());
        c.on_state(PlayerState::new(PlayState::Stop), T0);
        let mut rip = RipState::new(RipActivity::Inactive);
        rip.error = Some("ripErr".to_string());
        c.on_rip_state(rip, T0 + 1.0);
        assert_eq!(c.led_pattern(), Some(LedPattern::PlayerError));
    }

    #[test]
    fn test_sink_failure_does_not_propagate() {
        let (mut c, lcd, led) = controller(ControllerOptions::default());
        lcd.state().lock().unwrap().simulate_failure = true;
        led.state().lock().unwrap().simulate_failure = true;
        c.on_state(PlayerState::new(PlayState::Stop), T0);
        c.on_button_press(T0);
        c.fire_due(T0 + 60.0);

        lcd.state().lock().unwrap().simulate_failure = false;
        c.on_state(PlayerState::new(PlayState::NoDisc), T0 + 61.0);
        assert!(screen(&lcd).starts_with("No disc"));
    }

    #[test]
    fn test_shutdown_blanks() {
        let (mut c, lcd, led) = controller(ControllerOptions::default());
        c.shutdown();
        assert_eq!(lcd.state().lock().unwrap().clear_count, 2);
        assert_eq!(led_value(&led), Some(0));
        assert_eq!(c.next_deadline(), None);
    }
}
