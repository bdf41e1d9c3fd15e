/*
 *  display/drivers/mock.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock LCD and LED sinks for testing without hardware
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

use std::sync::{Arc, Mutex, MutexGuard};

use crate::display::error::{check_level, DisplayError};
use crate::display::traits::{LcdDriver, LedDriver};

/// Mock LCD sink
///
/// Records every operation in shared state that stays inspectable after
/// the sink has been moved into a controller or run loop.
#[derive(Debug, Clone, Default)]
pub struct MockLcd {
    state: Arc<Mutex<MockLcdState>>,
}

/// Recorded LCD state (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockLcdState {
    /// Number of times clear() was called
    pub clear_count: usize,

    /// Number of times home() was called
    pub home_count: usize,

    /// Every message written, oldest first
    pub messages: Vec<Vec<u8>>,

    /// Last enable_display() value
    pub enabled: Option<bool>,

    /// Last backlight level set
    pub backlight: Option<f64>,

    /// Simulate failures (for error testing)
    pub simulate_failure: bool,
}

impl MockLcdState {
    /// Last message decoded from the character ROM encoding.
    pub fn screen(&self) -> Option<String> {
        self.messages.last().map(|m| m.iter().map(|&b| char::from(b)).collect())
    }
}

impl MockLcd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockLcdState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockLcdState>, DisplayError> {
        let state = self
            .state
            .lock()
            .map_err(|_| DisplayError::Other("mock LCD state poisoned".to_string()))?;
        if state.simulate_failure {
            return Err(DisplayError::Other("Simulated LCD failure".to_string()));
        }
        Ok(state)
    }
}

impl LcdDriver for MockLcd {
    fn clear(&mut self) -> Result<(), DisplayError> {
        self.lock()?.clear_count += 1;
        Ok(())
    }

    fn home(&mut self) -> Result<(), DisplayError> {
        self.lock()?.home_count += 1;
        Ok(())
    }

    fn message(&mut self, text: &[u8]) -> Result<(), DisplayError> {
        self.lock()?.messages.push(text.to_vec());
        Ok(())
    }

    fn enable_display(&mut self, enable: bool) -> Result<(), DisplayError> {
        self.lock()?.enabled = Some(enable);
        Ok(())
    }

    fn set_backlight(&mut self, level: f64) -> Result<(), DisplayError> {
        let level = check_level("backlight", level)?;
        self.lock()?.backlight = Some(level);
        Ok(())
    }
}

/// Mock LED sink
#[derive(Debug, Clone, Default)]
pub struct MockLed {
    state: Arc<Mutex<MockLedState>>,
}

#[derive(Debug, Default)]
pub struct MockLedState {
    /// Every value set, oldest first
    pub values: Vec<u8>,

    /// Last brightness level set
    pub brightness: Option<f64>,

    pub simulate_failure: bool,
}

impl MockLedState {
    pub fn value(&self) -> Option<u8> {
        self.values.last().copied()
    }
}

impl MockLed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Arc<Mutex<MockLedState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> Result<MutexGuard<'_, MockLedState>, DisplayError> {
        let state = self
            .state
            .lock()
            .map_err(|_| DisplayError::Other("mock LED state poisoned".to_string()))?;
        if state.simulate_failure {
            return Err(DisplayError::Other("Simulated LED failure".to_string()));
        }
        Ok(state)
    }
}

impl LedDriver for MockLed {
    fn set(&mut self, value: u8) -> Result<(), DisplayError> {
        self.lock()?.values.push(value);
        Ok(())
    }

    fn set_brightness(&mut self, level: f64) -> Result<(), DisplayError> {
        let level = check_level("LED brightness", level)?;
        self.lock()?.brightness = Some(level);
        Ok(())
    }
}
