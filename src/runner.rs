/*
 *  runner.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *  (c) 2020-26 Stuart Hunter
 *
 *  Event loop feeding events and timer deadlines to the controller
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

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::constants::DISPLAY_TOGGLE_BUTTON;
use crate::controller::DisplayController;
use crate::display::traits::{LcdDriver, LedDriver};
use crate::source::Event;

// Sleep length standing in for "never"
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Seconds since the Unix epoch.
pub fn wall_clock() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Monotonic instant `delay` seconds from now. Negative, NaN and
/// unrepresentable delays saturate instead of panicking.
fn wake_after(delay: f64) -> Instant {
    let now = Instant::now();
    let delay = Duration::try_from_secs_f64(delay.max(0.0)).map_or(FAR_FUTURE, |d| d.min(FAR_FUTURE));
    now.checked_add(delay).unwrap_or(now + FAR_FUTURE)
}

/// Hand one inbound event to the controller.
pub fn dispatch<L: LcdDriver, D: LedDriver>(controller: &mut DisplayController<L, D>, event: Event, now: f64) {
    match event {
        Event::State(state) => controller.on_state(state, now),
        Event::RipState(rip_state) => controller.on_rip_state(rip_state, now),
        Event::Disc(disc) => controller.on_disc(disc, now),
        Event::Button(button) => {
            debug!("button {} {:?}", button.name, button.args);
            controller.on_button_press(now);
            if button.name == DISPLAY_TOGGLE_BUTTON {
                controller.on_display_toggle(&button.args, now);
            }
        }
    }
}

/// Drive `controller` until `shutdown` completes, then blank the display.
///
/// This is the only place the controller is touched, so events and timer
/// handlers never interleave. `clock` gives the current time in seconds
/// since the epoch. The loop keeps running timers after the event
/// source closes.
pub async fn run<L, D, C, S>(
    controller: &mut DisplayController<L, D>,
    mut events: mpsc::Receiver<Event>,
    clock: C,
    shutdown: S,
) where
    L: LcdDriver,
    D: LedDriver,
    C: Fn() -> f64,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut events_open = true;

    controller.start(clock());

    loop {
        let deadline = controller.next_deadline();
        let wake = match deadline {
            Some(at) => wake_after(at - clock()),
            None => Instant::now(),
        };

        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }

            event = events.recv(), if events_open => match event {
                Some(event) => dispatch(controller, event, clock()),
                None => {
                    info!("event source closed, display keeps running");
                    events_open = false;
                }
            },

            _ = sleep_until(wake), if deadline.is_some() => {
                // the sleep has passed the deadline even if the clock lags
                let now = deadline.map_or(clock(), |at| clock().max(at));
                controller.fire_due(now);
            }
        }
    }

    controller.shutdown();
}
