/*
 *  main.rs
 *
 *  codlcd - character LCD and status LED for the CD player
 *	(c) 2020-26 Stuart Hunter
 *
 *	This program is free software: you can redistribute it and/or modify
 *	it under the terms of the GNU General Public License as published by
 *	the Free Software Foundation, either version 3 of the License, or
 *	(at your option) any later version.
 *
 *	This program is distributed in the hope that it will be useful,
 *	but WITHOUT ANY WARRANTY; without even the implied warranty of
 *	MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *	GNU General Public License for more details.
 *
 *	See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *	Public License.
 *
 */

use log::{error, info};
use env_logger::Env;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use codlcd::config::{self, Config, DriverKind};
use codlcd::display::drivers::terminal::{TerminalLcd, TerminalLed};
use codlcd::display::{LcdDriver, LedDriver};
use codlcd::{runner, source, DisplayController};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

// Events waiting for the display loop
const EVENT_QUEUE: usize = 64;

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> Result<(), Box<dyn std::error::Error>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal_handler().await {
        error!("cannot install signal handlers: {}", e);
        std::future::pending::<()>().await;
    }
}

type Sinks = (Box<dyn LcdDriver>, Box<dyn LedDriver>);

fn build_sinks(cfg: &Config, columns: usize, lines: usize) -> anyhow::Result<Sinks> {
    match cfg.driver() {
        DriverKind::Terminal => {
            info!("drawing a {}x{} LCD on the terminal", columns, lines);
            let led = TerminalLed::stdout();
            let lcd = TerminalLcd::stdout(columns, lines).with_led_row(led.row());
            Ok((Box::new(lcd), Box::new(led)))
        }
        DriverKind::Gpio => gpio_sinks(cfg, lines),
    }
}

#[cfg(feature = "rpi")]
fn gpio_sinks(cfg: &Config, lines: usize) -> anyhow::Result<Sinks> {
    use anyhow::Context;
    use codlcd::display::drivers::hd44780::{GpioLed, Hd44780Lcd, LcdPins};

    let pins = cfg
        .display
        .as_ref()
        .and_then(|d| d.gpio.as_ref())
        .context("display.gpio pins are not configured")?;
    let gpio = rppal::gpio::Gpio::new().context("cannot open GPIO")?;
    let lcd = Hd44780Lcd::new(
        &gpio,
        LcdPins {
            rs: pins.rs,
            en: pins.en,
            d4: pins.d4,
            d5: pins.d5,
            d6: pins.d6,
            d7: pins.d7,
            backlight: pins.backlight,
        },
        lines,
        cfg.enable_pwm(),
        &cfg.custom_glyphs(),
    )?;
    let led = GpioLed::new(&gpio, pins.led, cfg.enable_pwm())?;
    info!("HD44780 on GPIO, LED on pin {}", pins.led);
    Ok((Box::new(lcd), Box::new(led)))
}

#[cfg(not(feature = "rpi"))]
fn gpio_sinks(_cfg: &Config, _lines: usize) -> anyhow::Result<Sinks> {
    anyhow::bail!("the gpio driver needs a build with --features rpi")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_filter()))
        .format_timestamp_secs()
        .init();

    info!("{} v.{} built {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let formatter = cfg.formatter().build();
    let (lcd, led) = build_sinks(&cfg, formatter.columns(), formatter.lines())?;
    let mut controller = DisplayController::new(lcd, led, formatter, cfg.text_encoder(), cfg.controller_options());

    let (tx, rx) = mpsc::channel(EVENT_QUEUE);
    let input = source::spawn(cfg.input(), tx);

    runner::run(&mut controller, rx, runner::wall_clock, shutdown_signal()).await;

    input.abort();
    info!("display cleared, exiting");
    Ok(())
}
