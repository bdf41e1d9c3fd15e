use serde::{Deserialize, Serialize};
use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use dirs_next::home_dir;
use std::collections::BTreeMap;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::constants::{MAX_CUSTOM_CHARS, MAX_INACTIVE_TIMEOUT};
use crate::controller::{BrightnessLevel, ControllerOptions};
use crate::display::encoder::TextEncoder;
use crate::display::formatter::FormatterKind;
use crate::source::InputSource;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,              // e.g., "info" | "debug"
    pub formatter: Option<FormatterKind>,       // screen geometry, "16x2"
    /// seconds in NO_DISC before dimming, 0 to never dim
    pub inactive_timeout: Option<f64>,
    /// cycled by DISPLAYTOGGLE, brightest first, last is used to dim
    pub brightness_levels: Option<Vec<BrightnessLevel>>,
    /// up to six glyphs missing from the character ROM, eight 5-bit rows each
    pub custom_chars: Option<BTreeMap<char, [u8; 8]>>,
    pub display: Option<DisplayConfig>,
    pub input: Option<InputSource>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DisplayConfig {
    pub driver: Option<DriverKind>,
    pub gpio: Option<GpioConfig>,
    /// dim backlight and LED with software PWM
    pub enable_pwm: Option<bool>,
}

/// BCM pin numbers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GpioConfig {
    pub led: u8,
    pub rs: u8,
    pub en: u8,
    pub d4: u8,
    pub d5: u8,
    pub d6: u8,
    pub d7: u8,
    pub backlight: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    #[default]
    Terminal,
    Gpio,
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone)]
#[command(name = "codlcd", about = "CD player LCD and LED", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// shorthand for --log-level debug
    #[arg(long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub inactive_timeout: Option<f64>,
    #[arg(long, value_enum)]
    pub driver: Option<DriverKind>,
    /// read events from this Unix socket instead of stdin
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub socket: Option<PathBuf>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = load_from(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Build the effective config for already parsed arguments.
pub fn load_from(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/codlcd/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/codlcd/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/codlcd.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["codlcd.yaml", "config.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    // top-level
    if src.log_level.is_some()          { dst.log_level = src.log_level; }
    if src.formatter.is_some()          { dst.formatter = src.formatter; }
    if src.inactive_timeout.is_some()   { dst.inactive_timeout = src.inactive_timeout; }
    if src.brightness_levels.is_some()  { dst.brightness_levels = src.brightness_levels; }
    if src.custom_chars.is_some()       { dst.custom_chars = src.custom_chars; }
    if src.input.is_some()              { dst.input = src.input; }
    // display
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.driver.is_some()      { dst.driver = src.driver; }
    if src.gpio.is_some()        { dst.gpio = src.gpio; }
    if src.enable_pwm.is_some()  { dst.enable_pwm = src.enable_pwm; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()         { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                       { cfg.log_level = Some("debug".to_string()); }
    if cli.inactive_timeout.is_some()  { cfg.inactive_timeout = cli.inactive_timeout; }
    if let Some(path) = cli.socket.as_ref() {
        cfg.input = Some(InputSource::UnixSocket(path.clone()));
    }
    if cli.driver.is_some() {
        cfg.display.get_or_insert_with(DisplayConfig::default).driver = cli.driver;
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(level) = cfg.log_level.as_deref() {
        if level.parse::<log::LevelFilter>().is_err() {
            return Err(ConfigError::Validation(format!("unknown log_level {:?}", level)));
        }
    }
    if let Some(t) = cfg.inactive_timeout {
        if !(0.0..=MAX_INACTIVE_TIMEOUT).contains(&t) {
            return Err(ConfigError::Validation(format!(
                "inactive_timeout must be 0..={} seconds, got {}",
                MAX_INACTIVE_TIMEOUT, t
            )));
        }
    }
    if let Some(levels) = cfg.brightness_levels.as_ref() {
        if levels.is_empty() {
            return Err(ConfigError::Validation("brightness_levels must not be empty".into()));
        }
        for l in levels {
            if !(0.0..=1.0).contains(&l.lcd) || !(0.0..=1.0).contains(&l.led) {
                return Err(ConfigError::Validation("brightness levels must be 0.0..=1.0".into()));
            }
        }
    }
    if let Some(chars) = cfg.custom_chars.as_ref() {
        if chars.len() > MAX_CUSTOM_CHARS {
            return Err(ConfigError::Validation(format!(
                "at most {} custom_chars, got {}",
                MAX_CUSTOM_CHARS,
                chars.len()
            )));
        }
        if let Some((c, _)) = chars.iter().find(|(_, rows)| rows.iter().any(|r| *r > 0x1f)) {
            return Err(ConfigError::Validation(format!("custom char {:?} rows must be 5 bits wide", c)));
        }
    }
    if let Some(display) = cfg.display.as_ref() {
        if display.driver == Some(DriverKind::Gpio) && display.gpio.is_none() {
            return Err(ConfigError::Validation("display driver gpio needs display.gpio pins".into()));
        }
    }
    Ok(())
}

impl Config {
    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn formatter(&self) -> FormatterKind {
        self.formatter.unwrap_or_default()
    }

    pub fn driver(&self) -> DriverKind {
        self.display.as_ref().and_then(|d| d.driver).unwrap_or_default()
    }

    pub fn enable_pwm(&self) -> bool {
        self.display.as_ref().and_then(|d| d.enable_pwm).unwrap_or(false)
    }

    pub fn input(&self) -> InputSource {
        self.input.clone().unwrap_or_default()
    }

    pub fn controller_options(&self) -> ControllerOptions {
        let mut options = ControllerOptions::default();
        if let Some(t) = self.inactive_timeout {
            options.inactive_timeout = t;
        }
        if let Some(levels) = self.brightness_levels.as_ref() {
            options.brightness_levels = levels.clone();
        }
        options
    }

    /// Encoder mapping each custom char to its CGRAM slot.
    pub fn text_encoder(&self) -> TextEncoder {
        match self.custom_chars.as_ref() {
            Some(chars) => TextEncoder::with_custom_chars(chars.keys().copied()),
            None => TextEncoder::new(),
        }
    }

    /// Glyph bitmaps in the same order as [`Config::text_encoder`] assigns slots.
    pub fn custom_glyphs(&self) -> Vec<[u8; 8]> {
        self.custom_chars
            .as_ref()
            .map(|chars| chars.values().copied().collect())
            .unwrap_or_default()
    }
}
