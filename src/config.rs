//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Mapping entries are parsed leniently: a missing or unrecognized button or
//! combo name is treated as "no mapping" rather than a hard error, so a stale
//! config file never prevents the board from connecting.

use serde::{Deserialize, Deserializer};
use serde::de::Error;
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::error::Result;
use crate::mapping::actions::{ComboAction, GamepadButton};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub board: BoardConfig,

    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Board acquisition configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BoardConfig {
    /// How long the tare window samples the unloaded board, in seconds.
    #[serde(default = "default_tare_duration_sec")]
    pub tare_duration_sec: f32,

    /// Per-read timeout while polling the board.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Rolling-average window size per quadrant.
    #[serde(default = "default_averaging_samples")]
    pub averaging_samples: usize,

    /// Total weight below which the board reports "nothing on board".
    #[serde(default = "default_dead_zone_kg")]
    pub dead_zone_kg: f32,

    /// Upper drift-band bound as a multiple of the dead zone.
    #[serde(default = "default_auto_tare_drift_multiplier")]
    pub auto_tare_drift_multiplier: f32,

    /// Continuous seconds inside the drift band before an automatic re-tare.
    #[serde(default = "default_auto_tare_drift_sec")]
    pub auto_tare_drift_sec: f32,
}

/// Input mapping configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct InputConfig {
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    #[serde(default)]
    pub buttons: ButtonConfig,

    #[serde(default)]
    pub combos: ComboConfig,
}

/// Per-quadrant press thresholds in kg
#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdConfig {
    #[serde(default = "default_threshold_kg")]
    pub top_right: f32,

    #[serde(default = "default_threshold_kg")]
    pub bottom_right: f32,

    #[serde(default = "default_threshold_kg")]
    pub top_left: f32,

    #[serde(default = "default_threshold_kg")]
    pub bottom_left: f32,
}

/// Per-quadrant button mappings
///
/// Values are kebab-case button names (`"a"`, `"left-bumper"`, ...).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ButtonConfig {
    #[serde(default, deserialize_with = "lenient_button")]
    pub top_right: Option<GamepadButton>,

    #[serde(default, deserialize_with = "lenient_button")]
    pub bottom_right: Option<GamepadButton>,

    #[serde(default, deserialize_with = "lenient_button")]
    pub top_left: Option<GamepadButton>,

    #[serde(default, deserialize_with = "lenient_button")]
    pub bottom_left: Option<GamepadButton>,
}

/// Per-pair combo mappings
///
/// Values are kebab-case action names (`"stick-up"`, `"dpad-left"`, ...).
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ComboConfig {
    #[serde(default, deserialize_with = "lenient_combo")]
    pub top: Option<ComboAction>,

    #[serde(default, deserialize_with = "lenient_combo")]
    pub bottom: Option<ComboAction>,

    #[serde(default, deserialize_with = "lenient_combo")]
    pub left: Option<ComboAction>,

    #[serde(default, deserialize_with = "lenient_combo")]
    pub right: Option<ComboAction>,

    #[serde(default, deserialize_with = "lenient_combo")]
    pub diagonal_tl_br: Option<ComboAction>,

    #[serde(default, deserialize_with = "lenient_combo")]
    pub diagonal_tr_bl: Option<ComboAction>,
}

/// Sample logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,
}

// Default value functions
fn default_tare_duration_sec() -> f32 { 3.0 }
fn default_read_timeout_ms() -> u64 { 20 }
fn default_averaging_samples() -> usize { 5 }
fn default_dead_zone_kg() -> f32 { 0.2 }
fn default_auto_tare_drift_multiplier() -> f32 { 2.0 }
fn default_auto_tare_drift_sec() -> f32 { 5.0 }

fn default_threshold_kg() -> f32 { 10.0 }

fn default_telemetry_enabled() -> bool { false }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            tare_duration_sec: default_tare_duration_sec(),
            read_timeout_ms: default_read_timeout_ms(),
            averaging_samples: default_averaging_samples(),
            dead_zone_kg: default_dead_zone_kg(),
            auto_tare_drift_multiplier: default_auto_tare_drift_multiplier(),
            auto_tare_drift_sec: default_auto_tare_drift_sec(),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            top_right: default_threshold_kg(),
            bottom_right: default_threshold_kg(),
            top_left: default_threshold_kg(),
            bottom_left: default_threshold_kg(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
        }
    }
}

/// Deserialize an optional button name, mapping unknown names to `None`.
fn lenient_button<'de, D>(deserializer: D) -> std::result::Result<Option<GamepadButton>, D::Error>
where
    D: Deserializer<'de>,
{
    let name: Option<String> = Option::deserialize(deserializer)?;
    Ok(name.as_deref().and_then(|n| {
        let parsed = GamepadButton::parse(n);
        if parsed.is_none() && n != "none" {
            warn!("Unknown button mapping '{}', treating as none", n);
        }
        parsed
    }))
}

/// Deserialize an optional combo action name, mapping unknown names to `None`.
fn lenient_combo<'de, D>(deserializer: D) -> std::result::Result<Option<ComboAction>, D::Error>
where
    D: Deserializer<'de>,
{
    let name: Option<String> = Option::deserialize(deserializer)?;
    Ok(name.as_deref().and_then(|n| {
        let parsed = ComboAction::parse(n);
        if parsed.is_none() && n != "none" {
            warn!("Unknown combo mapping '{}', treating as none", n);
        }
        parsed
    }))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use balance_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, falling back to defaults if it is missing.
    ///
    /// A malformed file is still an error; only a missing file falls back.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    fn validate(&self) -> Result<()> {
        if self.board.tare_duration_sec <= 0.0 || self.board.tare_duration_sec > 60.0 {
            return Err(crate::error::BalanceBridgeError::Config(
                toml::de::Error::custom("tare_duration_sec must be between 0 and 60")
            ));
        }

        if self.board.read_timeout_ms == 0 || self.board.read_timeout_ms > 1000 {
            return Err(crate::error::BalanceBridgeError::Config(
                toml::de::Error::custom("read_timeout_ms must be between 1 and 1000")
            ));
        }

        if self.board.averaging_samples == 0 || self.board.averaging_samples > 100 {
            return Err(crate::error::BalanceBridgeError::Config(
                toml::de::Error::custom("averaging_samples must be between 1 and 100")
            ));
        }

        if self.board.dead_zone_kg <= 0.0 || self.board.dead_zone_kg > 5.0 {
            return Err(crate::error::BalanceBridgeError::Config(
                toml::de::Error::custom("dead_zone_kg must be between 0 and 5")
            ));
        }

        if self.board.auto_tare_drift_multiplier <= 1.0
            || self.board.auto_tare_drift_multiplier > 10.0 {
            return Err(crate::error::BalanceBridgeError::Config(
                toml::de::Error::custom("auto_tare_drift_multiplier must be between 1 and 10")
            ));
        }

        if self.board.auto_tare_drift_sec <= 0.0 || self.board.auto_tare_drift_sec > 600.0 {
            return Err(crate::error::BalanceBridgeError::Config(
                toml::de::Error::custom("auto_tare_drift_sec must be between 0 and 600")
            ));
        }

        for (name, value) in [
            ("thresholds.top_right", self.input.thresholds.top_right),
            ("thresholds.bottom_right", self.input.thresholds.bottom_right),
            ("thresholds.top_left", self.input.thresholds.top_left),
            ("thresholds.bottom_left", self.input.thresholds.bottom_left),
        ] {
            if value <= 0.0 || value > 150.0 {
                return Err(crate::error::BalanceBridgeError::Config(
                    toml::de::Error::custom(format!("{} must be between 0 and 150", name))
                ));
            }
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(crate::error::BalanceBridgeError::Config(
                toml::de::Error::custom("telemetry log_dir cannot be empty when enabled")
            ));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(crate::error::BalanceBridgeError::Config(
                toml::de::Error::custom("max_records_per_file must be greater than 0")
            ));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(crate::error::BalanceBridgeError::Config(
                toml::de::Error::custom("max_files_to_keep must be greater than 0")
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.board.tare_duration_sec, 3.0);
        assert_eq!(config.board.read_timeout_ms, 20);
        assert_eq!(config.board.averaging_samples, 5);
        assert_eq!(config.board.dead_zone_kg, 0.2);
        assert_eq!(config.board.auto_tare_drift_multiplier, 2.0);
        assert_eq!(config.board.auto_tare_drift_sec, 5.0);
        assert_eq!(config.input.thresholds.top_left, 10.0);
        assert!(config.input.buttons.top_left.is_none());
        assert!(config.input.combos.top.is_none());
        assert!(!config.telemetry.enabled);
    }

    #[test]
    fn test_tare_duration_zero() {
        let mut config = Config::default();
        config.board.tare_duration_sec = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tare_duration_too_high() {
        let mut config = Config::default();
        config.board.tare_duration_sec = 61.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_read_timeout_zero() {
        let mut config = Config::default();
        config.board.read_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_read_timeout_too_high() {
        let mut config = Config::default();
        config.board.read_timeout_ms = 1001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_averaging_samples_zero() {
        let mut config = Config::default();
        config.board.averaging_samples = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dead_zone_negative() {
        let mut config = Config::default();
        config.board.dead_zone_kg = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_drift_multiplier_at_one_rejected() {
        // A multiplier of exactly 1 collapses the drift band to nothing.
        let mut config = Config::default();
        config.board.auto_tare_drift_multiplier = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_drift_duration_zero() {
        let mut config = Config::default();
        config.board.auto_tare_drift_sec = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_zero() {
        let mut config = Config::default();
        config.input.thresholds.bottom_right = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_too_high() {
        let mut config = Config::default();
        config.input.thresholds.top_right = 151.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_enabled() {
        let mut config = Config::default();
        config.telemetry.enabled = true;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_log_dir_when_disabled() {
        let mut config = Config::default();
        config.telemetry.enabled = false;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_max_records_zero() {
        let mut config = Config::default();
        config.telemetry.max_records_per_file = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[board]
tare_duration_sec = 2.0
dead_zone_kg = 0.5

[input.thresholds]
top_left = 12.5

[input.buttons]
top_left = "a"
bottom_left = "b"

[input.combos]
top = "stick-up"
bottom = "dpad-down"

[telemetry]
enabled = true
log_dir = "/tmp/balance-logs"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.board.tare_duration_sec, 2.0);
        assert_eq!(config.board.dead_zone_kg, 0.5);
        // Unspecified fields fall back to defaults
        assert_eq!(config.board.read_timeout_ms, 20);
        assert_eq!(config.input.thresholds.top_left, 12.5);
        assert_eq!(config.input.thresholds.top_right, 10.0);
        assert_eq!(config.input.buttons.top_left, Some(GamepadButton::A));
        assert_eq!(config.input.buttons.bottom_left, Some(GamepadButton::B));
        assert!(config.input.buttons.top_right.is_none());
        assert_eq!(config.input.combos.top, Some(ComboAction::StickUp));
        assert_eq!(config.input.combos.bottom, Some(ComboAction::DpadDown));
        assert!(config.telemetry.enabled);
    }

    #[test]
    fn test_unknown_mapping_name_treated_as_none() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[input.buttons]
top_left = "megabutton"

[input.combos]
top = "barrel-roll"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert!(config.input.buttons.top_left.is_none());
        assert!(config.input.combos.top.is_none());
    }

    #[test]
    fn test_explicit_none_mapping() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[input.buttons]
top_left = "none"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert!(config.input.buttons.top_left.is_none());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/balance-bridge.toml").unwrap();
        assert_eq!(config.board.averaging_samples, 5);
    }
}
