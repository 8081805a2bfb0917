//! Persisted user settings: brightness and display mode.
//!
//! The display core only ever receives validated values from here. Anything
//! wrong on disk is logged and replaced by defaults.

use crate::scheduler::DisplayMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Lowest brightness a user may choose; below this the panel looks off.
pub const MIN_BRIGHTNESS: u8 = 10;
pub const DEFAULT_BRIGHTNESS: u8 = 128;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("brightness {0} is below the minimum of {min}", min = MIN_BRIGHTNESS)]
    BrightnessOutOfRange(u8),
    #[error("failed to access settings file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub brightness: u8,
    pub display_mode: DisplayMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            brightness: DEFAULT_BRIGHTNESS,
            display_mode: DisplayMode::Time,
        }
    }
}

/// Check a brightness before it reaches the panel.
pub fn validate_brightness(value: u8) -> Result<u8, SettingsError> {
    if value < MIN_BRIGHTNESS {
        return Err(SettingsError::BrightnessOutOfRange(value));
    }
    Ok(value)
}

impl Settings {
    pub fn validate(self) -> Result<Self, SettingsError> {
        validate_brightness(self.brightness)?;
        Ok(self)
    }

    /// Read and validate settings from `path`.
    pub fn read(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Settings = serde_json::from_str(&text)?;
        settings.validate()
    }

    /// Like [`read`](Self::read), but never fails: a missing file is silently
    /// replaced by defaults, a broken one with a warning.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::read(path) {
            Ok(settings) => {
                tracing::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(SettingsError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Ignoring settings: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            brightness: 200,
            display_mode: DisplayMode::Rain,
        };
        settings.save(&path).unwrap();
        assert_eq!(Settings::read(&path).unwrap(), settings);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_or_default(&dir.path().join("nope.json"));
        assert_eq!(settings, Settings::default());
    }

    #[rstest]
    #[case("{not json")]
    #[case(r#"{"brightness": 3, "display_mode": "life"}"#)]
    #[case(r#"{"brightness": 900}"#)]
    #[case(r#"{"display_mode": "disco"}"#)]
    fn broken_file_falls_back_to_defaults(#[case] contents: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, contents).unwrap();
        assert!(Settings::read(&path).is_err());
        assert_eq!(Settings::load_or_default(&path), Settings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"display_mode": "pong"}"#).unwrap();
        let settings = Settings::read(&path).unwrap();
        assert_eq!(settings.brightness, DEFAULT_BRIGHTNESS);
        assert_eq!(settings.display_mode, DisplayMode::Pong);
    }

    #[rstest]
    #[case(0, false)]
    #[case(9, false)]
    #[case(10, true)]
    #[case(255, true)]
    fn brightness_floor(#[case] value: u8, #[case] ok: bool) {
        assert_eq!(validate_brightness(value).is_ok(), ok);
    }

    #[test]
    fn error_messages_are_readable() {
        let e = SettingsError::BrightnessOutOfRange(3);
        assert_eq!(e.to_string(), "brightness 3 is below the minimum of 10");
    }
}
