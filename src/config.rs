//! Postwatch configuration.
//!
//! Loaded from `~/.postwatch/config.toml`. A missing file means defaults;
//! a malformed one is an error.

use std::fs;
use std::path::PathBuf;

use jiff::SignedDuration;
use serde::Deserialize;

use crate::engine::CheckInWindow;

/// Deployment-level knobs for the attendance engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Minutes before scheduled start from which check-in is accepted.
    pub early_window_minutes: i64,

    /// Minutes after scheduled start until which check-in is still accepted.
    /// Past this, unattended assignments are swept to missed.
    pub late_window_minutes: i64,

    /// Command to run on each shift event, receiving the event JSON as its
    /// single argument. Unset means events are only logged.
    pub notify_hook: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            early_window_minutes: 30,
            late_window_minutes: 120,
            notify_hook: None,
        }
    }
}

impl Config {
    /// Load config from `~/.postwatch/config.toml`, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self, String> {
        let Some(path) = Self::path() else {
            return Ok(Self::default());
        };

        let contents = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
        };

        Self::from_toml(&contents).map_err(|e| format!("invalid config at {}: {e}", path.display()))
    }

    /// The config file path: `~/.postwatch/config.toml`.
    pub fn path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".postwatch").join("config.toml"))
    }

    /// The check-in window these settings describe.
    pub fn window(&self) -> CheckInWindow {
        CheckInWindow {
            early: SignedDuration::from_mins(self.early_window_minutes),
            late: SignedDuration::from_mins(self.late_window_minutes),
        }
    }

    fn from_toml(contents: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        if config.early_window_minutes < 0 || config.late_window_minutes < 0 {
            return Err("window minutes cannot be negative".to_string());
        }
        Ok(config)
    }
}
