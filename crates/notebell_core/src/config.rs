//! TOML configuration for notebell processes.
//!
//! # Responsibility
//! - Deserialize `notebell.toml` with every field defaulted.
//! - Turn raw strings (time zone, default reminder) into typed values.
//!
//! # Invariants
//! - A missing file section or key never fails; only malformed values do.
//! - Relative `log_dir` values resolve against the config file directory.

use crate::logging::default_log_level;
use crate::model::reminder::{ReminderConfig, ValidationError};
use crate::notification::DispatchSettings;
use crate::reminder::ReminderCalculator;
use crate::store::ReminderReloadPolicy;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebellConfig {
    pub log_level: String,
    /// Log directory; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    /// IANA zone name used for manual times and day queries.
    pub timezone: String,
    pub notification_title: String,
    pub notification_duration_ms: u64,
    /// Compact reminder text, e.g. `15m`, `after 2 hours`, `at 8:30`.
    pub default_reminder: String,
    pub reload_policy: ReminderReloadPolicy,
    /// Player program plus arguments; the sound locator is appended.
    pub sound_command: Vec<String>,
}

impl Default for NotebellConfig {
    fn default() -> Self {
        let dispatch = DispatchSettings::default();
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            timezone: "UTC".to_string(),
            notification_title: dispatch.title,
            notification_duration_ms: dispatch.duration_ms,
            default_reminder: ReminderConfig::default().to_string(),
            reload_policy: ReminderReloadPolicy::default(),
            sound_command: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    UnknownTimezone(String),
    DefaultReminder(ValidationError),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::UnknownTimezone(name) => write!(f, "unknown time zone `{name}`"),
            Self::DefaultReminder(err) => write!(f, "invalid default_reminder: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::UnknownTimezone(_) => None,
            Self::DefaultReminder(err) => Some(err),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl From<ValidationError> for ConfigError {
    fn from(value: ValidationError) -> Self {
        Self::DefaultReminder(value)
    }
}

impl NotebellConfig {
    /// Parses config text; relative paths stay as written.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads a config file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let mut config = Self::from_toml_str(&text)?;
        let base_dir = path.parent().unwrap_or(Path::new("."));
        config.log_dir = config.log_dir.map(|dir| resolve_path(base_dir, &dir));
        Ok(config)
    }

    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .trim()
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimezone(self.timezone.clone()))
    }

    pub fn calculator(&self) -> Result<ReminderCalculator, ConfigError> {
        Ok(ReminderCalculator::new(self.timezone()?))
    }

    /// Reminder applied to new events that do not carry one; `None` for
    /// `none`/`off`.
    pub fn default_reminder(&self) -> Result<Option<ReminderConfig>, ConfigError> {
        let text = self.default_reminder.trim();
        if text.eq_ignore_ascii_case("none") || text.eq_ignore_ascii_case("off") {
            return Ok(None);
        }
        Ok(Some(text.parse::<ReminderConfig>()?))
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            title: self.notification_title.clone(),
            duration_ms: self.notification_duration_ms,
        }
    }
}

fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
