//! Reminder configuration model.
//!
//! # Responsibility
//! - Describe how a reminder relates to its event start (`before|after|on-time`).
//! - Validate user input before it reaches the reminder calculator.
//! - Parse compact reminder text used by CLI flags and config files.
//!
//! # Invariants
//! - A `ReminderConfig` is never persisted on its own; it is the input from
//!   which an event's `reminder_time` is derived.
//! - A valid `manual_time` overrides mode/value/unit entirely.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Unix epoch milliseconds.
pub type EpochMs = i64;

const MINUTE_MS: i64 = 60_000;
const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 86_400_000;

static RELATIVE_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?i)(?:(before|after)\s+)?(\d+)\s*(m|min|mins|minutes?|h|hrs?|hours?|d|days?)$",
    )
    .expect("valid relative reminder regex")
});
static MANUAL_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)at\s+(\d{1,2}):(\d{1,2})$").expect("valid manual reminder regex")
});

/// Temporal relationship between a reminder and its event start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReminderMode {
    /// Remind `value * unit` before the event starts.
    Before,
    /// Remind `value * unit` after the event starts.
    After,
    /// Remind exactly at the event start.
    OnTime,
}

impl ReminderMode {
    /// Stable storage/wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
            Self::OnTime => "on-time",
        }
    }

    /// Parses a storage/wire string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            "on-time" => Some(Self::OnTime),
            _ => None,
        }
    }
}

/// Unit of a relative reminder offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderUnit {
    Minutes,
    Hours,
    Days,
}

impl ReminderUnit {
    /// Length of one unit in milliseconds.
    pub fn as_millis(self) -> i64 {
        match self {
            Self::Minutes => MINUTE_MS,
            Self::Hours => HOUR_MS,
            Self::Days => DAY_MS,
        }
    }

    /// Stable storage/wire string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        }
    }

    /// Parses a storage/wire string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "minutes" => Some(Self::Minutes),
            "hours" => Some(Self::Hours),
            "days" => Some(Self::Days),
            _ => None,
        }
    }

    fn from_suffix(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().chars().next()? {
            'm' => Some(Self::Minutes),
            'h' => Some(Self::Hours),
            'd' => Some(Self::Days),
            _ => None,
        }
    }
}

/// Literal wall-clock time-of-day that supersedes the relative offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ManualTime {
    pub hour: u32,
    pub minute: u32,
}

impl ManualTime {
    /// Creates a validated manual time.
    ///
    /// # Errors
    /// - `ManualHourOutOfRange` when `hour > 23`.
    /// - `ManualMinuteOutOfRange` when `minute > 59`.
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        let value = Self { hour, minute };
        value.validate()?;
        Ok(value)
    }

    /// Parses form-style hour/minute inputs.
    ///
    /// An empty component means "no manual override" and yields `Ok(None)`.
    /// Both components must be supplied for the override to apply.
    pub fn parse(hours: &str, minutes: &str) -> Result<Option<Self>, ValidationError> {
        let hours = hours.trim();
        let minutes = minutes.trim();
        if hours.is_empty() || minutes.is_empty() {
            return Ok(None);
        }

        let hour = hours
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidManualComponent(hours.to_string()))?;
        let minute = minutes
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidManualComponent(minutes.to_string()))?;
        Self::new(hour, minute).map(Some)
    }

    /// Returns whether both components are inside their wall-clock ranges.
    pub fn is_valid(&self) -> bool {
        self.hour <= 23 && self.minute <= 59
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.hour > 23 {
            return Err(ValidationError::ManualHourOutOfRange(self.hour));
        }
        if self.minute > 59 {
            return Err(ValidationError::ManualMinuteOutOfRange(self.minute));
        }
        Ok(())
    }
}

impl Display for ManualTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Input to the reminder calculator.
///
/// `value` is ignored for `ReminderMode::OnTime`. An absent or zero `value`
/// on a relative mode means "no reminder".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReminderConfig {
    pub mode: ReminderMode,
    pub value: Option<u32>,
    pub unit: ReminderUnit,
    pub manual_time: Option<ManualTime>,
}

impl Default for ReminderConfig {
    /// Form default: 15 minutes before the event.
    fn default() -> Self {
        Self::before(15, ReminderUnit::Minutes)
    }
}

impl ReminderConfig {
    pub fn before(value: u32, unit: ReminderUnit) -> Self {
        Self {
            mode: ReminderMode::Before,
            value: Some(value),
            unit,
            manual_time: None,
        }
    }

    pub fn after(value: u32, unit: ReminderUnit) -> Self {
        Self {
            mode: ReminderMode::After,
            value: Some(value),
            unit,
            manual_time: None,
        }
    }

    pub fn on_time() -> Self {
        Self {
            mode: ReminderMode::OnTime,
            value: None,
            unit: ReminderUnit::Minutes,
            manual_time: None,
        }
    }

    /// Returns a copy with the manual override set.
    pub fn with_manual_time(mut self, manual_time: ManualTime) -> Self {
        self.manual_time = Some(manual_time);
        self
    }

    /// Rejects configurations that must never reach the calculator.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.manual_time {
            Some(manual) => manual.validate(),
            None => Ok(()),
        }
    }
}

impl Display for ReminderConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(manual) = self.manual_time {
            return write!(f, "at {manual}");
        }
        match (self.mode, self.value) {
            (ReminderMode::OnTime, _) => write!(f, "on-time"),
            (_, None) | (_, Some(0)) => write!(f, "none"),
            (mode, Some(value)) => write!(f, "{} {value} {}", mode.as_str(), self.unit.as_str()),
        }
    }
}

impl FromStr for ReminderConfig {
    type Err = ValidationError;

    /// Parses compact reminder text.
    ///
    /// Accepted forms: `15m`, `before 2h`, `after 1 day`, `on-time`,
    /// `at 08:30`, `none`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "on-time" | "ontime" | "on time" => return Ok(Self::on_time()),
            "none" | "off" => {
                return Ok(Self {
                    value: None,
                    ..Self::default()
                })
            }
            _ => {}
        }

        if let Some(caps) = MANUAL_TEXT_RE.captures(trimmed) {
            let manual = ManualTime::parse(&caps[1], &caps[2])?
                .ok_or_else(|| ValidationError::InvalidReminderText(trimmed.to_string()))?;
            return Ok(Self::on_time().with_manual_time(manual));
        }

        let caps = RELATIVE_TEXT_RE
            .captures(trimmed)
            .ok_or_else(|| ValidationError::InvalidReminderText(trimmed.to_string()))?;
        let mode = match caps.get(1).map(|m| m.as_str().to_ascii_lowercase()) {
            Some(word) if word == "after" => ReminderMode::After,
            _ => ReminderMode::Before,
        };
        let value = caps[2]
            .parse::<u32>()
            .map_err(|_| ValidationError::InvalidReminderText(trimmed.to_string()))?;
        let unit = ReminderUnit::from_suffix(&caps[3])
            .ok_or_else(|| ValidationError::InvalidReminderText(trimmed.to_string()))?;

        Ok(Self {
            mode,
            value: Some(value),
            unit,
            manual_time: None,
        })
    }
}

/// Reminder input rejected before calculation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    ManualHourOutOfRange(u32),
    ManualMinuteOutOfRange(u32),
    /// Manual hour/minute component is not a number.
    InvalidManualComponent(String),
    /// Compact reminder text could not be parsed.
    InvalidReminderText(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ManualHourOutOfRange(hour) => {
                write!(f, "manual reminder hour must be within 0..=23, got {hour}")
            }
            Self::ManualMinuteOutOfRange(minute) => {
                write!(f, "manual reminder minute must be within 0..=59, got {minute}")
            }
            Self::InvalidManualComponent(value) => {
                write!(f, "manual reminder component is not a number: `{value}`")
            }
            Self::InvalidReminderText(value) => write!(f, "invalid reminder text: `{value}`"),
        }
    }
}

impl Error for ValidationError {}

#[cfg(test)]
mod tests {
    use super::{ManualTime, ReminderConfig, ReminderMode, ReminderUnit, ValidationError};

    #[test]
    fn manual_time_parse_treats_empty_component_as_absent() {
        assert_eq!(ManualTime::parse("", "30").unwrap(), None);
        assert_eq!(ManualTime::parse("08", " ").unwrap(), None);
        assert_eq!(
            ManualTime::parse("08", "30").unwrap(),
            Some(ManualTime { hour: 8, minute: 30 })
        );
    }

    #[test]
    fn manual_time_rejects_out_of_range_components() {
        assert_eq!(
            ManualTime::parse("24", "00").unwrap_err(),
            ValidationError::ManualHourOutOfRange(24)
        );
        assert_eq!(
            ManualTime::new(7, 60).unwrap_err(),
            ValidationError::ManualMinuteOutOfRange(60)
        );
        assert!(matches!(
            ManualTime::parse("ab", "10").unwrap_err(),
            ValidationError::InvalidManualComponent(_)
        ));
    }

    #[test]
    fn compact_text_parses_relative_forms() {
        let parsed: ReminderConfig = "15m".parse().unwrap();
        assert_eq!(parsed, ReminderConfig::before(15, ReminderUnit::Minutes));

        let parsed: ReminderConfig = "after 2 hours".parse().unwrap();
        assert_eq!(parsed, ReminderConfig::after(2, ReminderUnit::Hours));

        let parsed: ReminderConfig = "Before 1d".parse().unwrap();
        assert_eq!(parsed, ReminderConfig::before(1, ReminderUnit::Days));
    }

    #[test]
    fn compact_text_parses_on_time_manual_and_none() {
        let on_time: ReminderConfig = "on-time".parse().unwrap();
        assert_eq!(on_time.mode, ReminderMode::OnTime);

        let manual: ReminderConfig = "at 8:30".parse().unwrap();
        assert_eq!(manual.manual_time, Some(ManualTime { hour: 8, minute: 30 }));

        let none: ReminderConfig = "none".parse().unwrap();
        assert_eq!(none.value, None);
    }

    #[test]
    fn compact_text_rejects_garbage_and_invalid_manual_time() {
        assert!(matches!(
            "soonish".parse::<ReminderConfig>().unwrap_err(),
            ValidationError::InvalidReminderText(_)
        ));
        assert_eq!(
            "at 25:00".parse::<ReminderConfig>().unwrap_err(),
            ValidationError::ManualHourOutOfRange(25)
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        for config in [
            ReminderConfig::before(15, ReminderUnit::Minutes),
            ReminderConfig::after(3, ReminderUnit::Days),
            ReminderConfig::on_time(),
        ] {
            let parsed: ReminderConfig = config.to_string().parse().unwrap();
            assert_eq!(parsed, config);
        }
    }

    #[test]
    fn serialized_shape_uses_stable_names() {
        let config = ReminderConfig::on_time().with_manual_time(ManualTime::new(8, 30).unwrap());
        assert_eq!(
            serde_json::to_value(config).unwrap(),
            serde_json::json!({
                "mode": "on-time",
                "value": null,
                "unit": "minutes",
                "manual_time": { "hour": 8, "minute": 30 }
            })
        );

        let parsed: ReminderConfig = serde_json::from_str(
            r#"{"mode":"after","value":2,"unit":"hours","manual_time":null}"#,
        )
        .unwrap();
        assert_eq!(parsed, ReminderConfig::after(2, ReminderUnit::Hours));
    }
}
