//! Reminder-time resolution.
//!
//! # Responsibility
//! - Map `(event start, reminder config)` to a reminder instant or none.
//! - Reverse-derive an editable config from a stored reminder instant.
//!
//! # Invariants
//! - Pure and deterministic: identical inputs always yield identical output.
//!   Reconciliation relies on this to detect "no change".
//! - Total: never fails and never panics; overflow yields `None`.
//! - A valid manual time wins over mode/value/unit, including `on-time`.

use crate::model::reminder::{
    EpochMs, ManualTime, ReminderConfig, ReminderMode, ReminderUnit,
};
use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Timelike};
use chrono_tz::Tz;

/// Reminder calculator bound to the time zone used for calendar dates.
///
/// The time zone only matters for the manual override (calendar date of the
/// event start) and for `infer_config`; relative offsets are plain
/// millisecond arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderCalculator {
    tz: Tz,
}

impl Default for ReminderCalculator {
    fn default() -> Self {
        Self::utc()
    }
}

impl ReminderCalculator {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn utc() -> Self {
        Self::new(Tz::UTC)
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Computes the reminder instant for an event start.
    ///
    /// Resolution order:
    /// 1. valid manual time -> event start's calendar date at `hh:mm:00.000`;
    /// 2. `on-time` -> event start;
    /// 3. absent/zero value -> `None`;
    /// 4. `before`/`after` -> start -/+ `value * unit`.
    pub fn compute(&self, event_start: EpochMs, config: &ReminderConfig) -> Option<EpochMs> {
        if let Some(manual) = config.manual_time.filter(ManualTime::is_valid) {
            return self.at_time_of_day(event_start, manual);
        }

        let offset = match config.mode {
            ReminderMode::OnTime => return Some(event_start),
            ReminderMode::Before | ReminderMode::After => {
                let magnitude = config.value.filter(|value| *value > 0)?;
                i64::from(magnitude).checked_mul(config.unit.as_millis())?
            }
        };

        match config.mode {
            ReminderMode::Before => event_start.checked_sub(offset),
            _ => event_start.checked_add(offset),
        }
    }

    /// Derives the config an edit form shows for an existing reminder.
    ///
    /// Relative offsets pick the largest unit not exceeding the distance
    /// (days, then hours, then minutes) and round half up. When rounding
    /// loses the instant and the reminder falls on the event's local date,
    /// the manual time is filled from the reminder's local time-of-day.
    pub fn infer_config(&self, event_start: EpochMs, reminder_time: EpochMs) -> ReminderConfig {
        if reminder_time == event_start {
            return ReminderConfig::on_time();
        }

        let diff = i128::from(event_start) - i128::from(reminder_time);
        let mode = if diff > 0 {
            ReminderMode::Before
        } else {
            ReminderMode::After
        };
        let distance = diff.unsigned_abs();
        let unit = [ReminderUnit::Days, ReminderUnit::Hours]
            .into_iter()
            .find(|unit| distance >= unit.as_millis() as u128)
            .unwrap_or(ReminderUnit::Minutes);
        let unit_ms = unit.as_millis() as u128;
        let rounded = (distance + unit_ms / 2) / unit_ms;

        let relative = ReminderConfig {
            mode,
            value: Some(u32::try_from(rounded).unwrap_or(u32::MAX)),
            unit,
            manual_time: None,
        };
        if self.compute(event_start, &relative) == Some(reminder_time) {
            return relative;
        }

        match (self.local(event_start), self.local(reminder_time)) {
            (Some(start), Some(local)) if start.date_naive() == local.date_naive() => {
                relative.with_manual_time(ManualTime {
                    hour: local.hour(),
                    minute: local.minute(),
                })
            }
            _ => relative,
        }
    }

    /// Calendar date of an instant in this calculator's time zone.
    pub fn local_date(&self, at: EpochMs) -> Option<NaiveDate> {
        self.local(at).map(|local| local.date_naive())
    }

    /// `[start, end)` bounds of a calendar day in this time zone.
    pub fn day_bounds(&self, date: NaiveDate) -> Option<(EpochMs, EpochMs)> {
        let start = self.resolve_local(date.and_hms_opt(0, 0, 0)?)?;
        let next = self.resolve_local(date.succ_opt()?.and_hms_opt(0, 0, 0)?)?;
        Some((start, next))
    }

    fn at_time_of_day(&self, event_start: EpochMs, manual: ManualTime) -> Option<EpochMs> {
        let date = self.local(event_start)?.date_naive();
        let naive = date.and_hms_opt(manual.hour, manual.minute, 0)?;
        self.resolve_local(naive)
    }

    fn local(&self, at: EpochMs) -> Option<DateTime<Tz>> {
        self.tz.timestamp_millis_opt(at).single()
    }

    /// Instant of a wall-clock time in this time zone. Ambiguous times take
    /// the earliest instant; times inside a DST gap move forward one hour.
    pub fn resolve_local(&self, naive: NaiveDateTime) -> Option<EpochMs> {
        let resolved = match self.tz.from_local_datetime(&naive) {
            LocalResult::Single(at) => at,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => self
                .tz
                .from_local_datetime(&(naive + TimeDelta::hours(1)))
                .earliest()?,
        };
        Some(resolved.timestamp_millis())
    }
}

/// Computes a reminder instant with UTC calendar dates.
pub fn compute_reminder_time(event_start: EpochMs, config: &ReminderConfig) -> Option<EpochMs> {
    ReminderCalculator::utc().compute(event_start, config)
}

#[cfg(test)]
mod tests {
    use super::ReminderCalculator;
    use crate::model::reminder::{ManualTime, ReminderConfig, ReminderUnit};
    use chrono::{NaiveDate, TimeZone, Utc};
    use chrono_tz::Tz;

    fn ms(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn manual_time_uses_event_date_in_configured_zone() {
        let calc = ReminderCalculator::new(Tz::Asia__Tokyo);
        // 2024-03-10 01:00 JST == 2024-03-09 16:00 UTC.
        let start = ms(2024, 3, 9, 16, 0);
        let config = ReminderConfig::on_time().with_manual_time(ManualTime { hour: 0, minute: 5 });

        // 2024-03-10 00:05 JST == 2024-03-09 15:05 UTC.
        assert_eq!(calc.compute(start, &config), Some(ms(2024, 3, 9, 15, 5)));
    }

    #[test]
    fn manual_time_inside_dst_gap_moves_forward() {
        let calc = ReminderCalculator::new(Tz::America__New_York);
        // 2024-03-10 is the spring-forward day; 02:30 local does not exist.
        let start = ms(2024, 3, 10, 16, 0);
        let config = ReminderConfig::default().with_manual_time(ManualTime { hour: 2, minute: 30 });

        // 03:30 EDT == 07:30 UTC.
        assert_eq!(calc.compute(start, &config), Some(ms(2024, 3, 10, 7, 30)));
    }

    #[test]
    fn out_of_range_manual_time_falls_back_to_relative_offset() {
        let calc = ReminderCalculator::utc();
        let start = ms(2024, 3, 10, 9, 0);
        let config = ReminderConfig::before(15, ReminderUnit::Minutes)
            .with_manual_time(ManualTime { hour: 30, minute: 0 });

        assert_eq!(calc.compute(start, &config), Some(ms(2024, 3, 10, 8, 45)));
    }

    #[test]
    fn overflow_yields_none() {
        let calc = ReminderCalculator::utc();
        let config = ReminderConfig::before(u32::MAX, ReminderUnit::Days);
        assert_eq!(calc.compute(i64::MIN + 1, &config), None);
    }

    #[test]
    fn infer_config_picks_largest_unit() {
        let calc = ReminderCalculator::utc();
        let start = ms(2024, 3, 10, 9, 0);

        let inferred = calc.infer_config(start, ms(2024, 3, 10, 7, 0));
        assert_eq!(inferred.mode, crate::model::reminder::ReminderMode::Before);
        assert_eq!(inferred.unit, ReminderUnit::Hours);
        assert_eq!(inferred.value, Some(2));
        assert_eq!(inferred.manual_time, None);

        let inferred = calc.infer_config(start, ms(2024, 3, 12, 9, 0));
        assert_eq!(inferred.mode, crate::model::reminder::ReminderMode::After);
        assert_eq!(inferred.unit, ReminderUnit::Days);
        assert_eq!(inferred.value, Some(2));

        let inferred = calc.infer_config(start, start);
        assert_eq!(inferred, ReminderConfig::on_time());
    }

    #[test]
    fn infer_config_keeps_inexact_same_day_instant_as_manual_time() {
        let calc = ReminderCalculator::utc();
        let start = ms(2024, 3, 10, 9, 0);
        let reminder = ms(2024, 3, 10, 7, 10);

        let inferred = calc.infer_config(start, reminder);
        assert_eq!(inferred.value, Some(2));
        assert_eq!(inferred.manual_time, Some(ManualTime { hour: 7, minute: 10 }));
        assert_eq!(calc.compute(start, &inferred), Some(reminder));
    }

    #[test]
    fn inferred_config_recomputes_to_same_instant() {
        let calc = ReminderCalculator::new(Tz::Europe__Berlin);
        let start = ms(2024, 6, 1, 12, 0);
        let reminder = ms(2024, 6, 1, 11, 20);

        let inferred = calc.infer_config(start, reminder);
        assert_eq!(calc.compute(start, &inferred), Some(reminder));
    }

    #[test]
    fn day_bounds_cover_local_calendar_day() {
        let calc = ReminderCalculator::new(Tz::Europe__Berlin);
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let (start, end) = calc.day_bounds(date).unwrap();
        assert_eq!(start, ms(2024, 1, 14, 23, 0));
        assert_eq!(end - start, 86_400_000);
    }
}
