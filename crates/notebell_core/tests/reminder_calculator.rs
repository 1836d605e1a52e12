use chrono::{TimeZone, Utc};
use notebell_core::{
    compute_reminder_time, EpochMs, ManualTime, ReminderCalculator, ReminderConfig, ReminderUnit,
};

fn utc_ms(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> EpochMs {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .unwrap()
        .timestamp_millis()
}

#[test]
fn fifteen_minutes_before_nine_is_quarter_to_nine() {
    let start = utc_ms(2024, 3, 10, 9, 0);
    let config = ReminderConfig::before(15, ReminderUnit::Minutes);

    assert_eq!(
        compute_reminder_time(start, &config),
        Some(utc_ms(2024, 3, 10, 8, 45))
    );
}

#[test]
fn manual_time_lands_on_event_calendar_date() {
    let start = utc_ms(2024, 3, 10, 9, 0);
    let config = ReminderConfig::before(15, ReminderUnit::Minutes)
        .with_manual_time(ManualTime::new(8, 30).unwrap());

    assert_eq!(
        compute_reminder_time(start, &config),
        Some(utc_ms(2024, 3, 10, 8, 30))
    );
}

#[test]
fn manual_time_wins_even_for_on_time_mode() {
    let start = utc_ms(2024, 3, 10, 9, 0);
    let config = ReminderConfig::on_time().with_manual_time(ManualTime::new(7, 5).unwrap());

    assert_eq!(
        compute_reminder_time(start, &config),
        Some(utc_ms(2024, 3, 10, 7, 5))
    );
}

#[test]
fn on_time_is_the_start_instant() {
    let start = utc_ms(2025, 1, 1, 0, 0);
    assert_eq!(
        compute_reminder_time(start, &ReminderConfig::on_time()),
        Some(start)
    );
}

#[test]
fn before_and_after_are_symmetric_for_every_unit() {
    let start = utc_ms(2024, 6, 15, 12, 0);
    for unit in [ReminderUnit::Minutes, ReminderUnit::Hours, ReminderUnit::Days] {
        for value in [1u32, 2, 15, 90] {
            let before = compute_reminder_time(start, &ReminderConfig::before(value, unit)).unwrap();
            let after = compute_reminder_time(start, &ReminderConfig::after(value, unit)).unwrap();
            assert_eq!(start - before, after - start, "unit={unit:?} value={value}");
            assert_eq!(start - before, i64::from(value) * unit.as_millis());
        }
    }
}

#[test]
fn missing_or_zero_value_means_no_reminder() {
    let start = utc_ms(2024, 3, 10, 9, 0);
    let zero = ReminderConfig::before(0, ReminderUnit::Hours);
    let absent = ReminderConfig {
        value: None,
        ..ReminderConfig::after(3, ReminderUnit::Days)
    };

    assert_eq!(compute_reminder_time(start, &zero), None);
    assert_eq!(compute_reminder_time(start, &absent), None);
}

#[test]
fn computation_is_deterministic() {
    let calculator = ReminderCalculator::new(chrono_tz::Asia::Tokyo);
    let start = utc_ms(2024, 11, 3, 23, 30);
    let configs = [
        ReminderConfig::default(),
        ReminderConfig::after(2, ReminderUnit::Days),
        ReminderConfig::on_time().with_manual_time(ManualTime::new(6, 0).unwrap()),
    ];
    for config in configs {
        assert_eq!(
            calculator.compute(start, &config),
            calculator.compute(start, &config)
        );
    }
}

#[test]
fn manual_time_uses_the_calculator_time_zone_date() {
    // 2024-03-10T23:30Z is already 2024-03-11 in Tokyo.
    let calculator = ReminderCalculator::new(chrono_tz::Asia::Tokyo);
    let start = utc_ms(2024, 3, 10, 23, 30);
    let config = ReminderConfig::on_time().with_manual_time(ManualTime::new(9, 0).unwrap());

    // 2024-03-11 09:00 JST == 2024-03-11 00:00Z
    assert_eq!(
        calculator.compute(start, &config),
        Some(utc_ms(2024, 3, 11, 0, 0))
    );
}

#[test]
fn inferred_config_reproduces_the_stored_instant() {
    let calculator = ReminderCalculator::utc();
    let start = utc_ms(2024, 3, 10, 9, 0);
    let stored = utc_ms(2024, 3, 9, 9, 0);

    let inferred = calculator.infer_config(start, stored);
    assert_eq!(inferred.value, Some(1));
    assert_eq!(inferred.unit, ReminderUnit::Days);
    assert_eq!(calculator.compute(start, &inferred), Some(stored));
}

#[test]
fn compact_text_round_trips_through_display() {
    for text in ["before 15 minutes", "after 2 hours", "on-time", "at 08:30"] {
        let config: ReminderConfig = text.parse().unwrap();
        assert_eq!(config.to_string(), text);
    }
    assert!("whenever".parse::<ReminderConfig>().is_err());
    assert!("at 25:00".parse::<ReminderConfig>().is_err());
}
