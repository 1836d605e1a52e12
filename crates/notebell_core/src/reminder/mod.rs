//! Reminder-time resolution.

pub mod calculator;

pub use calculator::{compute_reminder_time, ReminderCalculator};
