//! Async driver for the notification scheduler.

pub mod reminder_loop;

pub use reminder_loop::{ReminderHandle, ReminderLoop};
