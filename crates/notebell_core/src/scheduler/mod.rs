//! Timer queue and reconciliation engine.

pub mod notification_scheduler;
pub mod timer_queue;

pub use notification_scheduler::{NotificationScheduler, ReconcileReport, SchedulerState};
pub use timer_queue::{TimerHandle, TimerQueue};
