//! Notification scheduling engine.
//!
//! # Responsibility
//! - Keep at most one armed timer per event id.
//! - Reconcile armed timers against full store snapshots.
//! - Hand due reminders to the dispatcher exactly once.
//!
//! # Invariants
//! - Re-reconciling an unchanged reminder instant never re-arms its timer.
//! - Past-due reminders are dropped at reconcile time, never fired later.
//! - Bookkeeping for a fired timer is removed before dispatch runs.
//! - A panicking dispatch is contained to its own timer.
//! - Lifecycle is explicit: nothing is armed before `start` or after
//!   `stop`/`dispose`.

use crate::model::event::EventId;
use crate::model::reminder::EpochMs;
use crate::notification::{NotificationDispatcher, ReminderNotification};
use crate::scheduler::timer_queue::{TimerHandle, TimerQueue};
use crate::store::snapshot::ReminderSnapshot;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

/// Scheduler lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Constructed, not yet started.
    Idle,
    Running,
    /// Stopped; may be started again.
    Stopped,
    /// Terminal.
    Disposed,
}

/// Counters describing one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Timers newly armed (including re-arms after a changed instant).
    pub armed: usize,
    /// Timers cancelled because the event vanished, lost its reminder or
    /// moved to another instant.
    pub cancelled: usize,
    /// Timers left untouched because their instant did not change.
    pub unchanged: usize,
    /// Reminders whose instant was already `<= now`.
    pub dropped_past_due: usize,
}

#[derive(Debug)]
struct ArmedReminder {
    handle: TimerHandle,
    reminder_time: EpochMs,
    title: String,
    custom_sound_url: Option<String>,
}

/// Explicitly owned scheduler instance.
#[derive(Debug)]
pub struct NotificationScheduler {
    queue: TimerQueue,
    armed: HashMap<EventId, ArmedReminder>,
    state: SchedulerState,
}

impl Default for NotificationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationScheduler {
    pub fn new() -> Self {
        Self {
            queue: TimerQueue::new(),
            armed: HashMap::new(),
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SchedulerState::Running
    }

    /// Enables reconciliation. Returns `false` once disposed.
    pub fn start(&mut self) -> bool {
        match self.state {
            SchedulerState::Disposed => {
                warn!("event=scheduler_start module=scheduler status=rejected reason=disposed");
                false
            }
            SchedulerState::Running => true,
            SchedulerState::Idle | SchedulerState::Stopped => {
                self.state = SchedulerState::Running;
                info!("event=scheduler_start module=scheduler status=ok");
                true
            }
        }
    }

    /// Cancels every outstanding timer; the scheduler can be started again.
    pub fn stop(&mut self) {
        if self.state == SchedulerState::Disposed {
            return;
        }
        let cancelled = self.cancel_all();
        self.state = SchedulerState::Stopped;
        info!(
            "event=scheduler_stop module=scheduler status=ok cancelled={}",
            cancelled
        );
    }

    /// Cancels every outstanding timer and makes the scheduler unusable.
    pub fn dispose(&mut self) {
        let cancelled = self.cancel_all();
        self.state = SchedulerState::Disposed;
        info!(
            "event=scheduler_dispose module=scheduler status=ok cancelled={}",
            cancelled
        );
    }

    /// Diffs armed timers against a full snapshot.
    ///
    /// Ignored (empty report) unless the scheduler is running.
    pub fn reconcile(&mut self, snapshot: &ReminderSnapshot, now: EpochMs) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        if !self.is_running() {
            debug!(
                "event=scheduler_reconcile module=scheduler status=skipped reason=not_running revision={}",
                snapshot.revision
            );
            return report;
        }

        let pending: HashMap<EventId, EpochMs> = snapshot
            .entries
            .iter()
            .filter_map(|entry| entry.reminder_time.map(|at| (entry.event_id, at)))
            .collect();

        let stale: Vec<EventId> = self
            .armed
            .keys()
            .filter(|id| !pending.contains_key(*id))
            .copied()
            .collect();
        for id in stale {
            if self.cancel(id) {
                report.cancelled += 1;
            }
        }

        for entry in &snapshot.entries {
            let Some(reminder_time) = entry.reminder_time else {
                continue;
            };

            if let Some(armed) = self.armed.get_mut(&entry.event_id) {
                if armed.reminder_time == reminder_time {
                    if armed.title != entry.title {
                        armed.title.clone_from(&entry.title);
                    }
                    if armed.custom_sound_url != entry.custom_sound_url {
                        armed.custom_sound_url.clone_from(&entry.custom_sound_url);
                    }
                    report.unchanged += 1;
                    continue;
                }
            }

            if self.cancel(entry.event_id) {
                report.cancelled += 1;
            }

            if reminder_time <= now {
                debug!(
                    "event=reminder_drop module=scheduler status=ok reason=past_due event_id={} late_ms={}",
                    entry.event_id,
                    now - reminder_time
                );
                report.dropped_past_due += 1;
                continue;
            }

            let handle = self.queue.arm(reminder_time, entry.event_id);
            self.armed.insert(
                entry.event_id,
                ArmedReminder {
                    handle,
                    reminder_time,
                    title: entry.title.clone(),
                    custom_sound_url: entry.custom_sound_url.clone(),
                },
            );
            report.armed += 1;
        }

        debug!(
            "event=scheduler_reconcile module=scheduler status=ok revision={} armed={} cancelled={} unchanged={} dropped={}",
            snapshot.revision,
            report.armed,
            report.cancelled,
            report.unchanged,
            report.dropped_past_due
        );
        report
    }

    /// Removes every timer due at `now` and returns what must be dispatched.
    ///
    /// Bookkeeping is already cleared when this returns.
    pub fn take_due(&mut self, now: EpochMs) -> Vec<ReminderNotification> {
        std::iter::from_fn(|| self.take_next_due(now)).collect()
    }

    /// Removes the earliest timer due at `now`, if any.
    pub fn take_next_due(&mut self, now: EpochMs) -> Option<ReminderNotification> {
        if !self.is_running() {
            return None;
        }

        while let Some((handle, event_id)) = self.queue.pop_due(now) {
            let matches_handle = self
                .armed
                .get(&event_id)
                .is_some_and(|armed| armed.handle == handle);
            if !matches_handle {
                continue;
            }
            if let Some(armed) = self.armed.remove(&event_id) {
                return Some(ReminderNotification {
                    event_id,
                    title: armed.title,
                    custom_sound_url: armed.custom_sound_url,
                    reminder_time: armed.reminder_time,
                });
            }
        }
        None
    }

    /// Fires every due timer through `dispatcher`; returns the fired count.
    ///
    /// Timers are popped one at a time. A dispatch that panics is logged and
    /// the remaining due timers still fire.
    pub fn fire_due(&mut self, now: EpochMs, dispatcher: &NotificationDispatcher) -> usize {
        let mut fired = 0;
        while let Some(notification) = self.take_next_due(now) {
            fired += 1;
            info!(
                "event=reminder_fire module=scheduler status=ok event_id={} late_ms={}",
                notification.event_id,
                now - notification.reminder_time
            );
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| dispatcher.dispatch(&notification)));
            if outcome.is_err() {
                error!(
                    "event=reminder_dispatch module=scheduler status=error reason=panicked event_id={}",
                    notification.event_id
                );
            }
        }
        fired
    }

    /// Earliest armed deadline.
    pub fn next_deadline(&mut self) -> Option<EpochMs> {
        self.queue.next_deadline()
    }

    pub fn is_armed(&self, event_id: EventId) -> bool {
        self.armed.contains_key(&event_id)
    }

    /// Instant the event's timer is armed for.
    pub fn scheduled_at(&self, event_id: EventId) -> Option<EpochMs> {
        self.armed.get(&event_id).map(|armed| armed.reminder_time)
    }

    pub fn armed_count(&self) -> usize {
        self.armed.len()
    }

    fn cancel(&mut self, event_id: EventId) -> bool {
        match self.armed.remove(&event_id) {
            Some(armed) => {
                self.queue.cancel(armed.handle);
                true
            }
            None => false,
        }
    }

    fn cancel_all(&mut self) -> usize {
        let cancelled = self.armed.len();
        self.armed.clear();
        self.queue.clear();
        cancelled
    }
}
