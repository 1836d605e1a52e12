//! Single-threaded timer driver.
//!
//! # Responsibility
//! - Sleep until the earliest armed deadline and fire due reminders.
//! - Re-evaluate the deadline whenever a mutation goes through a handle.
//!
//! # Invariants
//! - One wake primitive (`Notify`) plus one sleep future per iteration,
//!   regardless of how many timers are armed.
//! - Runs on a current-thread runtime; the service is never touched from
//!   two places at once.
//! - Visual/audio collaborators must not call back into a handle while a
//!   dispatch is running.

use crate::service::ReminderService;
use log::{debug, info};
use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::Notify;

/// Drives a `ReminderService` on the current task.
pub struct ReminderLoop {
    service: Rc<RefCell<ReminderService>>,
    wake: Rc<Notify>,
}

/// Cloneable access to the service that wakes the loop after mutations.
#[derive(Clone)]
pub struct ReminderHandle {
    service: Rc<RefCell<ReminderService>>,
    wake: Rc<Notify>,
}

impl ReminderLoop {
    pub fn new(service: ReminderService) -> Self {
        Self {
            service: Rc::new(RefCell::new(service)),
            wake: Rc::new(Notify::new()),
        }
    }

    pub fn handle(&self) -> ReminderHandle {
        ReminderHandle {
            service: self.service.clone(),
            wake: self.wake.clone(),
        }
    }

    /// Runs until `shutdown` resolves. Starts the service if needed and
    /// stops it on exit.
    pub async fn run_until<F: Future<Output = ()>>(&self, shutdown: F) {
        {
            let mut service = self.service.borrow_mut();
            if !service.scheduler().is_running() && !service.start() {
                return;
            }
        }
        info!("event=loop_start module=runtime status=ok");
        tokio::pin!(shutdown);

        let mut fired_total = 0usize;
        loop {
            let delay = {
                let mut service = self.service.borrow_mut();
                fired_total += service.fire_due();
                let now = service.now_ms();
                service
                    .next_deadline()
                    .map(|deadline| Duration::from_millis(deadline.saturating_sub(now).max(0) as u64))
            };
            debug!(
                "event=loop_wait module=runtime status=ok sleep_ms={}",
                delay.map_or(-1, |delay| delay.as_millis() as i64)
            );

            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.wake.notified() => {}
                _ = sleep_or_park(delay) => {}
            }
        }

        self.service.borrow_mut().stop();
        info!(
            "event=loop_stop module=runtime status=ok fired={}",
            fired_total
        );
    }

    /// Gives the service back after the loop is done.
    ///
    /// Returns `None` while handles are still alive.
    pub fn into_service(self) -> Option<ReminderService> {
        Rc::try_unwrap(self.service)
            .ok()
            .map(RefCell::into_inner)
    }
}

impl ReminderHandle {
    /// Mutates the service and wakes the loop to pick up a new deadline.
    pub fn update<T>(&self, apply: impl FnOnce(&mut ReminderService) -> T) -> T {
        let output = apply(&mut self.service.borrow_mut());
        self.wake.notify_one();
        output
    }

    /// Reads the service without waking the loop.
    pub fn read<T>(&self, inspect: impl FnOnce(&ReminderService) -> T) -> T {
        inspect(&self.service.borrow())
    }
}

async fn sleep_or_park(delay: Option<Duration>) {
    match delay {
        Some(delay) => tokio::time::sleep(delay).await,
        None => std::future::pending::<()>().await,
    }
}
