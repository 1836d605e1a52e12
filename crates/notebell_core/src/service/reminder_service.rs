//! Reminder use-case service.
//!
//! # Responsibility
//! - Own the event store, the notification scheduler and the dispatcher as
//!   one explicitly constructed unit.
//! - Reconcile the scheduler synchronously after every store mutation.
//! - Load/save the store through a notebook repository.
//!
//! # Invariants
//! - No mutation reaches the store without a following reconciliation pass.
//! - Reconciliation runs to completion before the mutating call returns.

use crate::clock::Clock;
use crate::model::event::{EventDraft, EventId, EventPatch};
use crate::model::reminder::{EpochMs, ValidationError};
use crate::model::tag::{TagDraft, TagId, TagPatch};
use crate::notification::NotificationDispatcher;
use crate::reminder::ReminderCalculator;
use crate::repo::notebook_repo::{NotebookRepository, RepoResult};
use crate::scheduler::{NotificationScheduler, ReconcileReport};
use crate::store::{EventStore, ReminderReloadPolicy};
use log::info;
use std::sync::Arc;

pub struct ReminderService {
    store: EventStore,
    scheduler: NotificationScheduler,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
}

impl ReminderService {
    /// Wires a service around an existing store. The scheduler starts idle.
    pub fn new(store: EventStore, dispatcher: NotificationDispatcher, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            scheduler: NotificationScheduler::new(),
            dispatcher,
            clock,
        }
    }

    /// Loads persisted state and wires a service around it.
    pub fn load<R: NotebookRepository>(
        repo: &R,
        calculator: ReminderCalculator,
        policy: ReminderReloadPolicy,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> RepoResult<Self> {
        let stored = repo.load_notebook()?;
        let store = EventStore::from_stored(stored, calculator, clock.clone(), policy);
        Ok(Self::new(store, dispatcher, clock))
    }

    /// Persists the full store.
    pub fn save<R: NotebookRepository>(&self, repo: &mut R) -> RepoResult<()> {
        repo.save_notebook(&self.store.to_stored())
    }

    /// Starts the scheduler and arms timers for the current state.
    pub fn start(&mut self) -> bool {
        if !self.scheduler.start() {
            return false;
        }
        let report = self.reconcile();
        info!(
            "event=service_start module=service status=ok armed={} dropped={}",
            report.armed, report.dropped_past_due
        );
        true
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn dispose(&mut self) {
        self.scheduler.dispose();
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    pub fn now_ms(&self) -> EpochMs {
        self.clock.now_ms()
    }

    /// Runs an arbitrary store mutation followed by reconciliation.
    pub fn mutate<T>(&mut self, apply: impl FnOnce(&mut EventStore) -> T) -> T {
        let revision = self.store.revision();
        let output = apply(&mut self.store);
        if self.store.revision() != revision {
            self.reconcile();
        }
        output
    }

    pub fn create_event(&mut self, draft: EventDraft) -> Result<EventId, ValidationError> {
        self.mutate(|store| store.create_event(draft))
    }

    /// Returns `Ok(false)` for an unknown id (no-op).
    pub fn update_event(&mut self, id: EventId, patch: EventPatch) -> Result<bool, ValidationError> {
        self.mutate(|store| store.update_event(id, patch))
    }

    pub fn delete_event(&mut self, id: EventId) -> bool {
        self.mutate(|store| store.delete_event(id))
    }

    pub fn add_tag(&mut self, draft: TagDraft) -> TagId {
        self.mutate(|store| store.add_tag(draft))
    }

    pub fn update_tag(&mut self, id: TagId, patch: TagPatch) -> bool {
        self.mutate(|store| store.update_tag(id, patch))
    }

    /// Deletes a tag, clearing it from events and notes.
    pub fn delete_tag(&mut self, id: TagId) -> bool {
        self.mutate(|store| store.delete_tag(id))
    }

    /// Diffs the scheduler against the current store snapshot.
    pub fn reconcile(&mut self) -> ReconcileReport {
        let snapshot = self.store.snapshot();
        self.scheduler.reconcile(&snapshot, self.clock.now_ms())
    }

    /// Fires every reminder due at the clock's current instant.
    pub fn fire_due(&mut self) -> usize {
        let now = self.clock.now_ms();
        self.scheduler.fire_due(now, &self.dispatcher)
    }

    /// Earliest armed reminder instant.
    pub fn next_deadline(&mut self) -> Option<EpochMs> {
        self.scheduler.next_deadline()
    }
}
