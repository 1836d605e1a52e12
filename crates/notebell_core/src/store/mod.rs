//! Canonical in-process state and the snapshots observers reconcile against.

pub mod event_store;
pub mod snapshot;

pub use event_store::{EventStore, NoteDeletion, ReminderReloadPolicy};
pub use snapshot::{ReminderEntry, ReminderSnapshot, StoredNotebook};
