//! Domain model for events, reminders, tags and notes.
//!
//! # Responsibility
//! - Define canonical data structures used by store, scheduler and storage.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Events are hard-deleted; notes go through a trash tombstone first.

pub mod event;
pub mod note;
pub mod reminder;
pub mod tag;
