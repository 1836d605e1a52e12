//! Calendar event model.
//!
//! # Responsibility
//! - Define the canonical event record observed by the notification scheduler.
//! - Define create/patch inputs used by the event store.
//!
//! # Invariants
//! - `id` is stable for the event lifetime and never reused.
//! - `reminder_time` is derived from `start_time` + `reminder`; it is only
//!   written by the event store, never patched directly.
//! - `end_time >= start_time` is expected but not enforced.
//! - `tag_id` and `note_id` are weak references: no ownership.

use crate::model::note::NoteId;
use crate::model::reminder::{EpochMs, ReminderConfig};
use crate::model::tag::TagId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for calendar events.
pub type EventId = Uuid;

pub const DEFAULT_EVENT_TITLE: &str = "New Event";
pub const DEFAULT_EVENT_COLOR: &str = "#3788d8";

/// Canonical event record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub description: String,
    /// Unix epoch milliseconds.
    pub start_time: EpochMs,
    /// Unix epoch milliseconds. Expected to be >= `start_time` when set.
    pub end_time: Option<EpochMs>,
    pub is_all_day: bool,
    /// Configuration `reminder_time` was computed from, if any.
    pub reminder: Option<ReminderConfig>,
    /// Derived reminder instant; `None` means "no reminder".
    pub reminder_time: Option<EpochMs>,
    pub note_id: Option<NoteId>,
    pub color: String,
    pub tag_id: Option<TagId>,
    /// Resource locator handed to the audio capability at dispatch time.
    pub custom_sound_url: Option<String>,
}

impl Event {
    /// Returns whether the event starts inside `[from, to)`.
    pub fn starts_within(&self, from: EpochMs, to: EpochMs) -> bool {
        self.start_time >= from && self.start_time < to
    }
}

/// Create input for `EventStore::create_event`.
///
/// Every field is optional; missing fields fall back to event defaults
/// (`start_time` defaults to the store clock's current instant).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<EpochMs>,
    pub end_time: Option<EpochMs>,
    pub is_all_day: bool,
    pub reminder: Option<ReminderConfig>,
    pub note_id: Option<NoteId>,
    pub color: Option<String>,
    pub tag_id: Option<TagId>,
    pub custom_sound_url: Option<String>,
}

impl EventDraft {
    /// Shorthand for the common "title at instant" draft.
    pub fn new(title: impl Into<String>, start_time: EpochMs) -> Self {
        Self {
            title: Some(title.into()),
            start_time: Some(start_time),
            ..Self::default()
        }
    }

    pub fn with_reminder(mut self, reminder: ReminderConfig) -> Self {
        self.reminder = Some(reminder);
        self
    }
}

/// Partial update for `EventStore::update_event`.
///
/// Outer `None` leaves a field untouched; for nullable fields the inner
/// `None` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<EpochMs>,
    pub end_time: Option<Option<EpochMs>>,
    pub is_all_day: Option<bool>,
    pub reminder: Option<Option<ReminderConfig>>,
    pub note_id: Option<Option<NoteId>>,
    pub color: Option<String>,
    pub tag_id: Option<Option<TagId>>,
    pub custom_sound_url: Option<Option<String>>,
}

impl EventPatch {
    /// Patch moving the event to a new start instant.
    pub fn reschedule(start_time: EpochMs) -> Self {
        Self {
            start_time: Some(start_time),
            ..Self::default()
        }
    }

    /// Patch replacing (or clearing) the reminder configuration.
    pub fn reminder(reminder: Option<ReminderConfig>) -> Self {
        Self {
            reminder: Some(reminder),
            ..Self::default()
        }
    }

    /// Returns whether applying this patch can change `reminder_time`.
    pub fn touches_reminder(&self) -> bool {
        self.start_time.is_some() || self.reminder.is_some()
    }
}
