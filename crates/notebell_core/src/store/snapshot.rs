//! Read-only views handed from the event store to its observers.

use crate::model::event::{Event, EventId};
use crate::model::note::Note;
use crate::model::reminder::EpochMs;
use crate::model::tag::Tag;
use serde::{Deserialize, Serialize};

/// Reminder-relevant projection of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderEntry {
    pub event_id: EventId,
    pub title: String,
    pub reminder_time: Option<EpochMs>,
    pub custom_sound_url: Option<String>,
}

impl From<&Event> for ReminderEntry {
    fn from(event: &Event) -> Self {
        Self {
            event_id: event.id,
            title: event.title.clone(),
            reminder_time: event.reminder_time,
            custom_sound_url: event.custom_sound_url.clone(),
        }
    }
}

/// Complete reminder view of the event collection at one store revision.
///
/// The scheduler always reconciles against a full snapshot; there are no
/// partial updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSnapshot {
    /// Store revision this snapshot was taken at.
    pub revision: u64,
    pub entries: Vec<ReminderEntry>,
}

impl ReminderSnapshot {
    pub fn new(revision: u64, entries: Vec<ReminderEntry>) -> Self {
        Self { revision, entries }
    }

    pub fn from_events<'a>(revision: u64, events: impl IntoIterator<Item = &'a Event>) -> Self {
        Self::new(revision, events.into_iter().map(ReminderEntry::from).collect())
    }
}

/// Full persisted state of the notebook (events, tags, notes).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredNotebook {
    pub events: Vec<Event>,
    pub tags: Vec<Tag>,
    pub notes: Vec<Note>,
}
