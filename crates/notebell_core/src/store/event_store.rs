//! In-process event store.
//!
//! # Responsibility
//! - Own the canonical events, tags and notes collections.
//! - Derive `reminder_time` through the reminder calculator on every change
//!   of start time or reminder config.
//! - Produce a complete `ReminderSnapshot` after every mutation.
//!
//! # Invariants
//! - `Event::reminder_time` is only written here, from
//!   `ReminderCalculator::compute`.
//! - Deleting a tag clears references (`Event::tag_id`, `Note::tags`); it
//!   never deletes events or notes.
//! - Operations addressing unknown ids are no-ops reported as `false`.
//! - `revision` increases by one for every mutation that changed state.

use crate::clock::Clock;
use crate::model::event::{
    Event, EventDraft, EventId, EventPatch, DEFAULT_EVENT_COLOR, DEFAULT_EVENT_TITLE,
};
use crate::model::note::{Note, NoteDraft, NoteId, NotePatch, NoteView, DEFAULT_NOTE_TITLE};
use crate::model::reminder::{EpochMs, ReminderConfig, ValidationError};
use crate::model::tag::{Tag, TagDraft, TagId, TagPatch, DEFAULT_TAG_COLOR, DEFAULT_TAG_NAME};
use crate::reminder::ReminderCalculator;
use crate::store::snapshot::{ReminderSnapshot, StoredNotebook};
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// How stored `reminder_time` values are treated when a store is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderReloadPolicy {
    /// Reuse persisted reminder instants verbatim.
    #[default]
    TrustStored,
    /// Recompute from start time + persisted reminder config. Events without
    /// a persisted config keep their stored instant.
    Recompute,
}

/// Outcome of `EventStore::delete_notes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteDeletion {
    /// No addressed note exists.
    Nothing,
    /// Notes moved to trash.
    Trashed(usize),
    /// Notes that were all in trash and got removed permanently.
    Purged(usize),
}

/// Canonical state holder; single source of truth for the scheduler.
pub struct EventStore {
    calculator: ReminderCalculator,
    clock: Arc<dyn Clock>,
    events: Vec<Event>,
    tags: Vec<Tag>,
    notes: Vec<Note>,
    revision: u64,
}

impl EventStore {
    /// Creates an empty store.
    pub fn new(calculator: ReminderCalculator, clock: Arc<dyn Clock>) -> Self {
        Self {
            calculator,
            clock,
            events: Vec::new(),
            tags: Vec::new(),
            notes: Vec::new(),
            revision: 0,
        }
    }

    /// Rebuilds a store from persisted state.
    pub fn from_stored(
        stored: StoredNotebook,
        calculator: ReminderCalculator,
        clock: Arc<dyn Clock>,
        policy: ReminderReloadPolicy,
    ) -> Self {
        let StoredNotebook {
            mut events,
            tags,
            notes,
        } = stored;

        if policy == ReminderReloadPolicy::Recompute {
            let mut drifted = 0usize;
            for event in &mut events {
                if let Some(config) = event.reminder {
                    let recomputed = calculator.compute(event.start_time, &config);
                    if recomputed != event.reminder_time {
                        drifted += 1;
                        event.reminder_time = recomputed;
                    }
                }
            }
            if drifted > 0 {
                warn!(
                    "event=store_load module=store status=ok reload_policy=recompute drifted={}",
                    drifted
                );
            }
        }

        info!(
            "event=store_load module=store status=ok events={} tags={} notes={}",
            events.len(),
            tags.len(),
            notes.len()
        );

        Self {
            calculator,
            clock,
            events,
            tags,
            notes,
            revision: 1,
        }
    }

    /// Clones the full state for persistence.
    pub fn to_stored(&self) -> StoredNotebook {
        StoredNotebook {
            events: self.events.clone(),
            tags: self.tags.clone(),
            notes: self.notes.clone(),
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn calculator(&self) -> &ReminderCalculator {
        &self.calculator
    }

    /// Full reminder view at the current revision.
    pub fn snapshot(&self) -> ReminderSnapshot {
        ReminderSnapshot::from_events(self.revision, &self.events)
    }

    /// Events, newest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn event(&self, id: EventId) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    /// Creates an event and derives its reminder time.
    ///
    /// # Errors
    /// - `ValidationError` when the draft's reminder config is invalid.
    pub fn create_event(&mut self, draft: EventDraft) -> Result<EventId, ValidationError> {
        if let Some(config) = draft.reminder.as_ref() {
            config.validate()?;
        }

        let start_time = draft.start_time.unwrap_or_else(|| self.clock.now_ms());
        let event = Event {
            id: Uuid::new_v4(),
            title: non_blank_or(draft.title, DEFAULT_EVENT_TITLE),
            description: draft.description.unwrap_or_default(),
            start_time,
            end_time: draft.end_time,
            is_all_day: draft.is_all_day,
            reminder: draft.reminder,
            reminder_time: self.derive_reminder(start_time, draft.reminder.as_ref()),
            note_id: draft.note_id,
            color: non_blank_or(draft.color, DEFAULT_EVENT_COLOR),
            tag_id: draft.tag_id,
            custom_sound_url: draft.custom_sound_url,
        };
        let id = event.id;

        info!(
            "event=event_create module=store status=ok event_id={} has_reminder={}",
            id,
            event.reminder_time.is_some()
        );
        self.events.insert(0, event);
        self.bump();
        Ok(id)
    }

    /// Applies a partial update.
    ///
    /// Returns `Ok(false)` when `id` is unknown; the call is then a no-op.
    ///
    /// # Errors
    /// - `ValidationError` when the patch carries an invalid reminder config.
    pub fn update_event(&mut self, id: EventId, patch: EventPatch) -> Result<bool, ValidationError> {
        if let Some(Some(config)) = patch.reminder.as_ref() {
            config.validate()?;
        }

        let calculator = self.calculator;
        let Some(event) = self.events.iter_mut().find(|event| event.id == id) else {
            warn!(
                "event=event_update module=store status=skipped reason=not_found event_id={}",
                id
            );
            return Ok(false);
        };

        let touches_reminder = patch.touches_reminder();
        // Loaded events may carry an instant without a config.
        if touches_reminder && patch.reminder.is_none() && event.reminder.is_none() {
            event.reminder = event
                .reminder_time
                .map(|at| calculator.infer_config(event.start_time, at));
        }
        if let Some(title) = patch.title {
            event.title = title;
        }
        if let Some(description) = patch.description {
            event.description = description;
        }
        if let Some(start_time) = patch.start_time {
            event.start_time = start_time;
        }
        if let Some(end_time) = patch.end_time {
            event.end_time = end_time;
        }
        if let Some(is_all_day) = patch.is_all_day {
            event.is_all_day = is_all_day;
        }
        if let Some(reminder) = patch.reminder {
            event.reminder = reminder;
        }
        if let Some(note_id) = patch.note_id {
            event.note_id = note_id;
        }
        if let Some(color) = patch.color {
            event.color = color;
        }
        if let Some(tag_id) = patch.tag_id {
            event.tag_id = tag_id;
        }
        if let Some(custom_sound_url) = patch.custom_sound_url {
            event.custom_sound_url = custom_sound_url;
        }
        if touches_reminder {
            event.reminder_time = event
                .reminder
                .as_ref()
                .and_then(|config| calculator.compute(event.start_time, config));
        }

        info!(
            "event=event_update module=store status=ok event_id={} reminder_recomputed={}",
            id, touches_reminder
        );
        self.bump();
        Ok(true)
    }

    /// Hard-deletes an event. Returns `false` when `id` is unknown.
    pub fn delete_event(&mut self, id: EventId) -> bool {
        let before = self.events.len();
        self.events.retain(|event| event.id != id);
        if self.events.len() == before {
            warn!(
                "event=event_delete module=store status=skipped reason=not_found event_id={}",
                id
            );
            return false;
        }

        info!("event=event_delete module=store status=ok event_id={}", id);
        self.bump();
        true
    }

    /// Events starting on a calendar day of the calculator's time zone.
    pub fn events_on_day(&self, date: NaiveDate) -> Vec<&Event> {
        match self.calculator.day_bounds(date) {
            Some((from, to)) => self.events_between(from, to),
            None => Vec::new(),
        }
    }

    /// Events starting inside `[from, to)`, ordered by start time.
    pub fn events_between(&self, from: EpochMs, to: EpochMs) -> Vec<&Event> {
        let mut matched: Vec<&Event> = self
            .events
            .iter()
            .filter(|event| event.starts_within(from, to))
            .collect();
        matched.sort_by_key(|event| (event.start_time, event.id));
        matched
    }

    /// Events whose reminder is still ahead of `now`, soonest first.
    pub fn upcoming_reminders(&self, now: EpochMs) -> Vec<&Event> {
        let mut matched: Vec<&Event> = self
            .events
            .iter()
            .filter(|event| event.reminder_time.is_some_and(|at| at > now))
            .collect();
        matched.sort_by_key(|event| (event.reminder_time, event.id));
        matched
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn tag(&self, id: TagId) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.id == id)
    }

    pub fn add_tag(&mut self, draft: TagDraft) -> TagId {
        let tag = Tag {
            id: Uuid::new_v4(),
            name: non_blank_or(draft.name, DEFAULT_TAG_NAME),
            color: non_blank_or(draft.color, DEFAULT_TAG_COLOR),
        };
        let id = tag.id;
        self.tags.push(tag);
        info!("event=tag_create module=store status=ok tag_id={}", id);
        self.bump();
        id
    }

    /// Returns `false` when `id` is unknown.
    pub fn update_tag(&mut self, id: TagId, patch: TagPatch) -> bool {
        let Some(tag) = self.tags.iter_mut().find(|tag| tag.id == id) else {
            warn!(
                "event=tag_update module=store status=skipped reason=not_found tag_id={}",
                id
            );
            return false;
        };
        if let Some(name) = patch.name {
            tag.name = name;
        }
        if let Some(color) = patch.color {
            tag.color = color;
        }
        self.bump();
        true
    }

    /// Deletes a tag and clears every reference to it.
    ///
    /// Events keep existing with `tag_id = None`; notes drop the id from
    /// their tag set. Returns whether the tag itself existed.
    pub fn delete_tag(&mut self, id: TagId) -> bool {
        let before = self.tags.len();
        self.tags.retain(|tag| tag.id != id);
        let removed = self.tags.len() != before;

        let mut cleared_events = 0usize;
        for event in self.events.iter_mut().filter(|event| event.tag_id == Some(id)) {
            event.tag_id = None;
            cleared_events += 1;
        }

        let mut cleared_notes = 0usize;
        for note in &mut self.notes {
            let tag_count = note.tags.len();
            note.tags.retain(|tag_id| *tag_id != id);
            if note.tags.len() != tag_count {
                cleared_notes += 1;
            }
        }

        if !removed && cleared_events == 0 && cleared_notes == 0 {
            warn!(
                "event=tag_delete module=store status=skipped reason=not_found tag_id={}",
                id
            );
            return false;
        }

        info!(
            "event=tag_delete module=store status=ok tag_id={} cleared_events={} cleared_notes={}",
            id, cleared_events, cleared_notes
        );
        self.bump();
        removed
    }

    /// Notes, newest first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn note(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Notes included in `view`, optionally filtered by a title/content query.
    pub fn notes_in_view(&self, view: NoteView, query: Option<&str>) -> Vec<&Note> {
        let query = query.map(str::trim).filter(|value| !value.is_empty());
        self.notes
            .iter()
            .filter(|note| view.includes(note))
            .filter(|note| query.map_or(true, |query| note.matches_query(query)))
            .collect()
    }

    pub fn add_note(&mut self, draft: NoteDraft) -> NoteId {
        let now = self.clock.now_ms();
        let note = Note {
            id: Uuid::new_v4(),
            title: non_blank_or(draft.title, DEFAULT_NOTE_TITLE),
            content: draft.content.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            tags: draft.tags,
            is_starred: draft.is_starred,
            is_archived: draft.is_archived,
            is_deleted: false,
        };
        let id = note.id;
        self.notes.insert(0, note);
        info!("event=note_create module=store status=ok note_id={}", id);
        self.bump();
        id
    }

    /// Applies a partial note update and bumps `updated_at`.
    pub fn update_note(&mut self, id: NoteId, patch: NotePatch) -> bool {
        let now = self.clock.now_ms();
        let Some(note) = self.notes.iter_mut().find(|note| note.id == id) else {
            warn!(
                "event=note_update module=store status=skipped reason=not_found note_id={}",
                id
            );
            return false;
        };
        if let Some(title) = patch.title {
            note.title = title;
        }
        if let Some(content) = patch.content {
            note.content = content;
        }
        if let Some(tags) = patch.tags {
            note.tags = tags;
        }
        if let Some(is_starred) = patch.is_starred {
            note.is_starred = is_starred;
        }
        if let Some(is_archived) = patch.is_archived {
            note.is_archived = is_archived;
        }
        note.updated_at = now;
        self.bump();
        true
    }

    /// Moves notes to trash, or purges them when all are already in trash.
    pub fn delete_notes(&mut self, ids: &[NoteId]) -> NoteDeletion {
        let targets: Vec<&Note> = self
            .notes
            .iter()
            .filter(|note| ids.contains(&note.id))
            .collect();
        if targets.is_empty() {
            warn!(
                "event=note_delete module=store status=skipped reason=not_found note_ids={:?}",
                ids
            );
            return NoteDeletion::Nothing;
        }

        let count = targets.len();
        let outcome = if targets.iter().all(|note| note.is_deleted) {
            self.notes.retain(|note| !ids.contains(&note.id));
            NoteDeletion::Purged(count)
        } else {
            for note in self.notes.iter_mut().filter(|note| ids.contains(&note.id)) {
                note.is_deleted = true;
            }
            NoteDeletion::Trashed(count)
        };

        info!(
            "event=note_delete module=store status=ok outcome={:?}",
            outcome
        );
        self.bump();
        outcome
    }

    /// Takes a note out of trash.
    pub fn restore_note(&mut self, id: NoteId) -> bool {
        self.set_note_flag("note_restore", id, |note| note.is_deleted = false)
            .is_some()
    }

    /// Flips the starred flag and returns the new value.
    pub fn toggle_starred(&mut self, id: NoteId) -> Option<bool> {
        self.set_note_flag("note_star", id, |note| note.is_starred = !note.is_starred)
            .map(|note| note.is_starred)
    }

    /// Flips the archived flag and returns the new value.
    pub fn toggle_archived(&mut self, id: NoteId) -> Option<bool> {
        self.set_note_flag("note_archive", id, |note| note.is_archived = !note.is_archived)
            .map(|note| note.is_archived)
    }

    /// Permanently removes every trashed note; returns how many were removed.
    pub fn empty_trash(&mut self) -> usize {
        let before = self.notes.len();
        self.notes.retain(|note| !note.is_deleted);
        let removed = before - self.notes.len();
        if removed > 0 {
            info!(
                "event=trash_empty module=store status=ok removed={}",
                removed
            );
            self.bump();
        }
        removed
    }

    /// Current reminder config for an event, reconstructed for editing when
    /// only the instant is known.
    pub fn editable_reminder(&self, id: EventId) -> Option<ReminderConfig> {
        let event = self.event(id)?;
        event.reminder.or_else(|| {
            event
                .reminder_time
                .map(|at| self.calculator.infer_config(event.start_time, at))
        })
    }

    fn set_note_flag(
        &mut self,
        operation: &str,
        id: NoteId,
        apply: impl FnOnce(&mut Note),
    ) -> Option<&Note> {
        let Some(index) = self.notes.iter().position(|note| note.id == id) else {
            warn!(
                "event={} module=store status=skipped reason=not_found note_id={}",
                operation, id
            );
            return None;
        };
        apply(&mut self.notes[index]);
        self.bump();
        Some(&self.notes[index])
    }

    fn derive_reminder(
        &self,
        start_time: EpochMs,
        config: Option<&ReminderConfig>,
    ) -> Option<EpochMs> {
        config.and_then(|config| self.calculator.compute(start_time, config))
    }

    fn bump(&mut self) {
        self.revision += 1;
        debug!(
            "event=store_revision module=store status=ok revision={}",
            self.revision
        );
    }
}

fn non_blank_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string())
}
