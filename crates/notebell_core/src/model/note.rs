//! Note model.
//!
//! # Invariants
//! - `is_deleted` is a trash tombstone; permanent removal only happens from
//!   trash.
//! - `tags` holds tag ids; deleting a tag removes it from every note.

use crate::model::reminder::EpochMs;
use crate::model::tag::TagId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for notes.
pub type NoteId = Uuid;

pub const DEFAULT_NOTE_TITLE: &str = "New Note";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    pub created_at: EpochMs,
    pub updated_at: EpochMs,
    pub tags: Vec<TagId>,
    pub is_starred: bool,
    pub is_archived: bool,
    pub is_deleted: bool,
}

impl Note {
    /// Visible in the regular notes list (not trashed, not archived).
    pub fn is_listed(&self) -> bool {
        !self.is_deleted && !self.is_archived
    }

    /// Case-insensitive match on title or content.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.content.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Vec<TagId>,
    pub is_starred: bool,
    pub is_archived: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<TagId>>,
    pub is_starred: Option<bool>,
    pub is_archived: Option<bool>,
}

/// List projections over the note collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteView {
    /// Not trashed and not archived.
    All,
    Starred,
    Archived,
    Trash,
    /// Listed notes carrying no tag.
    Untagged,
    /// Listed notes carrying the given tag.
    Tag(TagId),
}

impl NoteView {
    pub fn includes(self, note: &Note) -> bool {
        match self {
            Self::All => note.is_listed(),
            Self::Starred => note.is_listed() && note.is_starred,
            Self::Archived => !note.is_deleted && note.is_archived,
            Self::Trash => note.is_deleted,
            Self::Untagged => note.is_listed() && note.tags.is_empty(),
            Self::Tag(tag_id) => note.is_listed() && note.tags.contains(&tag_id),
        }
    }
}
