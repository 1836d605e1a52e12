//! Tag (folder) model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for tags.
pub type TagId = Uuid;

pub const DEFAULT_TAG_NAME: &str = "New Folder";
pub const DEFAULT_TAG_COLOR: &str = "#3788d8";

/// Folder-like label attached to notes (many) and events (one).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDraft {
    pub name: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}
