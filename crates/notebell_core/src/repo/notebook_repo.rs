//! Notebook repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Load and save the full notebook state (events, tags, notes).
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `save_notebook` replaces every row in one immediate transaction; a
//!   failed save leaves the previous state intact.
//! - Collection order survives a round trip via the `position` columns.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::{applied_version, latest_version};
use crate::db::DbError;
use crate::model::event::Event;
use crate::model::note::Note;
use crate::model::reminder::{ManualTime, ReminderConfig, ReminderMode, ReminderUnit};
use crate::model::tag::{Tag, TagId};
use crate::store::StoredNotebook;
use log::info;
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

const EVENT_SELECT_SQL: &str = "SELECT
    id,
    title,
    description,
    start_time,
    end_time,
    is_all_day,
    reminder_time,
    note_id,
    color,
    tag_id,
    custom_sound_url,
    reminder_mode,
    reminder_value,
    reminder_unit,
    manual_hour,
    manual_minute
FROM events
ORDER BY position ASC;";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for notebook persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    InvalidData(String),
    /// Connection has not been migrated to the schema this build expects.
    UninitializedConnection {
        actual_version: u32,
        expected_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted notebook data: {message}"),
            Self::UninitializedConnection {
                actual_version,
                expected_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Persistence contract for the full notebook state.
pub trait NotebookRepository {
    /// Reads every event, tag and note in stored order.
    fn load_notebook(&self) -> RepoResult<StoredNotebook>;
    /// Replaces the persisted state with `notebook`.
    fn save_notebook(&mut self, notebook: &StoredNotebook) -> RepoResult<()>;
}

/// SQLite-backed notebook repository.
pub struct SqliteNotebookRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteNotebookRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is not current.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        let actual_version = applied_version(conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                actual_version,
                expected_version,
            });
        }
        Ok(Self { conn })
    }
}

impl NotebookRepository for SqliteNotebookRepository<'_> {
    fn load_notebook(&self) -> RepoResult<StoredNotebook> {
        let started_at = Instant::now();

        let tags = load_tags(self.conn)?;
        let notes = load_notes(self.conn)?;
        let mut stmt = self.conn.prepare(EVENT_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut events = Vec::new();
        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }

        info!(
            "event=notebook_load module=repo status=ok events={} tags={} notes={} duration_ms={}",
            events.len(),
            tags.len(),
            notes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(StoredNotebook {
            events,
            tags,
            notes,
        })
    }

    fn save_notebook(&mut self, notebook: &StoredNotebook) -> RepoResult<()> {
        let started_at = Instant::now();
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute_batch(
            "DELETE FROM note_tags;
             DELETE FROM notes;
             DELETE FROM tags;
             DELETE FROM events;",
        )?;
        insert_tags(&tx, &notebook.tags)?;
        insert_notes(&tx, &notebook.notes)?;
        insert_events(&tx, &notebook.events)?;
        tx.commit()?;

        info!(
            "event=notebook_save module=repo status=ok events={} tags={} notes={} duration_ms={}",
            notebook.events.len(),
            notebook.tags.len(),
            notebook.notes.len(),
            started_at.elapsed().as_millis()
        );
        Ok(())
    }
}

fn load_tags(conn: &Connection) -> RepoResult<Vec<Tag>> {
    let mut stmt = conn.prepare("SELECT id, name, color FROM tags ORDER BY position ASC;")?;
    let mut rows = stmt.query([])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        tags.push(Tag {
            id: parse_uuid(row.get("id")?, "tags.id")?,
            name: row.get("name")?,
            color: row.get("color")?,
        });
    }
    Ok(tags)
}

fn load_notes(conn: &Connection) -> RepoResult<Vec<Note>> {
    let mut tags_by_note: HashMap<Uuid, Vec<TagId>> = HashMap::new();
    {
        let mut stmt =
            conn.prepare("SELECT note_id, tag_id FROM note_tags ORDER BY note_id, position ASC;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let note_id = parse_uuid(row.get("note_id")?, "note_tags.note_id")?;
            let tag_id = parse_uuid(row.get("tag_id")?, "note_tags.tag_id")?;
            tags_by_note.entry(note_id).or_default().push(tag_id);
        }
    }

    let mut stmt = conn.prepare(
        "SELECT
            id,
            title,
            content,
            created_at,
            updated_at,
            is_starred,
            is_archived,
            is_deleted
         FROM notes
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut notes = Vec::new();
    while let Some(row) = rows.next()? {
        let id = parse_uuid(row.get("id")?, "notes.id")?;
        notes.push(Note {
            id,
            title: row.get("title")?,
            content: row.get("content")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            tags: tags_by_note.remove(&id).unwrap_or_default(),
            is_starred: int_to_bool(row.get("is_starred")?, "notes.is_starred")?,
            is_archived: int_to_bool(row.get("is_archived")?, "notes.is_archived")?,
            is_deleted: int_to_bool(row.get("is_deleted")?, "notes.is_deleted")?,
        });
    }
    Ok(notes)
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    Ok(Event {
        id: parse_uuid(row.get("id")?, "events.id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        start_time: row.get("start_time")?,
        end_time: row.get("end_time")?,
        is_all_day: int_to_bool(row.get("is_all_day")?, "events.is_all_day")?,
        reminder: parse_reminder_config(row)?,
        reminder_time: row.get("reminder_time")?,
        note_id: parse_optional_uuid(row.get("note_id")?, "events.note_id")?,
        color: row.get("color")?,
        tag_id: parse_optional_uuid(row.get("tag_id")?, "events.tag_id")?,
        custom_sound_url: row.get("custom_sound_url")?,
    })
}

fn parse_reminder_config(row: &Row<'_>) -> RepoResult<Option<ReminderConfig>> {
    let Some(mode_text) = row.get::<_, Option<String>>("reminder_mode")? else {
        return Ok(None);
    };
    let mode = ReminderMode::parse(&mode_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid reminder mode `{mode_text}` in events.reminder_mode"
        ))
    })?;

    let unit_text: Option<String> = row.get("reminder_unit")?;
    let unit = match unit_text {
        Some(text) => ReminderUnit::parse(&text).ok_or_else(|| {
            RepoError::InvalidData(format!(
                "invalid reminder unit `{text}` in events.reminder_unit"
            ))
        })?,
        None => ReminderUnit::Minutes,
    };

    let manual_time = match (
        row.get::<_, Option<u32>>("manual_hour")?,
        row.get::<_, Option<u32>>("manual_minute")?,
    ) {
        (Some(hour), Some(minute)) => Some(ManualTime::new(hour, minute).map_err(|err| {
            RepoError::InvalidData(format!("invalid manual reminder time in events: {err}"))
        })?),
        (None, None) => None,
        _ => {
            return Err(RepoError::InvalidData(
                "events.manual_hour and events.manual_minute must be set together".to_string(),
            ))
        }
    };

    Ok(Some(ReminderConfig {
        mode,
        value: row.get("reminder_value")?,
        unit,
        manual_time,
    }))
}

fn insert_tags(tx: &Transaction<'_>, tags: &[Tag]) -> RepoResult<()> {
    let mut stmt =
        tx.prepare("INSERT INTO tags (id, position, name, color) VALUES (?1, ?2, ?3, ?4);")?;
    for (position, tag) in tags.iter().enumerate() {
        stmt.execute(params![
            tag.id.to_string(),
            position as i64,
            tag.name,
            tag.color
        ])?;
    }
    Ok(())
}

fn insert_notes(tx: &Transaction<'_>, notes: &[Note]) -> RepoResult<()> {
    let mut note_stmt = tx.prepare(
        "INSERT INTO notes (
            id, position, title, content, created_at, updated_at,
            is_starred, is_archived, is_deleted
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
    )?;
    let mut link_stmt = tx.prepare(
        "INSERT OR IGNORE INTO note_tags (note_id, tag_id, position) VALUES (?1, ?2, ?3);",
    )?;

    for (position, note) in notes.iter().enumerate() {
        let note_id = note.id.to_string();
        note_stmt.execute(params![
            note_id,
            position as i64,
            note.title,
            note.content,
            note.created_at,
            note.updated_at,
            bool_to_int(note.is_starred),
            bool_to_int(note.is_archived),
            bool_to_int(note.is_deleted),
        ])?;
        for (tag_position, tag_id) in note.tags.iter().enumerate() {
            link_stmt.execute(params![note_id, tag_id.to_string(), tag_position as i64])?;
        }
    }
    Ok(())
}

fn insert_events(tx: &Transaction<'_>, events: &[Event]) -> RepoResult<()> {
    let mut stmt = tx.prepare(
        "INSERT INTO events (
            id, position, title, description, start_time, end_time, is_all_day,
            reminder_time, note_id, color, tag_id, custom_sound_url,
            reminder_mode, reminder_value, reminder_unit, manual_hour, manual_minute
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17);",
    )?;

    for (position, event) in events.iter().enumerate() {
        let reminder = event.reminder.as_ref();
        let manual_time = reminder.and_then(|config| config.manual_time);
        stmt.execute(params![
            event.id.to_string(),
            position as i64,
            event.title,
            event.description,
            event.start_time,
            event.end_time,
            bool_to_int(event.is_all_day),
            event.reminder_time,
            event.note_id.map(|id| id.to_string()),
            event.color,
            event.tag_id.map(|id| id.to_string()),
            event.custom_sound_url,
            reminder.map(|config| config.mode.as_str()),
            reminder.and_then(|config| config.value),
            reminder.map(|config| config.unit.as_str()),
            manual_time.map(|time| time.hour),
            manual_time.map(|time| time.minute),
        ])?;
    }
    Ok(())
}

fn parse_uuid(text: String, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {column}")))
}

fn parse_optional_uuid(text: Option<String>, column: &str) -> RepoResult<Option<Uuid>> {
    text.map(|value| parse_uuid(value, column)).transpose()
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn int_to_bool(value: i64, column: &str) -> RepoResult<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RepoError::InvalidData(format!(
            "invalid boolean value `{other}` in {column}"
        ))),
    }
}
