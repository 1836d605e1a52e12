//! Core domain logic for notebell.
//! Reminder calculation, the event store, the notification scheduler and
//! their persistence live here; front-ends only wire collaborators.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notification;
pub mod reminder;
pub mod repo;
pub mod runtime;
pub mod scheduler;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, NotebellConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::event::{Event, EventDraft, EventId, EventPatch};
pub use model::note::{Note, NoteDraft, NoteId, NotePatch, NoteView};
pub use model::reminder::{
    EpochMs, ManualTime, ReminderConfig, ReminderMode, ReminderUnit, ValidationError,
};
pub use model::tag::{Tag, TagDraft, TagId, TagPatch};
pub use notification::{
    AudioOutcome, AudioPlayer, CommandAudioPlayer, DispatchSettings, NotificationDispatcher,
    PlaybackError, ReminderNotification, VisualAlert,
};
pub use reminder::{compute_reminder_time, ReminderCalculator};
pub use repo::{NotebookRepository, RepoError, RepoResult, SqliteNotebookRepository};
pub use runtime::{ReminderHandle, ReminderLoop};
pub use scheduler::{NotificationScheduler, ReconcileReport, SchedulerState};
pub use service::ReminderService;
pub use store::{
    EventStore, NoteDeletion, ReminderEntry, ReminderReloadPolicy, ReminderSnapshot,
    StoredNotebook,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
