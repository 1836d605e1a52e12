use notebell_core::db::{open_db, open_db_in_memory};
use notebell_core::{
    EventDraft, EventStore, ManualClock, ManualTime, NoteDraft, NotebookRepository,
    NotificationDispatcher, ReminderCalculator, ReminderConfig, ReminderReloadPolicy,
    ReminderService, ReminderUnit, RepoError, SqliteNotebookRepository, StoredNotebook, TagDraft,
    VisualAlert,
};
use rusqlite::Connection;
use std::sync::Arc;

const NOW: i64 = 1_710_061_200_000;
const MINUTE: i64 = 60_000;

struct SilentAlert;

impl VisualAlert for SilentAlert {
    fn show(&self, _title: &str, _description: &str, _duration_ms: u64) {}
}

fn populated_store() -> EventStore {
    let clock = Arc::new(ManualClock::new(NOW));
    let mut store = EventStore::new(ReminderCalculator::utc(), clock);
    let tag = store.add_tag(TagDraft {
        name: Some("Work".to_string()),
        color: Some("#ff0000".to_string()),
    });
    store
        .create_event(EventDraft {
            description: Some("weekly".to_string()),
            end_time: Some(NOW + 90 * MINUTE),
            tag_id: Some(tag),
            custom_sound_url: Some("file:///chime.ogg".to_string()),
            ..EventDraft::new("Planning", NOW + 60 * MINUTE).with_reminder(
                ReminderConfig::after(1, ReminderUnit::Hours)
                    .with_manual_time(ManualTime::new(7, 45).unwrap()),
            )
        })
        .unwrap();
    store
        .create_event(EventDraft::new("No reminder", NOW + 120 * MINUTE))
        .unwrap();
    let note = store.add_note(NoteDraft {
        title: Some("Agenda".to_string()),
        content: Some("- budget".to_string()),
        tags: vec![tag],
        is_starred: true,
        ..NoteDraft::default()
    });
    store.delete_notes(&[note]);
    store
}

#[test]
fn save_then_load_round_trips_the_notebook() {
    let store = populated_store();
    let expected = store.to_stored();

    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    repo.save_notebook(&expected).unwrap();

    assert_eq!(repo.load_notebook().unwrap(), expected);
}

#[test]
fn saving_replaces_previous_rows() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    repo.save_notebook(&populated_store().to_stored()).unwrap();
    repo.save_notebook(&StoredNotebook::default()).unwrap();

    assert_eq!(repo.load_notebook().unwrap(), StoredNotebook::default());
}

#[test]
fn unmigrated_connection_is_rejected() {
    let mut conn = Connection::open_in_memory().unwrap();
    match SqliteNotebookRepository::try_new(&mut conn) {
        Err(RepoError::UninitializedConnection {
            actual_version,
            expected_version,
        }) => {
            assert_eq!(actual_version, 0);
            assert!(expected_version > 0);
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection must be rejected"),
    }
}

#[test]
fn corrupted_uuid_is_reported_as_invalid_data() {
    let mut conn = open_db_in_memory().unwrap();
    conn.execute(
        "INSERT INTO tags (id, position, name, color) VALUES ('not-a-uuid', 0, 'x', '#000');",
        [],
    )
    .unwrap();
    let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();

    assert!(matches!(
        repo.load_notebook(),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn reload_policy_decides_between_stored_and_recomputed_instants() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notebell.db");
    let store = populated_store();
    let id = store.events()[1].id;

    let mut stored = store.to_stored();
    let planning = stored.events.iter_mut().find(|event| event.id == id).unwrap();
    let computed = planning.reminder_time;
    planning.reminder_time = Some(NOW + 5 * MINUTE);
    {
        let mut conn = open_db(&path).unwrap();
        let mut repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
        repo.save_notebook(&stored).unwrap();
    }

    let mut conn = open_db(&path).unwrap();
    let repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    let load = |policy| {
        ReminderService::load(
            &repo,
            ReminderCalculator::utc(),
            policy,
            NotificationDispatcher::visual_only(Arc::new(SilentAlert)),
            Arc::new(ManualClock::new(NOW)),
        )
        .unwrap()
    };

    let trusted = load(ReminderReloadPolicy::TrustStored);
    assert_eq!(
        trusted.store().event(id).unwrap().reminder_time,
        Some(NOW + 5 * MINUTE)
    );

    let recomputed = load(ReminderReloadPolicy::Recompute);
    assert_eq!(recomputed.store().event(id).unwrap().reminder_time, computed);
}

#[test]
fn loaded_service_arms_timers_on_start() {
    let mut conn = open_db_in_memory().unwrap();
    let mut repo = SqliteNotebookRepository::try_new(&mut conn).unwrap();
    let clock = Arc::new(ManualClock::new(NOW));
    let mut store = EventStore::new(ReminderCalculator::utc(), clock.clone());
    let id = store
        .create_event(
            EventDraft::new("Call", NOW + 60 * MINUTE)
                .with_reminder(ReminderConfig::before(15, ReminderUnit::Minutes)),
        )
        .unwrap();
    let service = ReminderService::new(
        store,
        NotificationDispatcher::visual_only(Arc::new(SilentAlert)),
        clock.clone(),
    );
    service.save(&mut repo).unwrap();

    let mut loaded = ReminderService::load(
        &repo,
        ReminderCalculator::utc(),
        ReminderReloadPolicy::default(),
        NotificationDispatcher::visual_only(Arc::new(SilentAlert)),
        clock,
    )
    .unwrap();
    assert!(!loaded.scheduler().is_armed(id));
    assert!(loaded.start());
    assert_eq!(loaded.scheduler().scheduled_at(id), Some(NOW + 45 * MINUTE));
}
