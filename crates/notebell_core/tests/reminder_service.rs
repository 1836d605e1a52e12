use notebell_core::{
    AudioPlayer, DispatchSettings, EventDraft, EventPatch, EventStore, ManualClock,
    NotificationDispatcher, PlaybackError, ReminderCalculator, ReminderConfig, ReminderService,
    ReminderUnit, SchedulerState, TagDraft, VisualAlert,
};
use std::cell::{Cell, RefCell};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;

const NOW: i64 = 1_710_061_200_000;
const MINUTE: i64 = 60_000;

#[derive(Default)]
struct Recorder {
    toasts: RefCell<Vec<(String, String, u64)>>,
    sounds: RefCell<Vec<String>>,
    panic_next: Cell<bool>,
}

struct RecorderAlert(Rc<Recorder>);

impl VisualAlert for RecorderAlert {
    fn show(&self, title: &str, description: &str, duration_ms: u64) {
        if self.0.panic_next.replace(false) {
            panic!("toast backend crashed");
        }
        self.0
            .toasts
            .borrow_mut()
            .push((title.to_string(), description.to_string(), duration_ms));
    }
}

struct RecorderAudio(Rc<Recorder>);

impl AudioPlayer for RecorderAudio {
    fn play(&self, url: &str) -> Result<(), PlaybackError> {
        self.0.sounds.borrow_mut().push(url.to_string());
        if url.ends_with(".missing") {
            return Err(PlaybackError::NotFound(url.to_string()));
        }
        Ok(())
    }
}

fn service() -> (ReminderService, Arc<ManualClock>, Rc<Recorder>) {
    let clock = Arc::new(ManualClock::new(NOW));
    let recorder = Rc::new(Recorder::default());
    let dispatcher = NotificationDispatcher::new(
        Arc::new(RecorderAlert(recorder.clone())),
        Some(Arc::new(RecorderAudio(recorder.clone()))),
        DispatchSettings::default(),
    );
    let store = EventStore::new(ReminderCalculator::utc(), clock.clone());
    let mut service = ReminderService::new(store, dispatcher, clock.clone());
    assert!(service.start());
    (service, clock, recorder)
}

fn draft(title: &str, start: i64) -> EventDraft {
    EventDraft::new(title, start).with_reminder(ReminderConfig::before(15, ReminderUnit::Minutes))
}

#[test]
fn mutation_arms_timer_and_firing_shows_toast_once() {
    let (mut service, clock, recorder) = service();
    let id = service.create_event(draft("Standup", NOW + 60 * MINUTE)).unwrap();
    assert_eq!(service.scheduler().scheduled_at(id), Some(NOW + 45 * MINUTE));
    assert_eq!(service.next_deadline(), Some(NOW + 45 * MINUTE));

    clock.set(NOW + 44 * MINUTE);
    assert_eq!(service.fire_due(), 0);

    clock.set(NOW + 45 * MINUTE);
    assert_eq!(service.fire_due(), 1);
    assert_eq!(service.fire_due(), 0);

    assert_eq!(
        *recorder.toasts.borrow(),
        vec![("Reminder".to_string(), "Standup".to_string(), 10_000)]
    );
}

#[test]
fn reschedule_leaves_one_timer_for_the_new_instant() {
    let (mut service, clock, recorder) = service();
    let id = service.create_event(draft("Review", NOW + 60 * MINUTE)).unwrap();

    service
        .update_event(id, EventPatch::reschedule(NOW + 180 * MINUTE))
        .unwrap();
    assert_eq!(service.scheduler().armed_count(), 1);
    assert_eq!(service.scheduler().scheduled_at(id), Some(NOW + 165 * MINUTE));

    clock.set(NOW + 60 * MINUTE);
    assert_eq!(service.fire_due(), 0);
    clock.set(NOW + 165 * MINUTE);
    assert_eq!(service.fire_due(), 1);
    assert_eq!(recorder.toasts.borrow().len(), 1);
}

#[test]
fn events_without_future_reminders_are_not_armed() {
    let (mut service, _, _) = service();
    let past = service.create_event(draft("Past", NOW)).unwrap();
    let silent = service
        .create_event(EventDraft::new("Silent", NOW + 60 * MINUTE))
        .unwrap();

    assert!(!service.scheduler().is_armed(past));
    assert!(!service.scheduler().is_armed(silent));
    assert_eq!(service.next_deadline(), None);
}

#[test]
fn deleting_an_event_cancels_its_timer() {
    let (mut service, clock, recorder) = service();
    let id = service.create_event(draft("Gone", NOW + 60 * MINUTE)).unwrap();

    assert!(service.delete_event(id));
    assert!(!service.delete_event(id));
    clock.set(NOW + 120 * MINUTE);
    assert_eq!(service.fire_due(), 0);
    assert!(recorder.toasts.borrow().is_empty());
}

#[test]
fn tag_changes_do_not_disturb_armed_timers() {
    let (mut service, _, _) = service();
    let tag = service.add_tag(TagDraft::default());
    let id = service
        .create_event(EventDraft {
            tag_id: Some(tag),
            ..draft("Tagged", NOW + 60 * MINUTE)
        })
        .unwrap();

    assert!(service.delete_tag(tag));
    assert_eq!(service.store().event(id).unwrap().tag_id, None);
    assert_eq!(service.scheduler().scheduled_at(id), Some(NOW + 45 * MINUTE));
}

#[test]
fn custom_sound_plays_after_toast_and_failures_are_swallowed() {
    let (mut service, clock, recorder) = service();
    service
        .create_event(EventDraft {
            custom_sound_url: Some("file:///sounds/chime.missing".to_string()),
            ..draft("Broken sound", NOW + 60 * MINUTE)
        })
        .unwrap();
    service
        .create_event(EventDraft {
            custom_sound_url: Some("file:///sounds/chime.ogg".to_string()),
            ..draft("Chime", NOW + 61 * MINUTE)
        })
        .unwrap();

    clock.set(NOW + 46 * MINUTE);
    assert_eq!(service.fire_due(), 2);
    assert_eq!(recorder.toasts.borrow().len(), 2);
    assert_eq!(
        *recorder.sounds.borrow(),
        vec!["file:///sounds/chime.missing", "file:///sounds/chime.ogg"]
    );
}

#[test]
fn panicking_dispatch_does_not_refire_or_corrupt_state() {
    let (mut service, clock, recorder) = service();
    let id = service.create_event(draft("Crash", NOW + 60 * MINUTE)).unwrap();

    recorder.panic_next.set(true);
    clock.set(NOW + 45 * MINUTE);
    let fired = catch_unwind(AssertUnwindSafe(|| service.fire_due()))
        .expect("dispatch panic stays inside the scheduler");
    assert_eq!(fired, 1);

    assert!(!service.scheduler().is_armed(id));
    assert_eq!(service.fire_due(), 0);
    assert!(recorder.toasts.borrow().is_empty());

    service
        .update_event(id, EventPatch::reschedule(NOW + 120 * MINUTE))
        .unwrap();
    assert!(service.scheduler().is_armed(id));
}

#[test]
fn panicking_dispatch_does_not_swallow_reminders_due_at_the_same_instant() {
    let (mut service, clock, recorder) = service();
    let first = service.create_event(draft("First", NOW + 60 * MINUTE)).unwrap();
    let second = service.create_event(draft("Second", NOW + 60 * MINUTE)).unwrap();

    recorder.panic_next.set(true);
    clock.set(NOW + 45 * MINUTE);
    assert_eq!(service.fire_due(), 2);

    assert!(!service.scheduler().is_armed(first));
    assert!(!service.scheduler().is_armed(second));
    let toasts = recorder.toasts.borrow();
    assert_eq!(toasts.len(), 1);
    assert!(toasts[0].1 == "First" || toasts[0].1 == "Second");
    drop(toasts);

    clock.set(NOW + 120 * MINUTE);
    assert_eq!(service.fire_due(), 0);
    assert_eq!(recorder.toasts.borrow().len(), 1);
}

#[test]
fn stopped_service_keeps_editing_without_arming() {
    let (mut service, _, _) = service();
    service.stop();
    assert_eq!(service.scheduler().state(), SchedulerState::Stopped);

    let id = service.create_event(draft("Later", NOW + 60 * MINUTE)).unwrap();
    assert!(!service.scheduler().is_armed(id));

    assert!(service.start());
    assert!(service.scheduler().is_armed(id));

    service.dispose();
    assert!(!service.start());
    assert_eq!(service.scheduler().armed_count(), 0);
}
