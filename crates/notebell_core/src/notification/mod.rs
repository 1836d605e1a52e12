//! Reminder delivery: visual alert plus optional audio.

pub mod audio;
pub mod dispatcher;

pub use audio::CommandAudioPlayer;
pub use dispatcher::{
    AudioOutcome, AudioPlayer, DispatchSettings, NotificationDispatcher, PlaybackError,
    ReminderNotification, VisualAlert,
};
