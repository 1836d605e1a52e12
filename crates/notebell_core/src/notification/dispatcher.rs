//! Notification dispatcher.
//!
//! # Responsibility
//! - Show a visual alert for every fired reminder.
//! - Request playback of the event's custom sound when one is set.
//!
//! # Invariants
//! - The visual alert is shown before, and regardless of, audio playback.
//! - Playback failures are logged and swallowed: no retry, no fallback sound.

use crate::model::event::EventId;
use crate::model::reminder::EpochMs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub const DEFAULT_NOTIFICATION_TITLE: &str = "Reminder";
pub const DEFAULT_NOTIFICATION_DURATION_MS: u64 = 10_000;

/// Payload handed from the scheduler to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderNotification {
    pub event_id: EventId,
    pub title: String,
    pub custom_sound_url: Option<String>,
    /// Instant the timer was armed for.
    pub reminder_time: EpochMs,
}

/// Visual-alert collaborator (toast, system notification, console line).
pub trait VisualAlert {
    fn show(&self, title: &str, description: &str, duration_ms: u64);
}

/// Audio-playback capability.
///
/// `play` starts playback and returns without waiting for it to finish.
pub trait AudioPlayer {
    fn play(&self, url: &str) -> Result<(), PlaybackError>;
}

/// Audio could not be played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// Sound resource does not exist.
    NotFound(String),
    /// Resource exists but could not be decoded.
    Decode(String),
    /// Playback was refused (policy, device busy).
    Rejected(String),
    /// No playback backend is available.
    Unavailable(String),
}

impl Display for PlaybackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(url) => write!(f, "sound not found: {url}"),
            Self::Decode(details) => write!(f, "sound could not be decoded: {details}"),
            Self::Rejected(details) => write!(f, "sound playback rejected: {details}"),
            Self::Unavailable(details) => write!(f, "no audio backend: {details}"),
        }
    }
}

impl Error for PlaybackError {}

/// Presentation settings for visual alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    pub title: String,
    pub duration_ms: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_NOTIFICATION_TITLE.to_string(),
            duration_ms: DEFAULT_NOTIFICATION_DURATION_MS,
        }
    }
}

/// What happened to the audio part of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioOutcome {
    /// Event has no custom sound.
    NotRequested,
    Played,
    Failed(PlaybackError),
}

pub struct NotificationDispatcher {
    visual: Arc<dyn VisualAlert>,
    audio: Option<Arc<dyn AudioPlayer>>,
    settings: DispatchSettings,
}

impl NotificationDispatcher {
    pub fn new(
        visual: Arc<dyn VisualAlert>,
        audio: Option<Arc<dyn AudioPlayer>>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            visual,
            audio,
            settings,
        }
    }

    /// Dispatcher that never plays sound.
    pub fn visual_only(visual: Arc<dyn VisualAlert>) -> Self {
        Self::new(visual, None, DispatchSettings::default())
    }

    /// Delivers one fired reminder.
    pub fn dispatch(&self, notification: &ReminderNotification) -> AudioOutcome {
        self.visual.show(
            &self.settings.title,
            &notification.title,
            self.settings.duration_ms,
        );

        let Some(url) = notification.custom_sound_url.as_deref() else {
            return AudioOutcome::NotRequested;
        };

        let result = match self.audio.as_ref() {
            Some(audio) => audio.play(url),
            None => Err(PlaybackError::Unavailable(
                "dispatcher configured without audio".to_string(),
            )),
        };

        match result {
            Ok(()) => {
                info!(
                    "event=sound_play module=notification status=ok event_id={}",
                    notification.event_id
                );
                AudioOutcome::Played
            }
            Err(err) => {
                warn!(
                    "event=sound_play module=notification status=error event_id={} error={}",
                    notification.event_id, err
                );
                AudioOutcome::Failed(err)
            }
        }
    }
}
