//! External-command audio backend.
//!
//! Plays a sound by spawning a configured player (`paplay`, `afplay`,
//! `ffplay -nodisp -autoexit`, ...) with the sound locator appended as the
//! last argument. `play` returns once the player is spawned; the exit status
//! is collected off the calling thread and only logged.

use crate::notification::dispatcher::{AudioPlayer, PlaybackError};
use log::{debug, warn};
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Child, Command, Stdio};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandAudioPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandAudioPlayer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Builds a player from `[program, args...]`; `None` for an empty list.
    pub fn from_command_line(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self::new(program.clone(), args.to_vec()))
    }
}

impl AudioPlayer for CommandAudioPlayer {
    fn play(&self, url: &str) -> Result<(), PlaybackError> {
        if let Some(path) = local_path(url) {
            if !path.exists() {
                return Err(PlaybackError::NotFound(url.to_string()));
            }
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => {
                    PlaybackError::Unavailable(format!("player `{}` not found", self.program))
                }
                _ => PlaybackError::Unavailable(format!(
                    "failed to spawn `{}`: {err}",
                    self.program
                )),
            })?;
        debug!(
            "event=sound_spawn module=notification status=ok program={} pid={}",
            self.program,
            child.id()
        );

        let program = self.program.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(move || reap(child, &program));
            }
            Err(_) => {
                std::thread::spawn(move || reap(child, &program));
            }
        }
        Ok(())
    }
}

/// Waits for a detached player and logs a failed exit.
fn reap(mut child: Child, program: &str) {
    match child.wait() {
        Ok(status) if status.success() => {
            debug!(
                "event=sound_exit module=notification status=ok program={}",
                program
            );
        }
        Ok(status) => {
            warn!(
                "event=sound_exit module=notification status=error program={} exit={}",
                program, status
            );
        }
        Err(err) => {
            warn!(
                "event=sound_exit module=notification status=error program={} error={}",
                program, err
            );
        }
    }
}

/// Filesystem path for `file://` locators and bare paths; `None` for other
/// URL schemes.
fn local_path(url: &str) -> Option<&Path> {
    if let Some(stripped) = url.strip_prefix("file://") {
        return Some(Path::new(stripped));
    }
    if url.contains("://") {
        return None;
    }
    Some(Path::new(url))
}
