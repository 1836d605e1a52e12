//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store, scheduler and repository calls into use-case APIs.
//! - Keep CLI/UI layers decoupled from storage and timer details.

pub mod reminder_service;

pub use reminder_service::ReminderService;
