//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the notebook persistence contract used by services.
//! - Isolate SQLite query details from service orchestration.

pub mod notebook_repo;

pub use notebook_repo::{NotebookRepository, RepoError, RepoResult, SqliteNotebookRepository};
