//! Typed error hierarchy for the kanban service.
//!
//! A single enum covers the board subsystem; the HTTP layer maps each variant
//! to a status code in `board::api`.

use thiserror::Error;

use crate::board::models::Board;

/// Errors from the state mutation service, the repository and the file stores.
#[derive(Debug, Error)]
pub enum KanbanError {
    #[error("{0}")]
    Validation(String),

    #[error("Task not found: {id}")]
    TaskNotFound { id: String },

    #[error("WIP limit reached for {}. Move another task out of Doing first.", .board.label())]
    WipLimitReached { board: Board },

    #[error("Stale revision for {path}: the file changed since it was loaded")]
    Conflict { path: String },

    #[error("Expected file at {path}, found directory.")]
    NotAFile { path: String },

    #[error("Remote store error: {0}")]
    Transport(String),

    #[error("Missing required env var: {0}")]
    MissingEnv(&'static str),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type KanbanResult<T> = Result<T, KanbanError>;
