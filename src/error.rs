//! Error types for fs-undo.
//!
//! All operations return `Result<T>` which aliases `Result<T, UndoError>`.

use thiserror::Error;

/// Errors from undo log operations.
#[derive(Debug, Error)]
pub enum UndoError {
    /// A command group is already open. Groups never nest.
    #[error("A command group is already open")]
    AlreadyOpen,

    /// No command group is open.
    #[error("No command group is open")]
    NoOpenGroup,

    /// No committed group is available to reopen.
    #[error("No command group to continue")]
    NothingToContinue,

    /// History depth must be positive.
    #[error("Invalid history depth: {0}")]
    InvalidDepth(usize),

    /// Cursor is at the start of history.
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Cursor is at the end of history.
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Executor failed while reversing a group.
    ///
    /// `index` is the insertion index of the failing record within its group.
    #[error("Undo failed at operation {index}: {source}")]
    UndoFailed {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    /// Executor failed while replaying a group.
    #[error("Redo failed at operation {index}: {source}")]
    RedoFailed {
        index: usize,
        #[source]
        source: anyhow::Error,
    },

    /// File system operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unexpected error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Broad category of an [`UndoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Usage errors. Surfaced immediately, never retried.
    Structural,
    /// End of history. A normal no-op status.
    Navigation,
    /// Executor reported a failure.
    Execution,
    /// Anything else (I/O, unexpected).
    Internal,
}

impl UndoError {
    pub fn class(&self) -> ErrorClass {
        match self {
            UndoError::AlreadyOpen
            | UndoError::NoOpenGroup
            | UndoError::NothingToContinue
            | UndoError::InvalidDepth(_) => ErrorClass::Structural,
            UndoError::NothingToUndo | UndoError::NothingToRedo => ErrorClass::Navigation,
            UndoError::UndoFailed { .. } | UndoError::RedoFailed { .. } => ErrorClass::Execution,
            UndoError::Io(_) | UndoError::Other(_) => ErrorClass::Internal,
        }
    }

    /// Index of the failing record for execution errors.
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            UndoError::UndoFailed { index, .. } | UndoError::RedoFailed { index, .. } => {
                Some(*index)
            }
            _ => None,
        }
    }
}

/// Result type alias for fs-undo operations.
pub type Result<T> = std::result::Result<T, UndoError>;
