//! Single reversible steps.

use std::fmt;

/// Kind of file system mutation a record describes.
///
/// The executor dispatches on this tag. `None` is a sentinel meaning "no real
/// mutation" and is never stored in a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    None,
    Move,
    Copy,
    Remove,
    Mkdir,
    Rmdir,
    SymlinkCreate,
    PermissionsChange,
}

impl OperationKind {
    pub fn is_none(self) -> bool {
        self == OperationKind::None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::None => "none",
            OperationKind::Move => "move",
            OperationKind::Copy => "copy",
            OperationKind::Remove => "remove",
            OperationKind::Mkdir => "mkdir",
            OperationKind::Rmdir => "rmdir",
            OperationKind::SymlinkCreate => "symlink",
            OperationKind::PermissionsChange => "chmod",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way a record is being replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Reverse the step.
    Undo,
    /// Apply the step again.
    Redo,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Undo => f.write_str("undo"),
            Direction::Redo => f.write_str("redo"),
        }
    }
}

/// One reversible step.
///
/// Stores no file content, only how to redo and how to undo the step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord<P> {
    pub kind: OperationKind,
    pub payload: P,
    pub do_description: String,
    pub undo_description: String,
}

impl<P> OperationRecord<P> {
    pub fn new(
        kind: OperationKind,
        payload: P,
        do_description: impl Into<String>,
        undo_description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            payload,
            do_description: do_description.into(),
            undo_description: undo_description.into(),
        }
    }

    /// Returns `(primary, secondary)` addressing arguments for `direction`.
    pub fn paths(&self, direction: Direction) -> (&str, &str) {
        match direction {
            Direction::Undo => (&self.undo_description, &self.do_description),
            Direction::Redo => (&self.do_description, &self.undo_description),
        }
    }
}
