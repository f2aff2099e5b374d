//! File system collaborators of the undo log.
//!
//! Provides the path existence query and an [`Executor`](crate::undo::Executor)
//! that replays records against the real file system.

pub mod executor;
pub mod exists;

pub use executor::{FsExecutor, FsPayload};
pub use exists::{LinkMode, path_exists};
