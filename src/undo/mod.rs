//! Undo/redo history for file system operations.
//!
//! Records reversible steps in command groups and replays them through an
//! injected [`Executor`].

pub mod executor;
pub mod group;
pub mod history;
pub mod record;

pub use executor::Executor;
pub use group::CommandGroup;
pub use history::{GroupStatus, HistoryStats, UndoLog};
pub use record::{Direction, OperationKind, OperationRecord};
