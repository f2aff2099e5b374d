//! Grouped undo/redo history.
//!
//! Records how to reverse and replay file system mutations, bundled into
//! command groups that undo and redo as a unit.
//!
//! ## Guarantees
//!
//! - **Ordering**: records undo in reverse insertion order and redo forward;
//!   groups undo newest first
//! - **Empty groups**: a group with no records is discarded, never committed
//! - **Bounded**: at most `max_depth` groups are kept; the oldest go first
//! - **Fault isolation**: an executor failure halts the group and leaves the
//!   cursor where it was
//!
//! ## Phases
//!
//! 1. **Record**: `begin_group()`, `add_operation()` per mutation, `end_group()`
//! 2. **Navigate**: `undo()` / `redo()` drive the executor over one group
//!
//! ## Example
//!
//! ```
//! # use fs_undo::undo::{Direction, OperationKind, UndoLog};
//! # fn example() -> fs_undo::Result<()> {
//! let mut applied = Vec::new();
//! let executor = |_: Direction, _: OperationKind, _: &(), primary: &str, _: &str| {
//!     applied.push(primary.to_string());
//!     anyhow::Ok(())
//! };
//! let mut log = UndoLog::with_depth(executor, 10)?;
//!
//! log.begin_group("rename")?;
//! log.add_operation(OperationKind::Move, (), "a.txt", "b.txt")?;
//! log.end_group()?;
//!
//! log.undo()?; // executor sees "b.txt"
//! log.redo()?; // executor sees "a.txt"
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::config::UndoConfig;
use crate::error::{Result, UndoError};

use super::executor::Executor;
use super::group::CommandGroup;
use super::record::{Direction, OperationKind, OperationRecord};

use std::collections::VecDeque;

/// Outcome of [`UndoLog::end_group`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStatus {
    /// The group held records and is now undoable.
    Committed,
    /// The group held nothing and was dropped.
    Empty,
}

/// Session-scoped undo/redo log.
///
/// Groups before the cursor are undoable, groups at or after it redoable.
/// Not synchronized: callers sharing a log across threads wrap it in one
/// `Mutex` so recording and replay never interleave.
pub struct UndoLog<P, E> {
    groups: VecDeque<CommandGroup<P>>,
    cursor: usize,
    max_depth: usize,
    open: Option<CommandGroup<P>>,
    executor: E,
}

impl<P, E: Executor<P>> UndoLog<P, E> {
    /// Creates an empty log.
    pub fn new(executor: E, config: UndoConfig) -> Self {
        Self {
            groups: VecDeque::new(),
            cursor: 0,
            max_depth: config.max_depth(),
            open: None,
            executor,
        }
    }

    /// Creates an empty log keeping at most `max_depth` groups.
    pub fn with_depth(executor: E, max_depth: usize) -> Result<Self> {
        Ok(Self::new(executor, UndoConfig::new(max_depth)?))
    }

    /// Drops all history and any open group.
    pub fn reset(&mut self) {
        if self.open.as_ref().is_some_and(|g| !g.is_empty()) {
            log::warn!("Discarding open command group on reset");
        }

        self.groups.clear();
        self.open = None;
        self.cursor = 0;
        log::debug!("Undo log reset");
    }

    /// Replaces the executor and capacity, then resets.
    ///
    /// Entry point for harnesses that need a fresh log with their own executor.
    pub fn reinit(&mut self, executor: E, max_depth: usize) -> Result<()> {
        let config = UndoConfig::new(max_depth)?;
        self.executor = executor;
        self.max_depth = config.max_depth();
        self.reset();
        Ok(())
    }

    /// Changes the retained depth, evicting immediately if history is now too long.
    pub fn configure(&mut self, max_depth: usize) -> Result<()> {
        let config = UndoConfig::new(max_depth)?;
        self.max_depth = config.max_depth();
        self.evict();
        Ok(())
    }

    /// Opens a new group. Groups never nest.
    pub fn begin_group(&mut self, message: impl Into<String>) -> Result<()> {
        if self.open.is_some() {
            return Err(UndoError::AlreadyOpen);
        }

        let message = message.into();
        log::debug!("Opening command group: {}", message);
        self.open = Some(CommandGroup::open(message));
        Ok(())
    }

    /// Reopens the newest undoable group so more records can join it.
    ///
    /// The group is committed again by the next `end_group()`, which also
    /// drops the redo tail.
    pub fn continue_group(&mut self) -> Result<()> {
        if self.open.is_some() {
            return Err(UndoError::AlreadyOpen);
        }
        if self.cursor == 0 {
            return Err(UndoError::NothingToContinue);
        }

        let mut group = self
            .groups
            .remove(self.cursor - 1)
            .ok_or(UndoError::NothingToContinue)?;
        self.cursor -= 1;
        group.reopen();

        log::debug!("Continuing command group: {}", group.message());
        self.open = Some(group);
        Ok(())
    }

    /// Replaces the open group's message, returning the old one.
    pub fn replace_group_message(&mut self, message: impl Into<String>) -> Result<String> {
        let group = self.open.as_mut().ok_or(UndoError::NoOpenGroup)?;
        Ok(group.set_message(message.into()))
    }

    /// Records one step in the open group.
    ///
    /// Only records history: the mutation itself must already have happened.
    /// Records of kind [`OperationKind::None`] are not stored.
    pub fn add_operation(
        &mut self,
        kind: OperationKind,
        payload: P,
        do_description: impl Into<String>,
        undo_description: impl Into<String>,
    ) -> Result<()> {
        let group = self.open.as_mut().ok_or(UndoError::NoOpenGroup)?;

        if kind.is_none() {
            log::debug!("Skipping sentinel operation in '{}'", group.message());
            return Ok(());
        }

        let record = OperationRecord::new(kind, payload, do_description, undo_description);
        log::debug!(
            "Recording {}: {} / {}",
            record.kind,
            record.do_description,
            record.undo_description
        );
        group.push(record);
        Ok(())
    }

    /// Closes the open group.
    ///
    /// A non-empty group is committed at the cursor, replacing any redo tail.
    pub fn end_group(&mut self) -> Result<GroupStatus> {
        let mut group = self.open.take().ok_or(UndoError::NoOpenGroup)?;

        if group.is_empty() {
            log::debug!("Discarding empty command group: {}", group.message());
            return Ok(GroupStatus::Empty);
        }

        let dropped = self.groups.len() - self.cursor;
        if dropped > 0 {
            log::debug!("Dropping {} redoable group(s)", dropped);
        }
        self.groups.truncate(self.cursor);

        group.commit();
        log::debug!(
            "Committed '{}' with {} operation(s)",
            group.message(),
            group.len()
        );
        self.groups.push_back(group);
        self.cursor += 1;

        self.evict();
        Ok(GroupStatus::Committed)
    }

    /// Reverses the newest undoable group.
    pub fn undo(&mut self) -> Result<()> {
        if self.open.is_some() {
            return Err(UndoError::AlreadyOpen);
        }
        if self.cursor == 0 {
            return Err(UndoError::NothingToUndo);
        }

        let group = &self.groups[self.cursor - 1];
        log::info!("Undoing: {}", group.message());
        run_group(&mut self.executor, group, Direction::Undo)?;

        self.cursor -= 1;
        Ok(())
    }

    /// Replays the oldest redoable group.
    pub fn redo(&mut self) -> Result<()> {
        if self.open.is_some() {
            return Err(UndoError::AlreadyOpen);
        }
        if self.cursor == self.groups.len() {
            return Err(UndoError::NothingToRedo);
        }

        let group = &self.groups[self.cursor];
        log::info!("Redoing: {}", group.message());
        run_group(&mut self.executor, group, Direction::Redo)?;

        self.cursor += 1;
        Ok(())
    }

    /// Drops the oldest groups until the log fits `max_depth`.
    ///
    /// Runs regardless of where the cursor sits, so redoable history can go too.
    fn evict(&mut self) {
        let mut evicted = 0;
        while self.groups.len() > self.max_depth {
            if let Some(group) = self.groups.pop_front() {
                log::debug!("Evicting command group: {}", group.message());
                evicted += 1;
            }
        }

        self.cursor = self.cursor.saturating_sub(evicted);
    }
}

fn run_group<P, E: Executor<P>>(
    executor: &mut E,
    group: &CommandGroup<P>,
    direction: Direction,
) -> Result<()> {
    let ops = group.operations().iter().enumerate();
    let steps: Box<dyn Iterator<Item = (usize, &OperationRecord<P>)> + '_> = match direction {
        Direction::Undo => Box::new(ops.rev()),
        Direction::Redo => Box::new(ops),
    };

    for (index, record) in steps {
        let (primary, secondary) = record.paths(direction);

        if let Err(source) =
            executor.apply(direction, record.kind, &record.payload, primary, secondary)
        {
            log::warn!(
                "{} of '{}' halted at operation {}: {}",
                direction,
                group.message(),
                index,
                source
            );
            return Err(match direction {
                Direction::Undo => UndoError::UndoFailed { index, source },
                Direction::Redo => UndoError::RedoFailed { index, source },
            });
        }

        log::debug!("{} {}: {}", direction, record.kind, primary);
    }

    Ok(())
}

/// History statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryStats {
    pub groups: usize,
    pub operations: usize,
    pub undoable: usize,
    pub redoable: usize,
}

impl<P, E> UndoLog<P, E> {
    /// True when nothing is recorded.
    ///
    /// With a group open: whether it has no records yet. Otherwise: whether
    /// no group has been committed.
    pub fn last_group_empty(&self) -> bool {
        match &self.open {
            Some(group) => group.is_empty(),
            None => self.groups.is_empty(),
        }
    }

    /// Number of committed groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn is_group_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.open.is_none() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.open.is_none() && self.cursor < self.groups.len()
    }

    /// Message of the open group, if any.
    pub fn open_message(&self) -> Option<&str> {
        self.open.as_ref().map(CommandGroup::message)
    }

    /// Message of the group `undo()` would reverse.
    pub fn undo_message(&self) -> Option<&str> {
        self.cursor
            .checked_sub(1)
            .and_then(|idx| self.groups.get(idx))
            .map(CommandGroup::message)
    }

    /// Message of the group `redo()` would replay.
    pub fn redo_message(&self) -> Option<&str> {
        self.groups.get(self.cursor).map(CommandGroup::message)
    }

    /// Committed groups, oldest first.
    pub fn groups(&self) -> impl Iterator<Item = &CommandGroup<P>> {
        self.groups.iter()
    }

    /// Borrows the executor, e.g. to inspect what a test executor saw.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            groups: self.groups.len(),
            operations: self.groups.iter().map(CommandGroup::len).sum(),
            undoable: self.cursor,
            redoable: self.groups.len() - self.cursor,
        }
    }

    /// Renders history newest first, one line per group.
    ///
    /// `detailed` adds indented `do:` and `undo:` lines under each group.
    pub fn listing(&self, detailed: bool) -> Vec<String> {
        let mut lines = Vec::new();
        for group in self.groups.iter().rev() {
            lines.push(group.message().to_string());
            if detailed {
                for record in group.operations() {
                    lines.push(format!("  do: {} {}", record.kind, record.do_description));
                    lines.push(format!(
                        "  undo: {} {}",
                        record.kind, record.undo_description
                    ));
                }
            }
        }
        lines
    }

    /// Line index in [`listing`](Self::listing) of the group `undo()` would
    /// reverse. Equals the number of lines when nothing is undoable.
    pub fn listing_position(&self, detailed: bool) -> usize {
        self.groups
            .iter()
            .skip(self.cursor)
            .map(|group| {
                if detailed {
                    1 + 2 * group.len()
                } else {
                    1
                }
            })
            .sum()
    }
}

impl<P, E> Drop for UndoLog<P, E> {
    fn drop(&mut self) {
        if self.open.as_ref().is_some_and(|g| !g.is_empty()) {
            log::warn!("Undo log dropped with an open command group");
        }
    }
}
