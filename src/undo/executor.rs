//! The executor seam: whatever performs the real mutation for one step.

use super::record::{Direction, OperationKind};

/// Performs the file system mutation described by one record.
///
/// Called once per record, strictly in order, and never concurrently. Later
/// records in a group may depend on state left by earlier ones, so each call
/// must complete before the log moves on.
///
/// Implementations must treat [`OperationKind::None`] as a probe: succeed
/// without side effects.
pub trait Executor<P> {
    /// Applies one step.
    ///
    /// On undo `primary` is the record's undo-description and `secondary` its
    /// do-description; on redo the other way around.
    fn apply(
        &mut self,
        direction: Direction,
        kind: OperationKind,
        payload: &P,
        primary: &str,
        secondary: &str,
    ) -> anyhow::Result<()>;
}

impl<P, F> Executor<P> for F
where
    F: FnMut(Direction, OperationKind, &P, &str, &str) -> anyhow::Result<()>,
{
    fn apply(
        &mut self,
        direction: Direction,
        kind: OperationKind,
        payload: &P,
        primary: &str,
        secondary: &str,
    ) -> anyhow::Result<()> {
        self(direction, kind, payload, primary, secondary)
    }
}
