//! Command groups: one user-facing action made of several records.

use super::record::OperationRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupState {
    /// Accepting records.
    Open,
    /// Sealed by `end_group`.
    Committed,
}

/// Ordered records sharing one message, committed as a unit.
#[derive(Debug, Clone)]
pub struct CommandGroup<P> {
    message: String,
    operations: Vec<OperationRecord<P>>,
    state: GroupState,
}

impl<P> CommandGroup<P> {
    pub(crate) fn open(message: String) -> Self {
        Self {
            message,
            operations: Vec::new(),
            state: GroupState::Open,
        }
    }

    pub(crate) fn push(&mut self, record: OperationRecord<P>) {
        debug_assert_eq!(self.state, GroupState::Open);
        debug_assert!(!record.kind.is_none());
        self.operations.push(record);
    }

    pub(crate) fn commit(&mut self) {
        self.state = GroupState::Committed;
    }

    pub(crate) fn reopen(&mut self) {
        self.state = GroupState::Open;
    }

    pub(crate) fn set_message(&mut self, message: String) -> String {
        std::mem::replace(&mut self.message, message)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn operations(&self) -> &[OperationRecord<P>] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn is_committed(&self) -> bool {
        self.state == GroupState::Committed
    }
}
