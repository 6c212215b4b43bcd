//! All-or-nothing execution support
//!
//! Each mutating adapter operation spans several collaborator calls
//! (pulls, approvals, engine calls, refunds). They commit together or not
//! at all: collaborators expose checkpoints, the registry keeps a journal
//! of its own inserts, and a per-adapter flag rejects re-entry while an
//! operation is in flight.

use crate::errors::AdapterError;
use std::cell::Cell;

/// State that can be restored to an earlier checkpoint
///
/// `rollback` must restore exactly the state observed by `checkpoint`,
/// including effects of nested calls made in between.
pub trait Transactional {
    type Checkpoint;

    fn checkpoint(&self) -> Self::Checkpoint;

    fn rollback(&mut self, checkpoint: Self::Checkpoint);
}

/// Checkpoints of every participant, taken at operation entry
pub(crate) struct Savepoint<E, L> {
    pub(crate) engine: E,
    pub(crate) ledger: L,
    pub(crate) registry: usize,
}

/// Marks an operation as in progress for as long as it lives
///
/// Entering while the flag is already set means a collaborator callback
/// is calling back into the adapter.
pub(crate) struct OperationGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> OperationGuard<'a> {
    pub(crate) fn enter(flag: &'a Cell<bool>, operation: &'static str) -> Result<Self, AdapterError> {
        if flag.replace(true) {
            return Err(AdapterError::Reentrancy { operation });
        }
        Ok(Self { flag })
    }
}

impl Drop for OperationGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
