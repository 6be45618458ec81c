//! Statement-set batching state.
//!
//! Between `BEGIN STATEMENT SET;` and `END;` modify operations are
//! collected instead of submitted. `END;` hands them over as one batch.

use sqlcli_core::ModifyOperation;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementSetError {
    #[error("a statement set is already open, use 'END;' to submit it first")]
    AlreadyActive,

    #[error("no statement set is open, use 'BEGIN STATEMENT SET;' first")]
    NotActive,
}

/// The open statement set, if any.
///
/// `pending` is only ever non-empty while the set is active.
#[derive(Debug, Default)]
pub struct StatementSetSession {
    active: bool,
    pending: Vec<ModifyOperation>,
}

impl StatementSetSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn pending(&self) -> &[ModifyOperation] {
        &self.pending
    }

    /// Open a statement set.
    pub fn begin(&mut self) -> Result<(), StatementSetError> {
        if self.active {
            return Err(StatementSetError::AlreadyActive);
        }
        self.active = true;
        self.pending.clear();
        Ok(())
    }

    /// Queue an operation into the open set.
    pub fn add(&mut self, operation: ModifyOperation) -> Result<(), StatementSetError> {
        if !self.active {
            return Err(StatementSetError::NotActive);
        }
        self.pending.push(operation);
        Ok(())
    }

    /// Close the set and return its operations in the order they were added.
    pub fn end(&mut self) -> Result<Vec<ModifyOperation>, StatementSetError> {
        if !self.active {
            return Err(StatementSetError::NotActive);
        }
        self.active = false;
        Ok(std::mem::take(&mut self.pending))
    }
}
