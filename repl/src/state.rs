//! Per-invocation state of the statement loop.

use sqlcli_core::RunMode;

use crate::statement_set::StatementSetSession;

/// Owned by one `run_statements` call and handed to every dispatch.
#[derive(Debug)]
pub struct LoopState {
    pub running: bool,
    pub mode: RunMode,
    pub statement_set: StatementSetSession,
}

impl LoopState {
    pub fn new(mode: RunMode) -> Self {
        Self {
            running: true,
            mode,
            statement_set: StatementSetSession::new(),
        }
    }

    /// Stop after the current statement.
    pub fn stop(&mut self) {
        self.running = false;
    }
}
