//! Admissibility of an operation in the current context.
//!
//! Rules are checked in order and the first denial wins:
//! 1. an initialization file only runs administrative statements,
//! 2. a non-interactive script only runs queries in TABLEAU result mode,
//! 3. an open statement set only accepts inserts, CTAS and `END`.

use sqlcli_core::{Operation, OperationKind, ResultMode, RunMode, SessionConfig, RESULT_MODE};

use crate::messages;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Allowed,
    Denied(String),
}

/// Kinds accepted in an initialization file.
pub const INIT_ALLOWED: [OperationKind; 10] = [
    OperationKind::Set,
    OperationKind::Reset,
    OperationKind::Create,
    OperationKind::Drop,
    OperationKind::Use,
    OperationKind::Alter,
    OperationKind::LoadModule,
    OperationKind::UnloadModule,
    OperationKind::AddJar,
    OperationKind::RemoveJar,
];

/// Kinds accepted while a statement set is open.
pub const STATEMENT_SET_ALLOWED: [OperationKind; 3] = [
    OperationKind::Insert,
    OperationKind::CreateTableAs,
    OperationKind::EndStatementSet,
];

pub fn validate(
    operation: &Operation,
    mode: RunMode,
    config: &SessionConfig,
    statement_set_active: bool,
) -> Validation {
    let kind = operation.kind();

    match mode {
        RunMode::Initialization if !INIT_ALLOWED.contains(&kind) => {
            return Validation::Denied(format!(
                "{}{}",
                messages::MESSAGE_UNSUPPORTED_IN_INIT,
                operation.summary()
            ));
        }
        RunMode::NonInteractive if kind == OperationKind::Query => {
            let result_mode = config.get(&RESULT_MODE);
            if result_mode != ResultMode::Tableau {
                return Validation::Denied(messages::message_query_requires_tableau(
                    result_mode.name(),
                ));
            }
        }
        _ => {}
    }

    if statement_set_active && !STATEMENT_SET_ALLOWED.contains(&kind) {
        return Validation::Denied(messages::MESSAGE_STATEMENT_SET_SQL_EXECUTION_ERROR.to_string());
    }

    Validation::Allowed
}
