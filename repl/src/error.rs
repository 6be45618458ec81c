//! Errors surfaced by the statement loop.

use std::io;

use sqlcli_gateway::GatewayError;
use sqlcli_parser::ParseError;
use thiserror::Error;

use crate::statement_set::StatementSetError;

/// A failure of one statement.
#[derive(Debug, Error)]
pub enum CliError {
    /// The operation is not legal in the current mode or statement-set state.
    #[error("{0}")]
    Validation(String),

    /// The statement text is malformed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The executor failed on a legal operation.
    #[error("{context}")]
    Execution {
        context: String,
        #[source]
        source: GatewayError,
    },

    /// A collaborator broke its contract.
    #[error("{0}")]
    InvariantViolation(String),

    #[error(transparent)]
    StatementSet(#[from] StatementSetError),

    /// Writing to the terminal failed.
    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl CliError {
    pub fn execution(context: impl Into<String>, source: GatewayError) -> Self {
        Self::Execution {
            context: context.into(),
            source,
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Programming errors get bug framing and end the loop in every mode.
    pub fn is_internal(&self) -> bool {
        matches!(self, CliError::InvariantViolation(_))
    }
}

impl From<io::Error> for CliError {
    fn from(source: io::Error) -> Self {
        Self::Io {
            context: "Could not write to the terminal".to_string(),
            source,
        }
    }
}

/// Result type for statement execution.
pub type CliResult<T> = Result<T, CliError>;
