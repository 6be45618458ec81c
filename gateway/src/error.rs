//! Gateway error types.

use sqlcli_core::ConfigError;
use thiserror::Error;

/// Errors reported by the gateway while executing a legal operation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Generic execution failure.
    #[error("{message}")]
    SqlExecution { message: String },

    /// A session property value was rejected.
    #[error("invalid session property: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Catalog object lookup failed.
    #[error("{kind} '{name}' does not exist")]
    ObjectNotFound { kind: &'static str, name: String },

    /// Catalog object already registered.
    #[error("{kind} '{name}' already exists")]
    ObjectExists { kind: &'static str, name: String },

    /// No job with this id was submitted in the session.
    #[error("could not find job '{job_id}'")]
    UnknownJob { job_id: String },

    /// Job id is malformed.
    #[error("'{job_id}' is not a valid job id, expected 32 hexadecimal characters")]
    InvalidJobId { job_id: String },

    /// Job already finished or stopped.
    #[error("job '{job_id}' is not running")]
    JobNotRunning { job_id: String },

    /// Jar was never added to the session.
    #[error("jar '{path}' is not registered in the session")]
    JarNotFound { path: String },

    /// The call observed a cancellation request.
    #[error("operation was cancelled")]
    Cancelled,
}

impl GatewayError {
    pub fn sql_execution(message: impl Into<String>) -> Self {
        Self::SqlExecution {
            message: message.into(),
        }
    }

    pub fn object_not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn object_exists(kind: &'static str, name: impl Into<String>) -> Self {
        Self::ObjectExists {
            kind,
            name: name.into(),
        }
    }
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
