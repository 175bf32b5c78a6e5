//! Error types for tsquery
//!
//! Provides a unified error type for all operations. Parsing and value
//! coercion never fail; only protocol-level failures, entity lifecycle
//! problems and I/O in the binary surface here.

use std::fmt;

use thiserror::Error;

use crate::protocol::Record;

/// Result type alias using QueryError
pub type Result<T> = std::result::Result<T, QueryError>;

/// Unified error type for tsquery operations
#[derive(Debug, Error)]
pub enum QueryError {
    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error(transparent)]
    Response(#[from] ResponseError),

    // -------------------------------------------------------------------------
    // Entity Errors
    // -------------------------------------------------------------------------
    #[error("{entity} record is missing identity field `{field}`")]
    MissingIdentity {
        entity: &'static str,
        field: &'static str,
    },

    #[error("Parent connection is no longer available")]
    ParentGone,

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Entity has been destroyed")]
    EntityDestroyed,

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A failure reported by the server on its `error` line.
///
/// An `id` of 0 means success and is never turned into this type by
/// [`Command::check`](crate::protocol::Command::check).
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseError {
    /// Numeric error id
    pub id: u64,

    /// Human readable message (`msg`)
    pub msg: String,

    /// Additional message some errors carry (`extra_msg`)
    pub extra_msg: Option<String>,

    /// Permission that was missing, for permission errors (`failed_permid`)
    pub failed_permid: Option<u64>,
}

impl ResponseError {
    /// Interpret a parsed error record
    ///
    /// Missing or non-numeric ids read as 0 and a missing message as empty.
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.get_u64("id").unwrap_or(0),
            msg: record.get_str("msg").unwrap_or_default().to_string(),
            extra_msg: record.get_str("extra_msg").map(str::to_string),
            failed_permid: record.get_u64("failed_permid"),
        }
    }

    /// Whether this record denotes a failure
    pub fn is_failure(&self) -> bool {
        self.id > 0
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "server error {}: {}", self.id, self.msg)?;
        if let Some(extra) = &self.extra_msg {
            write!(f, " ({extra})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ResponseError {}
