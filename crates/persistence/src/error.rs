// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use cmsdb_audit::UnknownOperation;
use cmsdb_domain::{CanonicalId, DomainError, IdentifierError, NumericError};
use diesel::result::DatabaseErrorKind;

/// Errors that can occur during persistence operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// A database error occurred.
    DatabaseError(String),
    /// Database connection failed.
    DatabaseConnectionFailed(String),
    /// A connection could not be checked out of the pool.
    PoolError(String),
    /// Database migration failed.
    MigrationFailed(String),
    /// Query execution failed.
    QueryFailed(String),
    /// Serialization/deserialization error.
    SerializationError(String),
    /// Initialization error.
    InitializationError(String),
    /// Foreign key enforcement is not enabled.
    ForeignKeyEnforcementNotEnabled,
    /// A query expected exactly one row and found none.
    NotFound(String),
    /// The addressed entity row does not exist.
    RecordNotFound { table: String, id: String },
    /// A unique constraint was violated.
    UniqueViolation(String),
    /// A foreign key constraint was violated.
    ForeignKeyViolation(String),
    /// A check constraint was violated.
    CheckViolation(String),
    /// A record identifier does not conform to the canonical format.
    InvalidIdentifier(IdentifierError),
    /// A value does not fit the column width of the active backend.
    ValueOutOfRange(NumericError),
    /// Entity parameters failed field validation.
    Validation(DomainError),
    /// Password hashing or verification failed.
    PasswordHash(String),
    /// The operation context was cancelled.
    Cancelled,
    /// The operation context deadline passed.
    DeadlineExceeded,
    /// A transaction could not be started.
    BeginTransaction(Box<Self>),
    /// A transaction could not be committed.
    CommitTransaction(Box<Self>),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::DatabaseConnectionFailed(msg) => {
                write!(f, "Database connection failed: {msg}")
            }
            Self::PoolError(msg) => write!(f, "Connection pool error: {msg}"),
            Self::MigrationFailed(msg) => write!(f, "Migration failed: {msg}"),
            Self::QueryFailed(msg) => write!(f, "Query failed: {msg}"),
            Self::SerializationError(msg) => write!(f, "Serialization error: {msg}"),
            Self::InitializationError(msg) => write!(f, "Initialization error: {msg}"),
            Self::ForeignKeyEnforcementNotEnabled => {
                write!(f, "Foreign key enforcement is not enabled")
            }
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::RecordNotFound { table, id } => {
                write!(f, "Record not found: {table} '{id}'")
            }
            Self::UniqueViolation(msg) => write!(f, "Unique constraint violated: {msg}"),
            Self::ForeignKeyViolation(msg) => {
                write!(f, "Foreign key constraint violated: {msg}")
            }
            Self::CheckViolation(msg) => write!(f, "Check constraint violated: {msg}"),
            Self::InvalidIdentifier(err) => write!(f, "Invalid record identifier: {err}"),
            Self::ValueOutOfRange(err) => write!(f, "Value out of range: {err}"),
            Self::Validation(err) => write!(f, "Validation failed: {err}"),
            Self::PasswordHash(msg) => write!(f, "Password hashing failed: {msg}"),
            Self::Cancelled => write!(f, "Operation cancelled"),
            Self::DeadlineExceeded => write!(f, "Operation deadline exceeded"),
            Self::BeginTransaction(cause) => write!(f, "begin transaction: {cause}"),
            Self::CommitTransaction(cause) => write!(f, "commit transaction: {cause}"),
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::BeginTransaction(cause) | Self::CommitTransaction(cause) => Some(cause.as_ref()),
            Self::InvalidIdentifier(err) => Some(err),
            Self::ValueOutOfRange(err) => Some(err),
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl PersistenceError {
    /// Builds a `RecordNotFound` for the row `id` of `table`.
    #[must_use]
    pub fn record_not_found(table: &str, id: &CanonicalId) -> Self {
        Self::RecordNotFound {
            table: table.to_string(),
            id: id.to_string(),
        }
    }

    /// Returns the error a stage annotation wraps, or `self` if unwrapped.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::BeginTransaction(cause) | Self::CommitTransaction(cause) => cause.root_cause(),
            _ => self,
        }
    }
}

impl From<diesel::result::Error> for PersistenceError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => Self::NotFound("Record not found".to_string()),
            diesel::result::Error::DatabaseError(kind, info) => {
                let message: String = info.message().to_string();
                match kind {
                    DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(message),
                    DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(message),
                    DatabaseErrorKind::CheckViolation => Self::CheckViolation(message),
                    _ => Self::DatabaseError(message),
                }
            }
            _ => Self::DatabaseError(err.to_string()),
        }
    }
}

impl From<diesel::ConnectionError> for PersistenceError {
    fn from(err: diesel::ConnectionError) -> Self {
        Self::DatabaseConnectionFailed(err.to_string())
    }
}

impl From<diesel::r2d2::PoolError> for PersistenceError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        Self::PoolError(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<UnknownOperation> for PersistenceError {
    fn from(err: UnknownOperation) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<IdentifierError> for PersistenceError {
    fn from(err: IdentifierError) -> Self {
        Self::InvalidIdentifier(err)
    }
}

impl From<NumericError> for PersistenceError {
    fn from(err: NumericError) -> Self {
        Self::ValueOutOfRange(err)
    }
}

impl From<DomainError> for PersistenceError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err)
    }
}

impl From<bcrypt::BcryptError> for PersistenceError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::PasswordHash(err.to_string())
    }
}
