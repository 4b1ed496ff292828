//! Storage error types

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced by the repository layer
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Constraint violation: {message}")]
    Constraint { message: String },

    #[error("Stored value is malformed: {message}")]
    Corrupt { message: String },
}

impl StorageError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StorageError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn constraint(message: impl Into<String>) -> Self {
        StorageError::Constraint {
            message: message.into(),
        }
    }

    pub fn corrupt(message: impl Into<String>) -> Self {
        StorageError::Corrupt {
            message: message.into(),
        }
    }

    /// Whether the underlying database error is a unique-index violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StorageError::Database(sea_orm::DbErr::Query(sea_orm::RuntimeErr::SqlxError(err))) => {
                err.as_database_error()
                    .and_then(|db| db.code())
                    .map(|code| code == "23505")
                    .unwrap_or(false)
            }
            _ => false,
        }
    }
}
