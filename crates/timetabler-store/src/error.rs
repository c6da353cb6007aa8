//! Store error type.

use std::fmt::Display;

use timetabler_core::AppError;
use timetabler_models::ScheduleError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached or the query failed. Nothing was written.
    #[error("store unavailable during {operation}: {message}")]
    Unavailable {
        operation: &'static str,
        message: String,
    },

    /// A persisted document no longer matches the domain model.
    #[error("corrupt document {key}: {message}")]
    Corrupt { key: String, message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The document failed validation and was not written.
    #[error("rejected write: {0}")]
    Rejected(#[from] ScheduleError),

    /// The document is not in the state the write expected.
    #[error("{0}")]
    Precondition(String),
}

impl StoreError {
    pub fn unavailable(operation: &'static str, err: impl Display) -> Self {
        StoreError::Unavailable {
            operation,
            message: err.to_string(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl Display) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Decode failures mean bad data; everything else is treated as the backend being down.
    pub fn from_sqlx(operation: &'static str, key: impl Display, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => StoreError::Corrupt {
                key: key.to_string(),
                message: err.to_string(),
            },
            other => StoreError::unavailable(operation, other),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }

    pub fn into_app_error(self) -> AppError {
        let message = anyhow::anyhow!(self.to_string());
        match self {
            StoreError::Unavailable { .. } => AppError::unavailable(message),
            StoreError::Corrupt { .. } => AppError::internal(message),
            StoreError::NotFound { .. } => AppError::not_found(message),
            StoreError::Rejected(_) => AppError::unprocessable(message),
            StoreError::Precondition(_) => AppError::conflict(message),
        }
    }
}
