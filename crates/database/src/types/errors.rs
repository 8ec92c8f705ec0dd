//! Error types for the database layer

use thiserror::Error;

use crate::entities::HscStage;

/// General database error
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("duplicate {0}")]
    Duplicate(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("stored value is corrupt: {0}")]
    Corrupt(String),

    #[error("database query error: {0}")]
    Query(#[from] sqlx::Error),

    #[error("database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DatabaseError {
    /// Maps unique-constraint violations to `Duplicate`, everything else to `Query`.
    pub(crate) fn from_insert(err: sqlx::Error, entity: &str) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DatabaseError::Duplicate(entity.to_string())
            }
            _ => DatabaseError::Query(err),
        }
    }
}

/// HSC run lifecycle errors
#[derive(Debug, Error)]
pub enum HscRunError {
    #[error("cannot move run from {current} to {target}")]
    InvalidTransition { current: HscStage, target: HscStage },

    #[error("run is running; stop it first")]
    Running,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for HscRunError {
    fn from(err: sqlx::Error) -> Self {
        HscRunError::Database(DatabaseError::Query(err))
    }
}
