//! Shared result types for the database layer

pub mod errors;

pub use errors::{DatabaseError, HscRunError};

pub type DatabaseResult<T> = Result<T, DatabaseError>;
pub type HscRunResult<T> = Result<T, HscRunError>;
