//! Convenience result type alias for OutingHub.

use crate::error::AppError;

/// A specialized `Result` type for OutingHub operations.
pub type AppResult<T> = Result<T, AppError>;
