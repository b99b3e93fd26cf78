//! Convenience result type alias for ThumbHub.

use crate::error::AppError;

/// A specialized `Result` type for ThumbHub operations.
pub type AppResult<T> = Result<T, AppError>;
