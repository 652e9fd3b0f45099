//! Typed path parameter helpers.

use std::str::FromStr;

use outinghub_core::error::AppError;

/// Parses an identifier from a path segment.
pub fn parse_id<T: FromStr>(s: &str) -> Result<T, AppError> {
    s.parse::<T>()
        .map_err(|_| AppError::invalid_input(format!("Invalid identifier: {s}")))
}
