//! Classification of sqlx failures into the application taxonomy.

use outinghub_core::error::{AppError, ErrorKind};

/// Map a sqlx error to the [`ErrorKind`] the admission engine reasons about.
///
/// Lock contention is `Busy` so callers retry; a unique violation is a
/// `Conflict` so the notification store can treat a lost insert race as
/// success and submit can report a duplicate live request.
pub fn classify(err: &sqlx::Error) -> ErrorKind {
    match err {
        sqlx::Error::PoolTimedOut => ErrorKind::Timeout,
        sqlx::Error::RowNotFound => ErrorKind::NotFound,
        sqlx::Error::Database(db) => match db.code().as_deref() {
            // lock_not_available, serialization_failure, deadlock_detected
            Some("55P03") | Some("40001") | Some("40P01") => ErrorKind::Busy,
            // unique_violation
            Some("23505") => ErrorKind::Conflict,
            // query_canceled, raised by statement_timeout
            Some("57014") => ErrorKind::Timeout,
            _ => ErrorKind::StorageFailure,
        },
        _ => ErrorKind::StorageFailure,
    }
}

/// Wrap a sqlx error with context, keeping it as the source.
pub fn map_sqlx(context: &str, err: sqlx::Error) -> AppError {
    let kind = classify(&err);
    AppError::with_source(kind, format!("{context}: {err}"), err)
}
