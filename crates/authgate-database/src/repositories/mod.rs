//! Concrete repository implementations.

pub mod credential;
pub mod lockout;

use authgate_core::error::{AppError, ErrorKind};

/// Map a sqlx error into an [`AppError`], separating "the database could
/// not be reached" from "the statement failed".
pub(crate) fn map_db_err(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
    move |e| {
        let kind = match &e {
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => ErrorKind::StoreUnavailable,
            _ => ErrorKind::Database,
        };
        AppError::with_source(kind, format!("{context}: {e}"), e)
    }
}
