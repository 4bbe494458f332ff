//! Diesel and pool error translation shared by the repositories.
//!
//! Every repository port exposes `Connection` and `Query` variants; callers
//! pass the matching constructors so one classification serves them all.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Collapse a pool failure into the repository's connection error.
pub(crate) fn map_pool_error_with<E>(error: PoolError, connection: impl FnOnce(String) -> E) -> E {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => connection(message),
    }
}

/// Classify a Diesel failure as a connection or query error.
///
/// Lost connections are reported as connection errors so the HTTP layer can
/// answer 503; everything else is a query error carrying a short summary.
pub(crate) fn map_diesel_error_with<E>(
    error: DieselError,
    query: impl FnOnce(String) -> E,
    connection: impl FnOnce(String) -> E,
) -> E {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            debug!(message = info.message(), "database connection closed");
            connection("database connection closed".to_owned())
        }
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "database rejected statement");
            query(format!("database error ({kind:?})"))
        }
        DieselError::NotFound => query("record not found".to_owned()),
        DieselError::BrokenTransactionManager => {
            connection("transaction manager is broken".to_owned())
        }
        other => {
            debug!(error = %other, "diesel operation failed");
            query("database error".to_owned())
        }
    }
}
