//! Diesel and pool error mapping for the profile store.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::ProfileStoreError;

use super::pool::PoolError;

/// Map pool errors to store connection errors.
pub(super) fn map_pool_error(error: PoolError) -> ProfileStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            ProfileStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to store errors.
///
/// Database messages are logged at debug level and never copied into the
/// returned error.
pub(super) fn map_diesel_error(error: DieselError) -> ProfileStoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => ProfileStoreError::query("record not found"),
        DieselError::QueryBuilderError(_) => ProfileStoreError::query("database query error"),
        DieselError::DeserializationError(_) => {
            ProfileStoreError::query("stored row could not be decoded")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            ProfileStoreError::connection("database connection error")
        }
        DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation
            | DatabaseErrorKind::ForeignKeyViolation
            | DatabaseErrorKind::CheckViolation
            | DatabaseErrorKind::NotNullViolation,
            _,
        ) => ProfileStoreError::constraint("database constraint violated"),
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            ProfileStoreError::constraint("concurrent transaction conflict")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ReadOnlyTransaction, _) => {
            ProfileStoreError::query("write attempted in a read-only transaction")
        }
        _ => ProfileStoreError::query("database error"),
    }
}
