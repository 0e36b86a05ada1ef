//! Profile sync domain service.
//!
//! Implements the driving ports on top of a [`SyncCoordinator`] and maps
//! coordinator failures to transport-agnostic [`Error`] values.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::ports::{ProfileCommand, ProfileQuery, ProfileStore, ProfileStoreError};
use crate::domain::{
    AccountId, AuditEntry, AuditLimit, DefaultSettings, DeleteOutcome, Error, ImportOutcome, LegacyBlob, ProfileExport,
    ProfileRequest, ProfileSnapshot, ProfileUpdateRequest, SyncCoordinator, SyncError,
    UpdateOutcome, extract_import,
};

/// Profile service implementing [`ProfileQuery`] and [`ProfileCommand`].
pub struct ProfileSyncService<S: ?Sized> {
    coordinator: SyncCoordinator<S>,
}

impl<S: ?Sized> Clone for ProfileSyncService<S> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<S> ProfileSyncService<S>
where
    S: ProfileStore + ?Sized,
{
    /// Create a service over `store`.
    pub fn new(store: Arc<S>, defaults: DefaultSettings, transaction_timeout: Duration) -> Self {
        Self {
            coordinator: SyncCoordinator::new(store, defaults, transaction_timeout),
        }
    }

    fn map_sync_error(error: SyncError) -> Error {
        match error {
            SyncError::Validation { message } => Error::invalid_request(message),
            SyncError::Timeout { elapsed_ms } => {
                Error::service_unavailable("profile store did not respond in time")
                    .with_details(json!({ "timeoutMs": elapsed_ms, "code": "transaction_timeout" }))
            }
            SyncError::Store(store_error) => Self::map_store_error(store_error),
        }
    }

    fn map_store_error(error: ProfileStoreError) -> Error {
        match error {
            ProfileStoreError::Connection { message } => {
                Error::service_unavailable(format!("profile store unavailable: {message}"))
            }
            ProfileStoreError::Timeout { message } => {
                Error::service_unavailable(format!("profile store timed out: {message}"))
            }
            ProfileStoreError::Query { message } => {
                Error::internal(format!("profile store error: {message}"))
            }
            ProfileStoreError::Constraint { message } => {
                Error::internal(format!("profile store constraint violated: {message}"))
            }
        }
    }
}

#[async_trait]
impl<S> ProfileQuery for ProfileSyncService<S>
where
    S: ProfileStore + ?Sized,
{
    async fn fetch_profile(
        &self,
        account: AccountId,
        request: ProfileRequest,
    ) -> Result<ProfileSnapshot, Error> {
        self.coordinator
            .read_profile(account, &request)
            .await
            .map_err(Self::map_sync_error)
    }

    async fn export(&self, account: AccountId) -> Result<ProfileExport, Error> {
        self.coordinator
            .export(account)
            .await
            .map_err(Self::map_sync_error)
    }

    async fn audit_log(
        &self,
        account: AccountId,
        limit: AuditLimit,
    ) -> Result<Vec<AuditEntry>, Error> {
        self.coordinator
            .audit_log(account, limit)
            .await
            .map_err(Self::map_sync_error)
    }
}

#[async_trait]
impl<S> ProfileCommand for ProfileSyncService<S>
where
    S: ProfileStore + ?Sized,
{
    async fn import_legacy(
        &self,
        account: AccountId,
        blob: LegacyBlob,
    ) -> Result<ImportOutcome, Error> {
        let batch = extract_import(&blob, self.coordinator.defaults())
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.coordinator
            .import_all(account, batch)
            .await
            .map_err(Self::map_sync_error)
    }

    async fn apply_updates(
        &self,
        account: AccountId,
        request: ProfileUpdateRequest,
    ) -> Result<UpdateOutcome, Error> {
        self.coordinator
            .apply_updates(account, request)
            .await
            .map_err(Self::map_sync_error)
    }

    async fn delete_all_data(&self, account: AccountId) -> Result<DeleteOutcome, Error> {
        self.coordinator
            .delete_all(account)
            .await
            .map_err(Self::map_sync_error)
    }
}
