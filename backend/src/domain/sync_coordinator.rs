//! Atomic application of imports and profile updates.
//!
//! Every operation runs inside one store transaction held by a
//! [`TransactionScope`]. The scope moves from open to committed when the
//! operation succeeds and to rolled back on the first error. Dropping an open
//! scope (early return, cancellation, or the deadline firing) leaves the
//! transaction uncommitted and the store discards its writes. There is no
//! retry here; callers re-run a failed operation if they want to.
//!
//! Writes append their audit entry inside the same transaction.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::account::{AccountId, ProfileScope};
use super::audit::{AuditAction, AuditEntry, AuditLimit, AuditRecord};
use super::item_annotation::{AnnotationChange, AnnotationUpdate, reconcile};
use super::legacy_import::ImportBatch;
use super::ports::{ProfileStore, ProfileStoreError, StoreTransaction, TransactionMode};
use super::profile::{ProfileComponent, ProfileExport, ProfileRequest, ProfileSnapshot};
use super::profile_update::{ProfileUpdate, ProfileUpdateRequest};
use super::settings::DefaultSettings;

/// Default deadline for one transaction.
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Failures that abort a coordinated operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// The input is missing identifying fields or required scope.
    #[error("invalid profile change: {message}")]
    Validation {
        /// What was wrong.
        message: String,
    },
    /// The store failed; the transaction was rolled back.
    #[error(transparent)]
    Store(#[from] ProfileStoreError),
    /// The transaction exceeded its deadline and was abandoned.
    #[error("profile transaction exceeded {elapsed_ms} ms")]
    Timeout {
        /// Deadline that was exceeded.
        elapsed_ms: u64,
    },
}

impl SyncError {
    /// Build a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Counts reported after a legacy import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOutcome {
    /// Settings keys stored in the delta.
    pub settings: usize,
    /// Loadouts written.
    pub loadouts: usize,
    /// Annotations written or removed.
    pub tags: usize,
    /// Records dropped: dangling or unscoped loadouts and empty annotations.
    pub skipped: usize,
}

/// Result of one applied profile update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedUpdate {
    /// Action name of the update.
    pub action: &'static str,
    /// Whether any stored row changed.
    pub changed: bool,
}

/// Per-update results, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// One entry per update.
    pub applied: Vec<AppliedUpdate>,
}

/// Counts of rows removed by a full account purge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Whether a settings row existed.
    pub settings: bool,
    /// Loadouts removed.
    pub loadouts: u64,
    /// Annotations removed.
    pub tags: u64,
}

impl ImportOutcome {
    fn audit_payload(&self) -> Value {
        json!({
            "settings": self.settings,
            "loadouts": self.loadouts,
            "tags": self.tags,
            "skipped": self.skipped,
        })
    }
}

impl UpdateOutcome {
    fn audit_payload(&self) -> Value {
        let actions: Vec<&str> = self.applied.iter().map(|update| update.action).collect();
        let changed = self.applied.iter().filter(|update| update.changed).count();
        json!({ "actions": actions, "changed": changed })
    }
}

impl DeleteOutcome {
    fn audit_payload(&self) -> Value {
        json!({
            "settings": self.settings,
            "loadouts": self.loadouts,
            "tags": self.tags,
        })
    }
}

/// Owner of one open store transaction.
///
/// Consumed by [`TransactionScope::commit`], [`TransactionScope::rollback`], or
/// [`TransactionScope::finish`]. Dropping it while open logs a warning and
/// drops the transaction uncommitted.
pub struct TransactionScope {
    tx: Option<Box<dyn StoreTransaction>>,
    mode: TransactionMode,
}

impl TransactionScope {
    /// Open a transaction on `store`.
    pub async fn open<S>(store: &S, mode: TransactionMode) -> Result<Self, ProfileStoreError>
    where
        S: ProfileStore + ?Sized,
    {
        let tx = store.begin(mode).await?;
        debug!(?mode, "profile transaction opened");
        Ok(Self { tx: Some(tx), mode })
    }

    /// The open transaction.
    pub fn transaction(&mut self) -> Result<&mut dyn StoreTransaction, ProfileStoreError> {
        match self.tx.as_mut() {
            Some(tx) => Ok(tx.as_mut()),
            None => Err(ProfileStoreError::query("transaction already finished")),
        }
    }

    /// Commit the transaction.
    pub async fn commit(mut self) -> Result<(), ProfileStoreError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| ProfileStoreError::query("transaction already finished"))?;
        tx.commit().await?;
        debug!(mode = ?self.mode, "profile transaction committed");
        Ok(())
    }

    /// Roll the transaction back.
    pub async fn rollback(mut self) -> Result<(), ProfileStoreError> {
        let Some(tx) = self.tx.take() else {
            return Ok(());
        };
        warn!(mode = ?self.mode, "rolling back profile transaction");
        tx.rollback().await
    }

    /// Commit when `result` is `Ok`, roll back otherwise, and pass the
    /// result through. A failed commit replaces the result.
    pub async fn finish<T>(self, result: Result<T, SyncError>) -> Result<T, SyncError> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(error) => {
                if let Err(rollback_error) = self.rollback().await {
                    warn!(%rollback_error, "rollback failed; store discards the transaction");
                }
                Err(error)
            }
        }
    }
}

impl Drop for TransactionScope {
    fn drop(&mut self) {
        if self.tx.is_some() {
            warn!(mode = ?self.mode, "profile transaction dropped while open; discarding writes");
        }
    }
}

/// Applies imports, updates, purges, and reads against a [`ProfileStore`].
pub struct SyncCoordinator<S: ?Sized> {
    store: Arc<S>,
    defaults: DefaultSettings,
    timeout: Duration,
}

impl<S: ?Sized> Clone for SyncCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            defaults: self.defaults.clone(),
            timeout: self.timeout,
        }
    }
}

impl<S> SyncCoordinator<S>
where
    S: ProfileStore + ?Sized,
{
    /// Coordinate operations on `store` using `defaults` and a per-transaction
    /// deadline.
    pub fn new(store: Arc<S>, defaults: DefaultSettings, timeout: Duration) -> Self {
        Self {
            store,
            defaults,
            timeout,
        }
    }

    /// Default settings in use.
    pub fn defaults(&self) -> &DefaultSettings {
        &self.defaults
    }

    /// Apply an extracted legacy snapshot: settings, then loadouts, then
    /// annotations, all or nothing.
    pub async fn import_all(
        &self,
        account: AccountId,
        batch: ImportBatch,
    ) -> Result<ImportOutcome, SyncError> {
        let outcome = self
            .within_deadline(async {
                let mut scope =
                    TransactionScope::open(self.store.as_ref(), TransactionMode::ReadWrite).await?;
                let result = apply_import(scope.transaction()?, account, batch).await;
                scope.finish(result).await
            })
            .await?;
        info!(
            account_id = %account,
            loadouts = outcome.loadouts,
            tags = outcome.tags,
            skipped = outcome.skipped,
            "legacy import committed"
        );
        Ok(outcome)
    }

    /// Apply a batch of direct updates, all or nothing.
    ///
    /// Scoped updates without a platform profile fail validation before the
    /// transaction opens.
    pub async fn apply_updates(
        &self,
        account: AccountId,
        request: ProfileUpdateRequest,
    ) -> Result<UpdateOutcome, SyncError> {
        let scope = request.scope().map(|platform| platform.for_account(account));
        let unscoped = request.updates.iter().find(|update| update.needs_scope());
        if let (None, Some(update)) = (&scope, unscoped) {
            return Err(SyncError::validation(format!(
                "platformMembershipId is required for `{}` updates",
                update.action()
            )));
        }

        self.within_deadline(async {
            let mut tx_scope =
                TransactionScope::open(self.store.as_ref(), TransactionMode::ReadWrite).await?;
            let result = apply_updates(
                tx_scope.transaction()?,
                &self.defaults,
                account,
                scope.as_ref(),
                request.updates,
            )
            .await;
            tx_scope.finish(result).await
        })
        .await
    }

    /// Remove every stored record of the account.
    pub async fn delete_all(&self, account: AccountId) -> Result<DeleteOutcome, SyncError> {
        let outcome = self
            .within_deadline(async {
                let mut scope =
                    TransactionScope::open(self.store.as_ref(), TransactionMode::ReadWrite).await?;
                let result = delete_all(scope.transaction()?, account).await;
                scope.finish(result).await
            })
            .await?;
        info!(
            account_id = %account,
            loadouts = outcome.loadouts,
            tags = outcome.tags,
            "account data deleted"
        );
        Ok(outcome)
    }

    /// Read the requested profile sections in one read-only transaction.
    pub async fn read_profile(
        &self,
        account: AccountId,
        request: &ProfileRequest,
    ) -> Result<ProfileSnapshot, SyncError> {
        self.within_deadline(async {
            let mut scope =
                TransactionScope::open(self.store.as_ref(), TransactionMode::ReadOnly).await?;
            let result = read_profile(scope.transaction()?, &self.defaults, account, request).await;
            scope.finish(result).await
        })
        .await
    }

    /// Read everything stored for the account in one read-only transaction.
    pub async fn export(&self, account: AccountId) -> Result<ProfileExport, SyncError> {
        self.within_deadline(async {
            let mut scope =
                TransactionScope::open(self.store.as_ref(), TransactionMode::ReadOnly).await?;
            let result = export(scope.transaction()?, &self.defaults, account).await;
            scope.finish(result).await
        })
        .await
    }

    /// Read the newest audit entries in one read-only transaction.
    pub async fn audit_log(
        &self,
        account: AccountId,
        limit: AuditLimit,
    ) -> Result<Vec<AuditEntry>, SyncError> {
        self.within_deadline(async {
            let mut scope =
                TransactionScope::open(self.store.as_ref(), TransactionMode::ReadOnly).await?;
            let result = scope
                .transaction()?
                .get_audit_log(account, limit)
                .await
                .map_err(SyncError::from);
            scope.finish(result).await
        })
        .await
    }

    async fn within_deadline<T, F>(&self, operation: F) -> Result<T, SyncError>
    where
        F: Future<Output = Result<T, SyncError>>,
    {
        if let Ok(result) = tokio::time::timeout(self.timeout, operation).await {
            return result;
        }
        let elapsed_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
        warn!(elapsed_ms, "profile transaction timed out; rolled back");
        Err(SyncError::Timeout { elapsed_ms })
    }
}

async fn apply_import(
    tx: &mut dyn StoreTransaction,
    account: AccountId,
    batch: ImportBatch,
) -> Result<ImportOutcome, SyncError> {
    let ImportBatch {
        settings,
        loadouts,
        annotations,
        dropped_loadouts,
    } = batch;
    let mut outcome = ImportOutcome {
        settings: settings.len(),
        skipped: dropped_loadouts,
        ..ImportOutcome::default()
    };

    tx.upsert_settings(account, &settings).await?;

    for entry in loadouts {
        let Some(platform) = entry.scope else {
            warn!(
                account_id = %account,
                loadout_id = %entry.loadout.id,
                "skipping loadout without platform or version"
            );
            outcome.skipped += 1;
            continue;
        };
        tx.upsert_loadout(&platform.for_account(account), &entry.loadout)
            .await?;
        outcome.loadouts += 1;
    }

    for entry in annotations {
        let scope = entry.scope.for_account(account);
        if apply_annotation(tx, &scope, entry.update).await? {
            outcome.tags += 1;
        } else {
            outcome.skipped += 1;
        }
    }

    tx.record_audit(
        account,
        &AuditRecord::new(AuditAction::Import, outcome.audit_payload()),
    )
    .await?;
    Ok(outcome)
}

async fn apply_updates(
    tx: &mut dyn StoreTransaction,
    defaults: &DefaultSettings,
    account: AccountId,
    scope: Option<&ProfileScope>,
    updates: Vec<ProfileUpdate>,
) -> Result<UpdateOutcome, SyncError> {
    let mut outcome = UpdateOutcome {
        applied: Vec::with_capacity(updates.len()),
    };
    for update in updates {
        let action = update.action();
        let changed = apply_update(tx, defaults, account, scope, update).await?;
        debug!(account_id = %account, action, changed, "profile update applied");
        outcome.applied.push(AppliedUpdate { action, changed });
    }
    let record = AuditRecord::new(AuditAction::Update, outcome.audit_payload())
        .with_scope(scope.map(|scope| scope.platform.clone()));
    tx.record_audit(account, &record).await?;
    Ok(outcome)
}

async fn apply_update(
    tx: &mut dyn StoreTransaction,
    defaults: &DefaultSettings,
    account: AccountId,
    scope: Option<&ProfileScope>,
    update: ProfileUpdate,
) -> Result<bool, SyncError> {
    let require_scope = || {
        scope.ok_or_else(|| SyncError::validation("platformMembershipId is required"))
    };
    match update {
        ProfileUpdate::Setting(partial) => {
            let stored = tx.get_settings(account).await?.unwrap_or_default();
            let delta = defaults.apply_partial(&stored, &partial);
            let changed = delta != stored;
            tx.upsert_settings(account, &delta).await?;
            Ok(changed)
        }
        ProfileUpdate::Loadout(loadout) => {
            tx.upsert_loadout(require_scope()?, &loadout).await?;
            Ok(true)
        }
        ProfileUpdate::DeleteLoadout(id) => Ok(tx.delete_loadout(require_scope()?, &id).await?),
        ProfileUpdate::Tag(annotation) => apply_annotation(tx, require_scope()?, annotation).await,
        ProfileUpdate::TagCleanup(ids) => Ok(tx.delete_annotations(account, &ids).await? > 0),
    }
}

/// Route one annotation update through the reconciler and issue its write.
/// Returns `false` when nothing was stored or removed.
async fn apply_annotation(
    tx: &mut dyn StoreTransaction,
    scope: &ProfileScope,
    update: AnnotationUpdate,
) -> Result<bool, SyncError> {
    let existing = tx.get_annotation(scope.account_id, &update.id).await?;
    match reconcile(existing.as_ref(), update) {
        AnnotationChange::Upsert(annotation) => {
            tx.upsert_annotation(scope, &annotation).await?;
            Ok(true)
        }
        AnnotationChange::Delete(id) => {
            tx.delete_annotation(scope.account_id, &id).await?;
            Ok(true)
        }
        AnnotationChange::Skip => {
            debug!(account_id = %scope.account_id, "annotation update left nothing to store");
            Ok(false)
        }
    }
}

async fn delete_all(
    tx: &mut dyn StoreTransaction,
    account: AccountId,
) -> Result<DeleteOutcome, SyncError> {
    let outcome = DeleteOutcome {
        settings: tx.delete_settings(account).await?,
        loadouts: tx.delete_all_loadouts(account).await?,
        tags: tx.delete_all_annotations(account).await?,
    };
    let purged = tx.delete_audit_log(account).await?;
    debug!(account_id = %account, purged, "audit log purged");
    tx.record_audit(
        account,
        &AuditRecord::new(AuditAction::DeleteAll, outcome.audit_payload()),
    )
    .await?;
    Ok(outcome)
}

async fn read_profile(
    tx: &mut dyn StoreTransaction,
    defaults: &DefaultSettings,
    account: AccountId,
    request: &ProfileRequest,
) -> Result<ProfileSnapshot, SyncError> {
    let components = request.components();
    let scope = request.scope().cloned().map(|platform| platform.for_account(account));
    let mut snapshot = ProfileSnapshot::default();

    if components.contains(ProfileComponent::Settings) {
        let stored = tx.get_settings(account).await?.unwrap_or_default();
        snapshot.settings = Some(defaults.merge(&stored));
    }
    if let Some(scope) = scope.as_ref() {
        if components.contains(ProfileComponent::Loadouts) {
            snapshot.loadouts = Some(tx.get_loadouts(scope).await?);
        }
        if components.contains(ProfileComponent::Tags) {
            snapshot.tags = Some(tx.get_annotations(scope).await?);
        }
    }
    Ok(snapshot)
}

async fn export(
    tx: &mut dyn StoreTransaction,
    defaults: &DefaultSettings,
    account: AccountId,
) -> Result<ProfileExport, SyncError> {
    let stored = tx.get_settings(account).await?.unwrap_or_default();
    Ok(ProfileExport {
        settings: defaults.merge(&stored),
        loadouts: tx.get_all_loadouts(account).await?,
        tags: tx.get_all_annotations(account).await?,
    })
}

#[cfg(test)]
#[path = "sync_coordinator_tests.rs"]
mod tests;
