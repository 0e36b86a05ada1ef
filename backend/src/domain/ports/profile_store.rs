//! Driven port for transactional profile persistence.
//!
//! Every read and write goes through a [`StoreTransaction`] obtained from
//! [`ProfileStore::begin`]. A transaction ends with exactly one of
//! [`StoreTransaction::commit`] or [`StoreTransaction::rollback`]; adapters
//! must discard the writes of a transaction that is dropped without either.
//!
//! Settings rows are keyed by account. Loadouts are keyed by account and
//! loadout id, annotations by account and item id; both also record the
//! platform profile they belong to, and scoped reads and deletes filter on it.
//! Audit entries are append-only per account and read newest first.

use async_trait::async_trait;

use crate::domain::{
    AccountId, AuditEntry, AuditLimit, AuditRecord, ItemAnnotation, ItemId, Loadout, LoadoutId, ProfileScope, ScopedAnnotation,
    ScopedLoadout, Settings,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by profile store adapters.
    pub enum ProfileStoreError {
        /// The store could not be reached.
        Connection { message: String } =>
            "profile store connection failed: {message}",
        /// A query or mutation failed.
        Query { message: String } =>
            "profile store query failed: {message}",
        /// A write violated a store constraint.
        Constraint { message: String } =>
            "profile store constraint violated: {message}",
        /// The store did not answer in time.
        Timeout { message: String } =>
            "profile store timed out: {message}",
    }
}

/// Isolation requested when opening a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionMode {
    /// Serializable read-write transaction.
    ReadWrite,
    /// Snapshot read that never blocks writers.
    ReadOnly,
}

/// Factory for store transactions.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Open a transaction.
    async fn begin(
        &self,
        mode: TransactionMode,
    ) -> Result<Box<dyn StoreTransaction>, ProfileStoreError>;
}

/// One open store transaction.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Stored settings delta, if any.
    async fn get_settings(
        &mut self,
        account: AccountId,
    ) -> Result<Option<Settings>, ProfileStoreError>;

    /// Replace the stored settings delta.
    async fn upsert_settings(
        &mut self,
        account: AccountId,
        delta: &Settings,
    ) -> Result<(), ProfileStoreError>;

    /// Remove the stored settings delta; `true` when a row existed.
    async fn delete_settings(&mut self, account: AccountId) -> Result<bool, ProfileStoreError>;

    /// Loadouts of one platform profile, ordered by id.
    async fn get_loadouts(&mut self, scope: &ProfileScope)
    -> Result<Vec<Loadout>, ProfileStoreError>;

    /// Every loadout of the account.
    async fn get_all_loadouts(
        &mut self,
        account: AccountId,
    ) -> Result<Vec<ScopedLoadout>, ProfileStoreError>;

    /// Insert or wholly replace a loadout.
    async fn upsert_loadout(
        &mut self,
        scope: &ProfileScope,
        loadout: &Loadout,
    ) -> Result<(), ProfileStoreError>;

    /// Remove one loadout; `true` when a row existed.
    async fn delete_loadout(
        &mut self,
        scope: &ProfileScope,
        id: &LoadoutId,
    ) -> Result<bool, ProfileStoreError>;

    /// Remove every loadout of the account, returning the count.
    async fn delete_all_loadouts(&mut self, account: AccountId) -> Result<u64, ProfileStoreError>;

    /// The account's annotation for an item, whichever platform profile
    /// last wrote it.
    async fn get_annotation(
        &mut self,
        account: AccountId,
        id: &ItemId,
    ) -> Result<Option<ItemAnnotation>, ProfileStoreError>;

    /// Annotations of one platform profile, ordered by item id.
    async fn get_annotations(
        &mut self,
        scope: &ProfileScope,
    ) -> Result<Vec<ItemAnnotation>, ProfileStoreError>;

    /// Every annotation of the account.
    async fn get_all_annotations(
        &mut self,
        account: AccountId,
    ) -> Result<Vec<ScopedAnnotation>, ProfileStoreError>;

    /// Insert or replace an annotation.
    async fn upsert_annotation(
        &mut self,
        scope: &ProfileScope,
        annotation: &ItemAnnotation,
    ) -> Result<(), ProfileStoreError>;

    /// Remove one annotation; `true` when a row existed.
    async fn delete_annotation(
        &mut self,
        account: AccountId,
        id: &ItemId,
    ) -> Result<bool, ProfileStoreError>;

    /// Remove the listed annotations, returning how many existed.
    async fn delete_annotations(
        &mut self,
        account: AccountId,
        ids: &[ItemId],
    ) -> Result<u64, ProfileStoreError>;

    /// Remove every annotation of the account, returning the count.
    async fn delete_all_annotations(
        &mut self,
        account: AccountId,
    ) -> Result<u64, ProfileStoreError>;

    /// Append an audit entry stamped with the current time.
    async fn record_audit(
        &mut self,
        account: AccountId,
        record: &AuditRecord,
    ) -> Result<(), ProfileStoreError>;

    /// The newest `limit` audit entries of the account, newest first.
    async fn get_audit_log(
        &mut self,
        account: AccountId,
        limit: AuditLimit,
    ) -> Result<Vec<AuditEntry>, ProfileStoreError>;

    /// Remove every audit entry of the account, returning the count.
    async fn delete_audit_log(&mut self, account: AccountId) -> Result<u64, ProfileStoreError>;

    /// Make the transaction's writes durable.
    async fn commit(self: Box<Self>) -> Result<(), ProfileStoreError>;

    /// Discard the transaction's writes.
    async fn rollback(self: Box<Self>) -> Result<(), ProfileStoreError>;
}

/// Fixture store whose transactions read nothing and accept every write.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProfileStore;

#[async_trait]
impl ProfileStore for FixtureProfileStore {
    async fn begin(
        &self,
        _mode: TransactionMode,
    ) -> Result<Box<dyn StoreTransaction>, ProfileStoreError> {
        Ok(Box::new(FixtureStoreTransaction))
    }
}

/// Transaction handed out by [`FixtureProfileStore`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureStoreTransaction;

#[async_trait]
impl StoreTransaction for FixtureStoreTransaction {
    async fn get_settings(
        &mut self,
        _account: AccountId,
    ) -> Result<Option<Settings>, ProfileStoreError> {
        Ok(None)
    }

    async fn upsert_settings(
        &mut self,
        _account: AccountId,
        _delta: &Settings,
    ) -> Result<(), ProfileStoreError> {
        Ok(())
    }

    async fn delete_settings(&mut self, _account: AccountId) -> Result<bool, ProfileStoreError> {
        Ok(false)
    }

    async fn get_loadouts(
        &mut self,
        _scope: &ProfileScope,
    ) -> Result<Vec<Loadout>, ProfileStoreError> {
        Ok(Vec::new())
    }

    async fn get_all_loadouts(
        &mut self,
        _account: AccountId,
    ) -> Result<Vec<ScopedLoadout>, ProfileStoreError> {
        Ok(Vec::new())
    }

    async fn upsert_loadout(
        &mut self,
        _scope: &ProfileScope,
        _loadout: &Loadout,
    ) -> Result<(), ProfileStoreError> {
        Ok(())
    }

    async fn delete_loadout(
        &mut self,
        _scope: &ProfileScope,
        _id: &LoadoutId,
    ) -> Result<bool, ProfileStoreError> {
        Ok(false)
    }

    async fn delete_all_loadouts(&mut self, _account: AccountId) -> Result<u64, ProfileStoreError> {
        Ok(0)
    }

    async fn get_annotation(
        &mut self,
        _account: AccountId,
        _id: &ItemId,
    ) -> Result<Option<ItemAnnotation>, ProfileStoreError> {
        Ok(None)
    }

    async fn get_annotations(
        &mut self,
        _scope: &ProfileScope,
    ) -> Result<Vec<ItemAnnotation>, ProfileStoreError> {
        Ok(Vec::new())
    }

    async fn get_all_annotations(
        &mut self,
        _account: AccountId,
    ) -> Result<Vec<ScopedAnnotation>, ProfileStoreError> {
        Ok(Vec::new())
    }

    async fn upsert_annotation(
        &mut self,
        _scope: &ProfileScope,
        _annotation: &ItemAnnotation,
    ) -> Result<(), ProfileStoreError> {
        Ok(())
    }

    async fn delete_annotation(
        &mut self,
        _account: AccountId,
        _id: &ItemId,
    ) -> Result<bool, ProfileStoreError> {
        Ok(false)
    }

    async fn delete_annotations(
        &mut self,
        _account: AccountId,
        _ids: &[ItemId],
    ) -> Result<u64, ProfileStoreError> {
        Ok(0)
    }

    async fn delete_all_annotations(
        &mut self,
        _account: AccountId,
    ) -> Result<u64, ProfileStoreError> {
        Ok(0)
    }

    async fn record_audit(
        &mut self,
        _account: AccountId,
        _record: &AuditRecord,
    ) -> Result<(), ProfileStoreError> {
        Ok(())
    }

    async fn get_audit_log(
        &mut self,
        _account: AccountId,
        _limit: AuditLimit,
    ) -> Result<Vec<AuditEntry>, ProfileStoreError> {
        Ok(Vec::new())
    }

    async fn delete_audit_log(&mut self, _account: AccountId) -> Result<u64, ProfileStoreError> {
        Ok(0)
    }

    async fn commit(self: Box<Self>) -> Result<(), ProfileStoreError> {
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), ProfileStoreError> {
        Ok(())
    }
}
