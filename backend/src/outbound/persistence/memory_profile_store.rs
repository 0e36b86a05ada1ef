//! In-process profile store.
//!
//! Each transaction reads from a snapshot taken when it began and records its
//! writes in a log. Commit replays the log onto the shared tables, so the last
//! committed writer wins per row. Rollback or drop discards the log.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::domain::ports::{ProfileStore, ProfileStoreError, StoreTransaction, TransactionMode};
use crate::domain::{
    AccountId, AuditEntry, AuditLimit, AuditRecord, ItemAnnotation, ItemId, Loadout, LoadoutId, PlatformScope, ProfileScope,
    ScopedAnnotation, ScopedLoadout, Settings,
};

#[derive(Debug, Clone, Default)]
struct Tables {
    settings: BTreeMap<AccountId, Settings>,
    loadouts: BTreeMap<(AccountId, LoadoutId), (PlatformScope, Loadout)>,
    annotations: BTreeMap<(AccountId, ItemId), (PlatformScope, ItemAnnotation)>,
    audit: BTreeMap<AccountId, Vec<AuditEntry>>,
}

#[derive(Debug, Clone)]
enum Write {
    UpsertSettings(AccountId, Settings),
    DeleteSettings(AccountId),
    UpsertLoadout(AccountId, PlatformScope, Loadout),
    DeleteLoadout(AccountId, LoadoutId),
    UpsertAnnotation(AccountId, PlatformScope, ItemAnnotation),
    DeleteAnnotation(AccountId, ItemId),
    AppendAudit(AccountId, AuditEntry),
    DeleteAudit(AccountId),
}

impl Tables {
    fn apply(&mut self, write: Write) {
        match write {
            Write::UpsertSettings(account, delta) => {
                self.settings.insert(account, delta);
            }
            Write::DeleteSettings(account) => {
                self.settings.remove(&account);
            }
            Write::UpsertLoadout(account, scope, loadout) => {
                self.loadouts
                    .insert((account, loadout.id.clone()), (scope, loadout));
            }
            Write::DeleteLoadout(account, id) => {
                self.loadouts.remove(&(account, id));
            }
            Write::UpsertAnnotation(account, scope, annotation) => {
                self.annotations
                    .insert((account, annotation.id.clone()), (scope, annotation));
            }
            Write::DeleteAnnotation(account, id) => {
                self.annotations.remove(&(account, id));
            }
            Write::AppendAudit(account, entry) => {
                self.audit.entry(account).or_default().push(entry);
            }
            Write::DeleteAudit(account) => {
                self.audit.remove(&account);
            }
        }
    }
}

/// Profile store kept in process memory.
///
/// Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryProfileStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, ProfileStoreError> {
        self.tables
            .lock()
            .map_err(|_| ProfileStoreError::connection("memory store lock poisoned"))
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn begin(
        &self,
        mode: TransactionMode,
    ) -> Result<Box<dyn StoreTransaction>, ProfileStoreError> {
        let snapshot = self.lock()?.clone();
        Ok(Box::new(MemoryTransaction {
            store: self.clone(),
            snapshot,
            log: Vec::new(),
            mode,
        }))
    }
}

struct MemoryTransaction {
    store: MemoryProfileStore,
    snapshot: Tables,
    log: Vec<Write>,
    mode: TransactionMode,
}

impl MemoryTransaction {
    fn write(&mut self, write: Write) -> Result<(), ProfileStoreError> {
        if self.mode == TransactionMode::ReadOnly {
            return Err(ProfileStoreError::query(
                "cannot write in a read-only transaction",
            ));
        }
        self.snapshot.apply(write.clone());
        self.log.push(write);
        Ok(())
    }

    fn scoped_loadouts(&self, account: AccountId) -> impl Iterator<Item = ScopedLoadout> + '_ {
        self.snapshot
            .loadouts
            .iter()
            .filter(move |((owner, _), _)| *owner == account)
            .map(|(_, (scope, loadout))| ScopedLoadout {
                scope: scope.clone(),
                loadout: loadout.clone(),
            })
    }

    fn scoped_annotations(
        &self,
        account: AccountId,
    ) -> impl Iterator<Item = ScopedAnnotation> + '_ {
        self.snapshot
            .annotations
            .iter()
            .filter(move |((owner, _), _)| *owner == account)
            .map(|(_, (scope, annotation))| ScopedAnnotation {
                scope: scope.clone(),
                annotation: annotation.clone(),
            })
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn get_settings(
        &mut self,
        account: AccountId,
    ) -> Result<Option<Settings>, ProfileStoreError> {
        Ok(self.snapshot.settings.get(&account).cloned())
    }

    async fn upsert_settings(
        &mut self,
        account: AccountId,
        delta: &Settings,
    ) -> Result<(), ProfileStoreError> {
        self.write(Write::UpsertSettings(account, delta.clone()))
    }

    async fn delete_settings(&mut self, account: AccountId) -> Result<bool, ProfileStoreError> {
        let existed = self.snapshot.settings.contains_key(&account);
        self.write(Write::DeleteSettings(account))?;
        Ok(existed)
    }

    async fn get_loadouts(
        &mut self,
        scope: &ProfileScope,
    ) -> Result<Vec<Loadout>, ProfileStoreError> {
        Ok(self
            .scoped_loadouts(scope.account_id)
            .filter(|entry| entry.scope == scope.platform)
            .map(|entry| entry.loadout)
            .collect())
    }

    async fn get_all_loadouts(
        &mut self,
        account: AccountId,
    ) -> Result<Vec<ScopedLoadout>, ProfileStoreError> {
        Ok(self.scoped_loadouts(account).collect())
    }

    async fn upsert_loadout(
        &mut self,
        scope: &ProfileScope,
        loadout: &Loadout,
    ) -> Result<(), ProfileStoreError> {
        self.write(Write::UpsertLoadout(
            scope.account_id,
            scope.platform.clone(),
            loadout.clone(),
        ))
    }

    async fn delete_loadout(
        &mut self,
        scope: &ProfileScope,
        id: &LoadoutId,
    ) -> Result<bool, ProfileStoreError> {
        let key = (scope.account_id, id.clone());
        let existed = self
            .snapshot
            .loadouts
            .get(&key)
            .is_some_and(|(owner, _)| *owner == scope.platform);
        if existed {
            self.write(Write::DeleteLoadout(key.0, key.1))?;
        }
        Ok(existed)
    }

    async fn delete_all_loadouts(&mut self, account: AccountId) -> Result<u64, ProfileStoreError> {
        let ids: Vec<LoadoutId> = self
            .scoped_loadouts(account)
            .map(|entry| entry.loadout.id)
            .collect();
        for id in &ids {
            self.write(Write::DeleteLoadout(account, id.clone()))?;
        }
        Ok(ids.len() as u64)
    }

    async fn get_annotation(
        &mut self,
        account: AccountId,
        id: &ItemId,
    ) -> Result<Option<ItemAnnotation>, ProfileStoreError> {
        Ok(self
            .snapshot
            .annotations
            .get(&(account, id.clone()))
            .map(|(_, annotation)| annotation.clone()))
    }

    async fn get_annotations(
        &mut self,
        scope: &ProfileScope,
    ) -> Result<Vec<ItemAnnotation>, ProfileStoreError> {
        Ok(self
            .scoped_annotations(scope.account_id)
            .filter(|entry| entry.scope == scope.platform)
            .map(|entry| entry.annotation)
            .collect())
    }

    async fn get_all_annotations(
        &mut self,
        account: AccountId,
    ) -> Result<Vec<ScopedAnnotation>, ProfileStoreError> {
        Ok(self.scoped_annotations(account).collect())
    }

    async fn upsert_annotation(
        &mut self,
        scope: &ProfileScope,
        annotation: &ItemAnnotation,
    ) -> Result<(), ProfileStoreError> {
        self.write(Write::UpsertAnnotation(
            scope.account_id,
            scope.platform.clone(),
            annotation.clone(),
        ))
    }

    async fn delete_annotation(
        &mut self,
        account: AccountId,
        id: &ItemId,
    ) -> Result<bool, ProfileStoreError> {
        let existed = self
            .snapshot
            .annotations
            .contains_key(&(account, id.clone()));
        if existed {
            self.write(Write::DeleteAnnotation(account, id.clone()))?;
        }
        Ok(existed)
    }

    async fn delete_annotations(
        &mut self,
        account: AccountId,
        ids: &[ItemId],
    ) -> Result<u64, ProfileStoreError> {
        let mut removed = 0;
        for id in ids {
            if self.delete_annotation(account, id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn delete_all_annotations(
        &mut self,
        account: AccountId,
    ) -> Result<u64, ProfileStoreError> {
        let ids: Vec<ItemId> = self
            .scoped_annotations(account)
            .map(|entry| entry.annotation.id)
            .collect();
        self.delete_annotations(account, &ids).await
    }

    async fn record_audit(
        &mut self,
        account: AccountId,
        record: &AuditRecord,
    ) -> Result<(), ProfileStoreError> {
        self.write(Write::AppendAudit(
            account,
            record.clone().stamped(Utc::now()),
        ))
    }

    async fn get_audit_log(
        &mut self,
        account: AccountId,
        limit: AuditLimit,
    ) -> Result<Vec<AuditEntry>, ProfileStoreError> {
        let take = usize::try_from(limit.get()).unwrap_or(usize::MAX);
        Ok(self
            .snapshot
            .audit
            .get(&account)
            .map(|entries| entries.iter().rev().take(take).cloned().collect())
            .unwrap_or_default())
    }

    async fn delete_audit_log(&mut self, account: AccountId) -> Result<u64, ProfileStoreError> {
        let existing = self.snapshot.audit.get(&account).map_or(0, Vec::len);
        if existing > 0 {
            self.write(Write::DeleteAudit(account))?;
        }
        Ok(existing as u64)
    }

    async fn commit(self: Box<Self>) -> Result<(), ProfileStoreError> {
        let Self { store, log, .. } = *self;
        let writes = log.len();
        let mut tables = store.lock()?;
        for write in log {
            tables.apply(write);
        }
        debug!(writes, "memory transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), ProfileStoreError> {
        debug!(discarded = self.log.len(), "memory transaction rolled back");
        Ok(())
    }
}
