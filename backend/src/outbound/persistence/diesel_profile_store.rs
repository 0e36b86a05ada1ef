//! PostgreSQL-backed `ProfileStore` implementation using Diesel ORM.
//!
//! Each store transaction owns one pooled connection for its lifetime and
//! drives the Diesel-async transaction manager directly: read-write
//! transactions run `SERIALIZABLE`, read-only ones run as a `REPEATABLE READ
//! READ ONLY` snapshot. Dropping a transaction without committing returns the
//! connection mid-transaction; the pool discards it and the server rolls the
//! work back.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::{AnsiTransactionManager, RunQueryDsl, TransactionManager};
use tracing::{debug, warn};

use crate::domain::ports::{ProfileStore, ProfileStoreError, StoreTransaction, TransactionMode};
use crate::domain::{
    AccountId, AuditAction, AuditEntry, AuditLimit, AuditRecord, CharacterClass, DestinyVersion, ItemAnnotation, ItemId, Loadout, LoadoutId,
    PlatformMembershipId, PlatformScope, ProfileScope, ScopedAnnotation, ScopedLoadout, Settings,
    TagValue,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    AuditLogRow, ItemAnnotationRow, NewAuditLogRow, LoadoutItemsColumn, LoadoutRow, NewItemAnnotationRow, NewLoadoutRow,
    NewSettingsRow, SettingsRow,
};
use super::pool::{DbPool, OwnedConnection};
use super::schema::{audit_log, item_annotations, loadouts, settings};

const BEGIN_READ_WRITE: &str = "BEGIN TRANSACTION ISOLATION LEVEL SERIALIZABLE";
const BEGIN_READ_ONLY: &str = "BEGIN TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY";

/// Diesel-backed implementation of the `ProfileStore` port.
#[derive(Clone)]
pub struct DieselProfileStore {
    pool: DbPool,
}

impl DieselProfileStore {
    /// Create a new store with the given connection pool.
    #[must_use]
    pub const fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileStore for DieselProfileStore {
    async fn begin(
        &self,
        mode: TransactionMode,
    ) -> Result<Box<dyn StoreTransaction>, ProfileStoreError> {
        let mut conn = self.pool.get_owned().await.map_err(map_pool_error)?;
        let sql = match mode {
            TransactionMode::ReadWrite => BEGIN_READ_WRITE,
            TransactionMode::ReadOnly => BEGIN_READ_ONLY,
        };
        AnsiTransactionManager::begin_transaction_sql(&mut *conn, sql)
            .await
            .map_err(map_diesel_error)?;
        debug!(?mode, "store transaction opened");
        Ok(Box::new(DieselTransaction { conn }))
    }
}

/// Open transaction on one pooled connection.
struct DieselTransaction {
    conn: OwnedConnection,
}

fn affected(rows: usize) -> u64 {
    u64::try_from(rows).unwrap_or(u64::MAX)
}

fn stored_version(row_version: i16) -> Result<DestinyVersion, ProfileStoreError> {
    DestinyVersion::try_from(i64::from(row_version))
        .map_err(|_| ProfileStoreError::query(format!("stored destiny version {row_version}")))
}

fn stored_scope(
    platform_membership_id: String,
    destiny_version: i16,
) -> Result<PlatformScope, ProfileStoreError> {
    let membership = PlatformMembershipId::new(platform_membership_id)
        .map_err(|err| ProfileStoreError::query(err.to_string()))?;
    Ok(PlatformScope::new(membership, stored_version(destiny_version)?))
}

fn row_to_settings(row: SettingsRow) -> Result<Settings, ProfileStoreError> {
    match row.settings {
        serde_json::Value::Object(map) => Ok(Settings::from(map)),
        other => Err(ProfileStoreError::query(format!(
            "stored settings are not an object: {other}"
        ))),
    }
}

fn row_to_loadout(row: LoadoutRow) -> Result<ScopedLoadout, ProfileStoreError> {
    let scope = stored_scope(row.platform_membership_id, row.destiny_version)?;
    let id = LoadoutId::new(row.id).map_err(|err| ProfileStoreError::query(err.to_string()))?;
    let class_type = CharacterClass::from_class_type(row.class_type)
        .map_err(|err| ProfileStoreError::query(err.to_string()))?;
    let items: LoadoutItemsColumn = serde_json::from_value(row.items)
        .map_err(|err| ProfileStoreError::query(format!("stored loadout items: {err}")))?;
    Ok(ScopedLoadout {
        scope,
        loadout: Loadout {
            id,
            name: row.name,
            class_type,
            clear_space: row.clear_space,
            equipped: items.equipped,
            unequipped: items.unequipped,
        },
    })
}

fn row_to_annotation(row: ItemAnnotationRow) -> Result<ScopedAnnotation, ProfileStoreError> {
    let scope = stored_scope(row.platform_membership_id, row.destiny_version)?;
    let id = ItemId::new(row.inventory_item_id)
        .map_err(|err| ProfileStoreError::query(err.to_string()))?;
    let tag = row.tag.and_then(|raw| match raw.parse::<TagValue>() {
        Ok(tag) => Some(tag),
        Err(_) => {
            warn!(value = raw.as_str(), item_id = %id, "unrecognised stored tag, ignoring");
            None
        }
    });
    Ok(ScopedAnnotation {
        scope,
        annotation: ItemAnnotation {
            id,
            tag,
            notes: row.notes.filter(|notes| !notes.is_empty()),
        },
    })
}

fn row_to_audit_entry(row: AuditLogRow) -> Result<AuditEntry, ProfileStoreError> {
    let action = row
        .action
        .parse::<AuditAction>()
        .map_err(|err| ProfileStoreError::query(err.to_string()))?;
    let scope = match (row.platform_membership_id, row.destiny_version) {
        (Some(membership), Some(version)) => Some(stored_scope(membership, version)?),
        _ => None,
    };
    Ok(AuditEntry {
        action,
        scope,
        payload: row.payload,
        created_at: row.created_at,
    })
}

fn collect<R, T>(
    rows: Vec<R>,
    convert: fn(R) -> Result<T, ProfileStoreError>,
) -> Result<Vec<T>, ProfileStoreError> {
    rows.into_iter().map(convert).collect()
}

#[async_trait]
impl StoreTransaction for DieselTransaction {
    async fn get_settings(
        &mut self,
        account: AccountId,
    ) -> Result<Option<Settings>, ProfileStoreError> {
        let row: Option<SettingsRow> = settings::table
            .filter(settings::account_id.eq(account.get()))
            .select(SettingsRow::as_select())
            .first(&mut *self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_settings).transpose()
    }

    async fn upsert_settings(
        &mut self,
        account: AccountId,
        delta: &Settings,
    ) -> Result<(), ProfileStoreError> {
        let value = delta.clone().into_value();
        let new_row = NewSettingsRow {
            account_id: account.get(),
            settings: &value,
        };
        diesel::insert_into(settings::table)
            .values(&new_row)
            .on_conflict(settings::account_id)
            .do_update()
            .set((
                settings::settings_json.eq(excluded(settings::settings_json)),
                settings::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut *self.conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete_settings(&mut self, account: AccountId) -> Result<bool, ProfileStoreError> {
        let deleted = diesel::delete(settings::table.filter(settings::account_id.eq(account.get())))
            .execute(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn get_loadouts(
        &mut self,
        scope: &ProfileScope,
    ) -> Result<Vec<Loadout>, ProfileStoreError> {
        let rows: Vec<LoadoutRow> = loadouts::table
            .filter(loadouts::account_id.eq(scope.account_id.get()))
            .filter(loadouts::platform_membership_id.eq(scope.platform_membership_id().as_str()))
            .filter(loadouts::destiny_version.eq(scope.destiny_version().as_number()))
            .order(loadouts::id.asc())
            .select(LoadoutRow::as_select())
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(collect(rows, row_to_loadout)?
            .into_iter()
            .map(|scoped| scoped.loadout)
            .collect())
    }

    async fn get_all_loadouts(
        &mut self,
        account: AccountId,
    ) -> Result<Vec<ScopedLoadout>, ProfileStoreError> {
        let rows: Vec<LoadoutRow> = loadouts::table
            .filter(loadouts::account_id.eq(account.get()))
            .order(loadouts::id.asc())
            .select(LoadoutRow::as_select())
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        collect(rows, row_to_loadout)
    }

    async fn upsert_loadout(
        &mut self,
        scope: &ProfileScope,
        loadout: &Loadout,
    ) -> Result<(), ProfileStoreError> {
        let items = serde_json::to_value(LoadoutItemsColumn {
            equipped: loadout.equipped.clone(),
            unequipped: loadout.unequipped.clone(),
        })
        .map_err(|err| ProfileStoreError::query(format!("loadout items: {err}")))?;
        let new_row = NewLoadoutRow {
            account_id: scope.account_id.get(),
            id: loadout.id.as_str(),
            platform_membership_id: scope.platform_membership_id().as_str(),
            destiny_version: scope.destiny_version().as_number(),
            name: loadout.name.as_str(),
            class_type: loadout.class_type.class_type(),
            clear_space: loadout.clear_space,
            items,
        };
        diesel::insert_into(loadouts::table)
            .values(&new_row)
            .on_conflict((loadouts::account_id, loadouts::id))
            .do_update()
            .set((&new_row, loadouts::updated_at.eq(diesel::dsl::now)))
            .execute(&mut *self.conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete_loadout(
        &mut self,
        scope: &ProfileScope,
        id: &LoadoutId,
    ) -> Result<bool, ProfileStoreError> {
        let deleted = diesel::delete(
            loadouts::table
                .filter(loadouts::account_id.eq(scope.account_id.get()))
                .filter(loadouts::id.eq(id.as_str()))
                .filter(loadouts::platform_membership_id.eq(scope.platform_membership_id().as_str()))
                .filter(loadouts::destiny_version.eq(scope.destiny_version().as_number())),
        )
        .execute(&mut *self.conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn delete_all_loadouts(&mut self, account: AccountId) -> Result<u64, ProfileStoreError> {
        diesel::delete(loadouts::table.filter(loadouts::account_id.eq(account.get())))
            .execute(&mut *self.conn)
            .await
            .map(affected)
            .map_err(map_diesel_error)
    }

    async fn get_annotation(
        &mut self,
        account: AccountId,
        id: &ItemId,
    ) -> Result<Option<ItemAnnotation>, ProfileStoreError> {
        let row: Option<ItemAnnotationRow> = item_annotations::table
            .filter(item_annotations::account_id.eq(account.get()))
            .filter(item_annotations::inventory_item_id.eq(id.as_str()))
            .select(ItemAnnotationRow::as_select())
            .first(&mut *self.conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row
            .map(row_to_annotation)
            .transpose()?
            .map(|scoped| scoped.annotation))
    }

    async fn get_annotations(
        &mut self,
        scope: &ProfileScope,
    ) -> Result<Vec<ItemAnnotation>, ProfileStoreError> {
        let rows: Vec<ItemAnnotationRow> = item_annotations::table
            .filter(item_annotations::account_id.eq(scope.account_id.get()))
            .filter(
                item_annotations::platform_membership_id
                    .eq(scope.platform_membership_id().as_str()),
            )
            .filter(item_annotations::destiny_version.eq(scope.destiny_version().as_number()))
            .order(item_annotations::inventory_item_id.asc())
            .select(ItemAnnotationRow::as_select())
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(collect(rows, row_to_annotation)?
            .into_iter()
            .map(|scoped| scoped.annotation)
            .collect())
    }

    async fn get_all_annotations(
        &mut self,
        account: AccountId,
    ) -> Result<Vec<ScopedAnnotation>, ProfileStoreError> {
        let rows: Vec<ItemAnnotationRow> = item_annotations::table
            .filter(item_annotations::account_id.eq(account.get()))
            .order(item_annotations::inventory_item_id.asc())
            .select(ItemAnnotationRow::as_select())
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        collect(rows, row_to_annotation)
    }

    async fn upsert_annotation(
        &mut self,
        scope: &ProfileScope,
        annotation: &ItemAnnotation,
    ) -> Result<(), ProfileStoreError> {
        let new_row = NewItemAnnotationRow {
            account_id: scope.account_id.get(),
            inventory_item_id: annotation.id.as_str(),
            platform_membership_id: scope.platform_membership_id().as_str(),
            destiny_version: scope.destiny_version().as_number(),
            tag: annotation.tag.map(TagValue::as_str),
            notes: annotation.notes.as_deref(),
        };
        diesel::insert_into(item_annotations::table)
            .values(&new_row)
            .on_conflict((item_annotations::account_id, item_annotations::inventory_item_id))
            .do_update()
            .set((&new_row, item_annotations::updated_at.eq(diesel::dsl::now)))
            .execute(&mut *self.conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn delete_annotation(
        &mut self,
        account: AccountId,
        id: &ItemId,
    ) -> Result<bool, ProfileStoreError> {
        let deleted = diesel::delete(
            item_annotations::table
                .filter(item_annotations::account_id.eq(account.get()))
                .filter(item_annotations::inventory_item_id.eq(id.as_str())),
        )
        .execute(&mut *self.conn)
        .await
        .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn delete_annotations(
        &mut self,
        account: AccountId,
        ids: &[ItemId],
    ) -> Result<u64, ProfileStoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let raw_ids: Vec<&str> = ids.iter().map(ItemId::as_str).collect();
        diesel::delete(
            item_annotations::table
                .filter(item_annotations::account_id.eq(account.get()))
                .filter(item_annotations::inventory_item_id.eq_any(raw_ids)),
        )
        .execute(&mut *self.conn)
        .await
        .map(affected)
        .map_err(map_diesel_error)
    }

    async fn delete_all_annotations(
        &mut self,
        account: AccountId,
    ) -> Result<u64, ProfileStoreError> {
        diesel::delete(item_annotations::table.filter(item_annotations::account_id.eq(account.get())))
            .execute(&mut *self.conn)
            .await
            .map(affected)
            .map_err(map_diesel_error)
    }

    async fn record_audit(
        &mut self,
        account: AccountId,
        record: &AuditRecord,
    ) -> Result<(), ProfileStoreError> {
        let new_row = NewAuditLogRow {
            account_id: account.get(),
            action: record.action.as_str(),
            platform_membership_id: record
                .scope
                .as_ref()
                .map(|scope| scope.platform_membership_id.as_str()),
            destiny_version: record
                .scope
                .as_ref()
                .map(|scope| scope.destiny_version.as_number()),
            payload: &record.payload,
        };
        diesel::insert_into(audit_log::table)
            .values(&new_row)
            .execute(&mut *self.conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn get_audit_log(
        &mut self,
        account: AccountId,
        limit: AuditLimit,
    ) -> Result<Vec<AuditEntry>, ProfileStoreError> {
        let rows: Vec<AuditLogRow> = audit_log::table
            .filter(audit_log::account_id.eq(account.get()))
            .order(audit_log::id.desc())
            .limit(i64::from(limit.get()))
            .select(AuditLogRow::as_select())
            .load(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        collect(rows, row_to_audit_entry)
    }

    async fn delete_audit_log(&mut self, account: AccountId) -> Result<u64, ProfileStoreError> {
        diesel::delete(audit_log::table.filter(audit_log::account_id.eq(account.get())))
            .execute(&mut *self.conn)
            .await
            .map(affected)
            .map_err(map_diesel_error)
    }

    async fn commit(mut self: Box<Self>) -> Result<(), ProfileStoreError> {
        AnsiTransactionManager::commit_transaction(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        debug!("store transaction committed");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<(), ProfileStoreError> {
        AnsiTransactionManager::rollback_transaction(&mut *self.conn)
            .await
            .map_err(map_diesel_error)?;
        debug!("store transaction rolled back");
        Ok(())
    }
}
