//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions to and from domain types live
//! in the store adapter.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::domain::LoadoutItem;

use super::schema::{audit_log, item_annotations, loadouts, settings};

// ---------------------------------------------------------------------------
// Settings models
// ---------------------------------------------------------------------------

/// Row struct for reading from the settings table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SettingsRow {
    #[diesel(column_name = settings_json)]
    pub settings: serde_json::Value,
}

/// Insertable struct for writing a settings delta.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = settings)]
pub(crate) struct NewSettingsRow<'a> {
    pub account_id: i64,
    #[diesel(column_name = settings_json)]
    pub settings: &'a serde_json::Value,
}

// ---------------------------------------------------------------------------
// Loadout models
// ---------------------------------------------------------------------------

/// Row struct for reading from the loadouts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = loadouts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LoadoutRow {
    pub id: String,
    pub platform_membership_id: String,
    pub destiny_version: i16,
    pub name: String,
    pub class_type: i64,
    pub clear_space: bool,
    pub items: serde_json::Value,
}

/// Insertable struct for creating or replacing a loadout.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = loadouts)]
pub(crate) struct NewLoadoutRow<'a> {
    pub account_id: i64,
    pub id: &'a str,
    pub platform_membership_id: &'a str,
    pub destiny_version: i16,
    pub name: &'a str,
    pub class_type: i64,
    pub clear_space: bool,
    pub items: serde_json::Value,
}

/// Shape of the `loadouts.items` JSON column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LoadoutItemsColumn {
    #[serde(default)]
    pub equipped: Vec<LoadoutItem>,
    #[serde(default)]
    pub unequipped: Vec<LoadoutItem>,
}

// ---------------------------------------------------------------------------
// Item annotation models
// ---------------------------------------------------------------------------

/// Row struct for reading from the item_annotations table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = item_annotations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ItemAnnotationRow {
    pub inventory_item_id: String,
    pub platform_membership_id: String,
    pub destiny_version: i16,
    pub tag: Option<String>,
    pub notes: Option<String>,
}

/// Insertable struct for creating or replacing an annotation.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = item_annotations)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct NewItemAnnotationRow<'a> {
    pub account_id: i64,
    pub inventory_item_id: &'a str,
    pub platform_membership_id: &'a str,
    pub destiny_version: i16,
    pub tag: Option<&'a str>,
    pub notes: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Audit log models
// ---------------------------------------------------------------------------

/// Row struct for reading from the audit_log table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = audit_log)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AuditLogRow {
    pub action: String,
    pub platform_membership_id: Option<String>,
    pub destiny_version: Option<i16>,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for appending an audit entry; the database stamps the
/// time.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = audit_log)]
pub(crate) struct NewAuditLogRow<'a> {
    pub account_id: i64,
    pub action: &'a str,
    pub platform_membership_id: Option<&'a str>,
    pub destiny_version: Option<i16>,
    pub payload: &'a serde_json::Value,
}
