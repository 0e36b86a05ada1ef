//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. When a
//! migration changes the schema, update this file to match (`diesel
//! print-schema` against a migrated database produces the same shape).

diesel::table! {
    /// Settings delta per account.
    ///
    /// Holds only the keys whose values differ from the default table.
    settings (account_id) {
        /// Owning account.
        account_id -> Int8,
        /// JSON object of non-default settings.
        #[sql_name = "settings"]
        settings_json -> Jsonb,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last write timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Saved loadouts, keyed by account and loadout id.
    loadouts (account_id, id) {
        /// Owning account.
        account_id -> Int8,
        /// Loadout identifier.
        id -> Text,
        /// Platform profile the loadout belongs to.
        platform_membership_id -> Text,
        /// Game-data generation (1 or 2).
        destiny_version -> Int2,
        /// Display name.
        name -> Text,
        /// Stored class type.
        class_type -> Int8,
        /// Whether applying the loadout clears other items.
        clear_space -> Bool,
        /// `{equipped, unequipped}` item lists.
        items -> Jsonb,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last write timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Item tags and notes, keyed by account and item instance id.
    item_annotations (account_id, inventory_item_id) {
        /// Owning account.
        account_id -> Int8,
        /// Item instance id.
        inventory_item_id -> Text,
        /// Platform profile the item belongs to.
        platform_membership_id -> Text,
        /// Game-data generation (1 or 2).
        destiny_version -> Int2,
        /// Optional tag value.
        tag -> Nullable<Text>,
        /// Optional non-empty notes.
        notes -> Nullable<Text>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last write timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only audit entries per account.
    audit_log (id) {
        /// Insertion order.
        id -> Int8,
        /// Owning account.
        account_id -> Int8,
        /// `import`, `update` or `delete_all`.
        action -> Text,
        /// Platform profile the change targeted.
        platform_membership_id -> Nullable<Text>,
        /// Game-data generation of the targeted profile.
        destiny_version -> Nullable<Int2>,
        /// Counts describing the change.
        payload -> Jsonb,
        /// Commit time of the change.
        created_at -> Timestamptz,
    }
}

diesel::allow_tables_to_appear_in_same_query!(settings, loadouts, item_annotations, audit_log);
