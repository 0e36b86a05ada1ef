//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror their wire shape and live in the inbound adapter,
//! where framework concerns belong.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// The account header is missing or malformed.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with current state.
    #[schema(rename = "conflict")]
    Conflict,
    /// The profile store is unreachable or timed out.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "platformMembershipId is required to read loadouts")]
    message: String,
    /// Correlation identifier echoed in the `trace-id` header.
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary error details for clients.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::TagValue`].
#[derive(ToSchema)]
#[schema(as = crate::domain::TagValue)]
pub enum TagValueSchema {
    /// Favourite item.
    #[schema(rename = "favorite")]
    Favorite,
    /// Keep.
    #[schema(rename = "keep")]
    Keep,
    /// Infusion fuel.
    #[schema(rename = "infuse")]
    Infuse,
    /// Junk.
    #[schema(rename = "junk")]
    Junk,
    /// Archived.
    #[schema(rename = "archive")]
    Archive,
}

/// OpenAPI schema for [`crate::domain::ItemAnnotation`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ItemAnnotation)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ItemAnnotationSchema {
    /// Item instance id.
    #[schema(example = "6917529071111111111")]
    id: String,
    /// Tag, omitted when unset.
    tag: Option<TagValueSchema>,
    /// Notes, omitted when unset.
    notes: Option<String>,
}

/// OpenAPI schema for [`crate::domain::AnnotationUpdate`].
///
/// An omitted field is left unchanged; `null` clears it.
#[derive(ToSchema)]
#[schema(as = crate::domain::AnnotationUpdate)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct AnnotationUpdateSchema {
    /// Item instance id.
    id: String,
    /// New tag, or `null` to clear.
    #[schema(nullable)]
    tag: Option<TagValueSchema>,
    /// New notes, or `null` to clear; empty notes count as cleared.
    #[schema(nullable)]
    notes: Option<String>,
}

/// OpenAPI schema for [`crate::domain::LoadoutItem`].
#[derive(ToSchema)]
#[schema(as = crate::domain::LoadoutItem)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct LoadoutItemSchema {
    /// Item instance id; absent for uninstanced items.
    id: Option<String>,
    /// Item definition hash.
    #[schema(example = 1_364_093_401)]
    hash: u32,
    /// Stack size; defaults to 1.
    #[schema(default = 1)]
    amount: u32,
}

/// OpenAPI schema for [`crate::domain::Loadout`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Loadout, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct LoadoutSchema {
    /// Loadout identifier.
    id: String,
    /// Display name.
    #[schema(example = "Raid")]
    name: String,
    /// Class type: titan 0, hunter 1, warlock 2, any 3.
    #[schema(example = 3)]
    class_type: i64,
    /// Whether applying the loadout clears other items.
    clear_space: bool,
    /// Items to equip.
    equipped: Vec<LoadoutItemSchema>,
    /// Items to carry.
    unequipped: Vec<LoadoutItemSchema>,
}

/// OpenAPI schema for [`crate::domain::ProfileSnapshot`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ProfileSnapshot)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ProfileSnapshotSchema {
    /// Full effective settings, when requested.
    #[schema(value_type = Option<Object>)]
    settings: Option<serde_json::Value>,
    /// Loadouts of the platform profile, when requested.
    loadouts: Option<Vec<LoadoutSchema>>,
    /// Annotations of the platform profile, when requested.
    tags: Option<Vec<ItemAnnotationSchema>>,
}

/// OpenAPI schema for [`crate::domain::ScopedLoadout`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ScopedLoadout, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ScopedLoadoutSchema {
    /// Platform profile.
    platform_membership_id: String,
    /// Generation.
    destiny_version: i64,
    /// The loadout.
    loadout: LoadoutSchema,
}

/// OpenAPI schema for [`crate::domain::ScopedAnnotation`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ScopedAnnotation, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ScopedAnnotationSchema {
    /// Platform profile.
    platform_membership_id: String,
    /// Generation.
    destiny_version: i64,
    /// The annotation.
    annotation: ItemAnnotationSchema,
}

/// OpenAPI schema for [`crate::domain::ProfileExport`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ProfileExport)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ProfileExportSchema {
    /// Full effective settings.
    #[schema(value_type = Object)]
    settings: serde_json::Value,
    /// Every loadout with its platform profile.
    loadouts: Vec<ScopedLoadoutSchema>,
    /// Every annotation with its platform profile.
    tags: Vec<ScopedAnnotationSchema>,
}

/// OpenAPI schema for [`crate::domain::ProfileUpdate`].
///
/// `payload` depends on `action`: a partial settings object, a loadout, a
/// loadout id, an annotation update, or a list of item ids.
#[derive(ToSchema)]
#[schema(as = crate::domain::ProfileUpdate)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ProfileUpdateSchema {
    /// One of `setting`, `loadout`, `delete_loadout`, `tag`, `tag_cleanup`.
    #[schema(example = "tag")]
    action: String,
    /// Action-specific payload.
    payload: serde_json::Value,
}

/// OpenAPI schema for [`crate::domain::ProfileUpdateRequest`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ProfileUpdateRequest, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ProfileUpdateRequestSchema {
    /// Platform profile; required by `loadout`, `delete_loadout` and `tag`.
    platform_membership_id: Option<String>,
    /// Generation; defaults to 2.
    destiny_version: Option<i64>,
    /// Updates applied in order, all or nothing.
    updates: Vec<ProfileUpdateSchema>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use utoipa::PartialSchema;

    fn schema_to_json<T: PartialSchema>() -> String {
        serde_json::to_string(&T::schema()).expect("schema serialises to JSON")
    }

    #[test]
    fn error_schema_has_expected_name_and_fields() {
        let schema_json = schema_to_json::<ErrorSchema>();
        // utoipa replaces :: with . in schema names
        assert_eq!(ErrorSchema::name(), "crate.domain.Error");
        assert!(schema_json.contains("traceId"), "fields are camelCase");
    }

    #[test]
    fn error_code_schema_variants_match_domain() {
        let schema_json = schema_to_json::<ErrorCodeSchema>();
        for code in [
            "invalid_request",
            "unauthorized",
            "forbidden",
            "not_found",
            "conflict",
            "service_unavailable",
            "internal_error",
        ] {
            assert!(schema_json.contains(code), "missing {code}");
        }
    }

    #[test]
    fn loadout_schema_uses_wire_names() {
        let schema_json = schema_to_json::<LoadoutSchema>();
        assert!(schema_json.contains("classType"));
        assert!(schema_json.contains("clearSpace"));
    }

    #[test]
    fn tag_schema_lists_every_tag() {
        let schema_json = schema_to_json::<TagValueSchema>();
        for tag in ["favorite", "keep", "infuse", "junk", "archive"] {
            assert!(schema_json.contains(tag), "missing {tag}");
        }
    }
}

/// OpenAPI schema for [`crate::domain::AuditAction`].
#[derive(ToSchema)]
#[schema(as = crate::domain::AuditAction)]
pub enum AuditActionSchema {
    /// A legacy snapshot was imported.
    #[schema(rename = "import")]
    Import,
    /// A batch of direct updates was applied.
    #[schema(rename = "update")]
    Update,
    /// Every stored record of the account was removed.
    #[schema(rename = "delete_all")]
    DeleteAll,
}

/// OpenAPI schema for [`crate::domain::AuditEntry`].
#[derive(ToSchema)]
#[schema(as = crate::domain::AuditEntry, rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct AuditEntrySchema {
    /// What happened.
    action: AuditActionSchema,
    /// Platform profile of an update batch.
    platform_membership_id: Option<String>,
    /// Generation of an update batch.
    destiny_version: Option<i64>,
    /// Counts describing the change.
    #[schema(value_type = Object)]
    payload: serde_json::Value,
    /// Commit time, RFC 3339.
    #[schema(example = "2026-01-12T10:00:00Z")]
    created_at: String,
}
