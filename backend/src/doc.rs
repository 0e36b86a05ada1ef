//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! document for the profile sync API. It registers:
//!
//! - **Paths**: profile read/update, legacy import, export, purge, the audit
//!   log and the health probes
//! - **Schemas**: wrappers from [`crate::inbound::http::schemas`] that describe
//!   domain types without coupling them to utoipa
//! - **Security**: the `X-Account-Id` header set by the authenticating proxy
//!
//! The generated document is served by Swagger UI in debug builds.

use crate::inbound::http::account_data::DeleteAllResponse;
use crate::inbound::http::audit::AuditLogResponse;
use crate::inbound::http::import::ImportResponse;
use crate::inbound::http::profile::UpdateStatusResponse;
use crate::inbound::http::schemas::{
    AnnotationUpdateSchema, AuditActionSchema, AuditEntrySchema, ErrorCodeSchema, ErrorSchema, ItemAnnotationSchema,
    LoadoutItemSchema, LoadoutSchema, ProfileExportSchema, ProfileSnapshotSchema,
    ProfileUpdateRequestSchema, ProfileUpdateSchema, ScopedAnnotationSchema, ScopedLoadoutSchema,
    TagValueSchema,
};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the account header security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "AccountHeader",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                "X-Account-Id",
                "Numeric account id injected by the authenticating proxy.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Profile sync API",
        description = "Per-account settings, loadouts and item annotations with legacy import.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("AccountHeader" = [])),
    paths(
        crate::inbound::http::profile::get_profile,
        crate::inbound::http::profile::update_profile,
        crate::inbound::http::import::import_legacy,
        crate::inbound::http::account_data::export_profile,
        crate::inbound::http::account_data::delete_all_data,
        crate::inbound::http::audit::audit_log,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        AuditActionSchema,
        AuditEntrySchema,
        AuditLogResponse,
        ErrorSchema,
        ErrorCodeSchema,
        TagValueSchema,
        ItemAnnotationSchema,
        AnnotationUpdateSchema,
        LoadoutItemSchema,
        LoadoutSchema,
        ProfileSnapshotSchema,
        ScopedLoadoutSchema,
        ScopedAnnotationSchema,
        ProfileExportSchema,
        ProfileUpdateSchema,
        ProfileUpdateRequestSchema,
        UpdateStatusResponse,
        ImportResponse,
        DeleteAllResponse,
    )),
    tags(
        (name = "profile", description = "Profile sync operations"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying OpenAPI schema registration and field structure.

    use super::*;
    use rstest::rstest;
    use utoipa::OpenApi;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    // Note: utoipa replaces :: with . in schema names
    const ERROR_SCHEMA_NAME: &str = "crate.domain.Error";
    const LOADOUT_SCHEMA_NAME: &str = "crate.domain.Loadout";

    /// Assert that an Object schema contains a field with the given name.
    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[test]
    fn openapi_error_schema_has_required_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get(ERROR_SCHEMA_NAME).expect("Error schema");

        assert_object_schema_has_field(error_schema, "code");
        assert_object_schema_has_field(error_schema, "message");
        assert_object_schema_has_field(error_schema, "traceId");
    }

    #[test]
    fn openapi_loadout_schema_uses_camel_case() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let loadout = schemas.get(LOADOUT_SCHEMA_NAME).expect("Loadout schema");

        assert_object_schema_has_field(loadout, "classType");
        assert_object_schema_has_field(loadout, "clearSpace");
    }

    #[test]
    fn openapi_audit_entry_schema_exposes_timestamp() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let entry = schemas
            .get("crate.domain.AuditEntry")
            .expect("AuditEntry schema");

        assert_object_schema_has_field(entry, "createdAt");
        assert_object_schema_has_field(entry, "platformMembershipId");
    }

    #[rstest]
    #[case("/profile")]
    #[case("/import")]
    #[case("/export")]
    #[case("/delete_all_data")]
    #[case("/audit")]
    #[case("/health/ready")]
    #[case("/health/live")]
    fn openapi_registers_path(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[test]
    fn openapi_declares_account_header_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("AccountHeader"));
    }
}
