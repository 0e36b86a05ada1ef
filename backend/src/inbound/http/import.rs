//! Legacy snapshot import HTTP handler.
//!
//! ```text
//! POST /import
//! ```
//!
//! The body is the whole legacy key/value blob. Everything recognised in it
//! is written in one transaction; the response counts what was applied and
//! what was skipped.

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{ImportOutcome, LegacyBlob};
use crate::inbound::http::ApiResult;
use crate::inbound::http::account::AccountContext;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;

/// Counts reported after a legacy import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportResponse {
    /// Loadouts written.
    pub loadouts: usize,
    /// Annotations written or removed.
    pub tags: usize,
    /// Records dropped because they were dangling, unscoped or empty.
    pub skipped: usize,
}

impl From<ImportOutcome> for ImportResponse {
    fn from(outcome: ImportOutcome) -> Self {
        Self {
            loadouts: outcome.loadouts,
            tags: outcome.tags,
            skipped: outcome.skipped,
        }
    }
}

/// Import a legacy snapshot for the caller.
#[utoipa::path(
    post,
    path = "/import",
    request_body(
        content = Object,
        description = "Legacy key/value blob (`settings-v1.0`, `loadouts-v3.0`, `dimItemInfo-m<id>-d<version>`)"
    ),
    responses(
        (status = 200, description = "Import applied", body = ImportResponse),
        (status = 400, description = "Malformed blob", body = ErrorSchema),
        (status = 401, description = "Missing account", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "importLegacy"
)]
#[post("/import")]
pub async fn import_legacy(
    state: web::Data<HttpState>,
    account: AccountContext,
    payload: web::Json<LegacyBlob>,
) -> ApiResult<web::Json<ImportResponse>> {
    let outcome = state
        .command
        .import_legacy(account.account_id(), payload.into_inner())
        .await?;
    info!(
        account_id = %account.account_id(),
        settings = outcome.settings,
        loadouts = outcome.loadouts,
        tags = outcome.tags,
        skipped = outcome.skipped,
        "legacy import applied"
    );
    Ok(web::Json(ImportResponse::from(outcome)))
}
