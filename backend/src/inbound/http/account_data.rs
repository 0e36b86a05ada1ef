//! Whole-account export and purge HTTP handlers.
//!
//! ```text
//! GET  /export
//! POST /delete_all_data
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::DeleteOutcome;
use crate::inbound::http::ApiResult;
use crate::inbound::http::account::AccountContext;
use crate::inbound::http::cache_control::profile_no_cache_header;
use crate::inbound::http::schemas::{ErrorSchema, ProfileExportSchema};
use crate::inbound::http::state::HttpState;

/// Counts reported after deleting an account's data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeleteAllResponse {
    /// Whether a settings record existed.
    pub settings: bool,
    /// Loadouts removed.
    pub loadouts: u64,
    /// Annotations removed.
    pub tags: u64,
}

impl From<DeleteOutcome> for DeleteAllResponse {
    fn from(outcome: DeleteOutcome) -> Self {
        Self {
            settings: outcome.settings,
            loadouts: outcome.loadouts,
            tags: outcome.tags,
        }
    }
}

/// Export everything stored for the caller, across platform profiles.
#[utoipa::path(
    get,
    path = "/export",
    responses(
        (status = 200, description = "Full account state", body = ProfileExportSchema),
        (status = 401, description = "Missing account", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "exportProfile"
)]
#[get("/export")]
pub async fn export_profile(
    state: web::Data<HttpState>,
    account: AccountContext,
) -> ApiResult<HttpResponse> {
    let export = state.query.export(account.account_id()).await?;
    Ok(HttpResponse::Ok()
        .insert_header(profile_no_cache_header())
        .json(export))
}

/// Delete the caller's settings, loadouts and annotations.
#[utoipa::path(
    post,
    path = "/delete_all_data",
    responses(
        (status = 200, description = "Data deleted", body = DeleteAllResponse),
        (status = 401, description = "Missing account", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "deleteAllData"
)]
#[post("/delete_all_data")]
pub async fn delete_all_data(
    state: web::Data<HttpState>,
    account: AccountContext,
) -> ApiResult<web::Json<DeleteAllResponse>> {
    let outcome = state.command.delete_all_data(account.account_id()).await?;
    info!(
        account_id = %account.account_id(),
        settings = outcome.settings,
        loadouts = outcome.loadouts,
        tags = outcome.tags,
        "deleted account data"
    );
    Ok(web::Json(DeleteAllResponse::from(outcome)))
}
