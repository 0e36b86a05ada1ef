//! Profile read and update HTTP handlers.
//!
//! ```text
//! GET  /profile?platformMembershipId=..&destinyVersion=2&components=settings,tags
//! POST /profile
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    DestinyVersion, Error, PlatformMembershipId, PlatformScope, ProfileComponents,
    ProfileRequest, ProfileRequestError, ProfileSnapshot, ProfileUpdateRequest, UpdateOutcome,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::account::AccountContext;
use crate::inbound::http::cache_control::profile_no_cache_header;
use crate::inbound::http::schemas::{
    ErrorSchema, ProfileSnapshotSchema, ProfileUpdateRequestSchema,
};
use crate::inbound::http::state::HttpState;

/// Query parameters of `GET /profile`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query, rename_all = "camelCase")]
pub struct ProfileQueryParams {
    /// Platform profile; required for `loadouts` and `tags`.
    pub platform_membership_id: Option<String>,
    /// Game-data generation, 1 or 2; defaults to 2.
    pub destiny_version: Option<i64>,
    /// Comma-separated subset of `settings,loadouts,tags`.
    pub components: Option<String>,
}

/// Status entry returned for each applied update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusResponse {
    /// Always `Success`; a failing update fails the whole request.
    #[schema(example = "Success")]
    pub status: String,
}

impl UpdateStatusResponse {
    fn success() -> Self {
        Self {
            status: "Success".to_owned(),
        }
    }
}

fn invalid_field(field: &str, code: &str, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field, "code": code }))
}

fn map_request_error(error: ProfileRequestError) -> Error {
    match &error {
        ProfileRequestError::UnknownComponent(_) | ProfileRequestError::NoComponents => {
            invalid_field("components", "invalid_components", error.to_string())
        }
        ProfileRequestError::MissingPlatform { .. } => invalid_field(
            "platformMembershipId",
            "missing_platform",
            error.to_string(),
        ),
    }
}

fn parse_scope(params: &ProfileQueryParams) -> Result<Option<PlatformScope>, Error> {
    let version = match params.destiny_version {
        Some(raw) => DestinyVersion::try_from(raw).map_err(|err| {
            invalid_field("destinyVersion", "invalid_destiny_version", err.to_string())
        })?,
        None => DestinyVersion::default(),
    };
    params
        .platform_membership_id
        .as_deref()
        .map(|raw| {
            PlatformMembershipId::new(raw)
                .map(|membership| PlatformScope::new(membership, version))
                .map_err(|err| {
                    invalid_field(
                        "platformMembershipId",
                        "invalid_platform_membership_id",
                        err.to_string(),
                    )
                })
        })
        .transpose()
}

fn parse_profile_request(params: &ProfileQueryParams) -> Result<ProfileRequest, Error> {
    let scope = parse_scope(params)?;
    let components: ProfileComponents = params
        .components
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(map_request_error)?;
    ProfileRequest::new(scope, components).map_err(map_request_error)
}

fn update_statuses(outcome: &UpdateOutcome) -> Vec<UpdateStatusResponse> {
    outcome
        .applied
        .iter()
        .map(|_| UpdateStatusResponse::success())
        .collect()
}

/// Read selected sections of the caller's profile.
#[utoipa::path(
    get,
    path = "/profile",
    params(ProfileQueryParams),
    responses(
        (
            status = 200,
            description = "Requested profile sections",
            headers(("Cache-Control" = String, description = "Always no-cache, max-age=0")),
            body = ProfileSnapshotSchema
        ),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Missing account", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "getProfile"
)]
#[get("/profile")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    account: AccountContext,
    params: web::Query<ProfileQueryParams>,
) -> ApiResult<HttpResponse> {
    let request = parse_profile_request(&params)?;
    let snapshot: ProfileSnapshot = state
        .query
        .fetch_profile(account.account_id(), request)
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header(profile_no_cache_header())
        .json(snapshot))
}

/// Apply a batch of profile updates in one transaction.
#[utoipa::path(
    post,
    path = "/profile",
    request_body = ProfileUpdateRequestSchema,
    responses(
        (status = 200, description = "One status per update, in order", body = [UpdateStatusResponse]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Missing account", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "updateProfile"
)]
#[post("/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    account: AccountContext,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<web::Json<Vec<UpdateStatusResponse>>> {
    let request = payload.into_inner();
    let requested = request.updates.len();
    let outcome = state
        .command
        .apply_updates(account.account_id(), request)
        .await?;
    let changed = outcome.applied.iter().filter(|update| update.changed).count();
    info!(account_id = %account.account_id(), requested, changed, "applied profile updates");
    Ok(web::Json(update_statuses(&outcome)))
}

#[cfg(test)]
#[path = "profile_tests.rs"]
mod tests;
