//! Audit log HTTP handler.
//!
//! ```text
//! GET /audit?limit=100
//! ```

use actix_web::{HttpResponse, get, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{AuditEntry, AuditLimit, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::account::AccountContext;
use crate::inbound::http::cache_control::profile_no_cache_header;
use crate::inbound::http::schemas::{AuditEntrySchema, ErrorSchema};
use crate::inbound::http::state::HttpState;

/// Query parameters of `GET /audit`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQueryParams {
    /// Entries to return, 1 to 1000; defaults to 100.
    pub limit: Option<i64>,
}

/// Audit entries of the caller, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AuditLogResponse {
    /// Entries, newest first.
    #[schema(value_type = Vec<AuditEntrySchema>)]
    pub log: Vec<AuditEntry>,
}

fn parse_limit(params: &AuditQueryParams) -> Result<AuditLimit, Error> {
    params.limit.map_or_else(
        || Ok(AuditLimit::default()),
        |raw| {
            AuditLimit::new(raw).map_err(|err| {
                Error::invalid_request(err.to_string())
                    .with_details(json!({ "field": "limit", "code": "invalid_limit" }))
            })
        },
    )
}

/// List the caller's recent imports, update batches and purges.
#[utoipa::path(
    get,
    path = "/audit",
    params(AuditQueryParams),
    responses(
        (status = 200, description = "Audit entries, newest first", body = AuditLogResponse),
        (status = 400, description = "Invalid limit", body = ErrorSchema),
        (status = 401, description = "Missing account", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["profile"],
    operation_id = "auditLog"
)]
#[get("/audit")]
pub async fn audit_log(
    state: web::Data<HttpState>,
    account: AccountContext,
    params: web::Query<AuditQueryParams>,
) -> ApiResult<HttpResponse> {
    let limit = parse_limit(&params)?;
    let log = state.query.audit_log(account.account_id(), limit).await?;
    Ok(HttpResponse::Ok()
        .insert_header(profile_no_cache_header())
        .json(AuditLogResponse { log }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::{DateTime, Utc};
    use rstest::rstest;
    use serde_json::Value;

    use crate::domain::ports::{FixtureProfileCommand, MockProfileQuery};
    use crate::domain::{AuditAction, AuditRecord};
    use crate::inbound::http::account::ACCOUNT_ID_HEADER;

    async fn call(state: HttpState, uri: &str) -> actix_web::dev::ServiceResponse {
        let app = actix_test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .service(audit_log),
        )
        .await;
        let req = actix_test::TestRequest::get()
            .uri(uri)
            .insert_header((ACCOUNT_ID_HEADER, "5"))
            .to_request();
        actix_test::call_service(&app, req).await
    }

    #[actix_web::test]
    async fn lists_entries_with_the_requested_limit() {
        let mut query = MockProfileQuery::new();
        query
            .expect_audit_log()
            .withf(|account, limit| account.get() == 5 && limit.get() == 2)
            .times(1)
            .returning(|_, _| {
                Ok(vec![
                    AuditRecord::new(AuditAction::Import, json!({"tags": 3}))
                        .stamped(DateTime::<Utc>::UNIX_EPOCH),
                ])
            });
        let state = HttpState::new(Arc::new(query), Arc::new(FixtureProfileCommand));

        let res = call(state, "/audit?limit=2").await;

        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.pointer("/log/0/action"), Some(&json!("import")));
        assert_eq!(body.pointer("/log/0/payload/tags"), Some(&json!(3)));
    }

    #[rstest]
    #[case::zero("/audit?limit=0")]
    #[case::too_large("/audit?limit=5000")]
    #[actix_web::test]
    async fn out_of_range_limits_are_invalid_requests(#[case] uri: &str) {
        let mut query = MockProfileQuery::new();
        query.expect_audit_log().never();
        let state = HttpState::new(Arc::new(query), Arc::new(FixtureProfileCommand));

        let res = call(state, uri).await;

        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body.pointer("/details/field"), Some(&json!("limit")));
    }

    #[rstest]
    fn missing_limit_uses_the_default() {
        let limit = parse_limit(&AuditQueryParams::default()).expect("default limit");

        assert_eq!(limit, AuditLimit::default());
    }
}
