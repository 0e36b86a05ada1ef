//! Tests for profile HTTP handlers.

use super::*;
use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test};
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::{Value, json};

use crate::domain::ports::{
    FixtureProfileCommand, FixtureProfileQuery, MockProfileCommand, MockProfileQuery,
};
use crate::domain::{
    AccountId, AppliedUpdate, ErrorCode, ItemAnnotation, ItemId, ProfileComponent, Settings,
    TagValue,
};
use crate::inbound::http::account::ACCOUNT_ID_HEADER;
use crate::inbound::http::cache_control::NO_CACHE_MAX_AGE_ZERO;
use crate::inbound::http::error::{json_error_handler, query_error_handler};

fn test_app(
    state: HttpState,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(get_profile)
        .service(update_profile)
}

fn params(
    platform: Option<&str>,
    version: Option<i64>,
    components: Option<&str>,
) -> ProfileQueryParams {
    ProfileQueryParams {
        platform_membership_id: platform.map(str::to_owned),
        destiny_version: version,
        components: components.map(str::to_owned),
    }
}

#[rstest]
fn parses_scoped_requests_with_default_version() {
    let request = parse_profile_request(&params(Some("4611686018"), None, Some("loadouts, tags")))
        .expect("valid request");

    let scope = request.scope().expect("scope");
    assert_eq!(scope.destiny_version, DestinyVersion::Two);
    assert!(request.components().contains(ProfileComponent::Tags));
    assert!(!request.components().contains(ProfileComponent::Settings));
}

#[rstest]
#[case::no_components(params(None, None, None), "components")]
#[case::blank_components(params(None, None, Some(" , ")), "components")]
#[case::unknown_component(params(None, None, Some("settings,vault")), "components")]
#[case::unscoped_tags(params(None, None, Some("tags")), "platformMembershipId")]
#[case::bad_version(params(Some("1"), Some(3), Some("settings")), "destinyVersion")]
#[case::bad_platform(params(Some("abc"), None, Some("settings")), "platformMembershipId")]
fn rejects_invalid_profile_requests(#[case] input: ProfileQueryParams, #[case] field: &str) {
    let error = parse_profile_request(&input).expect_err("invalid request");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
    assert_eq!(
        error.details().and_then(|details| details.get("field")),
        Some(&json!(field))
    );
}

#[actix_web::test]
async fn get_profile_passes_account_and_components_to_the_query_port() {
    let mut query = MockProfileQuery::new();
    query
        .expect_fetch_profile()
        .withf(|account, request| {
            account.get() == 7
                && request.components().contains(ProfileComponent::Tags)
                && request.scope().is_some()
        })
        .times(1)
        .returning(|_, _| {
            Ok(ProfileSnapshot {
                settings: None,
                loadouts: None,
                tags: Some(vec![ItemAnnotation {
                    id: ItemId::new("6917529").expect("id"),
                    tag: Some(TagValue::Junk),
                    notes: None,
                }]),
            })
        });
    let state = HttpState::new(Arc::new(query), Arc::new(FixtureProfileCommand));
    let app = actix_test::init_service(test_app(state)).await;

    let req = actix_test::TestRequest::get()
        .uri("/profile?platformMembershipId=4611686018&components=tags")
        .insert_header((ACCOUNT_ID_HEADER, "7"))
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get("Cache-Control")
            .and_then(|value| value.to_str().ok()),
        Some(NO_CACHE_MAX_AGE_ZERO)
    );
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body, json!({"tags": [{"id": "6917529", "tag": "junk"}]}));
}

#[actix_web::test]
async fn get_profile_requires_an_account() {
    let app = actix_test::init_service(test_app(HttpState::default())).await;

    let req = actix_test::TestRequest::get()
        .uri("/profile?components=settings")
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn get_profile_returns_builtin_settings_from_fixture() {
    let state = HttpState::new(Arc::new(FixtureProfileQuery), Arc::new(FixtureProfileCommand));
    let app = actix_test::init_service(test_app(state)).await;

    let req = actix_test::TestRequest::get()
        .uri("/profile?components=settings")
        .insert_header((ACCOUNT_ID_HEADER, "1"))
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body.pointer("/settings/itemSize"), Some(&json!(50)));
}

#[actix_web::test]
async fn update_profile_returns_one_status_per_update() {
    let mut command = MockProfileCommand::new();
    command
        .expect_apply_updates()
        .with(
            eq(AccountId::new(3).expect("account")),
            mockall::predicate::function(|request: &ProfileUpdateRequest| {
                request.updates.len() == 2
            }),
        )
        .times(1)
        .returning(|_, _| {
            Ok(UpdateOutcome {
                applied: vec![
                    AppliedUpdate {
                        action: "setting",
                        changed: true,
                    },
                    AppliedUpdate {
                        action: "tag",
                        changed: false,
                    },
                ],
            })
        });
    let state = HttpState::new(Arc::new(FixtureProfileQuery), Arc::new(command));
    let app = actix_test::init_service(test_app(state)).await;

    let req = actix_test::TestRequest::post()
        .uri("/profile")
        .insert_header((ACCOUNT_ID_HEADER, "3"))
        .set_json(json!({
            "platformMembershipId": "4611686018",
            "updates": [
                {"action": "setting", "payload": {"itemSize": 40}},
                {"action": "tag", "payload": {"id": "1", "tag": null}}
            ]
        }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body, json!([{"status": "Success"}, {"status": "Success"}]));
}

#[actix_web::test]
async fn update_profile_surfaces_validation_failures() {
    let mut command = MockProfileCommand::new();
    command.expect_apply_updates().returning(|_, _| {
        Err(Error::invalid_request(
            "loadout updates require platformMembershipId",
        ))
    });
    let state = HttpState::new(Arc::new(FixtureProfileQuery), Arc::new(command));
    let app = actix_test::init_service(test_app(state)).await;

    let req = actix_test::TestRequest::post()
        .uri("/profile")
        .insert_header((ACCOUNT_ID_HEADER, "3"))
        .set_json(json!({"updates": [{"action": "delete_loadout", "payload": "l-1"}]}))
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn update_profile_rejects_unknown_actions() {
    let app = actix_test::init_service(test_app(HttpState::default())).await;

    let req = actix_test::TestRequest::post()
        .uri("/profile")
        .insert_header((ACCOUNT_ID_HEADER, "3"))
        .set_json(json!({"updates": [{"action": "rename", "payload": {}}]}))
        .to_request();
    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body.get("code"), Some(&json!("invalid_request")));
}

#[rstest]
fn settings_partial_round_trips_through_the_request_type() {
    let request: ProfileUpdateRequest = serde_json::from_value(json!({
        "updates": [{"action": "setting", "payload": {"language": "de"}}]
    }))
    .expect("valid request");

    let mut expected = Settings::new();
    expected.insert("language", json!("de"));
    assert_eq!(
        request.updates.first(),
        Some(&crate::domain::ProfileUpdate::Setting(expected))
    );
}
