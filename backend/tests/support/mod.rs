//! Shared wiring for HTTP integration tests.

use std::sync::Arc;
use std::time::Duration;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use profile_sync::Trace;
use profile_sync::domain::{DefaultSettings, ProfileSyncService};
use profile_sync::inbound::http::account_data::{delete_all_data, export_profile};
use profile_sync::inbound::http::audit::audit_log;
use profile_sync::inbound::http::error::{json_error_handler, query_error_handler};
use profile_sync::inbound::http::import::import_legacy;
use profile_sync::inbound::http::profile::{get_profile, update_profile};
use profile_sync::inbound::http::state::HttpState;
use profile_sync::outbound::persistence::MemoryProfileStore;

/// Header carrying the authenticated account.
pub const ACCOUNT_HEADER: &str = "x-account-id";

/// Platform profile used by the fixtures.
pub const PLATFORM: &str = "4611686018467284386";

/// HTTP state over a fresh in-process store.
pub fn memory_state(store: MemoryProfileStore) -> web::Data<HttpState> {
    let service = ProfileSyncService::new(
        Arc::new(store),
        DefaultSettings::builtin(),
        Duration::from_secs(5),
    );
    web::Data::new(HttpState::from_service(Arc::new(service)))
}

/// Application exposing every profile endpoint.
pub fn profile_app(
    state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .wrap(Trace)
        .service(get_profile)
        .service(update_profile)
        .service(import_legacy)
        .service(export_profile)
        .service(delete_all_data)
        .service(audit_log)
}
