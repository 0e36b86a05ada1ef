//! Builders for the HTTP state backing the profile ports.

use std::sync::Arc;

use actix_web::web;
use tracing::{info, warn};

use profile_sync::domain::ProfileSyncService;
use profile_sync::domain::ports::ProfileStore;
use profile_sync::inbound::http::state::HttpState;
use profile_sync::outbound::persistence::{DieselProfileStore, MemoryProfileStore};

use super::ServerConfig;

/// Choose the store adapter: PostgreSQL when a pool is configured, otherwise
/// process memory.
fn build_store(config: &ServerConfig) -> Arc<dyn ProfileStore> {
    match &config.db_pool {
        Some(pool) => {
            info!("using PostgreSQL profile store");
            Arc::new(DieselProfileStore::new(pool.clone()))
        }
        None => {
            warn!("no database configured; profile data lives in process memory");
            Arc::new(MemoryProfileStore::new())
        }
    }
}

/// Build the shared HTTP state for every worker.
pub(super) fn build_http_state(config: &ServerConfig) -> web::Data<HttpState> {
    let service = ProfileSyncService::new(
        build_store(config),
        config.default_settings.clone(),
        config.transaction_timeout,
    );
    web::Data::new(HttpState::from_service(Arc::new(service)))
}
