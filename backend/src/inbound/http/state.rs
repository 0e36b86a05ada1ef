//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they depend only
//! on the driving ports and stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    FixtureProfileCommand, FixtureProfileQuery, ProfileCommand, ProfileQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub query: Arc<dyn ProfileQuery>,
    pub command: Arc<dyn ProfileCommand>,
}

impl HttpState {
    /// Bundle the read and write ports.
    pub fn new(query: Arc<dyn ProfileQuery>, command: Arc<dyn ProfileCommand>) -> Self {
        Self { query, command }
    }

    /// State backed by one service implementing both ports.
    pub fn from_service<S>(service: Arc<S>) -> Self
    where
        S: ProfileQuery + ProfileCommand + 'static,
    {
        Self {
            query: service.clone(),
            command: service,
        }
    }
}

impl Default for HttpState {
    fn default() -> Self {
        Self::new(Arc::new(FixtureProfileQuery), Arc::new(FixtureProfileCommand))
    }
}
