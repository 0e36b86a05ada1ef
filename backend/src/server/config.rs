//! HTTP server configuration object and helpers.

use profile_sync::domain::DefaultSettings;
use profile_sync::outbound::persistence::DbPool;
use std::net::SocketAddr;
use std::time::Duration;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) transaction_timeout: Duration,
    pub(crate) default_settings: DefaultSettings,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration backed by the in-process store.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        transaction_timeout: Duration,
        default_settings: DefaultSettings,
    ) -> Self {
        Self {
            bind_addr,
            transaction_timeout,
            default_settings,
            db_pool: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// When provided, profile data is stored in PostgreSQL instead of
    /// process memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
