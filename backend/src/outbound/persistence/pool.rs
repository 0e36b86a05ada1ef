//! Connection pool for the profile store.
//!
//! Wraps `diesel-async` and `bb8`. Store transactions hold an owned checkout
//! for their whole lifetime, so the pool hands out `'static` connections. A
//! connection returned while its transaction is still open is treated as
//! broken by the pool and closed, which rolls the transaction back on the
//! server.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use tracing::debug;

/// Pooled connection owned by its holder.
pub type OwnedConnection = PooledConnection<'static, AsyncPgConnection>;

const DEFAULT_MAX_SIZE: u32 = 10;
const DEFAULT_MIN_IDLE: u32 = 2;
const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failures while building the pool or checking out a connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// No connection became free before the checkout timeout.
    #[error("failed to get connection from pool: {message}")]
    Checkout { message: String },

    /// The pool could not be built from its configuration.
    #[error("failed to build connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    /// Checkout failure with `message`.
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout {
            message: message.into(),
        }
    }

    /// Build failure with `message`.
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build {
            message: message.into(),
        }
    }
}

/// Pool sizing and checkout settings.
///
/// The idle floor never exceeds the pool size: shrinking the pool below the
/// current floor lowers the floor with it.
///
/// # Example
///
/// ```ignore
/// let config = PoolConfig::new("postgres://sync@localhost/profiles")
///     .with_max_size(settings.pool_max_size)
///     .with_checkout_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: Option<u32>,
    checkout_timeout: Duration,
}

impl PoolConfig {
    /// Configuration for `database_url` with ten connections, two kept idle
    /// and a thirty second checkout timeout.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: DEFAULT_MAX_SIZE,
            min_idle: Some(DEFAULT_MIN_IDLE),
            checkout_timeout: DEFAULT_CHECKOUT_TIMEOUT,
        }
    }

    /// Cap the number of open connections.
    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self.min_idle = self.min_idle.map(|idle| idle.min(max_size));
        self
    }

    /// Keep at least `min_idle` connections open; clamped to the pool size.
    #[must_use]
    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle.map(|idle| idle.min(self.max_size));
        self
    }

    /// How long a caller waits for a free connection.
    #[must_use]
    pub fn with_checkout_timeout(mut self, timeout: Duration) -> Self {
        self.checkout_timeout = timeout;
        self
    }

    fn validate(&self) -> Result<(), PoolError> {
        if self.max_size == 0 {
            return Err(PoolError::build("pool size must be at least one"));
        }
        if self.database_url.trim().is_empty() {
            return Err(PoolError::build("database url is empty"));
        }
        Ok(())
    }
}

/// Async connection pool for PostgreSQL via Diesel.
///
/// # Example
///
/// ```ignore
/// let pool = DbPool::new(config).await?;
/// let store = DieselProfileStore::new(pool);
/// ```
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Build a pool from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Build`] when the configuration is unusable or the
    /// initial idle connections cannot be opened.
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.checkout_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;
        debug!(
            max_size = config.max_size,
            min_idle = ?config.min_idle,
            "profile store pool ready"
        );

        Ok(Self { inner: pool })
    }

    /// Check out a connection that is not tied to the pool's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Checkout`] if no connection frees up within the
    /// checkout timeout.
    pub async fn get_owned(&self) -> Result<OwnedConnection, PoolError> {
        self.inner
            .get_owned()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const URL: &str = "postgres://sync@localhost/profiles";

    #[rstest]
    fn defaults_keep_two_idle_of_ten() {
        let config = PoolConfig::new(URL);

        assert_eq!(config.max_size, 10);
        assert_eq!(config.min_idle, Some(2));
        assert_eq!(config.checkout_timeout, Duration::from_secs(30));
    }

    #[rstest]
    #[case::single_connection(1, Some(1))]
    #[case::larger_pool(20, Some(2))]
    fn shrinking_the_pool_lowers_the_idle_floor(#[case] size: u32, #[case] idle: Option<u32>) {
        let config = PoolConfig::new(URL).with_max_size(size);

        assert_eq!(config.min_idle, idle);
    }

    #[rstest]
    fn idle_floor_is_clamped_to_pool_size() {
        let config = PoolConfig::new(URL).with_max_size(3).with_min_idle(Some(8));

        assert_eq!(config.min_idle, Some(3));
    }

    #[rstest]
    #[case::empty_pool(PoolConfig::new(URL).with_max_size(0))]
    #[case::blank_url(PoolConfig::new("  "))]
    fn unusable_configurations_fail_validation(#[case] config: PoolConfig) {
        assert!(matches!(config.validate(), Err(PoolError::Build { .. })));
    }

    #[tokio::test]
    async fn zero_sized_pool_is_rejected_before_connecting() {
        let result = DbPool::new(PoolConfig::new(URL).with_max_size(0)).await;

        assert!(matches!(result, Err(PoolError::Build { .. })));
    }
}
