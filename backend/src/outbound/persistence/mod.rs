//! Profile store adapters.
//!
//! [`DieselProfileStore`] persists profiles in PostgreSQL through Diesel with
//! `diesel-async` and `bb8` pooling. [`MemoryProfileStore`] keeps them in
//! process memory for tests and database-less runs.
//!
//! # Architecture
//!
//! - **Thin adapters**: stores only translate between rows and domain types.
//!   Reconciliation happens in the domain before any write reaches them.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: database and pool failures are mapped to
//!   [`ProfileStoreError`](crate::domain::ports::ProfileStoreError).
//!
//! # Example
//!
//! ```ignore
//! use profile_sync::outbound::persistence::{DbPool, DieselProfileStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/profiles")).await?;
//! let store = DieselProfileStore::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_profile_store;
mod memory_profile_store;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_profile_store::DieselProfileStore;
pub use memory_profile_store::MemoryProfileStore;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, OwnedConnection, PoolConfig, PoolError};
