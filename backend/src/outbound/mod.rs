//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: profile stores backed by PostgreSQL (Diesel) or process
//!   memory.
//!
//! Adapters are thin translators between domain types and storage
//! representations. They contain no business logic.

pub mod persistence;
