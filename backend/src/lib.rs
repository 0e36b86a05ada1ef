//! Profile sync backend: per-account settings, loadouts and item annotations
//! kept in step with clients, plus bulk import of legacy snapshots.

pub mod cap_fs;
pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
