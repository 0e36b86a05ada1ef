//! HTTP inbound adapter exposing the profile sync endpoints.

pub mod account;
pub mod account_data;
pub mod audit;
pub mod cache_control;
pub mod error;
pub mod health;
pub mod import;
pub mod profile;
pub mod schemas;
pub mod state;

pub use error::ApiResult;
