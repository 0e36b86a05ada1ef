//! Account identification for HTTP handlers.
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! account as a positive integer in the `X-Account-Id` header; handlers take
//! an [`AccountContext`] and never read the header themselves.

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};
use serde_json::json;
use tracing::debug;

use crate::domain::{AccountId, Error};

/// Header carrying the authenticated account id.
pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

/// Authenticated account extracted from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountContext(AccountId);

impl AccountContext {
    /// Account the request acts on.
    #[must_use]
    pub const fn account_id(self) -> AccountId {
        self.0
    }

    fn from_headers(req: &HttpRequest) -> Result<Self, Error> {
        let raw = req
            .headers()
            .get(ACCOUNT_ID_HEADER)
            .ok_or_else(|| Error::unauthorized("account id header is required"))?;
        let account = raw
            .to_str()
            .ok()
            .and_then(|value| value.trim().parse::<AccountId>().ok())
            .ok_or_else(|| {
                debug!("rejected malformed account id header");
                Error::unauthorized("account id header must be a positive integer")
                    .with_details(json!({ "header": "X-Account-Id" }))
            })?;
        Ok(Self(account))
    }
}

impl FromRequest for AccountContext {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req))
    }
}
