//! Account audit log.
//!
//! Every committed import, update batch, and account purge appends one entry
//! in the same transaction as the change it describes, so the log never
//! mentions a change that was rolled back.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::account::PlatformScope;

/// Entries returned when the caller does not ask for a count.
pub const DEFAULT_AUDIT_LIMIT: u32 = 100;
/// Largest page of entries a caller may request.
pub const MAX_AUDIT_LIMIT: u32 = 1000;

/// Kind of change an audit entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A legacy snapshot was imported.
    Import,
    /// A batch of direct updates was applied.
    Update,
    /// Every stored record of the account was removed.
    DeleteAll,
}

impl AuditAction {
    /// Stored and wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Import => "import",
            Self::Update => "update",
            Self::DeleteAll => "delete_all",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored action name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown audit action `{0}`")]
pub struct UnknownAuditAction(pub String);

impl FromStr for AuditAction {
    type Err = UnknownAuditAction;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "import" => Ok(Self::Import),
            "update" => Ok(Self::Update),
            "delete_all" => Ok(Self::DeleteAll),
            other => Err(UnknownAuditAction(other.to_owned())),
        }
    }
}

/// Number of audit entries to read, between 1 and [`MAX_AUDIT_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AuditLimit(u32);

/// Raised for a requested entry count outside the accepted range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("limit must be between 1 and {max}, got {requested}")]
pub struct AuditLimitError {
    /// The rejected count.
    pub requested: i64,
    /// Largest accepted count.
    pub max: u32,
}

impl AuditLimit {
    /// Validate a requested entry count.
    ///
    /// # Errors
    ///
    /// Returns [`AuditLimitError`] when `requested` is not in
    /// `1..=MAX_AUDIT_LIMIT`.
    pub fn new(requested: i64) -> Result<Self, AuditLimitError> {
        u32::try_from(requested)
            .ok()
            .filter(|count| (1..=MAX_AUDIT_LIMIT).contains(count))
            .map(Self)
            .ok_or(AuditLimitError {
                requested,
                max: MAX_AUDIT_LIMIT,
            })
    }

    /// The count.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for AuditLimit {
    fn default() -> Self {
        Self(DEFAULT_AUDIT_LIMIT)
    }
}

/// Audit entry about to be written; the store stamps the time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// What happened.
    pub action: AuditAction,
    /// Platform profile the change targeted, when it had one.
    pub scope: Option<PlatformScope>,
    /// Counts and action names describing the change.
    pub payload: Value,
}

impl AuditRecord {
    /// Record an account-wide change.
    #[must_use]
    pub const fn new(action: AuditAction, payload: Value) -> Self {
        Self {
            action,
            scope: None,
            payload,
        }
    }

    /// Attach the platform profile the change targeted.
    #[must_use]
    pub fn with_scope(mut self, scope: Option<PlatformScope>) -> Self {
        self.scope = scope;
        self
    }

    /// Turn the record into a stored entry written at `created_at`.
    #[must_use]
    pub fn stamped(self, created_at: DateTime<Utc>) -> AuditEntry {
        AuditEntry {
            action: self.action,
            scope: self.scope,
            payload: self.payload,
            created_at,
        }
    }
}

/// One stored audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    /// What happened.
    pub action: AuditAction,
    /// Platform profile the change targeted, when it had one.
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<PlatformScope>,
    /// Counts and action names describing the change.
    pub payload: Value,
    /// Commit time of the change.
    pub created_at: DateTime<Utc>,
}
