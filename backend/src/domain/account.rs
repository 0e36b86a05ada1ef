//! Account identity and profile scoping.
//!
//! Settings belong to an [`AccountId`] alone. Loadouts and item annotations
//! belong to a [`ProfileScope`]: the account plus one game platform profile
//! ([`PlatformMembershipId`]) and one game-data generation
//! ([`DestinyVersion`]). Records that cannot name a full scope are not
//! synchronizable.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors raised while constructing account identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountValidationError {
    /// Account ids are positive integers.
    #[error("account id must be a positive integer")]
    InvalidAccountId,
    /// Platform membership ids are non-empty strings of ASCII digits.
    #[error("platform membership id must be a non-empty string of digits")]
    InvalidPlatformMembershipId,
    /// Only generations 1 and 2 exist.
    #[error("destiny version must be 1 or 2, got {0}")]
    InvalidDestinyVersion(i64),
}

/// Stable identifier of the authenticated account.
///
/// # Examples
/// ```
/// use profile_sync::domain::AccountId;
///
/// let id = AccountId::new(4321).expect("positive id");
/// assert_eq!(id.get(), 4321);
/// assert!(AccountId::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct AccountId(i64);

impl AccountId {
    /// Validate and wrap a raw account id.
    pub fn new(raw: i64) -> Result<Self, AccountValidationError> {
        if raw <= 0 {
            return Err(AccountValidationError::InvalidAccountId);
        }
        Ok(Self(raw))
    }

    /// Raw integer value, as stored.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for AccountId {
    type Error = AccountValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountId> for i64 {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

impl std::str::FromStr for AccountId {
    type Err = AccountValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .trim()
            .parse::<i64>()
            .map_err(|_| AccountValidationError::InvalidAccountId)?;
        Self::new(raw)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one game platform profile, kept in its decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlatformMembershipId(String);

impl PlatformMembershipId {
    /// Validate and construct a platform membership id.
    ///
    /// # Examples
    /// ```
    /// use profile_sync::domain::PlatformMembershipId;
    ///
    /// assert!(PlatformMembershipId::new("213512057").is_ok());
    /// assert!(PlatformMembershipId::new("12ab").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> Result<Self, AccountValidationError> {
        let raw = raw.into();
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AccountValidationError::InvalidPlatformMembershipId);
        }
        Ok(Self(raw))
    }

    /// Borrow the decimal representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PlatformMembershipId {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlatformMembershipId> for String {
    fn from(value: PlatformMembershipId) -> Self {
        value.0
    }
}

impl fmt::Display for PlatformMembershipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Game-data generation selector.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i64", into = "i64")]
pub enum DestinyVersion {
    /// The first generation.
    One,
    /// The second generation; the default when callers do not say.
    #[default]
    Two,
}

impl DestinyVersion {
    /// Numeric wire value (`1` or `2`).
    #[must_use]
    pub fn as_number(self) -> i16 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }
}

impl TryFrom<i64> for DestinyVersion {
    type Error = AccountValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(AccountValidationError::InvalidDestinyVersion(other)),
        }
    }
}

impl From<DestinyVersion> for i64 {
    fn from(value: DestinyVersion) -> Self {
        i64::from(value.as_number())
    }
}

impl fmt::Display for DestinyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_number())
    }
}

/// Platform half of the account key: which game profile a record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformScope {
    /// Game platform profile.
    pub platform_membership_id: PlatformMembershipId,
    /// Game-data generation.
    pub destiny_version: DestinyVersion,
}

impl PlatformScope {
    /// Pair a platform profile with a generation.
    #[must_use]
    pub fn new(platform_membership_id: PlatformMembershipId, destiny_version: DestinyVersion) -> Self {
        Self {
            platform_membership_id,
            destiny_version,
        }
    }

    /// Attach the owning account to form a full [`ProfileScope`].
    #[must_use]
    pub fn for_account(self, account_id: AccountId) -> ProfileScope {
        ProfileScope {
            account_id,
            platform: self,
        }
    }
}

/// Full account key `(accountId, platformMembershipId, destinyVersion)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileScope {
    /// Owning account.
    pub account_id: AccountId,
    /// Platform profile and generation.
    pub platform: PlatformScope,
}

impl ProfileScope {
    /// Build a scope from its three parts.
    #[must_use]
    pub fn new(
        account_id: AccountId,
        platform_membership_id: PlatformMembershipId,
        destiny_version: DestinyVersion,
    ) -> Self {
        PlatformScope::new(platform_membership_id, destiny_version).for_account(account_id)
    }

    /// Platform profile of this scope.
    #[must_use]
    pub fn platform_membership_id(&self) -> &PlatformMembershipId {
        &self.platform.platform_membership_id
    }

    /// Generation of this scope.
    #[must_use]
    pub fn destiny_version(&self) -> DestinyVersion {
        self.platform.destiny_version
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::zero(0)]
    #[case::negative(-7)]
    fn account_id_rejects_non_positive(#[case] raw: i64) {
        assert_eq!(
            AccountId::new(raw),
            Err(AccountValidationError::InvalidAccountId)
        );
    }

    #[rstest]
    fn account_id_parses_trimmed_header_values() {
        let id: AccountId = " 4321 ".parse().expect("valid id");
        assert_eq!(id.get(), 4321);
    }

    #[rstest]
    #[case::empty("")]
    #[case::letters("abc")]
    #[case::signed("-123")]
    #[case::spaced("12 3")]
    fn platform_membership_id_rejects_non_digits(#[case] raw: &str) {
        assert!(PlatformMembershipId::new(raw).is_err());
    }

    #[rstest]
    #[case(1, DestinyVersion::One)]
    #[case(2, DestinyVersion::Two)]
    fn destiny_version_accepts_known_generations(#[case] raw: i64, #[case] expected: DestinyVersion) {
        assert_eq!(DestinyVersion::try_from(raw), Ok(expected));
    }

    #[rstest]
    #[case(0)]
    #[case(3)]
    fn destiny_version_rejects_unknown_generations(#[case] raw: i64) {
        assert!(DestinyVersion::try_from(raw).is_err());
    }

    #[rstest]
    fn destiny_version_serialises_as_number() {
        let json = serde_json::to_string(&DestinyVersion::Two).expect("serialise");
        assert_eq!(json, "2");
        let parsed: DestinyVersion = serde_json::from_str("1").expect("deserialise");
        assert_eq!(parsed, DestinyVersion::One);
    }

    #[rstest]
    fn profile_scope_exposes_parts() {
        let account = AccountId::new(1).expect("account");
        let platform = PlatformMembershipId::new("42").expect("platform");
        let scope = ProfileScope::new(account, platform.clone(), DestinyVersion::One);

        assert_eq!(scope.account_id, account);
        assert_eq!(scope.platform_membership_id(), &platform);
        assert_eq!(scope.destiny_version(), DestinyVersion::One);
    }
}
