//! Driving port for profile reads.
//!
//! Inbound adapters use this port to read profile sections, full exports, and
//! the audit log without depending on the store.

use async_trait::async_trait;

use crate::domain::{
    AccountId, AuditEntry, AuditLimit, DefaultSettings, Error, ProfileComponent, ProfileExport, ProfileRequest,
    ProfileSnapshot,
};

/// Domain use-case port for reading a profile.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileQuery: Send + Sync {
    /// Read the requested sections for one platform profile.
    async fn fetch_profile(
        &self,
        account: AccountId,
        request: ProfileRequest,
    ) -> Result<ProfileSnapshot, Error>;

    /// Read everything stored for the account.
    async fn export(&self, account: AccountId) -> Result<ProfileExport, Error>;

    /// Newest audit entries of the account, newest first.
    async fn audit_log(
        &self,
        account: AccountId,
        limit: AuditLimit,
    ) -> Result<Vec<AuditEntry>, Error>;
}

/// Fixture query describing an account with nothing stored.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProfileQuery;

#[async_trait]
impl ProfileQuery for FixtureProfileQuery {
    async fn fetch_profile(
        &self,
        _account: AccountId,
        request: ProfileRequest,
    ) -> Result<ProfileSnapshot, Error> {
        let components = request.components();
        let scoped = request.scope().is_some();
        Ok(ProfileSnapshot {
            settings: components
                .contains(ProfileComponent::Settings)
                .then(|| DefaultSettings::builtin().values().clone()),
            loadouts: (scoped && components.contains(ProfileComponent::Loadouts))
                .then(Vec::new),
            tags: (scoped && components.contains(ProfileComponent::Tags)).then(Vec::new),
        })
    }

    async fn export(&self, _account: AccountId) -> Result<ProfileExport, Error> {
        Ok(ProfileExport {
            settings: DefaultSettings::builtin().values().clone(),
            ..ProfileExport::default()
        })
    }

    async fn audit_log(
        &self,
        _account: AccountId,
        _limit: AuditLimit,
    ) -> Result<Vec<AuditEntry>, Error> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_returns_default_settings_only() {
        let account = AccountId::new(1).expect("account");
        let request = ProfileRequest::new(None, "settings".parse().expect("components"))
            .expect("request");

        let snapshot = FixtureProfileQuery
            .fetch_profile(account, request)
            .await
            .expect("snapshot");

        assert_eq!(
            snapshot.settings.as_ref(),
            Some(DefaultSettings::builtin().values())
        );
        assert!(snapshot.loadouts.is_none());
    }
}
