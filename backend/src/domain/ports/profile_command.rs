//! Driving port for profile mutations: legacy import, direct updates, and the
//! full account purge.

use async_trait::async_trait;

use crate::domain::{
    AccountId, AppliedUpdate, DeleteOutcome, Error, ImportOutcome, LegacyBlob,
    ProfileUpdateRequest, UpdateOutcome,
};

/// Domain use-case port for changing a profile.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProfileCommand: Send + Sync {
    /// Import a legacy snapshot atomically.
    async fn import_legacy(
        &self,
        account: AccountId,
        blob: LegacyBlob,
    ) -> Result<ImportOutcome, Error>;

    /// Apply a batch of updates atomically.
    async fn apply_updates(
        &self,
        account: AccountId,
        request: ProfileUpdateRequest,
    ) -> Result<UpdateOutcome, Error>;

    /// Delete everything stored for the account.
    async fn delete_all_data(&self, account: AccountId) -> Result<DeleteOutcome, Error>;
}

/// Fixture command that accepts everything and stores nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureProfileCommand;

#[async_trait]
impl ProfileCommand for FixtureProfileCommand {
    async fn import_legacy(
        &self,
        _account: AccountId,
        _blob: LegacyBlob,
    ) -> Result<ImportOutcome, Error> {
        Ok(ImportOutcome::default())
    }

    async fn apply_updates(
        &self,
        _account: AccountId,
        request: ProfileUpdateRequest,
    ) -> Result<UpdateOutcome, Error> {
        Ok(UpdateOutcome {
            applied: request
                .updates
                .iter()
                .map(|update| AppliedUpdate {
                    action: update.action(),
                    changed: false,
                })
                .collect(),
        })
    }

    async fn delete_all_data(&self, _account: AccountId) -> Result<DeleteOutcome, Error> {
        Ok(DeleteOutcome::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ItemId, ProfileUpdate};

    #[tokio::test]
    async fn fixture_acknowledges_every_update() {
        let account = AccountId::new(1).expect("account");
        let request = ProfileUpdateRequest {
            platform_membership_id: None,
            destiny_version: None,
            updates: vec![ProfileUpdate::TagCleanup(vec![
                ItemId::new("1").expect("id"),
            ])],
        };

        let outcome = FixtureProfileCommand
            .apply_updates(account, request)
            .await
            .expect("outcome");

        assert_eq!(
            outcome.applied,
            vec![AppliedUpdate {
                action: "tag_cleanup",
                changed: false,
            }]
        );
    }
}
