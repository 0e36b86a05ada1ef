//! Direct profile updates sent by current clients.

use serde::{Deserialize, Serialize};

use super::account::{DestinyVersion, PlatformMembershipId, PlatformScope};
use super::item_annotation::{AnnotationUpdate, ItemId};
use super::loadout::{Loadout, LoadoutId};
use super::settings::Settings;

/// One change inside a profile update request.
///
/// # Examples
/// ```
/// use profile_sync::domain::ProfileUpdate;
///
/// let update: ProfileUpdate = serde_json::from_str(
///     r#"{"action": "tag", "payload": {"id": "123", "tag": "keep"}}"#,
/// )
/// .expect("valid update");
/// assert!(update.needs_scope());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "payload", rename_all = "snake_case")]
pub enum ProfileUpdate {
    /// Partial settings merged onto the stored effective settings.
    Setting(Settings),
    /// Whole loadout, replacing any stored loadout with the same id.
    Loadout(Loadout),
    /// Remove one loadout.
    DeleteLoadout(LoadoutId),
    /// Partial annotation update.
    Tag(AnnotationUpdate),
    /// Remove several annotations.
    TagCleanup(Vec<ItemId>),
}

impl ProfileUpdate {
    /// Action name as sent on the wire.
    #[must_use]
    pub fn action(&self) -> &'static str {
        match self {
            Self::Setting(_) => "setting",
            Self::Loadout(_) => "loadout",
            Self::DeleteLoadout(_) => "delete_loadout",
            Self::Tag(_) => "tag",
            Self::TagCleanup(_) => "tag_cleanup",
        }
    }

    /// Whether the update touches platform-scoped records.
    ///
    /// `tag_cleanup` deletes by account and item id, so it does not.
    #[must_use]
    pub fn needs_scope(&self) -> bool {
        matches!(self, Self::Loadout(_) | Self::DeleteLoadout(_) | Self::Tag(_))
    }
}

/// A batch of updates applied in one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    /// Platform profile for scoped updates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_membership_id: Option<PlatformMembershipId>,
    /// Generation for scoped updates; defaults to 2.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destiny_version: Option<DestinyVersion>,
    /// Updates in application order.
    pub updates: Vec<ProfileUpdate>,
}

impl ProfileUpdateRequest {
    /// Platform scope of the request, when a platform profile was named.
    #[must_use]
    pub fn scope(&self) -> Option<PlatformScope> {
        self.platform_membership_id
            .clone()
            .map(|pmid| PlatformScope::new(pmid, self.destiny_version.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CharacterClass, FieldUpdate};
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    fn parses_every_action() {
        let request: ProfileUpdateRequest = serde_json::from_value(json!({
            "platformMembershipId": "4611686018",
            "updates": [
                {"action": "setting", "payload": {"itemSize": 35}},
                {"action": "loadout", "payload": {
                    "id": "l1", "name": "PvP", "classType": 1, "clearSpace": false,
                    "equipped": [{"id": "1", "hash": 100, "amount": 1}], "unequipped": []
                }},
                {"action": "delete_loadout", "payload": "l0"},
                {"action": "tag", "payload": {"id": "9", "notes": null}},
                {"action": "tag_cleanup", "payload": ["1", "2"]}
            ]
        }))
        .expect("valid request");

        let actions: Vec<_> = request.updates.iter().map(ProfileUpdate::action).collect();
        assert_eq!(
            actions,
            vec!["setting", "loadout", "delete_loadout", "tag", "tag_cleanup"]
        );
        let Some(ProfileUpdate::Loadout(loadout)) = request.updates.get(1) else {
            panic!("expected loadout update");
        };
        assert_eq!(loadout.class_type, CharacterClass::Hunter);
        let Some(ProfileUpdate::Tag(tag)) = request.updates.get(3) else {
            panic!("expected tag update");
        };
        assert_eq!(tag.notes, FieldUpdate::Clear);
        assert_eq!(tag.tag, FieldUpdate::Unchanged);
    }

    #[rstest]
    fn scope_defaults_to_second_generation() {
        let request: ProfileUpdateRequest = serde_json::from_value(json!({
            "platformMembershipId": "7",
            "updates": []
        }))
        .expect("valid request");

        let scope = request.scope().expect("scope");
        assert_eq!(scope.destiny_version, DestinyVersion::Two);
    }

    #[rstest]
    fn scope_is_absent_without_platform() {
        let request: ProfileUpdateRequest =
            serde_json::from_value(json!({"destinyVersion": 1, "updates": []}))
                .expect("valid request");
        assert!(request.scope().is_none());
    }

    #[rstest]
    #[case::unknown_action(json!({"action": "explode", "payload": {}}))]
    #[case::bad_loadout(json!({"action": "loadout", "payload": {"name": "no id"}}))]
    fn rejects_malformed_updates(#[case] value: serde_json::Value) {
        assert!(serde_json::from_value::<ProfileUpdate>(value).is_err());
    }
}
