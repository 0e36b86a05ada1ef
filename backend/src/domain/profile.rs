//! Read-side profile shapes: component selection, profile snapshots, and the
//! full-account export.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::account::PlatformScope;
use super::item_annotation::ItemAnnotation;
use super::loadout::Loadout;
use super::settings::Settings;

/// Validation errors for profile read requests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProfileRequestError {
    /// A component name is not recognised.
    #[error("unknown profile component: {0}")]
    UnknownComponent(String),
    /// At least one component must be requested.
    #[error("no profile components requested")]
    NoComponents,
    /// Loadouts and tags are scoped to a platform profile.
    #[error("platformMembershipId is required to read {component}")]
    MissingPlatform {
        /// Component that needed the scope.
        component: &'static str,
    },
}

/// One section of the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileComponent {
    /// Effective settings.
    Settings,
    /// Loadouts for one platform profile.
    Loadouts,
    /// Item annotations for one platform profile.
    Tags,
}

impl ProfileComponent {
    /// Query-string name of the component.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Settings => "settings",
            Self::Loadouts => "loadouts",
            Self::Tags => "tags",
        }
    }
}

impl FromStr for ProfileComponent {
    type Err = ProfileRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "settings" => Ok(Self::Settings),
            "loadouts" => Ok(Self::Loadouts),
            "tags" => Ok(Self::Tags),
            other => Err(ProfileRequestError::UnknownComponent(other.to_owned())),
        }
    }
}

/// Non-empty set of requested components.
///
/// # Examples
/// ```
/// use profile_sync::domain::{ProfileComponent, ProfileComponents};
///
/// let components: ProfileComponents = "settings, tags".parse().expect("valid list");
/// assert!(components.contains(ProfileComponent::Tags));
/// assert!(!components.contains(ProfileComponent::Loadouts));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileComponents {
    settings: bool,
    loadouts: bool,
    tags: bool,
}

impl ProfileComponents {
    /// Every component.
    #[must_use]
    pub fn all() -> Self {
        Self {
            settings: true,
            loadouts: true,
            tags: true,
        }
    }

    /// Whether `component` was requested.
    #[must_use]
    pub fn contains(self, component: ProfileComponent) -> bool {
        match component {
            ProfileComponent::Settings => self.settings,
            ProfileComponent::Loadouts => self.loadouts,
            ProfileComponent::Tags => self.tags,
        }
    }

    /// Requested components that need a platform scope.
    pub fn scoped(self) -> impl Iterator<Item = ProfileComponent> {
        [ProfileComponent::Loadouts, ProfileComponent::Tags]
            .into_iter()
            .filter(move |component| self.contains(*component))
    }
}

impl FromStr for ProfileComponents {
    type Err = ProfileRequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut components = Self::from_flags(false, false, false);
        for name in s.split(',').map(str::trim).filter(|name| !name.is_empty()) {
            match name.parse()? {
                ProfileComponent::Settings => components.settings = true,
                ProfileComponent::Loadouts => components.loadouts = true,
                ProfileComponent::Tags => components.tags = true,
            }
        }
        if components == Self::from_flags(false, false, false) {
            return Err(ProfileRequestError::NoComponents);
        }
        Ok(components)
    }
}

impl ProfileComponents {
    fn from_flags(settings: bool, loadouts: bool, tags: bool) -> Self {
        Self {
            settings,
            loadouts,
            tags,
        }
    }
}

/// Validated profile read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRequest {
    scope: Option<PlatformScope>,
    components: ProfileComponents,
}

impl ProfileRequest {
    /// Validate that scoped components come with a platform scope.
    pub fn new(
        scope: Option<PlatformScope>,
        components: ProfileComponents,
    ) -> Result<Self, ProfileRequestError> {
        if let (None, Some(component)) = (&scope, components.scoped().next()) {
            return Err(ProfileRequestError::MissingPlatform {
                component: component.as_str(),
            });
        }
        Ok(Self { scope, components })
    }

    /// Platform scope, present whenever loadouts or tags were requested.
    #[must_use]
    pub fn scope(&self) -> Option<&PlatformScope> {
        self.scope.as_ref()
    }

    /// Requested components.
    #[must_use]
    pub fn components(&self) -> ProfileComponents {
        self.components
    }
}

/// Profile read result; only requested sections are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    /// Full effective settings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<Settings>,
    /// Loadouts of the requested platform profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loadouts: Option<Vec<Loadout>>,
    /// Annotations of the requested platform profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<ItemAnnotation>>,
}

/// Loadout together with the platform profile that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedLoadout {
    /// Owning platform profile.
    #[serde(flatten)]
    pub scope: PlatformScope,
    /// The loadout.
    pub loadout: Loadout,
}

/// Annotation together with the platform profile that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedAnnotation {
    /// Owning platform profile.
    #[serde(flatten)]
    pub scope: PlatformScope,
    /// The annotation.
    pub annotation: ItemAnnotation,
}

/// Everything stored for one account, across platform profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileExport {
    /// Full effective settings.
    pub settings: Settings,
    /// Every loadout.
    pub loadouts: Vec<ScopedLoadout>,
    /// Every annotation.
    pub tags: Vec<ScopedAnnotation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DestinyVersion, PlatformMembershipId};
    use rstest::rstest;

    fn scope() -> PlatformScope {
        PlatformScope::new(
            PlatformMembershipId::new("1").expect("platform"),
            DestinyVersion::Two,
        )
    }

    #[rstest]
    #[case::single("settings", (true, false, false))]
    #[case::spaced(" loadouts , tags ", (false, true, true))]
    #[case::repeated("tags,tags,", (false, false, true))]
    fn parses_component_lists(#[case] raw: &str, #[case] flags: (bool, bool, bool)) {
        let parsed: ProfileComponents = raw.parse().expect("valid list");
        assert_eq!(parsed, ProfileComponents::from_flags(flags.0, flags.1, flags.2));
    }

    #[rstest]
    #[case::empty("", ProfileRequestError::NoComponents)]
    #[case::commas(" , ", ProfileRequestError::NoComponents)]
    #[case::unknown("settings,bogus", ProfileRequestError::UnknownComponent("bogus".to_owned()))]
    fn rejects_bad_component_lists(#[case] raw: &str, #[case] expected: ProfileRequestError) {
        assert_eq!(raw.parse::<ProfileComponents>(), Err(expected));
    }

    #[rstest]
    fn scoped_components_need_a_platform() {
        let components: ProfileComponents = "settings,tags".parse().expect("valid list");
        assert_eq!(
            ProfileRequest::new(None, components),
            Err(ProfileRequestError::MissingPlatform { component: "tags" })
        );
        assert!(ProfileRequest::new(Some(scope()), components).is_ok());
    }

    #[rstest]
    fn settings_alone_need_no_platform() {
        let components: ProfileComponents = "settings".parse().expect("valid list");
        assert!(ProfileRequest::new(None, components).is_ok());
    }

    #[rstest]
    fn scoped_records_flatten_their_scope() {
        let record = ScopedAnnotation {
            scope: scope(),
            annotation: ItemAnnotation {
                id: crate::domain::ItemId::new("9").expect("id"),
                tag: None,
                notes: Some("n".to_owned()),
            },
        };
        let value = serde_json::to_value(&record).expect("serialise");
        assert_eq!(
            value,
            serde_json::json!({
                "platformMembershipId": "1",
                "destinyVersion": 2,
                "annotation": {"id": "9", "notes": "n"}
            })
        );
    }
}
