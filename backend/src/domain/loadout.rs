//! Saved loadouts and the normaliser that turns raw client loadouts into
//! their canonical stored form.
//!
//! Loadouts are replaced wholesale; there is no field-level merge.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::account::{DestinyVersion, PlatformMembershipId, PlatformScope};

/// Validation errors for loadout inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadoutValidationError {
    /// Every loadout is keyed by an id.
    #[error("loadout id must not be empty")]
    MissingId,
    /// External class codes are 0 to 3.
    #[error("unknown loadout class type: {0}")]
    UnknownClassType(i64),
}

/// Character class a loadout applies to.
///
/// Two numeric encodings exist. The loadout ordinal (`any=-1, warlock=0,
/// titan=1, hunter=2`) appears in raw client loadouts; the class type
/// (`titan=0, hunter=1, warlock=2, any=3`) is what gets stored and returned.
///
/// # Examples
/// ```
/// use profile_sync::domain::CharacterClass;
///
/// let class = CharacterClass::from_loadout_ordinal(Some(2));
/// assert_eq!(class, CharacterClass::Hunter);
/// assert_eq!(class.class_type(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CharacterClass {
    /// Usable by any class.
    #[default]
    Any,
    /// Warlock only.
    Warlock,
    /// Titan only.
    Titan,
    /// Hunter only.
    Hunter,
}

impl CharacterClass {
    /// Every class, for exhaustive iteration.
    pub const ALL: [Self; 4] = [Self::Any, Self::Warlock, Self::Titan, Self::Hunter];

    /// Decode a raw loadout ordinal; unknown or absent values mean [`Self::Any`].
    #[must_use]
    pub fn from_loadout_ordinal(ordinal: Option<i64>) -> Self {
        match ordinal {
            Some(0) => Self::Warlock,
            Some(1) => Self::Titan,
            Some(2) => Self::Hunter,
            _ => Self::Any,
        }
    }

    /// Encode as a raw loadout ordinal.
    #[must_use]
    pub fn loadout_ordinal(self) -> i64 {
        match self {
            Self::Any => -1,
            Self::Warlock => 0,
            Self::Titan => 1,
            Self::Hunter => 2,
        }
    }

    /// Encode as the stored class type.
    #[must_use]
    pub fn class_type(self) -> i64 {
        match self {
            Self::Titan => 0,
            Self::Hunter => 1,
            Self::Warlock => 2,
            Self::Any => 3,
        }
    }

    /// Decode a stored class type.
    pub fn from_class_type(class_type: i64) -> Result<Self, LoadoutValidationError> {
        match class_type {
            0 => Ok(Self::Titan),
            1 => Ok(Self::Hunter),
            2 => Ok(Self::Warlock),
            3 => Ok(Self::Any),
            other => Err(LoadoutValidationError::UnknownClassType(other)),
        }
    }
}

impl TryFrom<i64> for CharacterClass {
    type Error = LoadoutValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_class_type(value)
    }
}

impl From<CharacterClass> for i64 {
    fn from(value: CharacterClass) -> Self {
        value.class_type()
    }
}

impl Serialize for CharacterClass {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i64(self.class_type())
    }
}

impl<'de> Deserialize<'de> for CharacterClass {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Self::from_class_type(raw).map_err(serde::de::Error::custom)
    }
}

/// Client-assigned loadout identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LoadoutId(String);

impl LoadoutId {
    /// Validate and construct a loadout id.
    pub fn new(raw: impl Into<String>) -> Result<Self, LoadoutValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(LoadoutValidationError::MissingId);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LoadoutId {
    type Error = LoadoutValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LoadoutId> for String {
    fn from(value: LoadoutId) -> Self {
        value.0
    }
}

impl fmt::Display for LoadoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One item slot in a canonical loadout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadoutItem {
    /// Item instance id; absent for uninstanced items.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Item definition hash.
    pub hash: u32,
    /// Stack size.
    #[serde(default = "default_amount")]
    pub amount: u32,
}

fn default_amount() -> u32 {
    1
}

/// Canonical loadout as stored and returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loadout {
    /// Identifier, unique within a profile scope.
    pub id: LoadoutId,
    /// Display name.
    pub name: String,
    /// Class restriction, serialised as the stored class type.
    #[serde(default)]
    pub class_type: CharacterClass,
    /// Whether applying the loadout moves other items away.
    #[serde(default)]
    pub clear_space: bool,
    /// Items to equip, in order.
    #[serde(default)]
    pub equipped: Vec<LoadoutItem>,
    /// Items to carry but not equip, in order.
    #[serde(default)]
    pub unequipped: Vec<LoadoutItem>,
}

/// Item entry of a raw client loadout.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawLoadoutItem {
    /// Item instance id.
    #[serde(default)]
    pub id: Option<String>,
    /// Item definition hash.
    pub hash: u32,
    /// Stack size.
    #[serde(default = "default_amount")]
    pub amount: u32,
    /// Whether the item is equipped rather than carried.
    #[serde(default)]
    pub equipped: bool,
}

/// Loadout as written by older clients, before normalisation.
///
/// Everything except the items is optional here; [`normalize_loadout`]
/// decides what is required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLoadout {
    /// Loadout id.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Class as a loadout ordinal.
    #[serde(default)]
    pub class_type: Option<i64>,
    /// Clear-space flag.
    #[serde(default)]
    pub clear_space: Option<bool>,
    /// Owning platform profile, written as a string or a number.
    #[serde(default, deserialize_with = "lenient_membership_id")]
    pub membership_id: Option<String>,
    /// Owning game-data generation.
    #[serde(default)]
    pub destiny_version: Option<i64>,
    /// Flat item list, split by the `equipped` flag.
    #[serde(default)]
    pub items: Vec<RawLoadoutItem>,
}

fn lenient_membership_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(raw)) => Some(raw),
        Some(Value::Number(raw)) => Some(raw.to_string()),
        _ => None,
    })
}

/// Canonical loadout plus the platform scope it was found under, when the raw
/// record named one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformLoadout {
    /// `None` when the raw loadout lacked a usable platform or version.
    pub scope: Option<PlatformScope>,
    /// The normalised loadout.
    pub loadout: Loadout,
}

/// Convert a raw loadout to canonical form.
///
/// The class ordinal is re-encoded as a class type, items are partitioned by
/// their `equipped` flag with relative order kept, and item metadata beyond
/// `{id, hash, amount}` is dropped. A missing or unusable platform or version
/// yields `scope: None` rather than an error.
///
/// # Errors
/// [`LoadoutValidationError::MissingId`] when the raw loadout has no id.
pub fn normalize_loadout(raw: RawLoadout) -> Result<PlatformLoadout, LoadoutValidationError> {
    let id = LoadoutId::new(raw.id.unwrap_or_default())?;

    let scope = raw
        .membership_id
        .and_then(|pmid| PlatformMembershipId::new(pmid).ok())
        .zip(
            raw.destiny_version
                .and_then(|version| DestinyVersion::try_from(version).ok()),
        )
        .map(|(pmid, version)| PlatformScope::new(pmid, version));

    let (equipped, unequipped): (Vec<_>, Vec<_>) =
        raw.items.into_iter().partition(|item| item.equipped);
    let strip = |items: Vec<RawLoadoutItem>| {
        items
            .into_iter()
            .map(|item| LoadoutItem {
                id: item.id,
                hash: item.hash,
                amount: item.amount,
            })
            .collect::<Vec<_>>()
    };

    Ok(PlatformLoadout {
        scope,
        loadout: Loadout {
            id,
            name: raw.name.unwrap_or_default(),
            class_type: CharacterClass::from_loadout_ordinal(raw.class_type),
            clear_space: raw.clear_space.unwrap_or(false),
            equipped: strip(equipped),
            unequipped: strip(unequipped),
        },
    })
}
