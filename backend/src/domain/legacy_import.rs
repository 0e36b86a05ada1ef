//! Extraction of typed entities from a legacy client snapshot.
//!
//! The snapshot is one JSON object mixing fixed keys (`settings-v1.0`,
//! `loadouts-v3.0`), loadout objects stored under their own ids, and one
//! annotation table per platform profile under
//! `dimItemInfo-m<platformMembershipId>-d<1|2>`. Every other key is inert.

use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::account::{DestinyVersion, PlatformMembershipId, PlatformScope};
use super::item_annotation::{AnnotationUpdate, FieldUpdate, ItemId, TagValue};
use super::loadout::{PlatformLoadout, RawLoadout, normalize_loadout};
use super::settings::{DefaultSettings, Settings};

/// Key holding the partial settings object.
pub const SETTINGS_KEY: &str = "settings-v1.0";
/// Key holding the ordered list of loadout ids.
pub const LOADOUT_IDS_KEY: &str = "loadouts-v3.0";

static ANNOTATION_KEY_RE: OnceLock<Regex> = OnceLock::new();

fn annotation_key_regex() -> &'static Regex {
    ANNOTATION_KEY_RE.get_or_init(|| {
        Regex::new(r"^dimItemInfo-m(\d+)-d([12])$")
            .unwrap_or_else(|error| panic!("annotation key regex failed to compile: {error}"))
    })
}

/// Errors that abort an import before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LegacyImportError {
    /// A referenced loadout object has no id.
    #[error("loadout `{key}` has no id")]
    LoadoutWithoutId {
        /// Blob key the loadout was found under.
        key: String,
    },
    /// An annotation table contains an empty item id.
    #[error("annotation table `{key}` contains an empty item id")]
    AnnotationWithoutId {
        /// Annotation table key.
        key: String,
    },
}

/// Legacy snapshot as received.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LegacyBlob(Map<String, Value>);

impl LegacyBlob {
    /// Wrap a parsed JSON object.
    #[must_use]
    pub fn new(entries: Map<String, Value>) -> Self {
        Self(entries)
    }

    /// Whether the blob holds `key`.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of top-level keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the blob holds no keys at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }
}

impl From<Map<String, Value>> for LegacyBlob {
    fn from(entries: Map<String, Value>) -> Self {
        Self::new(entries)
    }
}

/// Annotation update tagged with the platform profile it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformAnnotation {
    /// Platform profile parsed from the table key.
    pub scope: PlatformScope,
    /// Fields present on the legacy entry.
    pub update: AnnotationUpdate,
}

/// Typed result of extraction, ready for the sync coordinator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportBatch {
    /// Settings delta against the defaults.
    pub settings: Settings,
    /// Loadouts in list order; unscoped ones are skipped when applied.
    pub loadouts: Vec<PlatformLoadout>,
    /// Annotations in table then item order.
    pub annotations: Vec<PlatformAnnotation>,
    /// Loadout ids whose object was missing or unreadable.
    pub dropped_loadouts: usize,
}

#[derive(Debug, Deserialize)]
struct LegacyAnnotation {
    #[serde(default)]
    tag: FieldUpdate<String>,
    #[serde(default)]
    notes: FieldUpdate<String>,
}

/// Scan a legacy snapshot and produce typed collections.
///
/// # Errors
/// Returns [`LegacyImportError`] when a record that must be imported lacks
/// its identifier. Records that are merely unusable (dangling loadout ids,
/// unknown keys, unknown tags) are dropped instead.
///
/// # Examples
/// ```
/// use profile_sync::domain::{DefaultSettings, LegacyBlob, extract_import};
///
/// let blob: LegacyBlob = serde_json::from_value(serde_json::json!({
///     "dimItemInfo-m213512057-d2": {"123456": {"tag": "favorite"}},
///     "foo-bar": {"ignored": true}
/// }))
/// .expect("object");
///
/// let batch = extract_import(&blob, &DefaultSettings::builtin()).expect("extract");
/// assert_eq!(batch.annotations.len(), 1);
/// assert_eq!(batch.annotations[0].update.id.as_str(), "123456");
/// ```
pub fn extract_import(
    blob: &LegacyBlob,
    defaults: &DefaultSettings,
) -> Result<ImportBatch, LegacyImportError> {
    let settings = extract_settings(blob, defaults);
    let (loadouts, dropped_loadouts) = extract_loadouts(blob)?;
    let annotations = extract_annotations(blob)?;
    debug!(
        settings = settings.len(),
        loadouts = loadouts.len(),
        dropped_loadouts,
        annotations = annotations.len(),
        "extracted legacy snapshot"
    );
    Ok(ImportBatch {
        settings,
        loadouts,
        annotations,
        dropped_loadouts,
    })
}

fn extract_settings(blob: &LegacyBlob, defaults: &DefaultSettings) -> Settings {
    match blob.get(SETTINGS_KEY) {
        Some(Value::Object(map)) => defaults.diff(&Settings::from(map.clone())),
        Some(other) => {
            warn!(kind = json_kind(other), "legacy settings are not an object; ignoring");
            Settings::new()
        }
        None => Settings::new(),
    }
}

fn extract_loadouts(blob: &LegacyBlob) -> Result<(Vec<PlatformLoadout>, usize), LegacyImportError> {
    let Some(Value::Array(ids)) = blob.get(LOADOUT_IDS_KEY) else {
        return Ok((Vec::new(), 0));
    };

    let mut loadouts = Vec::with_capacity(ids.len());
    let mut dropped = 0;
    for key in ids.iter().filter_map(Value::as_str) {
        let Some(value) = blob.get(key).filter(|value| value.is_object()) else {
            debug!(loadout_key = key, "loadout id has no matching object; dropping");
            dropped += 1;
            continue;
        };
        let raw = match RawLoadout::deserialize(value) {
            Ok(raw) => raw,
            Err(error) => {
                warn!(loadout_key = key, %error, "unreadable legacy loadout; dropping");
                dropped += 1;
                continue;
            }
        };
        let normalised = normalize_loadout(raw).map_err(|_| LegacyImportError::LoadoutWithoutId {
            key: key.to_owned(),
        })?;
        loadouts.push(normalised);
    }
    Ok((loadouts, dropped))
}

fn extract_annotations(blob: &LegacyBlob) -> Result<Vec<PlatformAnnotation>, LegacyImportError> {
    let mut annotations = Vec::new();
    for (key, table) in &blob.0 {
        let Some(scope) = parse_annotation_key(key) else {
            continue;
        };
        let Value::Object(entries) = table else {
            warn!(annotation_key = %key, "annotation table is not an object; ignoring");
            continue;
        };
        for (item, entry) in entries {
            let id = ItemId::new(item.clone())
                .map_err(|_| LegacyImportError::AnnotationWithoutId { key: key.clone() })?;
            let Ok(legacy) = LegacyAnnotation::deserialize(entry) else {
                warn!(annotation_key = %key, item_id = %id, "unreadable legacy annotation; dropping");
                continue;
            };
            annotations.push(PlatformAnnotation {
                scope: scope.clone(),
                update: AnnotationUpdate::new(id)
                    .with_tag(parse_legacy_tag(legacy.tag))
                    .with_notes(legacy.notes),
            });
        }
    }
    Ok(annotations)
}

/// Parse an annotation table key into its platform scope.
///
/// Keys that do not match exactly, including ones whose numeric parts are not
/// usable, are not annotation keys.
#[must_use]
pub fn parse_annotation_key(key: &str) -> Option<PlatformScope> {
    let captures = annotation_key_regex().captures(key)?;
    let platform = PlatformMembershipId::new(captures.get(1)?.as_str()).ok()?;
    let version = match captures.get(2)?.as_str() {
        "1" => DestinyVersion::One,
        _ => DestinyVersion::Two,
    };
    Some(PlatformScope::new(platform, version))
}

fn parse_legacy_tag(tag: FieldUpdate<String>) -> FieldUpdate<TagValue> {
    match tag {
        FieldUpdate::Set(raw) => match raw.parse() {
            Ok(tag) => FieldUpdate::Set(tag),
            Err(error) => {
                warn!(%error, "dropping unknown legacy tag");
                FieldUpdate::Unchanged
            }
        },
        FieldUpdate::Clear => FieldUpdate::Clear,
        FieldUpdate::Unchanged => FieldUpdate::Unchanged,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
