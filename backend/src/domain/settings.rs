//! Display settings and their delta-from-defaults storage form.
//!
//! Settings are a flat mapping of option names to scalar JSON values. Only the
//! keys whose value differs from the canonical defaults are persisted (the
//! delta); reads rebuild the effective settings by overlaying the delta on the
//! defaults. The defaults are an explicit [`DefaultSettings`] value handed to
//! whoever reconciles settings, so tests and deployments can substitute their
//! own table.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Errors raised while loading a default settings table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefaultSettingsError {
    /// The document is not valid JSON.
    #[error("default settings are not valid JSON: {message}")]
    InvalidJson {
        /// Parser diagnostic.
        message: String,
    },
    /// The document is valid JSON but not an object.
    #[error("default settings must be a JSON object")]
    NotAnObject,
    /// Defaults must be flat scalars.
    #[error("default setting `{key}` must be a string, number, or boolean")]
    NonScalarValue {
        /// Offending key.
        key: String,
    },
}

/// A mapping of option names to values.
///
/// Used for full effective settings, for persisted deltas, and for partial
/// client-supplied settings; which one a value is depends on where it came
/// from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, Value>);

impl Settings {
    /// Create an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up one option.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Set one option, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Number of options present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no options are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Keys in key order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Convert into a JSON object value.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0.into_iter().collect())
    }
}

impl FromIterator<(String, Value)> for Settings {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<serde_json::Map<String, Value>> for Settings {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// Canonical default settings, fixed for the lifetime of the process.
///
/// Cheap to clone; the table is shared.
///
/// # Examples
/// ```
/// use profile_sync::domain::{DefaultSettings, Settings};
/// use serde_json::json;
///
/// let defaults = DefaultSettings::from_json_str(r#"{"itemSize": 50, "language": "en"}"#)
///     .expect("valid defaults");
/// let mut candidate = Settings::new();
/// candidate.insert("itemSize", json!(50));
/// candidate.insert("language", json!("de"));
///
/// let delta = defaults.diff(&candidate);
/// assert_eq!(delta.len(), 1);
/// assert_eq!(defaults.merge(&delta).get("language"), Some(&json!("de")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultSettings {
    values: Arc<Settings>,
}

impl DefaultSettings {
    /// The built-in defaults shipped with the service.
    #[must_use]
    pub fn builtin() -> Self {
        let entries = [
            ("allowIdPostToDtr", json!(true)),
            ("charCol", json!(3)),
            ("charColMobile", json!(4)),
            ("colorA11y", json!("-")),
            ("compareBaseStats", json!(false)),
            ("farmingMakeRoomForItems", json!(true)),
            ("hideCompletedRecords", json!(false)),
            ("inventoryClearSpaces", json!(false)),
            ("itemSize", json!(50)),
            ("itemSort", json!("custom")),
            ("language", json!("en")),
            ("reviewsModeSelection", json!(0)),
            ("reviewsPlatformSelection", json!(0)),
            ("showNewItems", json!(false)),
            ("wishListSource", json!("")),
        ];
        Self::from_settings(
            entries
                .into_iter()
                .map(|(key, value)| (key.to_owned(), value))
                .collect(),
        )
    }

    /// Parse a defaults table from a JSON object of scalar values.
    pub fn from_json_str(raw: &str) -> Result<Self, DefaultSettingsError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|err| DefaultSettingsError::InvalidJson {
                message: err.to_string(),
            })?;
        let Value::Object(map) = value else {
            return Err(DefaultSettingsError::NotAnObject);
        };
        if let Some((key, _)) = map
            .iter()
            .find(|(_, value)| value.is_object() || value.is_array() || value.is_null())
        {
            return Err(DefaultSettingsError::NonScalarValue { key: key.clone() });
        }
        Ok(Self::from_settings(Settings::from(map)))
    }

    /// Wrap an already-built table.
    #[must_use]
    pub fn from_settings(values: Settings) -> Self {
        Self {
            values: Arc::new(values),
        }
    }

    /// Borrow the full defaults table.
    #[must_use]
    pub fn values(&self) -> &Settings {
        &self.values
    }

    /// Reduce `candidate` to the options that differ from the defaults.
    ///
    /// Only keys known to the defaults are considered; unknown keys never
    /// leak into the delta.
    #[must_use]
    pub fn diff(&self, candidate: &Settings) -> Settings {
        self.values
            .iter()
            .filter_map(|(key, default)| {
                candidate
                    .get(key)
                    .filter(|value| !same_setting_value(value, default))
                    .map(|value| (key.clone(), value.clone()))
            })
            .collect()
    }

    /// Rebuild effective settings by overlaying `delta` on the defaults.
    ///
    /// The result has exactly the keys of the defaults.
    #[must_use]
    pub fn merge(&self, delta: &Settings) -> Settings {
        self.values
            .iter()
            .map(|(key, default)| {
                let value = delta.get(key).unwrap_or(default);
                (key.clone(), value.clone())
            })
            .collect()
    }

    /// Fold a partial client update into a stored delta, returning the new
    /// minimal delta.
    #[must_use]
    pub fn apply_partial(&self, stored_delta: &Settings, partial: &Settings) -> Settings {
        let mut effective = self.merge(stored_delta);
        for (key, value) in partial.iter() {
            if effective.get(key).is_some() {
                effective.insert(key.clone(), value.clone());
            }
        }
        self.diff(&effective)
    }
}

/// Value equality with numbers compared numerically, so `50` and `50.0` are
/// the same setting.
fn same_setting_value(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            a == b || a.as_f64().partial_cmp(&b.as_f64()) == Some(std::cmp::Ordering::Equal)
        }
        _ => left == right,
    }
}

impl Default for DefaultSettings {
    fn default() -> Self {
        Self::builtin()
    }
}
