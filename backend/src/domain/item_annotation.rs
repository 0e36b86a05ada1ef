//! Per-item tags and notes, and the rules for partially updating them.
//!
//! A stored [`ItemAnnotation`] exists if and only if it carries a tag or a
//! non-empty note. [`reconcile`] folds an [`AnnotationUpdate`] into the
//! existing record and decides whether the result is written or the record is
//! removed.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Validation errors for annotation inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnnotationValidationError {
    /// Every annotation is keyed by an item id.
    #[error("item id must not be empty")]
    EmptyItemId,
    /// Tags come from a closed set.
    #[error("unknown item tag: {0}")]
    UnknownTag(String),
}

/// Inventory item instance identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(String);

impl ItemId {
    /// Validate and construct an item id.
    pub fn new(raw: impl Into<String>) -> Result<Self, AnnotationValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(AnnotationValidationError::EmptyItemId);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ItemId {
    type Error = AnnotationValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemId> for String {
    fn from(value: ItemId) -> Self {
        value.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short label a player attaches to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagValue {
    /// Marked as a favourite.
    Favorite,
    /// Worth keeping.
    Keep,
    /// Material for infusion.
    Infuse,
    /// Safe to dismantle.
    Junk,
    /// Kept but hidden from everyday views.
    Archive,
}

impl TagValue {
    /// Stored string form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Favorite => "favorite",
            Self::Keep => "keep",
            Self::Infuse => "infuse",
            Self::Junk => "junk",
            Self::Archive => "archive",
        }
    }
}

impl std::str::FromStr for TagValue {
    type Err = AnnotationValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "favorite" => Ok(Self::Favorite),
            "keep" => Ok(Self::Keep),
            "infuse" => Ok(Self::Infuse),
            "junk" => Ok(Self::Junk),
            "archive" => Ok(Self::Archive),
            other => Err(AnnotationValidationError::UnknownTag(other.to_owned())),
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored tag and notes for one item.
///
/// Absent fields are omitted when serialised, so a record holding only notes
/// reads back as `{id, notes}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAnnotation {
    /// Item the annotation belongs to.
    pub id: ItemId,
    /// Optional tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<TagValue>,
    /// Optional free-text notes; never `Some("")` once reconciled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ItemAnnotation {
    /// Whether the record carries anything worth storing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tag.is_none() && self.notes.as_deref().is_none_or(str::is_empty)
    }
}

/// Three-way change to one field of a partial update.
///
/// Deserialises from a possibly-missing JSON field: a missing field is
/// [`FieldUpdate::Unchanged`] (requires `#[serde(default)]` on the field),
/// `null` is [`FieldUpdate::Clear`], and any other value is
/// [`FieldUpdate::Set`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FieldUpdate<T> {
    /// Keep whatever is stored.
    #[default]
    Unchanged,
    /// Replace with this value.
    Set(T),
    /// Remove the stored value.
    Clear,
}

impl<T> FieldUpdate<T> {
    /// Resolve against the currently stored value.
    pub fn resolve(self, current: Option<T>) -> Option<T> {
        match self {
            Self::Unchanged => current,
            Self::Set(value) => Some(value),
            Self::Clear => None,
        }
    }

    /// Whether the update leaves the field alone.
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

impl<T> From<Option<T>> for FieldUpdate<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Clear, Self::Set)
    }
}

impl<'de, T> Deserialize<'de> for FieldUpdate<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Self::from)
    }
}

impl<T: Serialize> Serialize for FieldUpdate<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Set(value) => serializer.serialize_some(value),
            Self::Unchanged | Self::Clear => serializer.serialize_none(),
        }
    }
}

/// Partial update to one item's annotation.
///
/// # Examples
/// ```
/// use profile_sync::domain::{AnnotationUpdate, FieldUpdate};
///
/// let update: AnnotationUpdate =
///     serde_json::from_str(r#"{"id": "123456", "tag": null}"#).expect("valid update");
/// assert_eq!(update.tag, FieldUpdate::Clear);
/// assert_eq!(update.notes, FieldUpdate::Unchanged);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationUpdate {
    /// Item being annotated.
    pub id: ItemId,
    /// Change to the tag.
    #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
    pub tag: FieldUpdate<TagValue>,
    /// Change to the notes; `Set("")` counts as empty.
    #[serde(default, skip_serializing_if = "FieldUpdate::is_unchanged")]
    pub notes: FieldUpdate<String>,
}

impl AnnotationUpdate {
    /// An update touching no fields.
    #[must_use]
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            tag: FieldUpdate::Unchanged,
            notes: FieldUpdate::Unchanged,
        }
    }

    /// Change the tag.
    #[must_use]
    pub fn with_tag(mut self, tag: FieldUpdate<TagValue>) -> Self {
        self.tag = tag;
        self
    }

    /// Change the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: FieldUpdate<String>) -> Self {
        self.notes = notes;
        self
    }
}

/// Write the store must perform to apply an [`AnnotationUpdate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationChange {
    /// Insert or replace the record.
    Upsert(ItemAnnotation),
    /// Remove the existing record; it became empty.
    Delete(ItemId),
    /// Nothing stored and nothing to store.
    Skip,
}

/// Fold `update` into `existing` and decide the resulting write.
///
/// Omitted fields keep their stored value, `Clear` removes it, and an empty
/// notes string is treated as no notes. When neither a tag nor non-empty notes
/// remain the record is deleted, or skipped if it never existed.
///
/// # Examples
/// ```
/// use profile_sync::domain::{
///     AnnotationChange, AnnotationUpdate, FieldUpdate, ItemAnnotation, ItemId, TagValue, reconcile,
/// };
///
/// let id = ItemId::new("123456").expect("id");
/// let existing = ItemAnnotation {
///     id: id.clone(),
///     tag: Some(TagValue::Favorite),
///     notes: Some("the best".to_owned()),
/// };
/// let clear_tag = AnnotationUpdate::new(id.clone()).with_tag(FieldUpdate::Clear);
///
/// let change = reconcile(Some(&existing), clear_tag);
/// assert_eq!(
///     change,
///     AnnotationChange::Upsert(ItemAnnotation {
///         id,
///         tag: None,
///         notes: Some("the best".to_owned()),
///     })
/// );
/// ```
#[must_use]
pub fn reconcile(existing: Option<&ItemAnnotation>, update: AnnotationUpdate) -> AnnotationChange {
    let AnnotationUpdate { id, tag, notes } = update;
    let current_tag = existing.and_then(|record| record.tag);
    let current_notes = existing.and_then(|record| record.notes.clone());

    let tag = tag.resolve(current_tag);
    let notes = notes.resolve(current_notes).filter(|text| !text.is_empty());

    if tag.is_none() && notes.is_none() {
        return if existing.is_some() {
            AnnotationChange::Delete(id)
        } else {
            AnnotationChange::Skip
        };
    }

    AnnotationChange::Upsert(ItemAnnotation { id, tag, notes })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the annotation reconciler.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn item() -> ItemId {
        ItemId::new("123456").expect("valid id")
    }

    #[fixture]
    fn favourite(item: ItemId) -> ItemAnnotation {
        ItemAnnotation {
            id: item,
            tag: Some(TagValue::Favorite),
            notes: Some("the best".to_owned()),
        }
    }

    #[rstest]
    fn creates_record_when_none_exists(item: ItemId) {
        let update = AnnotationUpdate::new(item.clone())
            .with_tag(FieldUpdate::Set(TagValue::Favorite))
            .with_notes(FieldUpdate::Set("the best".to_owned()));

        assert_eq!(
            reconcile(None, update),
            AnnotationChange::Upsert(ItemAnnotation {
                id: item,
                tag: Some(TagValue::Favorite),
                notes: Some("the best".to_owned()),
            })
        );
    }

    #[rstest]
    fn overwrites_both_fields(item: ItemId, favourite: ItemAnnotation) {
        let update = AnnotationUpdate::new(item.clone())
            .with_tag(FieldUpdate::Set(TagValue::Junk))
            .with_notes(FieldUpdate::Set("the worst".to_owned()));

        assert_eq!(
            reconcile(Some(&favourite), update),
            AnnotationChange::Upsert(ItemAnnotation {
                id: item,
                tag: Some(TagValue::Junk),
                notes: Some("the worst".to_owned()),
            })
        );
    }

    #[rstest]
    fn clearing_tag_keeps_notes(item: ItemId, favourite: ItemAnnotation) {
        let update = AnnotationUpdate::new(item.clone()).with_tag(FieldUpdate::Clear);

        assert_eq!(
            reconcile(Some(&favourite), update),
            AnnotationChange::Upsert(ItemAnnotation {
                id: item,
                tag: None,
                notes: Some("the best".to_owned()),
            })
        );
    }

    #[rstest]
    #[case::cleared_notes(FieldUpdate::Clear)]
    #[case::empty_notes(FieldUpdate::Set(String::new()))]
    fn clearing_everything_deletes(
        item: ItemId,
        favourite: ItemAnnotation,
        #[case] notes: FieldUpdate<String>,
    ) {
        let update = AnnotationUpdate::new(item.clone())
            .with_tag(FieldUpdate::Clear)
            .with_notes(notes);

        assert_eq!(
            reconcile(Some(&favourite), update),
            AnnotationChange::Delete(item)
        );
    }

    #[rstest]
    fn omitted_notes_are_unchanged_not_empty(item: ItemId) {
        let existing = ItemAnnotation {
            id: item.clone(),
            tag: None,
            notes: Some("keep me".to_owned()),
        };
        let update = AnnotationUpdate::new(item.clone()).with_tag(FieldUpdate::Set(TagValue::Keep));

        assert_eq!(
            reconcile(Some(&existing), update),
            AnnotationChange::Upsert(ItemAnnotation {
                id: item,
                tag: Some(TagValue::Keep),
                notes: Some("keep me".to_owned()),
            })
        );
    }

    #[rstest]
    fn empty_result_without_existing_record_is_skipped(item: ItemId) {
        let update = AnnotationUpdate::new(item)
            .with_tag(FieldUpdate::Clear)
            .with_notes(FieldUpdate::Set(String::new()));

        assert_eq!(reconcile(None, update), AnnotationChange::Skip);
    }

    #[rstest]
    fn empty_notes_are_not_stored(item: ItemId) {
        let update = AnnotationUpdate::new(item.clone())
            .with_tag(FieldUpdate::Set(TagValue::Infuse))
            .with_notes(FieldUpdate::Set(String::new()));

        assert_eq!(
            reconcile(None, update),
            AnnotationChange::Upsert(ItemAnnotation {
                id: item,
                tag: Some(TagValue::Infuse),
                notes: None,
            })
        );
    }

    #[rstest]
    #[case::omitted(r#"{"id": "1"}"#, FieldUpdate::Unchanged, FieldUpdate::Unchanged)]
    #[case::nulls(r#"{"id": "1", "tag": null, "notes": null}"#, FieldUpdate::Clear, FieldUpdate::Clear)]
    #[case::values(
        r#"{"id": "1", "tag": "junk", "notes": ""}"#,
        FieldUpdate::Set(TagValue::Junk),
        FieldUpdate::Set(String::new())
    )]
    fn update_deserialises_presence(
        #[case] raw: &str,
        #[case] tag: FieldUpdate<TagValue>,
        #[case] notes: FieldUpdate<String>,
    ) {
        let update: AnnotationUpdate = serde_json::from_str(raw).expect("valid update");
        assert_eq!(update.tag, tag);
        assert_eq!(update.notes, notes);
    }

    #[rstest]
    #[case::missing(r#"{"tag": "junk"}"#)]
    #[case::empty(r#"{"id": "", "tag": "junk"}"#)]
    fn update_requires_an_id(#[case] raw: &str) {
        assert!(serde_json::from_str::<AnnotationUpdate>(raw).is_err());
    }

    #[rstest]
    fn annotation_serialises_without_absent_fields(item: ItemId) {
        let annotation = ItemAnnotation {
            id: item,
            tag: None,
            notes: Some("the best".to_owned()),
        };

        let json = serde_json::to_value(&annotation).expect("serialise");
        assert_eq!(json, serde_json::json!({"id": "123456", "notes": "the best"}));
    }

    #[rstest]
    #[case("favorite", TagValue::Favorite)]
    #[case("archive", TagValue::Archive)]
    fn tag_parses_known_labels(#[case] raw: &str, #[case] expected: TagValue) {
        assert_eq!(raw.parse::<TagValue>(), Ok(expected));
    }

    #[rstest]
    fn tag_rejects_unknown_labels() {
        assert_eq!(
            "shiny".parse::<TagValue>(),
            Err(AnnotationValidationError::UnknownTag("shiny".to_owned()))
        );
    }
}
