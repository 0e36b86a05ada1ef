//! Domain primitives, reconcilers, and use-case services.
//!
//! Purpose: hold the transport-agnostic core of profile sync. Inbound adapters
//! talk to the driving ports in [`ports`]; outbound adapters implement the
//! driven [`ports::ProfileStore`].
//!
//! Public surface:
//! - Account key types ([`AccountId`], [`PlatformScope`], [`ProfileScope`]).
//! - Settings reconciler ([`DefaultSettings`]).
//! - Annotation reconciler ([`reconcile`]).
//! - Loadout normaliser ([`normalize_loadout`]).
//! - Legacy extractor ([`extract_import`]).
//! - Audit log entries ([`AuditEntry`]).
//! - Transaction coordinator ([`SyncCoordinator`]) and the
//!   [`ProfileSyncService`] built on it.

pub mod account;
pub mod audit;
pub mod error;
pub mod item_annotation;
pub mod legacy_import;
pub mod loadout;
pub mod ports;
pub mod profile;
pub mod profile_service;
pub mod profile_update;
pub mod settings;
pub mod sync_coordinator;
pub mod trace_id;

pub use self::account::{
    AccountId, AccountValidationError, DestinyVersion, PlatformMembershipId, PlatformScope,
    ProfileScope,
};
pub use self::audit::{
    AuditAction, AuditEntry, AuditLimit, AuditLimitError, AuditRecord, DEFAULT_AUDIT_LIMIT,
    MAX_AUDIT_LIMIT, UnknownAuditAction,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::item_annotation::{
    AnnotationChange, AnnotationUpdate, AnnotationValidationError, FieldUpdate, ItemAnnotation,
    ItemId, TagValue, reconcile,
};
pub use self::legacy_import::{
    ImportBatch, LegacyBlob, LegacyImportError, PlatformAnnotation, extract_import,
    parse_annotation_key,
};
pub use self::loadout::{
    CharacterClass, Loadout, LoadoutId, LoadoutItem, LoadoutValidationError, PlatformLoadout,
    RawLoadout, RawLoadoutItem, normalize_loadout,
};
pub use self::profile::{
    ProfileComponent, ProfileComponents, ProfileExport, ProfileRequest, ProfileRequestError,
    ProfileSnapshot, ScopedAnnotation, ScopedLoadout,
};
pub use self::profile_service::ProfileSyncService;
pub use self::profile_update::{ProfileUpdate, ProfileUpdateRequest};
pub use self::settings::{DefaultSettings, DefaultSettingsError, Settings};
pub use self::sync_coordinator::{
    AppliedUpdate, DEFAULT_TRANSACTION_TIMEOUT, DeleteOutcome, ImportOutcome, SyncCoordinator,
    SyncError, TransactionScope, UpdateOutcome,
};
pub use self::trace_id::TraceId;

