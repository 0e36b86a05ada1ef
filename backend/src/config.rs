//! Service configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `PROFILE_SYNC_*` environment variables and
//! configuration files, in OrthoConfig's usual precedence.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use tracing::info;

use crate::cap_fs::read_file_to_string;
use crate::domain::{DefaultSettings, DefaultSettingsError};

const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(std::net::SocketAddrV4::new(std::net::Ipv4Addr::UNSPECIFIED, 8080));

/// Errors raised while turning settings into runtime values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The default settings file could not be read.
    #[error("failed to read default settings from {path}: {source}")]
    ReadDefaults {
        /// File that was requested.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The default settings file was read but is not a valid table.
    #[error("invalid default settings in {path}: {source}")]
    InvalidDefaults {
        /// File that was read.
        path: PathBuf,
        /// Parse failure.
        source: DefaultSettingsError,
    },
}

/// Configuration for the profile sync service.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PROFILE_SYNC")]
pub struct ServiceSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<SocketAddr>,
    /// PostgreSQL URL; the in-process store is used when absent.
    pub database_url: Option<String>,
    /// Deadline for one store transaction, in milliseconds.
    #[ortho_config(default = 10_000)]
    pub transaction_timeout_ms: u64,
    /// JSON file replacing the built-in default settings table.
    pub default_settings_path: Option<PathBuf>,
    /// Maximum pooled database connections.
    #[ortho_config(default = 10)]
    pub pool_max_size: u32,
}

impl ServiceSettings {
    /// Return the bind address, falling back to `0.0.0.0:8080`.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr.unwrap_or(DEFAULT_BIND_ADDR)
    }

    /// Return the transaction deadline.
    #[must_use]
    pub const fn transaction_timeout(&self) -> Duration {
        Duration::from_millis(self.transaction_timeout_ms)
    }

    /// Load the default settings table.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `default_settings_path` is set but cannot
    /// be read or parsed.
    pub fn default_settings(&self) -> Result<DefaultSettings, ConfigError> {
        match self.default_settings_path.as_deref() {
            Some(path) => load_default_settings(path),
            None => Ok(DefaultSettings::builtin()),
        }
    }
}

fn load_default_settings(path: &Path) -> Result<DefaultSettings, ConfigError> {
    let raw = read_file_to_string(path).map_err(|source| ConfigError::ReadDefaults {
        path: path.to_path_buf(),
        source,
    })?;
    let defaults =
        DefaultSettings::from_json_str(&raw).map_err(|source| ConfigError::InvalidDefaults {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), keys = defaults.values().len(), "loaded default settings");
    Ok(defaults)
}

#[cfg(test)]
mod tests {
    //! Unit tests for service configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;
    use serde_json::json;

    use crate::cap_fs::write_file;

    const VARS: [&str; 5] = [
        "PROFILE_SYNC_BIND_ADDR",
        "PROFILE_SYNC_DATABASE_URL",
        "PROFILE_SYNC_TRANSACTION_TIMEOUT_MS",
        "PROFILE_SYNC_DEFAULT_SETTINGS_PATH",
        "PROFILE_SYNC_POOL_MAX_SIZE",
    ];

    fn load_from_empty_args() -> ServiceSettings {
        ServiceSettings::load_from_iter([OsString::from("profile-sync")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();

        assert_eq!(settings.bind_addr(), DEFAULT_BIND_ADDR);
        assert!(settings.database_url.is_none());
        assert_eq!(settings.transaction_timeout(), Duration::from_secs(10));
        assert_eq!(settings.pool_max_size, 10);
        assert_eq!(
            settings.default_settings().expect("builtin defaults"),
            DefaultSettings::builtin()
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("PROFILE_SYNC_BIND_ADDR", Some("127.0.0.1:9090".to_owned())),
            (
                "PROFILE_SYNC_DATABASE_URL",
                Some("postgres://localhost/profiles".to_owned()),
            ),
            ("PROFILE_SYNC_TRANSACTION_TIMEOUT_MS", Some("250".to_owned())),
            ("PROFILE_SYNC_DEFAULT_SETTINGS_PATH", None),
            ("PROFILE_SYNC_POOL_MAX_SIZE", Some("3".to_owned())),
        ]);

        let settings = load_from_empty_args();

        assert_eq!(
            settings.bind_addr(),
            "127.0.0.1:9090".parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://localhost/profiles")
        );
        assert_eq!(settings.transaction_timeout(), Duration::from_millis(250));
        assert_eq!(settings.pool_max_size, 3);
    }

    #[rstest]
    fn default_settings_file_replaces_builtin_table() {
        let path = std::env::temp_dir().join(format!(
            "profile-sync-defaults-{}.json",
            uuid::Uuid::new_v4()
        ));
        write_file(&path, json!({"itemSize": 48, "language": "fr"}).to_string().as_bytes())
            .expect("write defaults");
        let _guard = lock_env(VARS.map(|name| {
            let value = (name == "PROFILE_SYNC_DEFAULT_SETTINGS_PATH")
                .then(|| path.display().to_string());
            (name, value)
        }));

        let defaults = load_from_empty_args()
            .default_settings()
            .expect("defaults load");

        assert_eq!(defaults.values().get("language"), Some(&json!("fr")));
        assert_eq!(defaults.values().len(), 2);
    }

    #[rstest]
    fn unreadable_default_settings_file_is_reported() {
        let path = std::env::temp_dir().join(format!("missing-{}.json", uuid::Uuid::new_v4()));

        let error = load_default_settings(&path).expect_err("missing file");

        assert!(matches!(error, ConfigError::ReadDefaults { .. }));
    }

    #[rstest]
    fn non_object_default_settings_file_is_rejected() {
        let path =
            std::env::temp_dir().join(format!("profile-sync-array-{}.json", uuid::Uuid::new_v4()));
        write_file(&path, b"[1, 2, 3]").expect("write defaults");

        let error = load_default_settings(&path).expect_err("array is not a table");

        assert!(matches!(
            error,
            ConfigError::InvalidDefaults {
                source: DefaultSettingsError::NotAnObject,
                ..
            }
        ));
    }
}
