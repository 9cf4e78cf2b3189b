//! TOML-based configuration for the admin helper.
//!
//! Reads and writes [`AppConfig`] in the platform-appropriate directory, which
//! is shared with the credentials file:
//! - Windows:  `%APPDATA%\chiv-admin-helper\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/chiv-admin-helper/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/chiv-admin-helper/config.toml`
//!
//! ```toml
//! [general]
//! log_level = "info"
//! copy_commands_to_clipboard = false
//!
//! [watcher]
//! poll_interval_ms = 50
//! shutdown_grace_ms = 2000
//!
//! [backend]
//! validate_url = "https://.../func-prd-validate_players"
//! action_url = "https://.../func-prd-player_action"
//! request_timeout_secs = 30
//! ```
//!
//! Every section and every field is optional; missing values take the
//! defaults shown above.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the per-user directory holding config and credentials.
pub const APP_DIR_NAME: &str = "chiv-admin-helper";

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value parsed but cannot be used.
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Copy every operator command to the clipboard after printing it.
    #[serde(default)]
    pub copy_commands_to_clipboard: bool,
}

/// Producer and shutdown timing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatcherConfig {
    /// Clipboard poll period in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long an in-flight backend call may run after Ctrl-C.
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

/// Moderation service endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    #[serde(default = "default_validate_url")]
    pub validate_url: String,
    #[serde(default = "default_action_url")]
    pub action_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_poll_interval_ms() -> u64 {
    50
}
fn default_shutdown_grace_ms() -> u64 {
    2_000
}
fn default_validate_url() -> String {
    "https://europe-west3-prj-prd-chiv-01.cloudfunctions.net/func-prd-validate_players".to_string()
}
fn default_action_url() -> String {
    "https://europe-west3-prj-prd-chiv-01.cloudfunctions.net/func-prd-player_action".to_string()
}
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            copy_commands_to_clipboard: false,
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            validate_url: default_validate_url(),
            action_url: default_action_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl WatcherConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    /// Rejects values that parse but would break the watchers or the backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watcher.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "watcher.poll_interval_ms",
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, url) in [
            ("backend.validate_url", &self.backend.validate_url),
            ("backend.action_url", &self.backend.action_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{url:?} is not an http(s) URL"),
                });
            }
        }
        if self.backend.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "backend.request_timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Directory holding `config.toml` and the credentials file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found"
/// and [`ConfigError::Parse`] if the TOML is malformed. Values are not
/// checked here; call [`AppConfig::validate`] once command-line overrides
/// have been merged.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let cfg = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<AppConfig>(&content)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppConfig::default(),
        Err(e) => {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    Ok(cfg)
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory including the app subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join(APP_DIR_NAME))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join(APP_DIR_NAME))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join(APP_DIR_NAME)
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("chiv_config_test_{}", Uuid::new_v4()))
    }

    // ── defaults ──────────────────────────────────────────────────────────────

    #[test]
    fn test_default_config_values() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.general.log_level, "info");
        assert!(!cfg.general.copy_commands_to_clipboard);
        assert_eq!(cfg.watcher.poll_interval(), Duration::from_millis(50));
        assert_eq!(cfg.watcher.shutdown_grace(), Duration::from_secs(2));
        assert_eq!(cfg.backend.request_timeout(), Duration::from_secs(30));
        assert!(cfg.backend.validate_url.ends_with("func-prd-validate_players"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[watcher]
poll_interval_ms = 100
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.watcher.poll_interval_ms, 100);
        assert_eq!(cfg.watcher.shutdown_grace_ms, 2_000);
        assert_eq!(cfg.general, GeneralConfig::default());
    }

    // ── validation ────────────────────────────────────────────────────────────

    #[test]
    fn test_zero_poll_interval_is_invalid() {
        let mut cfg = AppConfig::default();
        cfg.watcher.poll_interval_ms = 0;

        let err = cfg.validate().unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "watcher.poll_interval_ms",
                ..
            }
        ));
    }

    #[test]
    fn test_non_http_url_is_invalid() {
        let mut cfg = AppConfig::default();
        cfg.backend.action_url = "ftp://example.com".to_string();

        let err = cfg.validate().unwrap_err();

        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "backend.action_url",
                ..
            }
        ));
    }

    // ── load / save ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        let path = temp_dir().join("config.toml");

        let cfg = load_config_from(&path).expect("absent file is not an error");

        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_save_and_load_config_round_trip_via_temp_dir() {
        // Arrange
        let dir = temp_dir();
        let path = dir.join("nested").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.general.log_level = "debug".to_string();
        cfg.general.copy_commands_to_clipboard = true;
        cfg.watcher.poll_interval_ms = 25;

        // Act
        save_config_to(&path, &cfg).expect("save");
        let loaded = load_config_from(&path).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[[[ not valid toml").unwrap();

        let result = load_config_from(&path);

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_config_leaves_validation_to_the_caller() {
        // Arrange
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        std::fs::write(&path, "[watcher]\npoll_interval_ms = 0\n").unwrap();

        // Act
        let mut cfg = load_config_from(&path).expect("out-of-range values still load");

        // Assert
        assert_eq!(cfg.watcher.poll_interval_ms, 0);
        assert!(cfg.validate().is_err());
        cfg.watcher.poll_interval_ms = 20;
        assert!(cfg.validate().is_ok());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_app_dir_and_file_name() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with(Path::new(APP_DIR_NAME).join("config.toml")));
        }
        // NoPlatformConfigDir is acceptable in a stripped environment.
    }
}
