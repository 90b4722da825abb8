// crates/care-access-config/src/config.rs
// ============================================================================
// Module: Care Access Configuration
// Description: Configuration loading and validation for care-access.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: care-access-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section is optional and defaults to the analytics resource with
//! stderr audit output. Unknown fields and out-of-range values reject the
//! whole file.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use care_access_core::AuditPolicy;
use care_access_core::JsonRowKeys;
use care_access_core::ResourceName;
use care_access_core::core::rows::DEFAULT_PRACTICE_KEY;
use care_access_core::core::rows::DEFAULT_PROVIDER_KEY;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "care-access.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "CARE_ACCESS_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum length of a JSON row key name.
pub(crate) const MAX_ROW_KEY_LENGTH: usize = 64;
/// Default audit channel capacity.
pub(crate) const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
/// Maximum audit channel capacity.
pub(crate) const MAX_CHANNEL_CAPACITY: usize = 65_536;
/// Default cache entry lifetime in milliseconds.
pub(crate) const DEFAULT_CACHE_TTL_MS: u64 = 300_000;
/// Minimum cache entry lifetime in milliseconds.
pub(crate) const MIN_CACHE_TTL_MS: u64 = 1_000;
/// Maximum cache entry lifetime in milliseconds.
pub(crate) const MAX_CACHE_TTL_MS: u64 = 86_400_000;
/// Default maximum number of cached result sets.
pub(crate) const DEFAULT_CACHE_MAX_ENTRIES: usize = 1024;
/// Maximum number of cached result sets.
pub(crate) const MAX_CACHE_MAX_ENTRIES: usize = 1_048_576;

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Care Access configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CareAccessConfig {
    /// Protected resource and row layout.
    #[serde(default)]
    pub access: AccessConfig,
    /// Audit destination.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Result cache limits.
    #[serde(default)]
    pub cache: CacheConfig,
}

impl CareAccessConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit `path`, then `CARE_ACCESS_CONFIG`, then
    /// `care-access.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.access.validate()?;
        self.audit.validate()?;
        self.cache.validate()
    }

    /// Returns the protected resource.
    #[must_use]
    pub fn resource(&self) -> ResourceName {
        self.access.resource.clone()
    }

    /// Returns the JSON row key names.
    #[must_use]
    pub fn row_keys(&self) -> JsonRowKeys {
        JsonRowKeys {
            practice_key: self.access.practice_key.clone(),
            provider_key: self.access.provider_key.clone(),
        }
    }

    /// Returns the audit emission policy.
    #[must_use]
    pub const fn audit_policy(&self) -> AuditPolicy {
        AuditPolicy {
            emit_passthrough: self.audit.emit_passthrough,
        }
    }
}

// ============================================================================
// SECTION: Access Config
// ============================================================================

/// Protected resource and JSON row layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessConfig {
    /// Resource whose read grants are evaluated.
    #[serde(default)]
    pub resource: ResourceName,
    /// JSON field holding the practice key.
    #[serde(default = "default_practice_key")]
    pub practice_key: String,
    /// JSON field holding the provider key.
    #[serde(default = "default_provider_key")]
    pub provider_key: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            resource: ResourceName::default(),
            practice_key: default_practice_key(),
            provider_key: default_provider_key(),
        }
    }
}

impl AccessConfig {
    /// Validates row key names.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_row_key("access.practice_key", &self.practice_key)?;
        validate_row_key("access.provider_key", &self.provider_key)?;
        if self.practice_key == self.provider_key {
            return Err(ConfigError::Invalid(
                "access.practice_key and access.provider_key must differ".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Audit Config
// ============================================================================

/// Audit destination kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `audit.path`.
    File,
    /// Discard events.
    None,
}

/// Audit destination configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Destination kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// Log file path for the file sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Emit events for scope `all` passthrough calls.
    #[serde(default = "default_true")]
    pub emit_passthrough: bool,
    /// Capacity of the non-blocking audit channel.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            sink: AuditSinkKind::default(),
            path: None,
            emit_passthrough: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl AuditConfig {
    /// Validates sink selection and channel limits.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (AuditSinkKind::File, None) => {
                return Err(ConfigError::Invalid(
                    "audit.path is required when audit.sink = \"file\"".to_string(),
                ));
            }
            (AuditSinkKind::File, Some(path)) => validate_path(path)?,
            (AuditSinkKind::Stderr | AuditSinkKind::None, Some(_)) => {
                return Err(ConfigError::Invalid(
                    "audit.path is only allowed when audit.sink = \"file\"".to_string(),
                ));
            }
            (AuditSinkKind::Stderr | AuditSinkKind::None, None) => {}
        }
        if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
            return Err(ConfigError::Invalid(format!(
                "audit.channel_capacity must be between 1 and {MAX_CHANNEL_CAPACITY}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Cache Config
// ============================================================================

/// Result cache limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Entry lifetime in milliseconds.
    #[serde(default = "default_cache_ttl_ms")]
    pub ttl_ms: u64,
    /// Maximum number of cached result sets.
    #[serde(default = "default_cache_max_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: DEFAULT_CACHE_TTL_MS,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
        }
    }
}

impl CacheConfig {
    /// Returns the entry lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    /// Validates cache limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_CACHE_TTL_MS ..= MAX_CACHE_TTL_MS).contains(&self.ttl_ms) {
            return Err(ConfigError::Invalid(format!(
                "cache.ttl_ms must be between {MIN_CACHE_TTL_MS} and {MAX_CACHE_TTL_MS}"
            )));
        }
        if self.max_entries == 0 || self.max_entries > MAX_CACHE_MAX_ENTRIES {
            return Err(ConfigError::Invalid(format!(
                "cache.max_entries must be between 1 and {MAX_CACHE_MAX_ENTRIES}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates a path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a JSON row key name.
fn validate_row_key(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() || value.len() > MAX_ROW_KEY_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{field} must be 1 to {MAX_ROW_KEY_LENGTH} bytes"
        )));
    }
    Ok(())
}

/// Default practice key.
fn default_practice_key() -> String {
    DEFAULT_PRACTICE_KEY.to_string()
}

/// Default provider key.
fn default_provider_key() -> String {
    DEFAULT_PROVIDER_KEY.to_string()
}

/// Serde default for enabled flags.
const fn default_true() -> bool {
    true
}

/// Default audit channel capacity.
const fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

/// Default cache entry lifetime.
const fn default_cache_ttl_ms() -> u64 {
    DEFAULT_CACHE_TTL_MS
}

/// Default cache entry limit.
const fn default_cache_max_entries() -> usize {
    DEFAULT_CACHE_MAX_ENTRIES
}
