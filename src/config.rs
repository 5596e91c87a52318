//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag, must exist)
//! 2. `~/.docquery/config.toml` (user)
//! 3. `/etc/docquery/config.toml` (system)
//! 4. built-in defaults
//!
//! The Gemini API key is never read from the config file. It comes from
//! `secrets.toml` next to the user or system config (must be 0600 or 0400),
//! falling back to the `GEMINI_API_KEY` environment variable.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::CacheConfig;
use crate::providers::RetryPolicy;
#[cfg(feature = "gemini")]
use crate::providers::gemini;
use crate::{DocQueryError, Result};

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[cfg(feature = "gemini")]
    #[serde(default)]
    pub gemini: GeminiSection,
}

/// Response cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Entry time-to-live in seconds (default: 300).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Optional capacity bound (default: unbounded).
    #[serde(default)]
    pub max_entries: Option<u64>,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: None,
        }
    }
}

fn default_ttl_secs() -> u64 {
    300
}

impl CacheSection {
    pub fn to_cache_config(&self) -> CacheConfig {
        let config = CacheConfig::new().ttl(Duration::from_secs(self.ttl_secs));
        match self.max_entries {
            Some(max) => config.max_entries(max),
            None => config,
        }
    }
}

/// Retry settings for generation calls.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    /// Attempts including the first (default: 3).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds (default: 2000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Cap on any single delay in milliseconds (default: 60000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Backoff growth factor (default: 2.0).
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_multiplier() -> f64 {
    2.0
}

impl RetrySection {
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .max_attempts(self.max_attempts)
            .base_delay(Duration::from_millis(self.base_delay_ms))
            .max_delay(Duration::from_millis(self.max_delay_ms))
            .multiplier(self.multiplier)
    }
}

/// Gemini client settings.
#[cfg(feature = "gemini")]
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSection {
    /// Model name (default: gemini-1.5-flash).
    #[serde(default = "default_model")]
    pub model: String,
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 60).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[cfg(feature = "gemini")]
impl Default for GeminiSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[cfg(feature = "gemini")]
fn default_model() -> String {
    gemini::DEFAULT_MODEL.to_string()
}

#[cfg(feature = "gemini")]
fn default_base_url() -> String {
    gemini::DEFAULT_BASE_URL.to_string()
}

#[cfg(feature = "gemini")]
fn default_timeout_secs() -> u64 {
    gemini::DEFAULT_TIMEOUT.as_secs()
}

impl Config {
    /// Load configuration from the standard locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate a config file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DocQueryError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            DocQueryError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the components cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(DocQueryError::Configuration(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.retry.multiplier.is_finite() || self.retry.multiplier < 1.0 {
            return Err(DocQueryError::Configuration(format!(
                "retry.multiplier must be a finite number >= 1.0, got {}",
                self.retry.multiplier
            )));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(DocQueryError::Configuration(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".to_string(),
            ));
        }
        if self.cache.max_entries == Some(0) {
            return Err(DocQueryError::Configuration(
                "cache.max_entries must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Resolve the config file path, `None` meaning built-in defaults.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(DocQueryError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        Ok(config_dirs()
            .into_iter()
            .map(|dir| dir.join("config.toml"))
            .find(|path| path.exists()))
    }
}

/// User then system configuration directories.
fn config_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::with_capacity(2);
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".docquery"));
    }
    candidates.push(PathBuf::from("/etc/docquery"));
    candidates
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub gemini: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (the key may come from the
    /// environment).
    pub fn load() -> Result<Self> {
        match config_dirs()
            .into_iter()
            .map(|dir| dir.join("secrets.toml"))
            .find(|path| path.exists())
        {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load a specific secrets file, checking its permissions first.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            DocQueryError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            DocQueryError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            DocQueryError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(DocQueryError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// The Gemini API key, falling back to [`API_KEY_ENV_VAR`].
    pub fn gemini_api_key(&self) -> Option<String> {
        self.gemini
            .as_ref()
            .map(|s| s.api_key.clone())
            .or_else(|| std::env::var(API_KEY_ENV_VAR).ok())
            .filter(|key| !key.is_empty())
    }

    /// Like [`gemini_api_key()`](Self::gemini_api_key), but missing is an error.
    pub fn require_gemini_api_key(&self) -> Result<String> {
        self.gemini_api_key().ok_or_else(|| {
            DocQueryError::Configuration(format!(
                "{API_KEY_ENV_VAR} not found in environment variables."
            ))
        })
    }
}
