//! TOML-driven service configuration.
//!
//! `ServiceConfig` is deserialized from a TOML string or file and validated
//! on construction, so a service never runs with an unusable base URL or a
//! TTL window that admits zero-length links.
//!
//! Example:
//! ```toml
//! public_base_url = "https://forms.example.org"
//! default_ttl_hours = 48
//! min_ttl_hours = 1
//! max_ttl_hours = 720
//! ```

use std::path::Path;

use serde::Deserialize;

use examlink_contracts::{
    error::{ExamLinkError, ExamLinkResult},
    token::RawToken,
};

/// Lifecycle service configuration.
///
/// TTLs are in whole hours. Issue requests outside `[min_ttl_hours,
/// max_ttl_hours]` are clamped, not rejected.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Absolute base URL the public form URLs are built from. A trailing
    /// slash is trimmed on construction.
    pub public_base_url: String,
    /// TTL applied when the issue request does not specify one.
    pub default_ttl_hours: i64,
    /// Lower clamp bound: 1 hour.
    pub min_ttl_hours: i64,
    /// Upper clamp bound: 720 hours (30 days).
    pub max_ttl_hours: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:5173".to_string(),
            default_ttl_hours: 48,
            min_ttl_hours: 1,
            max_ttl_hours: 720,
        }
    }
}

impl ServiceConfig {
    /// Parse `s` as TOML and validate the result.
    ///
    /// Returns `ExamLinkError::ConfigError` if the TOML is malformed or a
    /// value is out of range.
    pub fn from_toml_str(s: &str) -> ExamLinkResult<Self> {
        let config: ServiceConfig = toml::from_str(s).map_err(|e| ExamLinkError::ConfigError {
            reason: format!("failed to parse service config TOML: {}", e),
        })?;
        config.validated()
    }

    /// Read the file at `path` and parse it as TOML configuration.
    pub fn from_file(path: &Path) -> ExamLinkResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| ExamLinkError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Build the public form URL for a freshly issued token.
    pub fn form_url(&self, token: &RawToken) -> String {
        format!("{}/form/{}", self.public_base_url, token.as_str())
    }

    /// Clamp a requested TTL into the configured window, falling back to
    /// the default when the caller gave none.
    pub fn clamp_ttl_hours(&self, requested: Option<i64>) -> i64 {
        requested
            .unwrap_or(self.default_ttl_hours)
            .clamp(self.min_ttl_hours, self.max_ttl_hours)
    }

    fn validated(mut self) -> ExamLinkResult<Self> {
        if !is_absolute_url(&self.public_base_url) {
            return Err(ExamLinkError::ConfigError {
                reason: format!(
                    "public_base_url must be an absolute URL, got '{}'",
                    self.public_base_url
                ),
            });
        }
        if self.min_ttl_hours < 1 {
            return Err(ExamLinkError::ConfigError {
                reason: format!("min_ttl_hours must be at least 1, got {}", self.min_ttl_hours),
            });
        }
        if self.max_ttl_hours < self.min_ttl_hours {
            return Err(ExamLinkError::ConfigError {
                reason: format!(
                    "max_ttl_hours ({}) must not be below min_ttl_hours ({})",
                    self.max_ttl_hours, self.min_ttl_hours
                ),
            });
        }
        if self.default_ttl_hours < self.min_ttl_hours
            || self.default_ttl_hours > self.max_ttl_hours
        {
            return Err(ExamLinkError::ConfigError {
                reason: format!(
                    "default_ttl_hours ({}) must lie within [{}, {}]",
                    self.default_ttl_hours, self.min_ttl_hours, self.max_ttl_hours
                ),
            });
        }
        while self.public_base_url.ends_with('/') {
            self.public_base_url.pop();
        }
        Ok(self)
    }
}

/// True when `s` starts with a `scheme://` prefix.
fn is_absolute_url(s: &str) -> bool {
    match s.split_once("://") {
        Some((scheme, rest)) => {
            !scheme.is_empty()
                && scheme.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-')
                && !rest.is_empty()
        }
        None => false,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
