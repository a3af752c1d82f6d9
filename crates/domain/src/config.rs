//! Client configuration (C10/C13).
//!
//! `HexClientConfig` carries the recognized options that are meaningfully
//! static per client instance — base URLs, the repository public key, the
//! default verify flag, the request timeout. Per-call transient values
//! (an `etag` to echo, an API key override, extra headers for one call)
//! are passed as explicit function parameters by the crates that use this
//! config rather than folded in here — see `hexpm::rest` and
//! `hexpm::registry`.

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HexClientConfig {
    /// Base URL for signed-index and tarball downloads.
    #[serde(default = "d_repo_uri")]
    pub repo_uri: String,
    /// Base URL for the REST API.
    #[serde(default = "d_api_uri")]
    pub api_uri: String,
    /// PEM-encoded RSA public key used to verify signed index payloads.
    /// Required when `verify` is `true`.
    #[serde(default)]
    pub repo_public_key: Option<String>,
    /// Gate signature verification of signed index payloads.
    #[serde(default = "d_verify")]
    pub verify: bool,
    /// Request timeout applied by the production HTTP realization.
    #[serde(default = "d_timeout_ms")]
    pub timeout_ms: u64,
    /// Default API key; sets the `authorization` header when present.
    /// Callers may override this per call.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for HexClientConfig {
    fn default() -> Self {
        Self {
            repo_uri: d_repo_uri(),
            api_uri: d_api_uri(),
            repo_public_key: None,
            verify: d_verify(),
            timeout_ms: d_timeout_ms(),
            api_key: None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl HexClientConfig {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good. Unlike a
    /// fail-fast constructor, this collects every issue so a caller can
    /// surface all of them at once.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        for (field, url) in [("repo_uri", &self.repo_uri), ("api_uri", &self.api_uri)] {
            if url.is_empty() {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: field.into(),
                    message: "must not be empty".into(),
                });
            } else if !url.starts_with("http://") && !url.starts_with("https://") {
                errors.push(ConfigError {
                    severity: ConfigSeverity::Error,
                    field: field.into(),
                    message: format!("must start with http:// or https:// (got \"{url}\")"),
                });
            }
        }

        if self.verify && self.repo_public_key.as_ref().is_none_or(|k| k.is_empty()) {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "repo_public_key".into(),
                message: "verify is enabled but no repository public key is configured".into(),
            });
        }

        if self.timeout_ms == 0 {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field: "timeout_ms".into(),
                message: "must be greater than 0".into(),
            });
        }

        errors
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Default value helpers (serde)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn d_repo_uri() -> String {
    "https://repo.hex.pm".into()
}
fn d_api_uri() -> String {
    "https://hex.pm/api".into()
}
fn d_verify() -> bool {
    true
}
fn d_timeout_ms() -> u64 {
    15_000
}
