//! Loader configuration.
//!
//! Configuration is optional: [`LoaderConfig::default`] is what the plain
//! factory functions use. It can be read from a TOML file or from the
//! environment.
//!
//! ```toml
//! # loaders.toml
//! failure_policy = "best_effort"
//! log_skipped = false
//! ```
//!
//! # Environment Variables
//!
//! - `ENTITY_LOADERS_FAILURE_POLICY=fail_fast|best_effort`
//! - `ENTITY_LOADERS_LOG_SKIPPED=true|false`
//!
//! `${VAR}` references inside a TOML file are expanded from the environment
//! before parsing.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LoaderError, LoaderResult};

/// Environment variable selecting the collection failure policy.
pub const FAILURE_POLICY_ENV: &str = "ENTITY_LOADERS_FAILURE_POLICY";

/// Environment variable toggling short-circuit debug events.
pub const LOG_SKIPPED_ENV: &str = "ENTITY_LOADERS_LOG_SKIPPED";

/// How a collection loader handles a failing member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failing member and return its error.
    #[default]
    FailFast,
    /// Visit every member, then return the first error.
    BestEffort,
}

impl FailurePolicy {
    /// Config-file spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FailFast => "fail_fast",
            Self::BestEffort => "best_effort",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "fail_fast" => Ok(Self::FailFast),
            "best_effort" => Ok(Self::BestEffort),
            other => Err(LoaderError::invalid_config(format!(
                "unknown failure policy '{}', expected 'fail_fast' or 'best_effort'",
                other
            ))),
        }
    }
}

/// Settings shared by the loaders built from one factory call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderConfig {
    /// Failure isolation for collection loaders.
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Emit a debug event whenever an operation is skipped for a
    /// non-persisted entity.
    #[serde(default = "default_log_skipped")]
    pub log_skipped: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            log_skipped: default_log_skipped(),
        }
    }
}

fn default_log_skipped() -> bool {
    true
}

impl LoaderConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the failure policy.
    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Toggle short-circuit debug events.
    pub fn log_skipped(mut self, enabled: bool) -> Self {
        self.log_skipped = enabled;
        self
    }

    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> LoaderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LoaderError::invalid_config(format!("cannot read {}", path.display())).with_source(e)
        })?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> LoaderResult<Self> {
        let expanded = expand_env_vars(content);

        toml::from_str(&expanded).map_err(|e| {
            LoaderError::invalid_config(format!("invalid loader configuration: {}", e.message()))
                .with_source(e)
        })
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> LoaderResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`, starting from the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LoaderResult<Self> {
        let mut config = Self::default();

        if let Some(policy) = lookup(FAILURE_POLICY_ENV) {
            config.failure_policy = policy.parse()?;
        }

        if let Some(value) = lookup(LOG_SKIPPED_ENV) {
            config.log_skipped = match value.to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                other => {
                    return Err(LoaderError::invalid_config(format!(
                        "{} must be a boolean, got '{}'",
                        LOG_SKIPPED_ENV, other
                    )));
                }
            };
        }

        Ok(config)
    }
}

fn expand_env_vars(content: &str) -> String {
    let Ok(re) = regex_lite::Regex::new(r"\$\{([^}]+)\}") else {
        return content.to_string();
    };

    let mut result = content.to_string();
    for cap in re.captures_iter(content) {
        let var_name = &cap[1];
        let full_match = &cap[0];

        if let Ok(value) = std::env::var(var_name) {
            result = result.replace(full_match, &value);
        }
    }

    result
}
