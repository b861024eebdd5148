//! Configuration for the authorization stack.
//!
//! Values come from the environment (see [`AccessConfig::from_env`]) or from
//! any serde source the host service already uses.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use orgscope_auth::{AccessDecision, ExistencePolicy, ScopeCalculator};
use orgscope_observability::LogFormat;
use orgscope_org::{DescendantResolver, NodeRepository, ResolverConfig};

pub const ENV_MAX_DEPTH: &str = "ORGSCOPE_MAX_DEPTH";
pub const ENV_RESOLVE_DEADLINE_MS: &str = "ORGSCOPE_RESOLVE_DEADLINE_MS";
pub const ENV_EXISTENCE_POLICY: &str = "ORGSCOPE_EXISTENCE_POLICY";
pub const ENV_LOG_FORMAT: &str = "ORGSCOPE_LOG_FORMAT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    /// Opt-in depth bound; `None` (the default) walks the whole subtree.
    pub max_depth: Option<usize>,
    pub deadline_ms: Option<u64>,
}

impl From<ResolverSettings> for ResolverConfig {
    fn from(value: ResolverSettings) -> Self {
        ResolverConfig {
            max_depth: value.max_depth,
            deadline: value.deadline_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub resolver: ResolverSettings,
    pub existence: ExistencePolicy,
    pub log: LogSettings,
}

impl AccessConfig {
    /// Read overrides from the process environment on top of the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AccessConfig::default();

        if let Some(raw) = lookup(ENV_MAX_DEPTH) {
            config.resolver.max_depth = match raw.trim() {
                "" | "none" | "unbounded" => None,
                value => Some(parse_number(ENV_MAX_DEPTH, value)?),
            };
        }

        if let Some(raw) = lookup(ENV_RESOLVE_DEADLINE_MS) {
            config.resolver.deadline_ms = Some(parse_number(ENV_RESOLVE_DEADLINE_MS, raw.trim())?);
        }

        match lookup(ENV_EXISTENCE_POLICY) {
            Some(raw) => {
                config.existence = match raw.trim().to_lowercase().as_str() {
                    "reveal" => ExistencePolicy::Reveal,
                    "conceal" => ExistencePolicy::Conceal,
                    _ => {
                        return Err(ConfigError::Invalid {
                            key: ENV_EXISTENCE_POLICY,
                            value: raw,
                            reason: "expected 'reveal' or 'conceal'".to_string(),
                        });
                    }
                }
            }
            None => tracing::warn!(
                "{ENV_EXISTENCE_POLICY} not set; missing targets are revealed as not found"
            ),
        }

        if let Some(raw) = lookup(ENV_LOG_FORMAT) {
            config.log.format = match raw.trim().to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "compact" => LogFormat::Compact,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: ENV_LOG_FORMAT,
                        value: raw,
                        reason: "expected 'json' or 'compact'".to_string(),
                    });
                }
            };
        }

        Ok(config)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        self.resolver.into()
    }

    /// Assemble the decision core over `repo` with these settings.
    pub fn build_access<R: NodeRepository>(&self, repo: R) -> AccessDecision<R> {
        let resolver = DescendantResolver::with_config(repo, self.resolver_config());
        AccessDecision::new(ScopeCalculator::new(resolver)).with_existence_policy(self.existence)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Load configuration from the environment and initialise logging with it.
pub fn bootstrap() -> Result<AccessConfig, ConfigError> {
    let config = AccessConfig::from_env()?;
    orgscope_observability::init_with(config.log.format);
    tracing::info!(
        max_depth = ?config.resolver.max_depth,
        deadline_ms = ?config.resolver.deadline_ms,
        existence = ?config.existence,
        "access configuration loaded"
    );
    Ok(config)
}
