// Service configuration with environment overrides

use crate::offer_cache::OfferCacheConfig;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

pub const ENV_PREFIX: &str = "TRIP_COMPOSER_";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("Provider timeout ({provider_ms}ms) exceeds request timeout ({request_ms}ms)")]
    ProviderTimeoutTooLong { provider_ms: u64, request_ms: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Bound on each individual provider call before it is replaced with fallback offers.
    pub provider_timeout_ms: u64,
    /// Bound on a whole composition.
    pub request_timeout_ms: u64,
    /// Base seed for synthetic offers; equal seeds give identical fallback data.
    pub fallback_seed: u64,
    pub cache: OfferCacheConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: 8_000,
            request_timeout_ms: 30_000,
            fallback_seed: 0x5eed,
            cache: OfferCacheConfig::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with whatever `lookup` returns for the `TRIP_COMPOSER_*` keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = parse_var(&lookup, "PROVIDER_TIMEOUT_MS")? {
            config.provider_timeout_ms = value;
        }
        if let Some(value) = parse_var(&lookup, "REQUEST_TIMEOUT_MS")? {
            config.request_timeout_ms = value;
        }
        if let Some(value) = parse_var(&lookup, "FALLBACK_SEED")? {
            config.fallback_seed = value;
        }
        if let Some(value) = parse_var(&lookup, "CACHE_ENABLED")? {
            config.cache.enabled = value;
        }
        if let Some(value) = parse_var(&lookup, "CACHE_TTL_SECONDS")? {
            config.cache.default_ttl_seconds = value;
        }
        if let Some(value) = parse_var(&lookup, "CACHE_MAX_ENTRIES")? {
            config.cache.max_entries = value;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("provider_timeout_ms"));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout("request_timeout_ms"));
        }
        if self.provider_timeout_ms > self.request_timeout_ms {
            return Err(ConfigError::ProviderTimeoutTooLong {
                provider_ms: self.provider_timeout_ms,
                request_ms: self.request_timeout_ms,
            });
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let key = format!("{}{}", ENV_PREFIX, name);
    match lookup(&key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (format!("{}{}", ENV_PREFIX, k), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("PROVIDER_TIMEOUT_MS", "250"),
            ("REQUEST_TIMEOUT_MS", "1000"),
            ("FALLBACK_SEED", "42"),
            ("CACHE_ENABLED", "false"),
            ("CACHE_TTL_SECONDS", " 60 "),
            ("CACHE_MAX_ENTRIES", "16"),
        ]))
        .unwrap();

        assert_eq!(config.provider_timeout_ms, 250);
        assert_eq!(config.request_timeout_ms, 1000);
        assert_eq!(config.fallback_seed, 42);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.default_ttl_seconds, 60);
        assert_eq!(config.cache.max_entries, 16);
    }

    #[test_case(&[("PROVIDER_TIMEOUT_MS", "soon")] ; "non-numeric timeout")]
    #[test_case(&[("CACHE_ENABLED", "yes")] ; "non-boolean flag")]
    #[test_case(&[("PROVIDER_TIMEOUT_MS", "0")] ; "zero provider timeout")]
    #[test_case(&[("REQUEST_TIMEOUT_MS", "0")] ; "zero request timeout")]
    #[test_case(&[("PROVIDER_TIMEOUT_MS", "5000"), ("REQUEST_TIMEOUT_MS", "1000")] ; "provider longer than request")]
    fn test_invalid_configuration_is_rejected(pairs: &[(&str, &str)]) {
        assert!(ServiceConfig::from_lookup(lookup_from(pairs)).is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ServiceConfig =
            serde_json::from_str(r#"{"provider_timeout_ms": 500}"#).unwrap();
        assert_eq!(config.provider_timeout_ms, 500);
        assert_eq!(config.request_timeout_ms, 30_000);
        assert_eq!(config.cache, OfferCacheConfig::default());
    }
}
