//! Runtime configuration read from the environment (and `.env` via dotenvy).

use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::domain::services::synchronizer::{SyncOptions, SyncScope};
use crate::domain::value_objects::Slug;

pub const LOCAL_DATABASE_URL: &str = "LOCAL_DATABASE_URL";
pub const PRODUCTION_DATABASE_URL: &str = "PRODUCTION_DATABASE_URL";
pub const SYNC_SCOPE: &str = "SYNC_SCOPE";
pub const SYNC_STORE_TIMEOUT_MS: &str = "SYNC_STORE_TIMEOUT_MS";
pub const SYNC_IMAGE_ATTRIBUTE: &str = "SYNC_IMAGE_ATTRIBUTE";
pub const SYNC_MAX_CONNECTIONS: &str = "SYNC_MAX_CONNECTIONS";
pub const NATS_URL: &str = "NATS_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

#[derive(Clone, Debug, Validate)]
#[validate(schema(function = "distinct_databases"))]
pub struct SyncConfig {
    #[validate(length(min = 1))]
    pub local_database_url: String,
    #[validate(length(min = 1))]
    pub production_database_url: String,
    pub scope: SyncScope,
    #[validate(range(min = 1, max = 600000))]
    pub store_timeout_ms: u64,
    pub image_attribute: Slug,
    #[validate(range(min = 1, max = 100))]
    pub max_connections: u32,
    pub nats_url: Option<String>,
}

fn distinct_databases(config: &SyncConfig) -> Result<(), ValidationError> {
    if config.local_database_url.trim() == config.production_database_url.trim() {
        return Err(ValidationError::new("source_and_target_are_the_same_database"));
    }
    Ok(())
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, ConfigError> { Self::from_lookup(|key| std::env::var(key).ok()) }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let scope = match get(SYNC_SCOPE) {
            Some(raw) => raw.parse::<SyncScope>().map_err(|e| invalid(SYNC_SCOPE, e))?,
            None => SyncScope::all(),
        };
        let image_attribute = Slug::new(get(SYNC_IMAGE_ATTRIBUTE).unwrap_or_else(|| "color".to_string()))
            .map_err(|e| invalid(SYNC_IMAGE_ATTRIBUTE, e))?;

        let config = Self {
            local_database_url: required(LOCAL_DATABASE_URL)?,
            production_database_url: required(PRODUCTION_DATABASE_URL)?,
            scope,
            store_timeout_ms: parse_or(get(SYNC_STORE_TIMEOUT_MS), SYNC_STORE_TIMEOUT_MS, 10_000)?,
            image_attribute,
            max_connections: parse_or(get(SYNC_MAX_CONNECTIONS), SYNC_MAX_CONNECTIONS, 5)?,
            nats_url: get(NATS_URL),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn store_timeout(&self) -> Duration { Duration::from_millis(self.store_timeout_ms) }

    pub fn sync_options(&self) -> SyncOptions { SyncOptions::new(self.store_timeout(), self.image_attribute.clone()) }
}

fn invalid(key: &'static str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid { key, reason: err.to_string() }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.map_or(Ok(default), |v| v.parse().map_err(|e| invalid(key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    const BASE: [(&str, &str); 2] = [
        (LOCAL_DATABASE_URL, "postgres://localhost/shop"),
        (PRODUCTION_DATABASE_URL, "postgres://prod.internal/shop"),
    ];

    #[test]
    fn test_defaults() {
        let config = SyncConfig::from_lookup(lookup(&BASE)).unwrap();
        assert_eq!(config.scope, SyncScope::all());
        assert_eq!(config.store_timeout(), Duration::from_secs(10));
        assert_eq!(config.image_attribute.as_str(), "color");
        assert_eq!(config.max_connections, 5);
        assert!(config.nats_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let mut pairs = BASE.to_vec();
        pairs.extend([(SYNC_SCOPE, "terms,variants"), (SYNC_STORE_TIMEOUT_MS, "2500"), (SYNC_IMAGE_ATTRIBUTE, "Finish"), (NATS_URL, "nats://localhost:4222")]);
        let config = SyncConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(!config.scope.attributes && config.scope.terms && config.scope.variants);
        assert_eq!(config.sync_options().store_timeout, Duration::from_millis(2500));
        assert_eq!(config.image_attribute.as_str(), "finish");
        assert_eq!(config.nats_url.as_deref(), Some("nats://localhost:4222"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(SyncConfig::from_lookup(lookup(&BASE[..1])), Err(ConfigError::Missing(PRODUCTION_DATABASE_URL))));

        let mut pairs = BASE.to_vec();
        pairs.push((SYNC_STORE_TIMEOUT_MS, "0"));
        assert!(matches!(SyncConfig::from_lookup(lookup(&pairs)), Err(ConfigError::Validation(_))));

        let mut pairs = BASE.to_vec();
        pairs.push((SYNC_SCOPE, "orders"));
        assert!(matches!(SyncConfig::from_lookup(lookup(&pairs)), Err(ConfigError::Invalid { key: SYNC_SCOPE, .. })));

        let same = [(LOCAL_DATABASE_URL, "postgres://db/shop"), (PRODUCTION_DATABASE_URL, "postgres://db/shop")];
        assert!(matches!(SyncConfig::from_lookup(lookup(&same)), Err(ConfigError::Validation(_))));
    }
}
