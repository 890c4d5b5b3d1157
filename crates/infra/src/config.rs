//! Configuration loading and representation.
//!
//! Every value comes from a `STOREFRONT_*` environment variable and has a
//! default, so an empty environment yields a working configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use storefront_core::{ExchangeRate, LocalTime};

pub const ENV_DATA_DIR: &str = "STOREFRONT_DATA_DIR";
pub const ENV_PREFIX: &str = "STOREFRONT_PREFIX";
pub const ENV_STORE_NAME: &str = "STOREFRONT_STORE_NAME";
pub const ENV_EXCHANGE_RATE: &str = "STOREFRONT_EXCHANGE_RATE";
pub const ENV_UTC_OFFSET_MINUTES: &str = "STOREFRONT_UTC_OFFSET_MINUTES";
pub const ENV_CONFIRM_TIMEOUT_SECS: &str = "STOREFRONT_CONFIRM_TIMEOUT_SECS";
pub const ENV_RESTOCK_THRESHOLD: &str = "STOREFRONT_RESTOCK_THRESHOLD";
pub const ENV_TOS_URL: &str = "STOREFRONT_TOS_URL";
pub const ENV_FEEDBACK_URL: &str = "STOREFRONT_FEEDBACK_URL";
pub const ENV_BANNER_URL: &str = "STOREFRONT_BANNER_URL";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Directory holding `settings.json`.
    pub data_dir: PathBuf,
    pub prefix: String,
    /// Shown as title and author of delivery messages.
    pub store_name: String,
    pub exchange_rate: ExchangeRate,
    pub local_time: LocalTime,
    /// How long the vouch prompt waits for the operator.
    pub confirm_timeout: Duration,
    /// Global restock threshold used until `setrestockthreshold` stores one.
    pub restock_threshold: u32,
    pub tos_url: Option<String>,
    pub feedback_url: Option<String>,
    pub banner_url: Option<String>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            prefix: "!".to_string(),
            store_name: "Frenzy Store".to_string(),
            exchange_rate: ExchangeRate::DEFAULT,
            local_time: LocalTime::default(),
            confirm_timeout: Duration::from_secs(60),
            restock_threshold: 5,
            tos_url: None,
            feedback_url: None,
            banner_url: None,
        }
    }
}

impl StorefrontConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup (the environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let prefix = get(ENV_PREFIX).unwrap_or(defaults.prefix);
        if prefix.chars().any(char::is_whitespace) {
            return Err(ConfigError::invalid(ENV_PREFIX, &prefix, "must not contain whitespace"));
        }

        let exchange_rate = match get(ENV_EXCHANGE_RATE) {
            Some(raw) => {
                let rate = Decimal::from_str(raw.trim())
                    .map_err(|e| ConfigError::invalid(ENV_EXCHANGE_RATE, &raw, e.to_string()))?;
                ExchangeRate::new(rate)
                    .map_err(|e| ConfigError::invalid(ENV_EXCHANGE_RATE, &raw, e.to_string()))?
            }
            None => defaults.exchange_rate,
        };

        let local_time = match get(ENV_UTC_OFFSET_MINUTES) {
            Some(raw) => {
                let minutes = parse_number::<i32>(ENV_UTC_OFFSET_MINUTES, &raw)?;
                LocalTime::from_offset_minutes(minutes).ok_or_else(|| {
                    ConfigError::invalid(ENV_UTC_OFFSET_MINUTES, &raw, "offset out of range")
                })?
            }
            None => defaults.local_time,
        };

        let confirm_timeout = match get(ENV_CONFIRM_TIMEOUT_SECS) {
            Some(raw) => match parse_number::<u64>(ENV_CONFIRM_TIMEOUT_SECS, &raw)? {
                0 => {
                    return Err(ConfigError::invalid(
                        ENV_CONFIRM_TIMEOUT_SECS,
                        &raw,
                        "must be at least one second",
                    ));
                }
                secs => Duration::from_secs(secs),
            },
            None => defaults.confirm_timeout,
        };

        let restock_threshold = match get(ENV_RESTOCK_THRESHOLD) {
            Some(raw) => parse_number::<u32>(ENV_RESTOCK_THRESHOLD, &raw)?,
            None => defaults.restock_threshold,
        };

        Ok(Self {
            data_dir: get(ENV_DATA_DIR).map(PathBuf::from).unwrap_or(defaults.data_dir),
            prefix,
            store_name: get(ENV_STORE_NAME).unwrap_or(defaults.store_name),
            exchange_rate,
            local_time,
            confirm_timeout,
            restock_threshold,
            tos_url: get(ENV_TOS_URL),
            feedback_url: get(ENV_FEEDBACK_URL),
            banner_url: get(ENV_BANNER_URL),
        })
    }
}

fn parse_number<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::invalid(var, raw, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        StorefrontConfig::from_lookup(|var| map.get(var).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config(&[]).unwrap(), StorefrontConfig::default());
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config(&[
            (ENV_PREFIX, "?"),
            (ENV_EXCHANGE_RATE, "90"),
            (ENV_UTC_OFFSET_MINUTES, "0"),
            (ENV_CONFIRM_TIMEOUT_SECS, "5"),
            (ENV_RESTOCK_THRESHOLD, "2"),
            (ENV_TOS_URL, "https://example.com/tos"),
        ])
        .unwrap();

        assert_eq!(cfg.prefix, "?");
        assert_eq!(cfg.exchange_rate.rate(), Decimal::from(90));
        assert_eq!(cfg.local_time, LocalTime::from_offset_minutes(0).unwrap());
        assert_eq!(cfg.confirm_timeout, Duration::from_secs(5));
        assert_eq!(cfg.restock_threshold, 2);
        assert_eq!(cfg.tos_url.as_deref(), Some("https://example.com/tos"));
    }

    #[test]
    fn invalid_values_name_the_variable() {
        let err = config(&[(ENV_CONFIRM_TIMEOUT_SECS, "soon")]).unwrap_err();
        match err {
            ConfigError::Invalid { var, .. } => assert_eq!(var, ENV_CONFIRM_TIMEOUT_SECS),
        }
        assert!(config(&[(ENV_EXCHANGE_RATE, "0")]).is_err());
        assert!(config(&[(ENV_CONFIRM_TIMEOUT_SECS, "0")]).is_err());
        assert!(config(&[(ENV_PREFIX, "a b")]).is_err());
    }
}
