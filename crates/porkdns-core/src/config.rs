//! Configuration types for porkdns
//!
//! This module defines the configuration handed from the driver to the core.
//! Loading from the environment happens in the binary; these types only
//! carry values and validate them.

use serde::{Deserialize, Serialize};

/// Environment variable holding the Porkbun API key
pub const ENV_API_KEY: &str = "PORKBUN_API_KEY";

/// Environment variable holding the Porkbun secret key
pub const ENV_SECRET_KEY: &str = "PORKBUN_SECRET_KEY";

/// Environment variable overriding the Porkbun base URL
pub const ENV_BASE_URL: &str = "PORKBUN_BASE_URL";

/// Environment variable overriding the retry attempt budget
pub const ENV_MAX_RETRIES: &str = "PORKBUN_MAX_RETRIES";

/// Main porkdns configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PorkdnsConfig {
    /// Which record store to talk to
    pub store: StoreConfig,

    /// Retry behavior for every remote call
    #[serde(default)]
    pub retry: RetryConfig,
}

impl PorkdnsConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.store.validate()
    }
}

/// Record store configuration
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// Porkbun JSON API
    Porkbun {
        /// API key (`pk1_...`)
        api_key: String,
        /// Secret API key (`sk1_...`)
        secret_key: String,
        /// Base URL override, e.g. for a test server
        #[serde(default)]
        base_url: Option<String>,
    },

    /// In-process store (not persistent)
    #[default]
    Memory,

    /// Custom store registered by name
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Porkbun {
                api_key,
                secret_key,
                base_url,
            } => {
                if api_key.is_empty() {
                    return Err(crate::Error::config("api_key cannot be an empty string"));
                }
                if secret_key.is_empty() {
                    return Err(crate::Error::config(
                        "secret_key cannot be an empty string",
                    ));
                }
                if let Some(url) = base_url
                    && !url.starts_with("https://")
                    && !url.starts_with("http://")
                {
                    return Err(crate::Error::config(format!(
                        "base_url must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                Ok(())
            }
            StoreConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom store factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom store config cannot be null"));
                }
                Ok(())
            }
            StoreConfig::Memory => Ok(()),
        }
    }

    /// Get the store type name used for registry lookup
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Porkbun { .. } => "porkbun",
            StoreConfig::Memory => "memory",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

// Credentials stay out of logs
impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreConfig::Porkbun { base_url, .. } => f
                .debug_struct("Porkbun")
                .field("api_key", &"<REDACTED>")
                .field("secret_key", &"<REDACTED>")
                .field("base_url", base_url)
                .finish(),
            StoreConfig::Memory => f.write_str("Memory"),
            StoreConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .finish_non_exhaustive(),
        }
    }
}

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempt budget per remote call; see [`RetryPolicy::attempts`]
    ///
    /// [`RetryPolicy::attempts`]: crate::retry::RetryPolicy::attempts
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (in seconds); doubles afterwards
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl RetryConfig {
    /// Parse an attempt budget override such as `PORKBUN_MAX_RETRIES`
    pub fn parse_max_retries(raw: &str) -> Result<u32, crate::Error> {
        raw.trim().parse().map_err(|e| {
            crate::Error::config(format!("failed converting max retries '{}': {}", raw, e))
        })
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_max_retries() -> u32 {
    10
}

fn default_retry_delay_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 10);
        assert_eq!(config.retry_delay_secs, 10);
    }

    #[test]
    fn test_zero_max_retries_is_accepted_as_one_attempt() {
        let config = PorkdnsConfig {
            store: StoreConfig::Memory,
            retry: RetryConfig {
                max_retries: RetryConfig::parse_max_retries("0").unwrap(),
                retry_delay_secs: 1,
            },
        };

        assert!(config.validate().is_ok());
        let policy = crate::retry::RetryPolicy::from_config(&config.retry);
        assert_eq!(policy.max_attempts(), 1);
    }

    #[test]
    fn test_parse_max_retries() {
        assert_eq!(RetryConfig::parse_max_retries("3").unwrap(), 3);
        assert_eq!(RetryConfig::parse_max_retries(" 12 ").unwrap(), 12);
        assert!(RetryConfig::parse_max_retries("many").is_err());
    }

    #[test]
    fn test_porkbun_requires_keys() {
        let config = StoreConfig::Porkbun {
            api_key: String::new(),
            secret_key: "sk1_x".to_string(),
            base_url: None,
        };
        assert!(config.validate().is_err());

        let config = StoreConfig::Porkbun {
            api_key: "pk1_x".to_string(),
            secret_key: String::new(),
            base_url: None,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_base_url_scheme() {
        let config = StoreConfig::Porkbun {
            api_key: "pk1_x".to_string(),
            secret_key: "sk1_x".to_string(),
            base_url: Some("ftp://example.com".to_string()),
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_config_deserializes_tagged() {
        let json = r#"{"type":"porkbun","api_key":"pk1_a","secret_key":"sk1_b"}"#;
        let config: StoreConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.type_name(), "porkbun");
        assert!(config.validate().is_ok());

        let config: StoreConfig = serde_json::from_str(r#"{"type":"memory"}"#).unwrap();
        assert_eq!(config.type_name(), "memory");
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = StoreConfig::Porkbun {
            api_key: "pk1_supersecret".to_string(),
            secret_key: "sk1_supersecret".to_string(),
            base_url: None,
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("supersecret"));
        assert!(debug.contains("REDACTED"));
    }
}
