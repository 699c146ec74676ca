use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use std::time::Duration;
use crate::types::SourceConfig;

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config() -> Result<SourceConfig> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<SourceConfig> {
    let defaults = SourceConfig::default();

    let api_version = match env.get_var("METRICS_API_VERSION") {
        Some(v) => v.trim().to_string(),
        None => defaults.api_version,
    };
    if api_version.is_empty() || api_version.contains('/') {
        return Err(anyhow!(
            "METRICS_API_VERSION must be a bare version such as v1beta1, got {:?}",
            api_version
        ));
    }

    // 0 leaves the client without a read timeout
    let request_timeout = match env.get_var("METRICS_REQUEST_TIMEOUT_SECONDS") {
        Some(v) => {
            let secs: u64 = v
                .trim()
                .parse()
                .context("Invalid METRICS_REQUEST_TIMEOUT_SECONDS")?;
            (secs > 0).then(|| Duration::from_secs(secs))
        }
        None => defaults.request_timeout,
    };

    Ok(SourceConfig {
        api_version,
        request_timeout,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_loading_with_env() {
        let env = MockEnvironment::new()
            .with_var("METRICS_API_VERSION", "v1")
            .with_var("METRICS_REQUEST_TIMEOUT_SECONDS", "10");

        let config = load_config_with_env(&env).unwrap();

        assert_eq!(config.api_version, "v1");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_config_loading_defaults() {
        let config = load_config_with_env(&MockEnvironment::new()).unwrap();

        assert_eq!(config.api_version, "v1beta1"); // default
        assert_eq!(config.request_timeout, Some(Duration::from_secs(30))); // default
        assert_eq!(config, SourceConfig::default());
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let env = MockEnvironment::new().with_var("METRICS_REQUEST_TIMEOUT_SECONDS", "0");

        let config = load_config_with_env(&env).unwrap();
        assert_eq!(config.request_timeout, None);
    }

    #[test]
    fn test_config_loading_invalid_timeout() {
        for val in ["invalid", "-1", "1.5", ""] {
            let env = MockEnvironment::new().with_var("METRICS_REQUEST_TIMEOUT_SECONDS", val);

            let result = load_config_with_env(&env);
            assert!(result.is_err(), "Accepted value: {}", val);
            assert!(result.unwrap_err().to_string().contains("METRICS_REQUEST_TIMEOUT_SECONDS"));
        }
    }

    #[test]
    fn test_api_version_parsing() {
        let env = MockEnvironment::new().with_var("METRICS_API_VERSION", "  v1beta1  ");
        assert_eq!(load_config_with_env(&env).unwrap().api_version, "v1beta1");

        for val in ["", "   ", "metrics.k8s.io/v1beta1"] {
            let env = MockEnvironment::new().with_var("METRICS_API_VERSION", val);

            let result = load_config_with_env(&env);
            assert!(result.is_err(), "Accepted value: {:?}", val);
            assert!(result.unwrap_err().to_string().contains("METRICS_API_VERSION"));
        }
    }
}
