//! Configuration management for svcprov
//!
//! Settings are loaded from environment variables with defaults that target a
//! local single-node platform. The config knows how to build the concrete
//! clients the provisioning pipeline runs against.
//!
//! # Environment Variables
//!
//! ## Platform endpoints
//! - `SVCPROV_RECEPTOR_URL`: App runner API - default: "http://receptor.192.168.11.11.xip.io"
//! - `SVCPROV_RECEPTOR_USERNAME` / `SVCPROV_RECEPTOR_PASSWORD`: Optional basic auth
//! - `SVCPROV_BLOB_STORE_URL`: WebDAV blob store - default: "http://192.168.11.11:8444/blobs"
//! - `SVCPROV_BLOB_STORE_USERNAME` / `SVCPROV_BLOB_STORE_PASSWORD`: Optional basic auth
//! - `SVCPROV_REGISTRY_URL`: Registry for unqualified images - default: "https://registry-1.docker.io"
//!
//! ## Provisioning
//! - `SVCPROV_SYSTEM_DOMAIN`: Route hostname suffix - default: "192.168.11.11.xip.io"
//! - `SVCPROV_HEALTHCHECK_URL`: Health-check helper download
//! - `SVCPROV_POLL_INTERVAL_MS`: Readiness poll interval - default: "1000"
//! - `SVCPROV_REQUEST_TIMEOUT`: HTTP timeout in seconds - default: "30"
//! - `SVCPROV_LOG_LEVEL`: Logging level - default: "info"
//!
//! # Example
//!
//! ```no_run
//! use svcprov::ProvisionerConfig;
//! use std::env;
//!
//! env::set_var("SVCPROV_SYSTEM_DOMAIN", "apps.example.com");
//!
//! let config = ProvisionerConfig::default();
//! config.validate().expect("Invalid configuration");
//!
//! let pipeline = config.pipeline_config();
//! assert_eq!(pipeline.system_domain, "apps.example.com");
//! ```

use crate::image::{ImageMetadataFetcher, RegistryMetadataFetcher};
use crate::pipeline::config::{DEFAULT_HEALTHCHECK_URL, DEFAULT_SYSTEM_DOMAIN};
use crate::pipeline::PipelineConfig;
use crate::runner::{AppRunner, ReceptorClient};
use crate::store::{DavBlobStore, DescriptorStore};
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_RECEPTOR_URL: &str = "http://receptor.192.168.11.11.xip.io";
const DEFAULT_BLOB_STORE_URL: &str = "http://192.168.11.11:8444/blobs";
const DEFAULT_REGISTRY_URL: &str = "https://registry-1.docker.io";
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("Invalid URL for {field}: '{value}'. Expected an http:// or https:// URL")]
    InvalidUrl { field: String, value: String },
}

/// Basic-auth pair for a platform endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct EndpointCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for EndpointCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    pub receptor_url: String,
    pub receptor_credentials: Option<EndpointCredentials>,

    pub blob_store_url: String,
    pub blob_store_credentials: Option<EndpointCredentials>,

    /// Registry used for images without a registry host
    pub registry_url: String,

    pub system_domain: String,

    pub healthcheck_url: String,

    pub poll_interval_ms: u64,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,
}

fn credentials_from_env(user_var: &str, pass_var: &str) -> Option<EndpointCredentials> {
    let username = env::var(user_var).ok().filter(|u| !u.is_empty())?;
    Some(EndpointCredentials {
        username,
        password: env::var(pass_var).unwrap_or_default(),
    })
}

impl Default for ProvisionerConfig {
    /// Loads SVCPROV_* environment variables, falling back to defaults
    fn default() -> Self {
        let string_var = |key: &str, default: &str| {
            env::var(key)
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let poll_interval_ms = env::var("SVCPROV_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_POLL_INTERVAL_MS);

        let request_timeout_secs = env::var("SVCPROV_REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);

        Self {
            receptor_url: string_var("SVCPROV_RECEPTOR_URL", DEFAULT_RECEPTOR_URL),
            receptor_credentials: credentials_from_env(
                "SVCPROV_RECEPTOR_USERNAME",
                "SVCPROV_RECEPTOR_PASSWORD",
            ),
            blob_store_url: string_var("SVCPROV_BLOB_STORE_URL", DEFAULT_BLOB_STORE_URL),
            blob_store_credentials: credentials_from_env(
                "SVCPROV_BLOB_STORE_USERNAME",
                "SVCPROV_BLOB_STORE_PASSWORD",
            ),
            registry_url: string_var("SVCPROV_REGISTRY_URL", DEFAULT_REGISTRY_URL),
            system_domain: string_var("SVCPROV_SYSTEM_DOMAIN", DEFAULT_SYSTEM_DOMAIN),
            healthcheck_url: string_var("SVCPROV_HEALTHCHECK_URL", DEFAULT_HEALTHCHECK_URL),
            poll_interval_ms,
            request_timeout_secs,
            log_level: string_var("SVCPROV_LOG_LEVEL", DEFAULT_LOG_LEVEL).to_lowercase(),
        }
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let has_host = value
        .strip_prefix("http://")
        .or_else(|| value.strip_prefix("https://"))
        .is_some_and(|rest| !rest.is_empty());
    if has_host {
        Ok(())
    } else {
        Err(ConfigError::InvalidUrl {
            field: field.to_string(),
            value: value.to_string(),
        })
    }
}

impl ProvisionerConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a non-http(s) endpoint, an out-of-range
    /// interval or timeout, an empty system domain or an unknown log level
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_url("SVCPROV_RECEPTOR_URL", &self.receptor_url)?;
        validate_url("SVCPROV_BLOB_STORE_URL", &self.blob_store_url)?;
        validate_url("SVCPROV_REGISTRY_URL", &self.registry_url)?;
        validate_url("SVCPROV_HEALTHCHECK_URL", &self.healthcheck_url)?;

        if self.system_domain.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "System domain must not be empty".to_string(),
            ));
        }

        if !(10..=60_000).contains(&self.poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "Poll interval must be between 10ms and 60s".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout must be at least 1 second".to_string(),
            ));
        }
        if self.request_timeout_secs > 600 {
            return Err(ConfigError::ValidationFailed(
                "Request timeout cannot exceed 10 minutes".to_string(),
            ));
        }

        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::ValidationFailed(format!(
                    "Invalid log level: {}. Valid options: trace, debug, info, warn, error",
                    self.log_level
                )))
            }
        }

        Ok(())
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::new()
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_system_domain(self.system_domain.clone())
            .with_healthcheck_url(self.healthcheck_url.clone())
    }

    pub fn create_image_fetcher(&self) -> Arc<dyn ImageMetadataFetcher> {
        Arc::new(RegistryMetadataFetcher::with_timeout(
            self.registry_url.clone(),
            self.request_timeout(),
        ))
    }

    pub fn create_runner(&self) -> Arc<dyn AppRunner> {
        let client = ReceptorClient::with_timeout(self.receptor_url.clone(), self.request_timeout());
        match &self.receptor_credentials {
            Some(c) => Arc::new(client.with_credentials(c.username.clone(), c.password.clone())),
            None => Arc::new(client),
        }
    }

    pub fn create_store(&self) -> Arc<dyn DescriptorStore> {
        let store = DavBlobStore::with_timeout(self.blob_store_url.clone(), self.request_timeout());
        match &self.blob_store_credentials {
            Some(c) => Arc::new(store.with_credentials(c.username.clone(), c.password.clone())),
            None => Arc::new(store),
        }
    }

    /// Converts configuration to a display map for output formatting
    pub fn to_display_map(&self) -> std::collections::BTreeMap<String, String> {
        let mut map = std::collections::BTreeMap::new();

        map.insert("receptor_url".to_string(), self.receptor_url.clone());
        map.insert("blob_store_url".to_string(), self.blob_store_url.clone());
        map.insert("registry_url".to_string(), self.registry_url.clone());
        map.insert("system_domain".to_string(), self.system_domain.clone());
        map.insert("healthcheck_url".to_string(), self.healthcheck_url.clone());
        map.insert(
            "poll_interval_ms".to_string(),
            self.poll_interval_ms.to_string(),
        );
        map.insert(
            "request_timeout_secs".to_string(),
            self.request_timeout_secs.to_string(),
        );
        map.insert("log_level".to_string(), self.log_level.clone());

        map
    }
}

impl fmt::Display for ProvisionerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "svcprov Configuration:")?;
        writeln!(f, "  Receptor: {}", self.receptor_url)?;
        if let Some(c) = &self.receptor_credentials {
            writeln!(f, "  Receptor User: {}", c.username)?;
        }
        writeln!(f, "  Blob Store: {}", self.blob_store_url)?;
        if let Some(c) = &self.blob_store_credentials {
            writeln!(f, "  Blob Store User: {}", c.username)?;
        }
        writeln!(f, "  Registry: {}", self.registry_url)?;
        writeln!(f, "  System Domain: {}", self.system_domain)?;
        writeln!(f, "  Health Check: {}", self.healthcheck_url)?;
        writeln!(f, "  Poll Interval: {}ms", self.poll_interval_ms)?;
        writeln!(f, "  Request Timeout: {}s", self.request_timeout_secs)?;
        writeln!(f, "  Log Level: {}", self.log_level)?;
        Ok(())
    }
}
