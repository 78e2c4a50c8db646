//! Container image metadata
//!
//! The orchestrator only depends on [`ImageMetadataFetcher`]; the
//! [`RegistryMetadataFetcher`] implementation talks to a Docker Registry
//! HTTP API v2 endpoint.

pub mod reference;
pub mod registry_client;

pub use reference::ImageReference;
pub use registry_client::RegistryMetadataFetcher;

use async_trait::async_trait;
use thiserror::Error;

/// Metadata declared by an image's configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Declared exposed ports, ascending and unique
    pub exposed_ports: Vec<u16>,
    pub working_dir: Option<String>,
    /// Entrypoint followed by the default command arguments
    pub start_command: Vec<String>,
}

impl ImageMetadata {
    pub fn new(exposed_ports: Vec<u16>, working_dir: Option<String>, start_command: Vec<String>) -> Self {
        let mut exposed_ports = exposed_ports;
        exposed_ports.sort_unstable();
        exposed_ports.dedup();
        Self {
            exposed_ports,
            working_dir: working_dir.filter(|dir| !dir.is_empty()),
            start_command,
        }
    }
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Invalid image reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    #[error("Registry request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Registry returned {status} for {url}")]
    Registry { status: u16, url: String },

    #[error("Registry authentication failed: {0}")]
    Unauthorized(String),

    #[error("Invalid image manifest: {0}")]
    InvalidManifest(String),
}

#[async_trait]
pub trait ImageMetadataFetcher: Send + Sync {
    async fn fetch_metadata(&self, image: &str) -> Result<ImageMetadata, ImageError>;
}
