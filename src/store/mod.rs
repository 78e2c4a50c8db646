//! Key/value blob store holding service descriptors and bindings

pub mod dav;

pub use dav::DavBlobStore;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Blob store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Blob store returned {status} for {method} {key}")]
    Status {
        method: String,
        key: String,
        status: u16,
    },

    #[error("Invalid blob store listing: {0}")]
    InvalidListing(String),

    #[error("Blob store error: {0}")]
    Other(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DescriptorStore: Send + Sync {
    /// All stored keys, sorted
    async fn list(&self) -> Result<Vec<String>, StoreError>;

    async fn upload(&self, key: &str, content: Vec<u8>) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
