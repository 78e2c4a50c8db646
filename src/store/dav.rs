//! WebDAV blob store client
//!
//! Keys map to paths below the store's base URL: `services/db.json` lives at
//! `<base>/services/db.json`. Listing walks collections with `PROPFIND`
//! (`Depth: 1`), uploads use `PUT` and create missing parent collections with
//! `MKCOL` when the server answers `409 Conflict`.

use super::{DescriptorStore, StoreError};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use std::time::Duration;
use tracing::debug;

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:"><D:prop><D:resourcetype/></D:prop></D:propfind>"#;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// One `<D:response>` entry of a multistatus listing
#[derive(Debug, Clone, PartialEq, Eq)]
struct DavEntry {
    path: String,
    is_collection: bool,
}

pub struct DavBlobStore {
    base_url: String,
    credentials: Option<(String, String)>,
    http_client: Client,
}

impl DavBlobStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials: None,
            http_client,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    fn url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }

    /// Path component of the base URL, e.g. `/blobs`
    fn base_path(&self) -> String {
        let without_scheme = self
            .base_url
            .split_once("://")
            .map_or(self.base_url.as_str(), |(_, rest)| rest);
        match without_scheme.find('/') {
            Some(i) => without_scheme[i..].trim_end_matches('/').to_string(),
            None => String::new(),
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.http_client.request(method, url);
        match &self.credentials {
            Some((user, pass)) => request.basic_auth(user, Some(pass)),
            None => request,
        }
    }

    async fn propfind(&self, path: &str) -> Result<Vec<DavEntry>, StoreError> {
        let method = Method::from_bytes(b"PROPFIND")
            .map_err(|e| StoreError::Other(e.to_string()))?;
        let url = self.url(path);

        let response = self
            .request(method, &url)
            .header("Depth", "1")
            .header("Content-Type", "application/xml")
            .body(PROPFIND_BODY)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Status {
                method: "PROPFIND".to_string(),
                key: path.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        parse_multistatus(&body)
    }

    async fn mkcol(&self, key: &str) -> Result<(), StoreError> {
        let method = Method::from_bytes(b"MKCOL").map_err(|e| StoreError::Other(e.to_string()))?;
        let response = self.request(method, &self.url(key)).send().await?;

        // 405: the collection already exists
        if response.status().is_success() || response.status() == StatusCode::METHOD_NOT_ALLOWED {
            Ok(())
        } else {
            Err(StoreError::Status {
                method: "MKCOL".to_string(),
                key: key.to_string(),
                status: response.status().as_u16(),
            })
        }
    }

    async fn put(&self, key: &str, content: &[u8]) -> Result<StatusCode, StoreError> {
        let response = self
            .request(Method::PUT, &self.url(key))
            .body(content.to_vec())
            .send()
            .await?;
        Ok(response.status())
    }
}

#[async_trait]
impl DescriptorStore for DavBlobStore {
    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let base_path = self.base_path();
        let mut keys = Vec::new();
        let mut pending = vec![String::new()];

        while let Some(collection) = pending.pop() {
            for entry in self.propfind(&collection).await? {
                let Some(key) = key_from_href(&entry.path, &base_path) else {
                    continue;
                };
                // A collection lists itself first
                if key.trim_end_matches('/') == collection.trim_end_matches('/') {
                    continue;
                }
                if entry.is_collection {
                    pending.push(format!("{}/", key.trim_end_matches('/')));
                } else {
                    keys.push(key);
                }
            }
        }

        keys.sort();
        debug!(count = keys.len(), "Listed blob store keys");
        Ok(keys)
    }

    async fn upload(&self, key: &str, content: Vec<u8>) -> Result<(), StoreError> {
        let mut status = self.put(key, &content).await?;

        if status == StatusCode::CONFLICT {
            if let Some((parent, _)) = key.rsplit_once('/') {
                debug!(collection = %parent, "Creating missing collection");
                self.mkcol(parent).await?;
                status = self.put(key, &content).await?;
            }
        }

        if status.is_success() {
            debug!(key = %key, bytes = content.len(), "Uploaded blob");
            Ok(())
        } else {
            Err(StoreError::Status {
                method: "PUT".to_string(),
                key: key.to_string(),
                status: status.as_u16(),
            })
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let response = self.request(Method::DELETE, &self.url(key)).send().await?;
        let status = response.status();

        if status.is_success() || status == StatusCode::NOT_FOUND {
            debug!(key = %key, "Deleted blob");
            Ok(())
        } else {
            Err(StoreError::Status {
                method: "DELETE".to_string(),
                key: key.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

/// Converts an href (absolute URL or absolute path) into a store key
///
/// Hrefs arrive percent-encoded; keys are decoded so `my%20db.json` lists as
/// `my db.json`. A path that does not decode to UTF-8 is kept as sent.
fn key_from_href(href: &str, base_path: &str) -> Option<String> {
    let path = match href.split_once("://") {
        Some((_, rest)) => rest.find('/').map_or("/", |i| &rest[i..]),
        None => href,
    };
    let path = match urlencoding::decode(path) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => path.to_string(),
    };
    let relative = path.strip_prefix(base_path)?;
    Some(relative.trim_start_matches('/').to_string())
}

fn parse_multistatus(body: &str) -> Result<Vec<DavEntry>, StoreError> {
    let document =
        roxmltree::Document::parse(body).map_err(|e| StoreError::InvalidListing(e.to_string()))?;

    let entries = document
        .descendants()
        .filter(|n| n.tag_name().name() == "response")
        .filter_map(|response| {
            let path = response
                .descendants()
                .find(|n| n.tag_name().name() == "href")
                .and_then(|n| n.text())?
                .trim()
                .to_string();
            let is_collection = response
                .descendants()
                .any(|n| n.tag_name().name() == "collection");
            Some(DavEntry {
                path,
                is_collection,
            })
        })
        .collect();

    Ok(entries)
}
