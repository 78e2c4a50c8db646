//! Docker Registry HTTP API v2 metadata fetcher
//!
//! Resolves `image:tag` to its schema-2 (or OCI) manifest, follows manifest
//! lists to the `linux/amd64` entry, then reads the image configuration blob
//! for exposed ports, working directory and entrypoint/command.
//!
//! Anonymous bearer tokens are requested on demand when the registry answers
//! `401` with a `WWW-Authenticate: Bearer ...` challenge.

use super::{ImageError, ImageMetadata, ImageMetadataFetcher, ImageReference};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Registry used for references without an explicit host
pub const DOCKER_HUB_REGISTRY: &str = "https://registry-1.docker.io";

const MANIFEST_MEDIA_TYPES: &str = "application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.index.v1+json";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    config: Option<Descriptor>,
    #[serde(default)]
    manifests: Vec<PlatformManifest>,
}

#[derive(Debug, Deserialize)]
struct Descriptor {
    digest: String,
}

#[derive(Debug, Deserialize)]
struct PlatformManifest {
    digest: String,
    #[serde(default)]
    platform: Option<Platform>,
}

#[derive(Debug, Deserialize)]
struct Platform {
    architecture: String,
    os: String,
}

#[derive(Debug, Deserialize)]
struct ImageConfigBlob {
    #[serde(default)]
    config: Option<ContainerConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerConfig {
    #[serde(default)]
    exposed_ports: Option<HashMap<String, serde_json::Value>>,
    #[serde(default)]
    working_dir: Option<String>,
    #[serde(default)]
    entrypoint: Option<Vec<String>>,
    #[serde(default)]
    cmd: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

pub struct RegistryMetadataFetcher {
    /// Base URL for Docker Hub references
    default_registry: String,
    http_client: Client,
}

impl RegistryMetadataFetcher {
    pub fn new(default_registry: impl Into<String>) -> Self {
        Self::with_timeout(default_registry, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(default_registry: impl Into<String>, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            default_registry: default_registry.into().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    fn registry_url(&self, reference: &ImageReference) -> String {
        match &reference.registry {
            Some(host) => format!("https://{}", host),
            None => self.default_registry.clone(),
        }
    }

    /// GETs `url`, answering a bearer challenge once if the registry asks
    async fn get(
        &self,
        url: &str,
        accept: Option<&str>,
        token: &mut Option<String>,
    ) -> Result<reqwest::Response, ImageError> {
        let send = |token: Option<&str>| {
            let mut request = self.http_client.get(url);
            if let Some(accept) = accept {
                request = request.header(ACCEPT, accept);
            }
            if let Some(token) = token {
                request = request.header(AUTHORIZATION, format!("Bearer {}", token));
            }
            request.send()
        };

        let mut response = send(token.as_deref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED && token.is_none() {
            let challenge = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| ImageError::Unauthorized(format!("no challenge from {}", url)))?;

            *token = Some(self.fetch_token(&challenge).await?);
            response = send(token.as_deref()).await?;
        }

        if !response.status().is_success() {
            return Err(ImageError::Registry {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response)
    }

    async fn fetch_token(&self, challenge: &str) -> Result<String, ImageError> {
        let params = parse_bearer_challenge(challenge)
            .ok_or_else(|| ImageError::Unauthorized(format!("unsupported challenge: {}", challenge)))?;
        let realm = params
            .get("realm")
            .ok_or_else(|| ImageError::Unauthorized("challenge without realm".to_string()))?;

        let query: Vec<(&str, &str)> = params
            .iter()
            .filter(|(k, _)| k.as_str() != "realm")
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        debug!(realm = %realm, "Requesting registry token");
        let response = self.http_client.get(realm).query(&query).send().await?;
        if !response.status().is_success() {
            return Err(ImageError::Unauthorized(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response.json().await?;
        body.token
            .or(body.access_token)
            .ok_or_else(|| ImageError::Unauthorized("token response without token".to_string()))
    }
}

#[async_trait]
impl ImageMetadataFetcher for RegistryMetadataFetcher {
    async fn fetch_metadata(&self, image: &str) -> Result<ImageMetadata, ImageError> {
        let reference = ImageReference::parse(image)?;
        let base = self.registry_url(&reference);
        let mut token = None;

        info!(image = %reference, "Fetching image metadata");

        let manifest_url = format!("{}/v2/{}/manifests/{}", base, reference.repository, reference.tag);
        let mut manifest: Manifest = self
            .get(&manifest_url, Some(MANIFEST_MEDIA_TYPES), &mut token)
            .await?
            .json()
            .await?;

        if manifest.config.is_none() && !manifest.manifests.is_empty() {
            let digest = select_platform_manifest(&manifest.manifests).ok_or_else(|| {
                ImageError::InvalidManifest("no linux/amd64 entry in manifest list".to_string())
            })?;
            debug!(digest = %digest, "Following manifest list");

            let url = format!("{}/v2/{}/manifests/{}", base, reference.repository, digest);
            manifest = self
                .get(&url, Some(MANIFEST_MEDIA_TYPES), &mut token)
                .await?
                .json()
                .await?;
        }

        let config_digest = manifest
            .config
            .map(|c| c.digest)
            .ok_or_else(|| {
                ImageError::InvalidManifest(format!(
                    "manifest of type {} has no config",
                    manifest.media_type.as_deref().unwrap_or("unknown")
                ))
            })?;

        let blob_url = format!("{}/v2/{}/blobs/{}", base, reference.repository, config_digest);
        let blob = self.get(&blob_url, None, &mut token).await?.text().await?;

        metadata_from_config(&blob)
    }
}

fn select_platform_manifest(manifests: &[PlatformManifest]) -> Option<&str> {
    manifests
        .iter()
        .find(|m| {
            m.platform
                .as_ref()
                .is_some_and(|p| p.os == "linux" && p.architecture == "amd64")
        })
        .map(|m| m.digest.as_str())
}

/// Parses `Bearer realm="...",service="...",scope="..."` into its parameters
fn parse_bearer_challenge(challenge: &str) -> Option<HashMap<String, String>> {
    let rest = challenge.trim().strip_prefix("Bearer ")?;
    let mut params = HashMap::new();

    for part in rest.split(',') {
        let (key, value) = part.trim().split_once('=')?;
        params.insert(key.trim().to_string(), value.trim().trim_matches('"').to_string());
    }

    Some(params)
}

/// Extracts [`ImageMetadata`] from an image configuration blob
fn metadata_from_config(blob: &str) -> Result<ImageMetadata, ImageError> {
    let parsed: ImageConfigBlob = serde_json::from_str(blob)
        .map_err(|e| ImageError::InvalidManifest(format!("invalid image config: {}", e)))?;
    let config = parsed.config.unwrap_or_default();

    let mut exposed_ports = Vec::new();
    for key in config.exposed_ports.unwrap_or_default().keys() {
        let number = key.split('/').next().unwrap_or(key);
        let port = number
            .parse::<u16>()
            .map_err(|_| ImageError::InvalidManifest(format!("invalid exposed port '{}'", key)))?;
        exposed_ports.push(port);
    }

    let mut start_command = config.entrypoint.unwrap_or_default();
    start_command.extend(config.cmd.unwrap_or_default());

    Ok(ImageMetadata::new(exposed_ports, config.working_dir, start_command))
}
