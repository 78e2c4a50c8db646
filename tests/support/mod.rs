#![allow(dead_code)]

//! In-memory collaborators for provisioning and catalog tests

use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use svcprov::image::{ImageError, ImageMetadata, ImageMetadataFetcher};
use svcprov::pipeline::{PipelineConfig, ProvisioningContext, ProvisioningOrchestrator};
use svcprov::runner::{
    AppRunner, AppStatus, EffectiveAppConfig, InstanceInfo, InstanceState, PortMapping,
    RunnerError,
};
use svcprov::store::{DescriptorStore, StoreError};
use std::time::Duration;

pub fn svcprov_binary() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_svcprov"))
}

pub struct FakeImageFetcher {
    metadata: Option<ImageMetadata>,
    pub calls: AtomicUsize,
}

impl FakeImageFetcher {
    pub fn new(metadata: ImageMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fetcher whose registry answers 404
    pub fn failing() -> Self {
        Self {
            metadata: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageMetadataFetcher for FakeImageFetcher {
    async fn fetch_metadata(&self, image: &str) -> Result<ImageMetadata, ImageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.metadata.clone().ok_or_else(|| ImageError::Registry {
            status: 404,
            url: format!("https://registry.test/v2/{}/manifests/latest", image),
        })
    }
}

/// App runner that records calls and replays scripted statuses
///
/// The last scripted status repeats once the script runs out.
#[derive(Default)]
pub struct FakeAppRunner {
    pub created: Mutex<Vec<EffectiveAppConfig>>,
    pub removed: Mutex<Vec<String>>,
    statuses: Mutex<VecDeque<AppStatus>>,
    pub status_calls: AtomicUsize,
    fail_create: bool,
    missing_apps: bool,
}

impl FakeAppRunner {
    pub fn with_statuses(statuses: Vec<AppStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Default::default()
        }
    }

    pub fn running(name: &str, instances: u32) -> Self {
        Self::with_statuses(vec![running_status(name, instances)])
    }

    pub fn failing_create() -> Self {
        Self {
            fail_create: true,
            ..Default::default()
        }
    }

    /// Runner that knows no apps at all
    pub fn empty() -> Self {
        Self {
            missing_apps: true,
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<EffectiveAppConfig> {
        self.created.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[async_trait]
impl AppRunner for FakeAppRunner {
    async fn create_app(&self, config: &EffectiveAppConfig) -> Result<(), RunnerError> {
        if self.fail_create {
            return Err(RunnerError::Api {
                status: 500,
                message: "cell capacity exhausted".to_string(),
            });
        }
        self.created.lock().unwrap().push(config.clone());
        Ok(())
    }

    async fn app_status(&self, name: &str) -> Result<AppStatus, RunnerError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.statuses.lock().unwrap();
        let status = if statuses.len() > 1 {
            statuses.pop_front()
        } else {
            statuses.front().cloned()
        };
        status.ok_or_else(|| RunnerError::AppNotFound(name.to_string()))
    }

    async fn remove_app(&self, name: &str) -> Result<(), RunnerError> {
        if self.missing_apps {
            return Err(RunnerError::AppNotFound(name.to_string()));
        }
        self.removed.lock().unwrap().push(name.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFailure {
    List,
    Upload,
    Delete,
}

/// Blob store backed by a sorted map
#[derive(Default)]
pub struct MemoryStore {
    pub blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    failure: Option<StoreFailure>,
    pub list_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keys(keys: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut blobs = store.blobs.lock().unwrap();
            for key in keys {
                blobs.insert(key.to_string(), Vec::new());
            }
        }
        store
    }

    pub fn failing(mut self, failure: StoreFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.blobs
            .lock()
            .unwrap()
            .get(key)
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    pub fn keys(&self) -> Vec<String> {
        self.blobs.lock().unwrap().keys().cloned().collect()
    }

    fn fail(&self, failure: StoreFailure, method: &str, key: &str) -> Result<(), StoreError> {
        if self.failure == Some(failure) {
            return Err(StoreError::Status {
                method: method.to_string(),
                key: key.to_string(),
                status: 503,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DescriptorStore for MemoryStore {
    async fn list(&self) -> Result<Vec<String>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.fail(StoreFailure::List, "PROPFIND", "")?;
        Ok(self.keys())
    }

    async fn upload(&self, key: &str, content: Vec<u8>) -> Result<(), StoreError> {
        self.fail(StoreFailure::Upload, "PUT", key)?;
        self.blobs.lock().unwrap().insert(key.to_string(), content);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.fail(StoreFailure::Delete, "DELETE", key)?;
        self.blobs.lock().unwrap().remove(key);
        Ok(())
    }
}

pub fn running_status(name: &str, instances: u32) -> AppStatus {
    status_with(name, instances, InstanceState::Running)
}

pub fn starting_status(name: &str, instances: u32) -> AppStatus {
    status_with(name, instances, InstanceState::Claimed)
}

fn status_with(name: &str, instances: u32, state: InstanceState) -> AppStatus {
    AppStatus {
        name: name.to_string(),
        desired_instances: instances,
        instances: (0..instances)
            .map(|index| InstanceInfo {
                index,
                state,
                address: format!("10.0.0.{}", index + 4),
                ports: vec![PortMapping {
                    container_port: 5432,
                    host_port: 61001 + index as u16,
                }],
            })
            .collect(),
    }
}

pub fn postgres_metadata() -> ImageMetadata {
    ImageMetadata::new(
        vec![5432],
        Some("/".to_string()),
        vec!["docker-entrypoint.sh".to_string(), "postgres".to_string()],
    )
}

pub struct Harness {
    pub fetcher: Arc<FakeImageFetcher>,
    pub runner: Arc<FakeAppRunner>,
    pub store: Arc<MemoryStore>,
    pub orchestrator: ProvisioningOrchestrator,
}

impl Harness {
    pub fn new(fetcher: FakeImageFetcher, runner: FakeAppRunner, store: MemoryStore) -> Self {
        let fetcher = Arc::new(fetcher);
        let runner = Arc::new(runner);
        let store = Arc::new(store);

        let context = ProvisioningContext::with_default_registry(
            fetcher.clone(),
            runner.clone(),
            store.clone(),
            PipelineConfig::new()
                .with_poll_interval(Duration::from_secs(1))
                .with_system_domain("apps.test"),
        );

        Self {
            fetcher,
            runner,
            store,
            orchestrator: ProvisioningOrchestrator::new(context, None),
        }
    }

    /// Postgres image, one running instance, empty store
    pub fn postgres() -> Self {
        Self::new(
            FakeImageFetcher::new(postgres_metadata()),
            FakeAppRunner::running("db", 1),
            MemoryStore::new(),
        )
    }
}
