//! Service catalog commands: list, bind and remove
//!
//! These are thin operations over the descriptor store and the app runner.
//! None of them validates names against each other and none compensates
//! for a partial failure.

use crate::pipeline::FailureKind;
use crate::runner::{AppRunner, RunnerError};
use crate::services::descriptor::{binding_key, descriptor_key, service_name_from_key};
use crate::store::{DescriptorStore, StoreError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to list services: {0}")]
    List(#[source] StoreError),

    #[error("Failed to bind {app} to service {service}: {source}")]
    Bind {
        app: String,
        service: String,
        source: StoreError,
    },

    #[error("Failed to remove app for service {service}: {source}")]
    RemoveApp {
        service: String,
        source: RunnerError,
    },

    /// The app is gone but its descriptor is still published
    #[error("Removed app {service} but failed to delete its descriptor {key}: {source}")]
    OrphanedDescriptor {
        service: String,
        key: String,
        source: StoreError,
    },
}

impl CatalogError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CatalogError::RemoveApp {
                source: RunnerError::AppNotFound(_),
                ..
            } => FailureKind::BusinessRule,
            _ => FailureKind::Internal,
        }
    }
}

pub struct ServiceCatalog {
    store: Arc<dyn DescriptorStore>,
    runner: Arc<dyn AppRunner>,
}

impl ServiceCatalog {
    pub fn new(store: Arc<dyn DescriptorStore>, runner: Arc<dyn AppRunner>) -> Self {
        Self { store, runner }
    }

    /// Names of all published services, in store order
    pub async fn list_services(&self) -> Result<Vec<String>, CatalogError> {
        let keys = self.store.list().await.map_err(CatalogError::List)?;
        debug!(keys = keys.len(), "Listed store keys");

        Ok(keys
            .iter()
            .filter_map(|key| service_name_from_key(key))
            .map(str::to_string)
            .collect())
    }

    /// Records a binding marker; neither name is checked
    pub async fn bind_service(&self, app_name: &str, service_name: &str) -> Result<String, CatalogError> {
        let key = binding_key(app_name, service_name);
        self.store
            .upload(&key, Vec::new())
            .await
            .map_err(|source| CatalogError::Bind {
                app: app_name.to_string(),
                service: service_name.to_string(),
                source,
            })?;

        info!(app = %app_name, service = %service_name, key = %key, "Bound app to service");
        Ok(key)
    }

    /// Removes the service's app, then its descriptor
    pub async fn remove_service(&self, service_name: &str) -> Result<(), CatalogError> {
        self.runner
            .remove_app(service_name)
            .await
            .map_err(|source| CatalogError::RemoveApp {
                service: service_name.to_string(),
                source,
            })?;

        let key = descriptor_key(service_name);
        self.store
            .delete(&key)
            .await
            .map_err(|source| CatalogError::OrphanedDescriptor {
                service: service_name.to_string(),
                key: key.clone(),
                source,
            })?;

        info!(service = %service_name, "Removed service");
        Ok(())
    }
}
