//! Provisioning context for managing dependencies

use std::sync::Arc;

use crate::image::ImageMetadataFetcher;
use crate::runner::AppRunner;
use crate::services::ServiceTypeRegistry;
use crate::store::DescriptorStore;

use super::config::PipelineConfig;

/// Context that owns all long-lived provisioning dependencies
#[derive(Clone)]
pub struct ProvisioningContext {
    pub image_fetcher: Arc<dyn ImageMetadataFetcher>,

    pub runner: Arc<dyn AppRunner>,

    pub store: Arc<dyn DescriptorStore>,

    /// Service types known to this run
    pub registry: Arc<ServiceTypeRegistry>,

    pub config: PipelineConfig,
}

impl ProvisioningContext {
    pub fn new(
        image_fetcher: Arc<dyn ImageMetadataFetcher>,
        runner: Arc<dyn AppRunner>,
        store: Arc<dyn DescriptorStore>,
        registry: Arc<ServiceTypeRegistry>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            image_fetcher,
            runner,
            store,
            registry,
            config,
        }
    }

    /// Create a context with the built-in service types
    pub fn with_default_registry(
        image_fetcher: Arc<dyn ImageMetadataFetcher>,
        runner: Arc<dyn AppRunner>,
        store: Arc<dyn DescriptorStore>,
        config: PipelineConfig,
    ) -> Self {
        Self::new(
            image_fetcher,
            runner,
            store,
            Arc::new(ServiceTypeRegistry::with_defaults()),
            config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ImageError, ImageMetadata};
    use crate::runner::MockAppRunner;
    use crate::store::MockDescriptorStore;
    use async_trait::async_trait;

    struct StaticFetcher;

    #[async_trait]
    impl ImageMetadataFetcher for StaticFetcher {
        async fn fetch_metadata(&self, _image: &str) -> Result<ImageMetadata, ImageError> {
            Ok(ImageMetadata::default())
        }
    }

    #[test]
    fn test_with_default_registry() {
        let context = ProvisioningContext::with_default_registry(
            Arc::new(StaticFetcher),
            Arc::new(MockAppRunner::new()),
            Arc::new(MockDescriptorStore::new()),
            PipelineConfig::default(),
        );

        assert!(context.registry.contains("postgres"));
        assert!(context.registry.contains("mysql"));
        assert_eq!(context.config.system_domain, "192.168.11.11.xip.io");
    }
}
