//! svcprov - backing service provisioning for container platforms
//!
//! svcprov launches backing services (PostgreSQL, MySQL, ...) as long-running
//! apps on an orchestration platform, waits until they are healthy and
//! publishes a connection descriptor to a blob store so other apps can find
//! their credentials.
//!
//! # Core Concepts
//!
//! - **Service types**: a [`ServiceTypeRegistry`] maps a type name to the
//!   credential environment its image expects and the descriptor it publishes
//! - **Derivation**: ports, health monitor, working directory and start command
//!   are reconciled from explicit flags, image metadata and defaults
//! - **Provisioning**: the [`ProvisioningOrchestrator`] drives one request
//!   through a fixed sequence of states and reports a typed failure per step
//!
//! # Example Usage
//!
//! ```no_run
//! use svcprov::{ProvisionerConfig, ProvisioningContext, ProvisioningOrchestrator};
//! use svcprov::pipeline::ServiceCreationRequest;
//! use svcprov::services::ServiceCredentials;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProvisionerConfig::default();
//! let context = ProvisioningContext::with_default_registry(
//!     config.create_image_fetcher(),
//!     config.create_runner(),
//!     config.create_store(),
//!     config.pipeline_config(),
//! );
//!
//! let request = ServiceCreationRequest::new("db", "postgres", ServiceCredentials::new("alice", "s3cr3t"));
//! let outcome = ProvisioningOrchestrator::new(context, None).execute(request).await?;
//! println!("Published {}", outcome.descriptor_key);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod image;
pub mod pipeline;
pub mod progress;
pub mod runner;
pub mod services;
pub mod store;
pub mod util;

pub use catalog::{CatalogError, ServiceCatalog};
pub use config::{ConfigError, ProvisionerConfig};
pub use pipeline::{
    FailureKind, ProvisioningContext, ProvisioningError, ProvisioningOrchestrator,
    ProvisioningOutcome, ProvisioningState,
};
pub use services::{ServiceType, ServiceTypeRegistry};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
