//! Application runner: creates, inspects and removes long-running apps on
//! the orchestration platform

pub mod params;
pub mod receptor;

pub use params::{
    AppStatus, BootstrapAction, EffectiveAppConfig, InstanceInfo, InstanceState, MonitorConfig,
    PortMapping, ResourceLimits, Route, RouteOverride,
};
pub use receptor::ReceptorClient;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("App runner request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("App runner returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("App '{0}' already exists")]
    AppExists(String),

    #[error("'{0}' is not a started app")]
    AppNotFound(String),

    #[error("Invalid app runner response: {0}")]
    InvalidResponse(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AppRunner: Send + Sync {
    async fn create_app(&self, config: &EffectiveAppConfig) -> Result<(), RunnerError>;

    async fn app_status(&self, name: &str) -> Result<AppStatus, RunnerError>;

    async fn remove_app(&self, name: &str) -> Result<(), RunnerError>;
}
