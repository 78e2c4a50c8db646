use super::phases::DeriveError;
use super::state::{FailureKind, ProvisioningState};
use crate::image::ImageError;
use crate::runner::RunnerError;
use crate::services::RegistryError;
use crate::store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Underlying cause of a failed provisioning run
#[derive(Debug, Error)]
pub enum ProvisioningFailure {
    #[error(transparent)]
    Derive(#[from] DeriveError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("Service '{0}' already exists")]
    AlreadyExists(String),

    #[error("Timed out waiting for the service to start ({running}/{desired} instances running after {}s)", timeout.as_secs())]
    TimedOut {
        timeout: Duration,
        desired: u32,
        running: usize,
    },

    #[error("No running instance of '{0}' reported an address and port")]
    RuntimeInfoUnavailable(String),

    #[error("Failed to serialize service descriptor: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A provisioning run that ended in `Failed(kind)`
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct ProvisioningError {
    /// Last state reached before the failure
    pub state: ProvisioningState,
    pub kind: FailureKind,
    #[source]
    pub cause: ProvisioningFailure,
}

impl ProvisioningError {
    pub fn new(state: ProvisioningState, kind: FailureKind, cause: impl Into<ProvisioningFailure>) -> Self {
        Self {
            state,
            kind,
            cause: cause.into(),
        }
    }

    pub fn help_message(&self) -> String {
        match self.kind {
            FailureKind::InvalidSyntax => format!(
                "Error: {}\n\n\
                Help: Check the command line. Ports are a comma-separated list such as 80,443,\n\
                routes use port:hostname[,port:hostname] and monitor URLs use port:/path.",
                self.cause
            ),
            FailureKind::BusinessRule => format!(
                "Error: {}\n\n\
                Help: The request is well-formed but cannot be carried out. Check that\n\
                the monitored port is exposed and that the service name is not in use.",
                self.cause
            ),
            FailureKind::BadImage => format!(
                "Error: {}\n\n\
                Help: The image metadata could not be used. Check the image name and tag,\n\
                or pass a start command after '--'.",
                self.cause
            ),
            FailureKind::CreationFailed => format!(
                "Error creating app: {}\n\n\
                Help: The app runner rejected the request. Check SVCPROV_RECEPTOR_URL and\n\
                the app runner's logs.",
                self.cause
            ),
            FailureKind::TimedOut => format!(
                "Error: {}\n\n\
                The service is still downloading or starting in the background.\n\
                It will not be registered until a descriptor is published.",
                self.cause
            ),
            FailureKind::Internal => format!(
                "Error: {}\n\n\
                Help: An unexpected error occurred after the request was accepted.\n\
                Run with --verbose for details.",
                self.cause
            ),
        }
    }
}
