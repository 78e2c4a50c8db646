pub mod config;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod phases;
pub mod readiness;
pub mod request;
pub mod state;

pub use config::PipelineConfig;
pub use context::ProvisioningContext;
pub use error::{ProvisioningError, ProvisioningFailure};
pub use orchestrator::{ProvisioningOrchestrator, ProvisioningOutcome};
pub use phases::monitor::MonitorSelection;
pub use phases::DeriveError;
pub use readiness::{wait_for_ready, ReadinessTimeout};
pub use request::ServiceCreationRequest;
pub use state::{FailureKind, ProvisioningState, StateTracker};
