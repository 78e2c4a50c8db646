//! Progress handler trait and events

use crate::pipeline::ProvisioningState;
use std::time::Duration;

/// Events emitted while a service is provisioned
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Provisioning started
    Started { service_name: String, image: String },

    /// The workflow reached a new state
    StateEntered { state: ProvisioningState },

    /// Informational message meant for the user
    Notice { message: String },

    /// One readiness poll completed
    WaitingForInstances { running: usize, desired: u32 },

    /// Service running and registered
    Completed {
        service_name: String,
        total_time: Duration,
    },

    /// Provisioning stopped in a failed state
    Failed {
        state: ProvisioningState,
        error: String,
    },
}

/// Trait for handling progress events during provisioning
pub trait ProgressHandler: Send + Sync {
    /// Called when a progress event occurs
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}
