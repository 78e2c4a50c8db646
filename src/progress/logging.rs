//! Logging-based progress handler

use super::{ProgressEvent, ProgressHandler};
use tracing::{debug, info, warn};

/// Handler that logs progress events using tracing
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingHandler;

impl ProgressHandler for LoggingHandler {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Started {
                service_name,
                image,
            } => {
                info!(service = %service_name, image = %image, "Starting provisioning");
            }
            ProgressEvent::StateEntered { state } => {
                debug!(state = %state, "Entered state");
            }
            ProgressEvent::Notice { message } => {
                info!("{}", message);
            }
            ProgressEvent::WaitingForInstances { running, desired } => {
                debug!(running, desired, "Waiting for instances");
            }
            ProgressEvent::Completed {
                service_name,
                total_time,
            } => {
                info!(
                    service = %service_name,
                    total_time_ms = total_time.as_millis(),
                    "Provisioning complete"
                );
            }
            ProgressEvent::Failed { state, error } => {
                warn!(state = %state, error = %error, "Provisioning failed");
            }
        }
    }
}
