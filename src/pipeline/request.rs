//! Service creation request

use super::phases::monitor::MonitorSelection;
use super::phases::DeriveError;
use crate::services::ServiceCredentials;
use std::time::Duration;

pub const DEFAULT_CPU_WEIGHT: u32 = 100;
pub const DEFAULT_MEMORY_MB: u64 = 128;
pub const DEFAULT_DISK_MB: u64 = 0;
pub const DEFAULT_INSTANCES: u32 = 1;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Everything needed to provision one backing service
///
/// Optional fields left unset are derived from the image metadata or
/// defaults during provisioning.
#[derive(Debug, Clone)]
pub struct ServiceCreationRequest {
    pub service_name: String,
    pub image: String,
    pub credentials: ServiceCredentials,
    /// Registry key; resolved from the image or name when unset
    pub service_type: Option<String>,
    pub start_command: Option<Vec<String>>,
    pub working_dir: Option<String>,
    pub privileged: bool,
    /// `KEY=VALUE` or bare `KEY` entries
    pub env: Vec<String>,
    pub cpu_weight: u32,
    pub memory_mb: u64,
    pub disk_mb: u64,
    /// Comma-separated port list
    pub ports: Option<String>,
    pub monitor: MonitorSelection,
    /// `port:hostname[,port:hostname]`
    pub routes: Option<String>,
    pub no_routes: bool,
    pub instances: u32,
    pub timeout: Duration,
}

impl ServiceCreationRequest {
    pub fn new(
        service_name: impl Into<String>,
        image: impl Into<String>,
        credentials: ServiceCredentials,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            image: image.into(),
            credentials,
            service_type: None,
            start_command: None,
            working_dir: None,
            privileged: false,
            env: Vec::new(),
            cpu_weight: DEFAULT_CPU_WEIGHT,
            memory_mb: DEFAULT_MEMORY_MB,
            disk_mb: DEFAULT_DISK_MB,
            ports: None,
            monitor: MonitorSelection::default(),
            routes: None,
            no_routes: false,
            instances: DEFAULT_INSTANCES,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    pub fn with_start_command(mut self, argv: Vec<String>) -> Self {
        self.start_command = Some(argv);
        self
    }

    pub fn with_working_dir(mut self, working_dir: impl Into<String>) -> Self {
        self.working_dir = Some(working_dir.into());
        self
    }

    pub fn with_privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    pub fn with_env(mut self, entry: impl Into<String>) -> Self {
        self.env.push(entry.into());
        self
    }

    pub fn with_cpu_weight(mut self, cpu_weight: u32) -> Self {
        self.cpu_weight = cpu_weight;
        self
    }

    pub fn with_memory_mb(mut self, memory_mb: u64) -> Self {
        self.memory_mb = memory_mb;
        self
    }

    pub fn with_disk_mb(mut self, disk_mb: u64) -> Self {
        self.disk_mb = disk_mb;
        self
    }

    pub fn with_ports(mut self, ports: impl Into<String>) -> Self {
        self.ports = Some(ports.into());
        self
    }

    pub fn with_monitor(mut self, monitor: MonitorSelection) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn with_routes(mut self, routes: impl Into<String>) -> Self {
        self.routes = Some(routes.into());
        self
    }

    pub fn with_no_routes(mut self, no_routes: bool) -> Self {
        self.no_routes = no_routes;
        self
    }

    pub fn with_instances(mut self, instances: u32) -> Self {
        self.instances = instances;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Checks argument ranges that need no external lookup
    pub fn validate(&self) -> Result<(), DeriveError> {
        if self.service_name.trim().is_empty() {
            return Err(DeriveError::InvalidArgument(
                "Service name must not be empty".to_string(),
            ));
        }
        if self.service_name.contains('/') {
            return Err(DeriveError::InvalidArgument(format!(
                "Service name '{}' must not contain '/'",
                self.service_name
            )));
        }
        if self.image.trim().is_empty() {
            return Err(DeriveError::InvalidArgument(
                "Image must not be empty".to_string(),
            ));
        }
        if !(1..=100).contains(&self.cpu_weight) {
            return Err(DeriveError::InvalidArgument(format!(
                "Invalid CPU weight {}. Must be between 1 and 100",
                self.cpu_weight
            )));
        }
        if self.instances < 1 {
            return Err(DeriveError::InvalidArgument(
                "Number of instances must be greater than 0".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(DeriveError::InvalidArgument(
                "Timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
