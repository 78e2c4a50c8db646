use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Health-check configuration used to decide instance readiness
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorConfig {
    Disabled,
    Monitored {
        port: u16,
        /// HTTP path to probe; a plain TCP check when `None`
        url_path: Option<String>,
        timeout: Duration,
    },
}

impl MonitorConfig {
    pub fn port(&self) -> Option<u16> {
        match self {
            MonitorConfig::Disabled => None,
            MonitorConfig::Monitored { port, .. } => Some(*port),
        }
    }
}

/// A `port:hostname` pair from the `--routes` flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOverride {
    pub port: u16,
    pub hostname_prefix: String,
}

/// Fully qualified hostname routed to a container port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub hostname: String,
    pub port: u16,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "http://{}", self.hostname)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// Relative CPU weight, 1-100
    pub cpu_weight: u32,
    pub memory_mb: u64,
    /// 0 means unlimited
    pub disk_mb: u64,
}

/// Download run inside the container before the start command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAction {
    pub from: String,
    pub to: String,
    pub user: String,
}

/// Fully reconciled configuration handed to the app runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveAppConfig {
    pub name: String,
    pub rootfs: String,
    /// Unique and ascending
    pub exposed_ports: Vec<u16>,
    pub working_dir: String,
    pub start_command: String,
    pub args: Vec<String>,
    pub environment: BTreeMap<String, String>,
    pub monitor: MonitorConfig,
    pub routes: Vec<Route>,
    pub privileged: bool,
    pub limits: ResourceLimits,
    pub instances: u32,
    pub bootstrap: BootstrapAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Unclaimed,
    Claimed,
    Running,
    Crashed,
    Unknown,
}

impl InstanceState {
    pub fn from_api(state: &str) -> Self {
        match state.to_ascii_uppercase().as_str() {
            "UNCLAIMED" => InstanceState::Unclaimed,
            "CLAIMED" => InstanceState::Claimed,
            "RUNNING" => InstanceState::Running,
            "CRASHED" => InstanceState::Crashed,
            _ => InstanceState::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub container_port: u16,
    pub host_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceInfo {
    pub index: u32,
    pub state: InstanceState,
    /// Host address the instance's ports are mapped on
    pub address: String,
    pub ports: Vec<PortMapping>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppStatus {
    pub name: String,
    pub desired_instances: u32,
    pub instances: Vec<InstanceInfo>,
}

impl AppStatus {
    pub fn running_instances(&self) -> usize {
        self.instances
            .iter()
            .filter(|i| i.state == InstanceState::Running)
            .count()
    }

    /// Running instance with the lowest index
    pub fn first_running(&self) -> Option<&InstanceInfo> {
        self.instances
            .iter()
            .filter(|i| i.state == InstanceState::Running)
            .min_by_key(|i| i.index)
    }
}
