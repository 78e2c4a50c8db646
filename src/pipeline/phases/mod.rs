// Configuration derivation phases
//
// Each phase reconciles one part of the app configuration from explicit
// request values, fetched image metadata and defaults. Phases are pure: they
// report where a value came from and leave user notices to the orchestrator.

use thiserror::Error;

#[path = "01_ports.rs"]
pub mod ports;
#[path = "02_monitor.rs"]
pub mod monitor;
#[path = "03_launch.rs"]
pub mod launch;
#[path = "04_routes.rs"]
pub mod routes;
#[path = "05_environment.rs"]
pub mod environment;

/// Port used when neither the request nor the image names one
pub const DEFAULT_PORT: u16 = 8080;

/// Working directory used when neither the request nor the image names one
pub const DEFAULT_WORKING_DIR: &str = "/";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeriveError {
    #[error("Invalid port specified. Ports must be a comma-delimited list of integers between 0-65535 (got '{0}')")]
    InvalidPort(String),

    #[error("Invalid monitor URL '{0}'. Expected format is port:/path/to/endpoint")]
    InvalidMonitorUrl(String),

    #[error("Must have an exposed port that matches the monitored port ({port} is not among {exposed:?})")]
    MonitorPortNotExposed { port: u16, exposed: Vec<u16> },

    #[error("Unable to determine start command from image metadata")]
    MissingStartCommand,

    #[error("Malformed route '{0}'. Expected format is port:hostname[,port:hostname]")]
    InvalidRoute(String),

    #[error("Invalid environment variable '{0}'. Expected KEY=VALUE or KEY")]
    InvalidEnvironment(String),

    #[error("{0}")]
    InvalidArgument(String),
}

/// Where a derived value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Explicit,
    Image,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: Source) -> Self {
        Self { value, source }
    }
}
