use crate::runner::BootstrapAction;
use std::time::Duration;

pub const DEFAULT_SYSTEM_DOMAIN: &str = "192.168.11.11.xip.io";
pub const DEFAULT_HEALTHCHECK_URL: &str =
    "http://file-server.service.dc1.consul:8080/v1/static/healthcheck.tgz";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Delay between readiness polls
    pub poll_interval: Duration,
    /// Suffix appended to every route hostname
    pub system_domain: String,
    pub bootstrap: BootstrapAction,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            system_domain: DEFAULT_SYSTEM_DOMAIN.to_string(),
            bootstrap: BootstrapAction {
                from: DEFAULT_HEALTHCHECK_URL.to_string(),
                to: "/tmp".to_string(),
                user: "vcap".to_string(),
            },
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_system_domain(mut self, system_domain: impl Into<String>) -> Self {
        self.system_domain = system_domain.into();
        self
    }

    pub fn with_healthcheck_url(mut self, url: impl Into<String>) -> Self {
        self.bootstrap.from = url.into();
        self
    }
}
