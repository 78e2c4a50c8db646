use super::DeriveError;
use crate::runner::MonitorConfig;
use std::time::Duration;

/// Health-check choices made on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSelection {
    pub port: Option<u16>,
    /// `port:/path` target for an HTTP check
    pub url: Option<String>,
    pub disabled: bool,
    pub timeout: Duration,
}

impl Default for MonitorSelection {
    fn default() -> Self {
        Self {
            port: None,
            url: None,
            disabled: false,
            timeout: Duration::from_secs(1),
        }
    }
}

/// Resolves the monitor configuration against the exposed ports
///
/// A monitor URL takes precedence over an explicit port. Without either, the
/// lowest exposed port is monitored.
pub fn resolve_monitor(
    exposed_ports: &[u16],
    selection: &MonitorSelection,
) -> Result<MonitorConfig, DeriveError> {
    if selection.disabled {
        return Ok(MonitorConfig::Disabled);
    }

    if let Some(spec) = &selection.url {
        let (port, path) = parse_monitor_url(spec)?;
        ensure_exposed(port, exposed_ports)?;
        return Ok(MonitorConfig::Monitored {
            port,
            url_path: Some(path),
            timeout: selection.timeout,
        });
    }

    if let Some(port) = selection.port {
        ensure_exposed(port, exposed_ports)?;
        return Ok(MonitorConfig::Monitored {
            port,
            url_path: None,
            timeout: selection.timeout,
        });
    }

    match exposed_ports.iter().min() {
        Some(&port) => Ok(MonitorConfig::Monitored {
            port,
            url_path: None,
            timeout: selection.timeout,
        }),
        None => Ok(MonitorConfig::Disabled),
    }
}

fn parse_monitor_url(spec: &str) -> Result<(u16, String), DeriveError> {
    let invalid = || DeriveError::InvalidMonitorUrl(spec.to_string());

    let (port, path) = spec.split_once(':').ok_or_else(invalid)?;
    let port = port.parse::<u16>().map_err(|_| invalid())?;
    if !path.starts_with('/') {
        return Err(invalid());
    }

    Ok((port, path.to_string()))
}

fn ensure_exposed(port: u16, exposed_ports: &[u16]) -> Result<(), DeriveError> {
    if exposed_ports.contains(&port) {
        Ok(())
    } else {
        Err(DeriveError::MonitorPortNotExposed {
            port,
            exposed: exposed_ports.to_vec(),
        })
    }
}
