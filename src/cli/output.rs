//! Output formatting for multiple formats
//!
//! ```
//! use svcprov::cli::output::{OutputFormat, OutputFormatter};
//!
//! let formatter = OutputFormatter::new(OutputFormat::Json);
//! let output = formatter.format_services(&["db".to_string()]).unwrap();
//! assert!(output.contains("\"db\""));
//! ```

use anyhow::{Context, Result};
use serde::Serialize;

use crate::pipeline::ProvisioningOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON format (machine-readable)
    Json,
    /// YAML format
    Yaml,
    /// Human-readable formatted text
    Human,
}

#[derive(Debug, Serialize)]
struct ServiceList<'a> {
    services: &'a [String],
}

/// Summary of a created service, without credentials
#[derive(Debug, Serialize)]
pub struct ServiceSummary {
    pub service_name: String,
    pub service_type: String,
    pub descriptor_key: String,
    pub routes: Vec<String>,
}

impl From<&ProvisioningOutcome> for ServiceSummary {
    fn from(outcome: &ProvisioningOutcome) -> Self {
        Self {
            service_name: outcome.service_name.clone(),
            service_type: outcome.service_type.clone(),
            descriptor_key: outcome.descriptor_key.clone(),
            routes: outcome.routes.iter().map(|r| r.to_string()).collect(),
        }
    }
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the names returned by `list-services`
    pub fn format_services(&self, services: &[String]) -> Result<String> {
        let list = ServiceList { services };
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&list).context("Failed to serialize services to JSON")
            }
            OutputFormat::Yaml => {
                serde_yaml::to_string(&list).context("Failed to serialize services to YAML")
            }
            OutputFormat::Human => Ok(services.join("\n")),
        }
    }

    pub fn format_outcome(&self, outcome: &ProvisioningOutcome) -> Result<String> {
        let summary = ServiceSummary::from(outcome);
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&summary)
                .context("Failed to serialize service summary to JSON"),
            OutputFormat::Yaml => serde_yaml::to_string(&summary)
                .context("Failed to serialize service summary to YAML"),
            OutputFormat::Human => Ok(self.format_outcome_human(&summary)),
        }
    }

    fn format_outcome_human(&self, summary: &ServiceSummary) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "Service {} ({}) registered at {}\n",
            summary.service_name, summary.service_type, summary.descriptor_key
        ));
        if summary.routes.is_empty() {
            output.push_str("No routes registered.");
        } else {
            output.push_str("App is reachable at:");
            for route in &summary.routes {
                output.push_str(&format!("\n{}", route));
            }
        }
        output
    }
}
