//! Command handlers
//!
//! Each handler wires concrete clients from [`ProvisionerConfig`], runs one
//! operation and returns the process exit status.

use super::commands::{BindServiceArgs, CreateServiceArgs, ListServicesArgs, RemoveServiceArgs};
use super::exit_codes;
use super::output::{OutputFormat, OutputFormatter};
use crate::catalog::{CatalogError, ServiceCatalog};
use crate::config::ProvisionerConfig;
use crate::pipeline::{
    FailureKind, MonitorSelection, ProvisioningContext, ProvisioningError, ProvisioningOrchestrator,
    ServiceCreationRequest,
};
use crate::progress::{ConsoleHandler, ProgressHandler};
use crate::services::ServiceCredentials;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, error, warn};

fn load_config() -> Result<ProvisionerConfig> {
    let config = ProvisionerConfig::default();
    config
        .validate()
        .context("Invalid svcprov configuration")?;
    debug!("{}", config);
    Ok(config)
}

fn catalog_from_env() -> Result<ServiceCatalog> {
    let config = load_config()?;
    Ok(ServiceCatalog::new(config.create_store(), config.create_runner()))
}

fn report_catalog_error(err: &CatalogError) -> i32 {
    let kind = err.kind();
    if kind == FailureKind::Internal {
        error!(error = %err, "Unexpected failure");
    } else {
        warn!(error = %err, "Command failed");
    }
    eprintln!("Error: {}", err);
    exit_codes::for_kind(kind)
}

pub async fn handle_list_services(args: &ListServicesArgs) -> i32 {
    let catalog = match catalog_from_env() {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return exit_codes::INTERNAL_ERROR;
        }
    };

    let services = match catalog.list_services().await {
        Ok(services) => services,
        Err(e) => return report_catalog_error(&e),
    };

    let formatter = OutputFormatter::new(OutputFormat::from(args.format));
    match formatter.format_services(&services) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{}", output);
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_codes::INTERNAL_ERROR
        }
    }
}

pub async fn handle_bind_service(args: &BindServiceArgs, quiet: bool) -> i32 {
    let catalog = match catalog_from_env() {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return exit_codes::INTERNAL_ERROR;
        }
    };

    match catalog.bind_service(&args.app_name, &args.service_name).await {
        Ok(_) => {
            if !quiet {
                println!("Bound {} to service {}.", args.app_name, args.service_name);
            }
            exit_codes::SUCCESS
        }
        Err(e) => report_catalog_error(&e),
    }
}

pub async fn handle_remove_service(args: &RemoveServiceArgs, quiet: bool) -> i32 {
    let catalog = match catalog_from_env() {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return exit_codes::INTERNAL_ERROR;
        }
    };

    if !quiet {
        println!("Removing {}...", args.service_name);
    }
    match catalog.remove_service(&args.service_name).await {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => report_catalog_error(&e),
    }
}

/// Maps parsed flags onto a creation request
pub fn request_from_args(args: &CreateServiceArgs) -> ServiceCreationRequest {
    let mut request = ServiceCreationRequest::new(
        args.service_name.clone(),
        args.image.clone(),
        ServiceCredentials::new(args.user.clone(), args.password.clone()),
    )
    .with_privileged(args.run_as_root)
    .with_cpu_weight(args.cpu_weight)
    .with_memory_mb(args.memory_mb)
    .with_disk_mb(args.disk_mb)
    .with_instances(args.instances)
    .with_timeout(args.timeout)
    .with_no_routes(args.no_routes)
    .with_monitor(MonitorSelection {
        port: args.monitor_port,
        url: args.monitor_url.clone(),
        disabled: args.no_monitor,
        timeout: args.monitor_timeout,
    });

    if let Some(service_type) = &args.service_type {
        request = request.with_service_type(service_type.clone());
    }
    if !args.start_command.is_empty() {
        request = request.with_start_command(args.start_command.clone());
    }
    if let Some(dir) = &args.working_dir {
        request = request.with_working_dir(dir.clone());
    }
    if let Some(ports) = &args.ports {
        request = request.with_ports(ports.clone());
    }
    if let Some(routes) = &args.routes {
        request = request.with_routes(routes.clone());
    }
    for entry in &args.env {
        request = request.with_env(entry.clone());
    }

    request
}

fn report_provisioning_error(err: &ProvisioningError) -> i32 {
    match err.kind {
        FailureKind::Internal => {
            error!(state = %err.state, error = %err, "Unexpected provisioning failure")
        }
        kind => warn!(state = %err.state, kind = %kind, error = %err, "Provisioning failed"),
    }
    eprintln!("{}", err.help_message());
    exit_codes::for_kind(err.kind)
}

pub async fn handle_create_service(args: &CreateServiceArgs, quiet: bool) -> i32 {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return exit_codes::INTERNAL_ERROR;
        }
    };

    let context = ProvisioningContext::with_default_registry(
        config.create_image_fetcher(),
        config.create_runner(),
        config.create_store(),
        config.pipeline_config(),
    );
    let handler: Option<Arc<dyn ProgressHandler>> = if quiet {
        None
    } else {
        Some(Arc::new(ConsoleHandler::new()))
    };
    let orchestrator = ProvisioningOrchestrator::new(context, handler);

    match orchestrator.execute(request_from_args(args)).await {
        Ok(outcome) => {
            if !quiet {
                match OutputFormatter::new(OutputFormat::Human).format_outcome(&outcome) {
                    Ok(summary) => println!("{}", summary),
                    Err(e) => warn!(error = %e, "Failed to format service summary"),
                }
            }
            exit_codes::SUCCESS
        }
        Err(e) => report_provisioning_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{CliArgs, Commands};
    use clap::Parser;
    use std::time::Duration;

    fn create_args(argv: &[&str]) -> CreateServiceArgs {
        match CliArgs::parse_from(argv).command {
            Commands::CreateService(args) => args,
            other => panic!("Expected CreateService command, got {:?}", other),
        }
    }

    #[test]
    fn test_request_from_args() {
        let args = create_args(&[
            "svcprov", "cs", "db", "postgres", "alice", "s3cr3t", "--ports", "5432", "-U",
            "5432:/ready", "--monitor-timeout", "500ms", "-e", "A=1", "--", "postgres", "-N", "50",
        ]);
        let request = request_from_args(&args);

        assert_eq!(request.service_name, "db");
        assert_eq!(request.credentials, ServiceCredentials::new("alice", "s3cr3t"));
        assert_eq!(request.ports.as_deref(), Some("5432"));
        assert_eq!(request.monitor.url.as_deref(), Some("5432:/ready"));
        assert_eq!(request.monitor.timeout, Duration::from_millis(500));
        assert_eq!(request.env, vec!["A=1"]);
        assert_eq!(
            request.start_command,
            Some(vec!["postgres".to_string(), "-N".to_string(), "50".to_string()])
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_without_start_command() {
        let args = create_args(&["svcprov", "cs", "db", "postgres", "alice", "s3cr3t", "--no-routes"]);
        let request = request_from_args(&args);

        assert!(request.start_command.is_none());
        assert!(request.no_routes);
        assert!(request.routes.is_none());
    }
}
