use super::context::ProvisioningContext;
use super::error::{ProvisioningError, ProvisioningFailure};
use super::phases::environment::build_environment;
use super::phases::launch::{resolve_start_command, resolve_working_dir};
use super::phases::monitor::resolve_monitor;
use super::phases::ports::resolve_exposed_ports;
use super::phases::routes::{parse_route_overrides, resolve_routes};
use super::phases::{DeriveError, Source};
use super::readiness::wait_for_ready;
use super::request::ServiceCreationRequest;
use super::state::{FailureKind, ProvisioningState, StateTracker};
use crate::image::ImageReference;
use crate::progress::{ProgressEvent, ProgressHandler};
use crate::runner::{EffectiveAppConfig, MonitorConfig, ResourceLimits, Route};
use crate::services::descriptor::{descriptor_key, service_name_from_key};
use crate::services::ServiceDescriptor;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of a successful provisioning run
#[derive(Debug, Clone)]
pub struct ProvisioningOutcome {
    pub service_name: String,
    pub service_type: String,
    pub descriptor_key: String,
    pub descriptor: ServiceDescriptor,
    pub app_config: EffectiveAppConfig,
    pub routes: Vec<Route>,
    /// Every state passed through, `Start` to `Done`
    pub states: Vec<ProvisioningState>,
}

/// Drives a creation request through the provisioning states
///
/// External calls are made strictly in sequence. A failure at any step ends
/// the run in `Failed(kind)`; nothing created earlier is rolled back.
pub struct ProvisioningOrchestrator {
    context: ProvisioningContext,
    progress_handler: Option<Arc<dyn ProgressHandler>>,
}

/// Per-run bookkeeping: state history plus progress reporting
struct Run<'a> {
    tracker: StateTracker,
    handler: Option<&'a dyn ProgressHandler>,
}

impl<'a> Run<'a> {
    fn emit(&self, event: ProgressEvent) {
        if let Some(handler) = self.handler {
            handler.on_progress(&event);
        }
    }

    fn notice(&self, message: impl Into<String>) {
        self.emit(ProgressEvent::Notice {
            message: message.into(),
        });
    }

    fn advance(&mut self) {
        let state = self.tracker.advance();
        info!(state = %state, "Provisioning state");
        self.emit(ProgressEvent::StateEntered { state });
    }

    fn fail(&mut self, kind: FailureKind, cause: impl Into<ProvisioningFailure>) -> ProvisioningError {
        let reached = self.tracker.current();
        let failed = self.tracker.fail(kind);
        let error = ProvisioningError::new(reached, kind, cause);
        warn!(state = %reached, kind = %kind, error = %error, "Provisioning failed");
        self.emit(ProgressEvent::Failed {
            state: failed,
            error: error.to_string(),
        });
        error
    }
}

impl ProvisioningOrchestrator {
    pub fn new(context: ProvisioningContext, progress_handler: Option<Arc<dyn ProgressHandler>>) -> Self {
        Self {
            context,
            progress_handler,
        }
    }

    pub fn context(&self) -> &ProvisioningContext {
        &self.context
    }

    pub async fn execute(
        &self,
        request: ServiceCreationRequest,
    ) -> Result<ProvisioningOutcome, ProvisioningError> {
        let start = Instant::now();
        let mut run = Run {
            tracker: StateTracker::new(),
            handler: self.progress_handler.as_deref(),
        };

        info!(
            service = %request.service_name,
            image = %request.image,
            "Starting service provisioning"
        );
        run.emit(ProgressEvent::Started {
            service_name: request.service_name.clone(),
            image: request.image.clone(),
        });
        run.emit(ProgressEvent::StateEntered {
            state: ProvisioningState::Start,
        });

        // Start: everything that can fail without touching the platform
        if let Err(e) = request.validate() {
            return Err(run.fail(FailureKind::InvalidSyntax, e));
        }
        let reference = match ImageReference::parse(&request.image) {
            Ok(reference) => reference,
            Err(e) => return Err(run.fail(FailureKind::BusinessRule, e)),
        };
        let service_type = self.resolve_service_type(&request, &reference);
        let service_vars = match self
            .context
            .registry
            .environment(&service_type, &request.credentials)
        {
            Ok(vars) => vars,
            Err(e) => return Err(run.fail(FailureKind::Internal, e)),
        };
        debug!(service_type = %service_type, rootfs = %reference.rootfs(), "Resolved service type");

        match self.service_exists(&request.service_name).await {
            Ok(false) => {}
            Ok(true) => {
                return Err(run.fail(
                    FailureKind::BusinessRule,
                    ProvisioningFailure::AlreadyExists(request.service_name.clone()),
                ))
            }
            Err(e) => return Err(run.fail(FailureKind::Internal, e)),
        }

        let metadata = match self.context.image_fetcher.fetch_metadata(&request.image).await {
            Ok(metadata) => metadata,
            Err(e) => return Err(run.fail(FailureKind::BadImage, e)),
        };
        run.advance();

        let ports = match resolve_exposed_ports(request.ports.as_deref(), &metadata) {
            Ok(ports) => ports,
            Err(e) => return Err(run.fail(FailureKind::InvalidSyntax, e)),
        };
        match ports.source {
            Source::Image => run.notice(format!(
                "No port specified, using exposed ports from the image metadata.\n\tExposed Ports: {}",
                join_ports(&ports.value)
            )),
            Source::Default => run.notice(
                "No port specified, image metadata did not contain exposed ports. Defaulting to 8080.",
            ),
            Source::Explicit => {}
        }

        let monitor = match resolve_monitor(&ports.value, &request.monitor) {
            Ok(monitor) => monitor,
            Err(e @ DeriveError::MonitorPortNotExposed { .. }) => {
                return Err(run.fail(FailureKind::BusinessRule, e))
            }
            Err(e) => return Err(run.fail(FailureKind::InvalidSyntax, e)),
        };

        let working_dir = resolve_working_dir(request.working_dir.as_deref(), &metadata);
        if working_dir.source != Source::Explicit {
            run.notice(format!(
                "No working directory specified, using working directory from the image metadata...\nWorking directory is:\n{}",
                working_dir.value
            ));
        }

        match &monitor {
            MonitorConfig::Monitored { port, .. } => {
                run.notice(format!("Monitoring the app on port {}...", port))
            }
            MonitorConfig::Disabled => run.notice("No ports will be monitored."),
        }

        let start_command = match resolve_start_command(request.start_command.as_deref(), &metadata) {
            Ok(command) => command,
            Err(e) => return Err(run.fail(FailureKind::BadImage, e)),
        };
        if start_command.source == Source::Image {
            run.notice(format!(
                "No start command specified, using start command from the image metadata...\nStart command is:\n{}",
                start_command.value.display()
            ));
        }
        run.advance();

        let overrides = match request.routes.as_deref().filter(|r| !r.trim().is_empty()) {
            Some(spec) => match parse_route_overrides(spec) {
                Ok(overrides) => overrides,
                Err(e) => return Err(run.fail(FailureKind::InvalidSyntax, e)),
            },
            None => Vec::new(),
        };
        let routes = resolve_routes(
            &request.service_name,
            &overrides,
            request.no_routes,
            &ports.value,
            &self.context.config.system_domain,
        );

        let environment = match build_environment(
            &request.service_name,
            &request.env,
            |key| std::env::var(key).ok(),
            &service_vars,
        ) {
            Ok(environment) => environment,
            Err(e) => return Err(run.fail(FailureKind::InvalidSyntax, e)),
        };
        run.advance();

        let app_config = EffectiveAppConfig {
            name: request.service_name.clone(),
            rootfs: reference.rootfs(),
            exposed_ports: ports.value,
            working_dir: working_dir.value,
            start_command: start_command.value.command,
            args: start_command.value.args,
            environment,
            monitor,
            routes: routes.clone(),
            privileged: request.privileged,
            limits: ResourceLimits {
                cpu_weight: request.cpu_weight,
                memory_mb: request.memory_mb,
                disk_mb: request.disk_mb,
            },
            instances: request.instances,
            bootstrap: self.context.config.bootstrap.clone(),
        };

        info!(app = %app_config.name, rootfs = %app_config.rootfs, "Creating app");
        if let Err(e) = self.context.runner.create_app(&app_config).await {
            return Err(run.fail(FailureKind::CreationFailed, e));
        }
        run.advance();

        let waited = wait_for_ready(
            self.context.runner.as_ref(),
            &request.service_name,
            request.instances,
            request.timeout,
            self.context.config.poll_interval,
            |status| {
                run.emit(ProgressEvent::WaitingForInstances {
                    running: status.running_instances(),
                    desired: request.instances,
                })
            },
        )
        .await;
        if let Err(timeout) = waited {
            return Err(run.fail(
                FailureKind::TimedOut,
                ProvisioningFailure::TimedOut {
                    timeout: timeout.timeout,
                    desired: timeout.desired,
                    running: timeout.running,
                },
            ));
        }
        run.advance();
        run.notice(format!("Service {} running.", request.service_name));

        let (host, port) = match self.runtime_endpoint(&request.service_name).await {
            Ok(endpoint) => endpoint,
            Err(e) => return Err(run.fail(FailureKind::Internal, e)),
        };
        debug!(host = %host, port, "Resolved runtime endpoint");

        let descriptor = match self.context.registry.render_descriptor(
            &service_type,
            &request.credentials,
            &host,
            port,
        ) {
            Ok(descriptor) => descriptor,
            Err(e) => return Err(run.fail(FailureKind::Internal, e)),
        };
        let json = match descriptor.to_json() {
            Ok(json) => json,
            Err(e) => return Err(run.fail(FailureKind::Internal, e)),
        };
        let key = descriptor_key(&request.service_name);
        if let Err(e) = self.context.store.upload(&key, json.into_bytes()).await {
            return Err(run.fail(FailureKind::Internal, e));
        }
        run.advance();
        run.notice(format!("Service {} registered.", request.service_name));

        run.advance();
        info!(
            service = %request.service_name,
            duration_ms = start.elapsed().as_millis(),
            "Provisioning complete"
        );
        run.emit(ProgressEvent::Completed {
            service_name: request.service_name.clone(),
            total_time: start.elapsed(),
        });

        Ok(ProvisioningOutcome {
            service_name: request.service_name,
            service_type,
            descriptor_key: key,
            descriptor,
            app_config,
            routes,
            states: run.tracker.into_history(),
        })
    }

    /// Explicit type, then the image repository's last path component, then
    /// the service name
    fn resolve_service_type(&self, request: &ServiceCreationRequest, reference: &ImageReference) -> String {
        if let Some(explicit) = &request.service_type {
            return explicit.clone();
        }
        let basename = reference.basename();
        if self.context.registry.contains(basename) {
            return basename.to_string();
        }
        request.service_name.clone()
    }

    async fn service_exists(&self, service_name: &str) -> Result<bool, crate::store::StoreError> {
        let keys = self.context.store.list().await?;
        Ok(keys
            .iter()
            .filter_map(|key| service_name_from_key(key))
            .any(|name| name == service_name))
    }

    /// Address and host port of the first running instance
    async fn runtime_endpoint(&self, app_name: &str) -> Result<(String, u16), ProvisioningFailure> {
        let status = self.context.runner.app_status(app_name).await?;
        status
            .first_running()
            .and_then(|instance| {
                instance
                    .ports
                    .first()
                    .map(|mapping| (instance.address.clone(), mapping.host_port))
            })
            .ok_or_else(|| ProvisioningFailure::RuntimeInfoUnavailable(app_name.to_string()))
    }
}

fn join_ports(ports: &[u16]) -> String {
    ports
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
