//! Receptor REST API client
//!
//! Apps are desired long-running processes (LRPs) keyed by their process
//! guid, which is the app name. Instance state comes from the actual LRPs.

use super::{
    AppRunner, AppStatus, EffectiveAppConfig, InstanceInfo, InstanceState, MonitorConfig,
    PortMapping, RunnerError,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

const LRP_DOMAIN: &str = "lattice";
const ROUTER_KEY: &str = "cf-router";
const HEALTHCHECK_PATH: &str = "/tmp/healthcheck";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize)]
struct EnvironmentVariable {
    name: String,
    value: String,
}

#[derive(Debug, Serialize)]
struct DownloadAction {
    from: String,
    to: String,
    user: String,
}

#[derive(Debug, Serialize)]
struct RunAction {
    path: String,
    args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dir: Option<String>,
    user: String,
    log_source: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum Action {
    Download(DownloadAction),
    Run(RunAction),
}

#[derive(Debug, Serialize)]
struct CfRoute {
    hostnames: Vec<String>,
    port: u16,
}

#[derive(Debug, Serialize)]
struct DesiredLrpCreateRequest {
    process_guid: String,
    domain: String,
    rootfs: String,
    instances: u32,
    env: Vec<EnvironmentVariable>,
    cpu_weight: u32,
    memory_mb: u64,
    disk_mb: u64,
    privileged: bool,
    ports: Vec<u16>,
    routes: BTreeMap<String, Vec<CfRoute>>,
    log_guid: String,
    log_source: String,
    metrics_guid: String,
    setup: Action,
    action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    monitor: Option<Action>,
}

#[derive(Debug, Deserialize)]
struct DesiredLrpResponse {
    instances: u32,
}

#[derive(Debug, Deserialize)]
struct ActualLrpResponse {
    index: u32,
    state: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    ports: Vec<ActualPortMapping>,
}

#[derive(Debug, Deserialize)]
struct ActualPortMapping {
    container_port: u16,
    host_port: u16,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    message: String,
}

pub struct ReceptorClient {
    endpoint: String,
    credentials: Option<(String, String)>,
    http_client: Client,
}

impl ReceptorClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            credentials: None,
            http_client,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some((user, pass)) => request.basic_auth(user, Some(pass)),
            None => request,
        }
    }

    async fn api_error(response: Response) -> RunnerError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(err) if !err.message.is_empty() => format!("{}: {}", err.name, err.message),
            _ => body,
        };
        RunnerError::Api { status, message }
    }
}

#[async_trait]
impl AppRunner for ReceptorClient {
    async fn create_app(&self, config: &EffectiveAppConfig) -> Result<(), RunnerError> {
        let request = desired_lrp_request(config);
        debug!(app = %config.name, instances = config.instances, "Desiring LRP");

        let response = self
            .authorize(self.http_client.post(format!("{}/v1/desired_lrps", self.endpoint)))
            .json(&request)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT => Err(RunnerError::AppExists(config.name.clone())),
            _ => Err(Self::api_error(response).await),
        }
    }

    async fn app_status(&self, name: &str) -> Result<AppStatus, RunnerError> {
        let desired = self
            .authorize(
                self.http_client
                    .get(format!("{}/v1/desired_lrps/{}", self.endpoint, name)),
            )
            .send()
            .await?;

        let desired: DesiredLrpResponse = match desired.status() {
            status if status.is_success() => desired.json().await?,
            StatusCode::NOT_FOUND => return Err(RunnerError::AppNotFound(name.to_string())),
            _ => return Err(Self::api_error(desired).await),
        };

        let actual = self
            .authorize(
                self.http_client
                    .get(format!("{}/v1/actual_lrps/{}", self.endpoint, name)),
            )
            .send()
            .await?;
        if !actual.status().is_success() {
            return Err(Self::api_error(actual).await);
        }
        let actual: Vec<ActualLrpResponse> = actual
            .json()
            .await
            .map_err(|e| RunnerError::InvalidResponse(e.to_string()))?;

        Ok(app_status_from_responses(name, desired, actual))
    }

    async fn remove_app(&self, name: &str) -> Result<(), RunnerError> {
        let response = self
            .authorize(
                self.http_client
                    .delete(format!("{}/v1/desired_lrps/{}", self.endpoint, name)),
            )
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND => Err(RunnerError::AppNotFound(name.to_string())),
            _ => Err(Self::api_error(response).await),
        }
    }
}

fn desired_lrp_request(config: &EffectiveAppConfig) -> DesiredLrpCreateRequest {
    let user = if config.privileged { "root" } else { "vcap" };

    let mut routes_by_port: BTreeMap<u16, Vec<String>> = BTreeMap::new();
    for route in &config.routes {
        routes_by_port
            .entry(route.port)
            .or_default()
            .push(route.hostname.clone());
    }
    let cf_routes = routes_by_port
        .into_iter()
        .map(|(port, hostnames)| CfRoute { hostnames, port })
        .collect();

    let monitor = match &config.monitor {
        MonitorConfig::Disabled => None,
        MonitorConfig::Monitored {
            port,
            url_path,
            timeout,
        } => {
            let mut args = vec!["-port".to_string(), port.to_string()];
            if let Some(path) = url_path {
                args.push("-uri".to_string());
                args.push(path.clone());
            }
            args.push("-timeout".to_string());
            args.push(format!("{}ms", timeout.as_millis()));
            Some(Action::Run(RunAction {
                path: HEALTHCHECK_PATH.to_string(),
                args,
                dir: None,
                user: "vcap".to_string(),
                log_source: "HEALTH".to_string(),
            }))
        }
    };

    DesiredLrpCreateRequest {
        process_guid: config.name.clone(),
        domain: LRP_DOMAIN.to_string(),
        rootfs: config.rootfs.clone(),
        instances: config.instances,
        env: config
            .environment
            .iter()
            .map(|(name, value)| EnvironmentVariable {
                name: name.clone(),
                value: value.clone(),
            })
            .collect(),
        cpu_weight: config.limits.cpu_weight,
        memory_mb: config.limits.memory_mb,
        disk_mb: config.limits.disk_mb,
        privileged: config.privileged,
        ports: config.exposed_ports.clone(),
        routes: BTreeMap::from([(ROUTER_KEY.to_string(), cf_routes)]),
        log_guid: config.name.clone(),
        log_source: "APP".to_string(),
        metrics_guid: config.name.clone(),
        setup: Action::Download(DownloadAction {
            from: config.bootstrap.from.clone(),
            to: config.bootstrap.to.clone(),
            user: config.bootstrap.user.clone(),
        }),
        action: Action::Run(RunAction {
            path: config.start_command.clone(),
            args: config.args.clone(),
            dir: Some(config.working_dir.clone()),
            user: user.to_string(),
            log_source: "APP".to_string(),
        }),
        monitor,
    }
}

fn app_status_from_responses(
    name: &str,
    desired: DesiredLrpResponse,
    actual: Vec<ActualLrpResponse>,
) -> AppStatus {
    let mut instances: Vec<InstanceInfo> = actual
        .into_iter()
        .map(|lrp| InstanceInfo {
            index: lrp.index,
            state: InstanceState::from_api(&lrp.state),
            address: lrp.address,
            ports: lrp
                .ports
                .into_iter()
                .map(|p| PortMapping {
                    container_port: p.container_port,
                    host_port: p.host_port,
                })
                .collect(),
        })
        .collect();
    instances.sort_by_key(|i| i.index);

    AppStatus {
        name: name.to_string(),
        desired_instances: desired.instances,
        instances,
    }
}
