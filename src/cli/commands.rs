use clap::{Args, Parser, Subcommand, ValueEnum};
use std::time::Duration;

/// Provisions backing services as apps on the platform and publishes their
/// connection descriptors
#[derive(Parser, Debug)]
#[command(
    name = "svcprov",
    about = "Provision backing services and publish their connection descriptors",
    version,
    author,
    long_about = "svcprov launches backing services such as PostgreSQL or MySQL as apps on \
                  the platform, waits for them to become healthy and publishes a connection \
                  descriptor other apps can discover. Platform endpoints are read from \
                  SVCPROV_* environment variables."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        visible_alias = "lss",
        about = "Lists registered services",
        long_about = "Lists the services that have a published descriptor.\n\n\
                      Examples:\n  \
                      svcprov list-services\n  \
                      svcprov lss --format json"
    )]
    ListServices(ListServicesArgs),

    #[command(
        visible_alias = "bs",
        about = "Binds a future app name to an existing service",
        long_about = "Records that APP_NAME intends to use SERVICE_NAME. Neither name is \
                      checked; the binding is a declaration.\n\n\
                      Examples:\n  \
                      svcprov bind-service web db"
    )]
    BindService(BindServiceArgs),

    #[command(
        visible_alias = "rs",
        about = "Removes a service",
        long_about = "Stops the service's app and deletes its published descriptor.\n\n\
                      Examples:\n  \
                      svcprov remove-service db"
    )]
    RemoveService(RemoveServiceArgs),

    #[command(
        visible_alias = "cs",
        about = "Creates a service",
        long_about = "Launches IMAGE as SERVICE_NAME with the given credentials, waits for it \
                      to become healthy and publishes its connection descriptor. A start \
                      command, if any, must follow '--'.\n\n\
                      Examples:\n  \
                      svcprov create-service db postgres alice s3cr3t\n  \
                      svcprov create-service db myrepo/postgres:9.4 alice s3cr3t --ports 5432\n  \
                      svcprov create-service cache mysql bob pw --service-type mysql -- mysqld --skip-grant-tables"
    )]
    CreateService(CreateServiceArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ListServicesArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Args, Debug, Clone)]
pub struct BindServiceArgs {
    #[arg(value_name = "APP_NAME")]
    pub app_name: String,

    #[arg(value_name = "SERVICE_NAME")]
    pub service_name: String,
}

#[derive(Args, Debug, Clone)]
pub struct RemoveServiceArgs {
    #[arg(value_name = "SERVICE_NAME")]
    pub service_name: String,
}

#[derive(Args, Debug, Clone)]
pub struct CreateServiceArgs {
    #[arg(value_name = "SERVICE_NAME")]
    pub service_name: String,

    #[arg(value_name = "DOCKER_IMAGE")]
    pub image: String,

    #[arg(value_name = "USER")]
    pub user: String,

    #[arg(value_name = "PASS")]
    pub password: String,

    #[arg(last = true, value_name = "START_COMMAND")]
    pub start_command: Vec<String>,

    #[arg(
        short = 'w',
        long,
        value_name = "DIR",
        help = "Working directory for container (overrides image metadata)"
    )]
    pub working_dir: Option<String>,

    #[arg(short = 'r', long, help = "Runs in the context of the root user")]
    pub run_as_root: bool,

    #[arg(
        short = 'e',
        long = "env",
        value_name = "KEY[=VALUE]",
        help = "Environment variables (can be passed multiple times)"
    )]
    pub env: Vec<String>,

    #[arg(
        short = 'c',
        long,
        default_value_t = 100,
        value_parser = clap::value_parser!(u32).range(1..=100),
        help = "Relative CPU weight for the container (valid values: 1-100)"
    )]
    pub cpu_weight: u32,

    #[arg(short = 'm', long, default_value_t = 128, help = "Memory limit for container in MB")]
    pub memory_mb: u64,

    #[arg(short = 'd', long, default_value_t = 0, help = "Disk limit for container in MB")]
    pub disk_mb: u64,

    #[arg(
        short = 'p',
        long,
        value_name = "PORTS",
        help = "Ports to expose on the container (comma delimited)"
    )]
    pub ports: Option<String>,

    #[arg(
        short = 'M',
        long,
        value_name = "PORT",
        help = "Selects the port used to healthcheck the app"
    )]
    pub monitor_port: Option<u16>,

    #[arg(
        short = 'U',
        long,
        value_name = "PORT:/PATH",
        help = "Uses HTTP to healthcheck the app, e.g. 8080:/health"
    )]
    pub monitor_url: Option<String>,

    #[arg(
        long,
        value_name = "DURATION",
        default_value = "1s",
        value_parser = parse_duration,
        help = "Timeout for the app healthcheck"
    )]
    pub monitor_timeout: Duration,

    #[arg(long, help = "Disables healthchecking for the app")]
    pub no_monitor: bool,

    #[arg(
        short = 'R',
        long,
        value_name = "PORT:HOST[,PORT:HOST]",
        help = "Route mappings to exposed ports, e.g. 8080:foo,9090:bar"
    )]
    pub routes: Option<String>,

    #[arg(long, help = "Registers no routes for the app")]
    pub no_routes: bool,

    #[arg(
        short = 'i',
        long,
        default_value_t = 1,
        value_parser = clap::value_parser!(u32).range(1..),
        help = "Number of application instances to spawn on launch"
    )]
    pub instances: u32,

    #[arg(
        short = 't',
        long,
        value_name = "DURATION",
        default_value = "120",
        value_parser = parse_duration,
        help = "Polling timeout for app to start (seconds, or with ms/s/m suffix)"
    )]
    pub timeout: Duration,

    #[arg(
        long,
        value_name = "TYPE",
        help = "Service type (defaults to the image name, then the service name)"
    )]
    pub service_type: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Yaml,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}

/// Parses `120`, `120s`, `500ms` or `2m`; a bare number is seconds
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let invalid = || format!("Invalid duration '{}'. Use e.g. 120, 30s, 500ms or 2m", s);

    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => s.split_at(idx),
        None => (s, "s"),
    };
    let value = digits.parse::<u64>().map_err(|_| invalid())?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        _ => Err(invalid()),
    }
}
