use svcprov::cli::commands::{CliArgs, Commands};
use svcprov::cli::exit_codes;
use svcprov::cli::handlers::{
    handle_bind_service, handle_create_service, handle_list_services, handle_remove_service,
};
use svcprov::util::logging::{init_logging, parse_level, LoggingConfig};
use svcprov::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // Help and version requests print to stdout and succeed
            let code = if e.use_stderr() {
                exit_codes::INVALID_SYNTAX
            } else {
                exit_codes::SUCCESS
            };
            std::process::exit(code);
        }
    };
    init_logging_from_args(&args);

    debug!("svcprov v{} starting", VERSION);

    let exit_code = match &args.command {
        Commands::ListServices(list_args) => handle_list_services(list_args).await,
        Commands::BindService(bind_args) => handle_bind_service(bind_args, args.quiet).await,
        Commands::RemoveService(remove_args) => {
            handle_remove_service(remove_args, args.quiet).await
        }
        Commands::CreateService(create_args) => {
            handle_create_service(create_args, args.quiet).await
        }
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        let level_str = env::var("SVCPROV_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        parse_level(&level_str)
    };

    let use_json = env::var("SVCPROV_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);

    init_logging(LoggingConfig {
        level,
        use_json,
        ..LoggingConfig::with_level(level)
    });
}
