pub mod commands;
pub mod exit_codes;
pub mod handlers;
pub mod output;

pub use commands::{
    BindServiceArgs, CliArgs, Commands, CreateServiceArgs, ListServicesArgs, RemoveServiceArgs,
};
pub use output::{OutputFormat, OutputFormatter};
