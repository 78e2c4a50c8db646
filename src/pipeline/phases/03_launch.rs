use super::{DeriveError, Resolved, Source, DEFAULT_WORKING_DIR};
use crate::image::ImageMetadata;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartCommand {
    pub command: String,
    pub args: Vec<String>,
}

impl StartCommand {
    /// Splits `argv` into command and arguments, `None` when empty
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (command, args) = argv.split_first()?;
        Some(Self {
            command: command.clone(),
            args: args.to_vec(),
        })
    }

    pub fn display(&self) -> String {
        std::iter::once(self.command.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub fn resolve_working_dir(explicit: Option<&str>, metadata: &ImageMetadata) -> Resolved<String> {
    match (explicit.filter(|d| !d.is_empty()), metadata.working_dir.as_deref()) {
        (Some(dir), _) => Resolved::new(dir.to_string(), Source::Explicit),
        (None, Some(dir)) => Resolved::new(dir.to_string(), Source::Image),
        (None, None) => Resolved::new(DEFAULT_WORKING_DIR.to_string(), Source::Default),
    }
}

/// The explicit command line wins over the image's entrypoint and command
pub fn resolve_start_command(
    explicit: Option<&[String]>,
    metadata: &ImageMetadata,
) -> Result<Resolved<StartCommand>, DeriveError> {
    if let Some(command) = explicit.and_then(StartCommand::from_argv) {
        return Ok(Resolved::new(command, Source::Explicit));
    }

    StartCommand::from_argv(&metadata.start_command)
        .map(|command| Resolved::new(command, Source::Image))
        .ok_or(DeriveError::MissingStartCommand)
}
