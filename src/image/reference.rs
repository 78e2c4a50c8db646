//! Image reference parsing and root filesystem URIs

use super::ImageError;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

const DEFAULT_TAG: &str = "latest";
const OFFICIAL_NAMESPACE: &str = "library";

fn component_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z0-9]+(?:(?:[._]|__|-+)[a-z0-9]+)*$").unwrap())
}

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").unwrap())
}

/// A parsed `[registry/]repository[:tag]` reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry host (with port), `None` for the public Docker Hub
    pub registry: Option<String>,
    pub repository: String,
    pub tag: String,
}

impl ImageReference {
    pub fn parse(reference: &str) -> Result<Self, ImageError> {
        let invalid = |reason: &str| ImageError::InvalidReference {
            reference: reference.to_string(),
            reason: reason.to_string(),
        };

        if reference.is_empty() {
            return Err(invalid("reference is empty"));
        }
        if reference.contains('@') {
            return Err(invalid("digest references are not supported"));
        }

        let (registry, remainder) = match reference.split_once('/') {
            Some((first, rest))
                if first.contains('.') || first.contains(':') || first == "localhost" =>
            {
                (Some(first.to_string()), rest)
            }
            _ => (None, reference),
        };

        // A ':' after the last '/' separates the tag
        let last_slash = remainder.rfind('/').map_or(0, |i| i + 1);
        let (repository, tag) = match remainder[last_slash..].rfind(':') {
            Some(i) => {
                let split = last_slash + i;
                (&remainder[..split], &remainder[split + 1..])
            }
            None => (remainder, DEFAULT_TAG),
        };

        if repository.is_empty() {
            return Err(invalid("repository is empty"));
        }
        for component in repository.split('/') {
            if !component_regex().is_match(component) {
                return Err(invalid(&format!(
                    "repository component '{}' must be lowercase alphanumerics separated by '.', '_' or '-'",
                    component
                )));
            }
        }
        if !tag_regex().is_match(tag) {
            return Err(invalid(&format!("invalid tag '{}'", tag)));
        }

        let repository = if registry.is_none() && !repository.contains('/') {
            format!("{}/{}", OFFICIAL_NAMESPACE, repository)
        } else {
            repository.to_string()
        };

        Ok(Self {
            registry,
            repository,
            tag: tag.to_string(),
        })
    }

    /// Final path component of the repository, e.g. `postgres` for `myrepo/postgres`
    pub fn basename(&self) -> &str {
        self.repository
            .rsplit('/')
            .next()
            .unwrap_or(&self.repository)
    }

    /// Root filesystem URI understood by the app runner
    ///
    /// `docker:///library/postgres#latest` for Docker Hub images and
    /// `docker://registry.example.com:5000/team/db#1.0` otherwise.
    pub fn rootfs(&self) -> String {
        format!(
            "docker://{}/{}#{}",
            self.registry.as_deref().unwrap_or(""),
            self.repository,
            self.tag
        )
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(registry) = &self.registry {
            write!(f, "{}/", registry)?;
        }
        write!(f, "{}:{}", self.repository, self.tag)
    }
}
