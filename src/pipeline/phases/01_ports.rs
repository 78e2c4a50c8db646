use super::{DeriveError, Resolved, Source, DEFAULT_PORT};
use crate::image::ImageMetadata;

/// Resolves the exposed port set, ascending and without duplicates
///
/// An explicit comma-separated list wins over the image's declared ports,
/// which win over [`DEFAULT_PORT`].
pub fn resolve_exposed_ports(
    explicit: Option<&str>,
    metadata: &ImageMetadata,
) -> Result<Resolved<Vec<u16>>, DeriveError> {
    if let Some(list) = explicit {
        return parse_port_list(list).map(|ports| Resolved::new(ports, Source::Explicit));
    }

    if !metadata.exposed_ports.is_empty() {
        let mut ports = metadata.exposed_ports.clone();
        ports.sort_unstable();
        ports.dedup();
        return Ok(Resolved::new(ports, Source::Image));
    }

    Ok(Resolved::new(vec![DEFAULT_PORT], Source::Default))
}

fn parse_port_list(list: &str) -> Result<Vec<u16>, DeriveError> {
    let mut ports = list
        .split(',')
        .map(|token| {
            token
                .trim()
                .parse::<u16>()
                .map_err(|_| DeriveError::InvalidPort(token.to_string()))
        })
        .collect::<Result<Vec<u16>, DeriveError>>()?;

    // Numeric order, "9" sorts before "80"
    ports.sort_unstable();
    ports.dedup();
    Ok(ports)
}
