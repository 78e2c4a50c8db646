use super::DeriveError;
use crate::runner::{Route, RouteOverride};

/// Parses `port:hostname[,port:hostname]`
pub fn parse_route_overrides(spec: &str) -> Result<Vec<RouteOverride>, DeriveError> {
    spec.split(',')
        .map(|entry| {
            let invalid = || DeriveError::InvalidRoute(entry.to_string());
            let (port, hostname) = entry.trim().split_once(':').ok_or_else(invalid)?;
            let port = port.trim().parse::<u16>().map_err(|_| invalid())?;
            let hostname = hostname.trim();
            if hostname.is_empty() || hostname.contains(char::is_whitespace) {
                return Err(invalid());
            }
            Ok(RouteOverride {
                port,
                hostname_prefix: hostname.to_string(),
            })
        })
        .collect()
}

/// Qualifies route overrides with the system domain
///
/// Without overrides the app gets `<name>.<domain>` on its first exposed port.
/// Suppressed routing yields no routes at all.
pub fn resolve_routes(
    service_name: &str,
    overrides: &[RouteOverride],
    no_routes: bool,
    exposed_ports: &[u16],
    system_domain: &str,
) -> Vec<Route> {
    if no_routes {
        return Vec::new();
    }

    if overrides.is_empty() {
        return exposed_ports
            .first()
            .map(|&port| Route {
                hostname: format!("{}.{}", service_name, system_domain),
                port,
            })
            .into_iter()
            .collect();
    }

    overrides
        .iter()
        .map(|o| Route {
            hostname: format!("{}.{}", o.hostname_prefix, system_domain),
            port: o.port,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    const DOMAIN: &str = "192.168.11.11.xip.io";

    #[test]
    fn test_parse_overrides() {
        let overrides = parse_route_overrides("5432:db, 8080:admin").unwrap();
        assert_eq!(
            overrides,
            vec![
                RouteOverride {
                    port: 5432,
                    hostname_prefix: "db".to_string()
                },
                RouteOverride {
                    port: 8080,
                    hostname_prefix: "admin".to_string()
                },
            ]
        );
    }

    #[parameterized(
        missing_colon = { "5432db" },
        bad_port = { "pg:db" },
        empty_host = { "5432:" },
        spaced_host = { "5432:my db" },
        trailing_comma = { "5432:db," },
    )]
    fn test_malformed_overrides(spec: &str) {
        assert!(matches!(
            parse_route_overrides(spec),
            Err(DeriveError::InvalidRoute(_))
        ));
    }

    #[test]
    fn test_default_route_on_first_port() {
        let routes = resolve_routes("db", &[], false, &[80, 5432], DOMAIN);
        assert_eq!(
            routes,
            vec![Route {
                hostname: "db.192.168.11.11.xip.io".to_string(),
                port: 80,
            }]
        );
    }

    #[test]
    fn test_overrides_replace_default() {
        let overrides = parse_route_overrides("5432:pg").unwrap();
        let routes = resolve_routes("db", &overrides, false, &[80, 5432], DOMAIN);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].hostname, "pg.192.168.11.11.xip.io");
        assert_eq!(routes[0].port, 5432);
    }

    #[test]
    fn test_no_routes() {
        let overrides = parse_route_overrides("5432:pg").unwrap();
        assert!(resolve_routes("db", &overrides, true, &[5432], DOMAIN).is_empty());
        assert!(resolve_routes("db", &[], true, &[5432], DOMAIN).is_empty());
    }
}
