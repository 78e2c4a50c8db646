use super::{ServiceCredentials, ServiceDescriptor};
use super::{MysqlService, PostgresService};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown service type '{name}'. Known types: {known}")]
    UnknownServiceType { name: String, known: String },
}

/// A provisionable backing service type
pub trait ServiceType: Send + Sync {
    /// Registry key, e.g. "postgres"
    fn name(&self) -> &'static str;

    /// Environment variables the service image reads its credentials from
    fn environment(&self, credentials: &ServiceCredentials) -> BTreeMap<String, String>;

    /// Descriptor for an instance reachable at `host:port`
    fn render_descriptor(
        &self,
        credentials: &ServiceCredentials,
        host: &str,
        port: u16,
    ) -> ServiceDescriptor;
}

pub struct ServiceTypeRegistry {
    types: HashMap<String, Arc<dyn ServiceType>>,
}

impl ServiceTypeRegistry {
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(PostgresService));
        registry.register(Arc::new(MysqlService));
        registry
    }

    /// Adds or replaces the entry under the type's name
    pub fn register(&mut self, service_type: Arc<dyn ServiceType>) {
        self.types
            .insert(service_type.name().to_string(), service_type);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn get(&self, name: &str) -> Result<&dyn ServiceType, RegistryError> {
        self.types
            .get(name)
            .map(|t| t.as_ref())
            .ok_or_else(|| RegistryError::UnknownServiceType {
                name: name.to_string(),
                known: self.names().join(", "),
            })
    }

    pub fn environment(
        &self,
        name: &str,
        credentials: &ServiceCredentials,
    ) -> Result<BTreeMap<String, String>, RegistryError> {
        Ok(self.get(name)?.environment(credentials))
    }

    pub fn render_descriptor(
        &self,
        name: &str,
        credentials: &ServiceCredentials,
        host: &str,
        port: u16,
    ) -> Result<ServiceDescriptor, RegistryError> {
        Ok(self.get(name)?.render_descriptor(credentials, host, port))
    }
}

impl Default for ServiceTypeRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ConnectionRecord;

    struct RedisService;

    impl ServiceType for RedisService {
        fn name(&self) -> &'static str {
            "redis"
        }

        fn environment(&self, credentials: &ServiceCredentials) -> BTreeMap<String, String> {
            BTreeMap::from([("REDIS_PASSWORD".to_string(), credentials.password.clone())])
        }

        fn render_descriptor(
            &self,
            credentials: &ServiceCredentials,
            host: &str,
            port: u16,
        ) -> ServiceDescriptor {
            ServiceDescriptor::new(
                self.name(),
                "redis",
                ConnectionRecord {
                    scheme: "redis".to_string(),
                    user: credentials.user.clone(),
                    password: credentials.password.clone(),
                    host: host.to_string(),
                    port,
                    database: "0".to_string(),
                },
            )
        }
    }

    #[test]
    fn test_defaults_registered() {
        let registry = ServiceTypeRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["mysql", "postgres"]);
        assert!(registry.contains("postgres"));
        assert!(!registry.contains("redis"));
    }

    #[test]
    fn test_unknown_type_is_error() {
        let registry = ServiceTypeRegistry::with_defaults();
        let credentials = ServiceCredentials::new("alice", "pw");

        let err = registry.environment("mongo", &credentials).unwrap_err();
        assert_eq!(
            err,
            RegistryError::UnknownServiceType {
                name: "mongo".to_string(),
                known: "mysql, postgres".to_string(),
            }
        );
        assert!(registry
            .render_descriptor("mongo", &credentials, "10.0.0.1", 1)
            .is_err());
    }

    #[test]
    fn test_register_new_type() {
        let mut registry = ServiceTypeRegistry::with_defaults();
        registry.register(Arc::new(RedisService));

        let credentials = ServiceCredentials::new("default", "pw");
        let env = registry.environment("redis", &credentials).unwrap();
        assert_eq!(env.get("REDIS_PASSWORD"), Some(&"pw".to_string()));

        let descriptor = registry
            .render_descriptor("redis", &credentials, "10.0.0.9", 6379)
            .unwrap();
        assert_eq!(descriptor.url(), "redis://default:pw@10.0.0.9:6379/0");
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let registry = ServiceTypeRegistry::with_defaults();
        let credentials = ServiceCredentials::new("alice", "s3cr3t");

        for name in registry.names() {
            let first = registry
                .render_descriptor(name, &credentials, "10.0.0.4", 5432)
                .unwrap()
                .to_json()
                .unwrap();
            let second = registry
                .render_descriptor(name, &credentials, "10.0.0.4", 5432)
                .unwrap()
                .to_json()
                .unwrap();
            assert_eq!(first, second);
        }
    }
}
