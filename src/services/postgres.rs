use super::{ConnectionRecord, ServiceCredentials, ServiceDescriptor, ServiceType};
use std::collections::BTreeMap;

pub struct PostgresService;

impl ServiceType for PostgresService {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn environment(&self, credentials: &ServiceCredentials) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("POSTGRES_USER".to_string(), credentials.user.clone()),
            ("POSTGRES_PASSWORD".to_string(), credentials.password.clone()),
        ])
    }

    fn render_descriptor(
        &self,
        credentials: &ServiceCredentials,
        host: &str,
        port: u16,
    ) -> ServiceDescriptor {
        // The image creates one database named after the user
        ServiceDescriptor::new(
            self.name(),
            "postgresql",
            ConnectionRecord {
                scheme: "postgres".to_string(),
                user: credentials.user.clone(),
                password: credentials.password.clone(),
                host: host.to_string(),
                port,
                database: credentials.user.clone(),
            },
        )
    }
}
