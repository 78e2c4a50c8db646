use super::{ConnectionRecord, ServiceCredentials, ServiceDescriptor, ServiceType};
use std::collections::BTreeMap;

pub struct MysqlService;

impl ServiceType for MysqlService {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn environment(&self, credentials: &ServiceCredentials) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("MYSQL_USER".to_string(), credentials.user.clone()),
            ("MYSQL_DATABASE".to_string(), credentials.user.clone()),
            ("MYSQL_PASSWORD".to_string(), credentials.password.clone()),
            ("MYSQL_ROOT_PASSWORD".to_string(), credentials.password.clone()),
        ])
    }

    fn render_descriptor(
        &self,
        credentials: &ServiceCredentials,
        host: &str,
        port: u16,
    ) -> ServiceDescriptor {
        ServiceDescriptor::new(
            self.name(),
            "mysql",
            ConnectionRecord {
                scheme: "mysql".to_string(),
                user: credentials.user.clone(),
                password: credentials.password.clone(),
                host: host.to_string(),
                port,
                database: credentials.user.clone(),
            },
        )
    }
}
