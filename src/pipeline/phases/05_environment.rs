use super::DeriveError;
use std::collections::BTreeMap;

pub const PROCESS_GUID: &str = "PROCESS_GUID";

/// Builds the container environment
///
/// Entries are `KEY=VALUE` (split on the first `=`) or a bare `KEY`, whose
/// value is looked up in the invoking environment. Later entries replace
/// earlier ones, `PROCESS_GUID` defaults to the service name and the service
/// type's variables are applied last.
pub fn build_environment<F>(
    service_name: &str,
    entries: &[String],
    lookup: F,
    service_vars: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>, DeriveError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut environment = BTreeMap::new();

    for entry in entries {
        let (key, value) = match entry.split_once('=') {
            Some((key, value)) => (key, value.to_string()),
            None => (entry.as_str(), lookup(entry).unwrap_or_default()),
        };
        if key.is_empty() {
            return Err(DeriveError::InvalidEnvironment(entry.clone()));
        }
        environment.insert(key.to_string(), value);
    }

    environment
        .entry(PROCESS_GUID.to_string())
        .or_insert_with(|| service_name.to_string());

    for (key, value) in service_vars {
        environment.insert(key.clone(), value.clone());
    }

    Ok(environment)
}
