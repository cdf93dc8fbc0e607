//! Configuration validation.

use tether_common::ConfigError;

use crate::schema::TetherConfig;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &TetherConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    let url = config.relay.relay_url.trim();
    if url.is_empty() {
        errors.push("relay.relay_url must not be empty".into());
    } else if !url.starts_with("ws://") && !url.starts_with("wss://") {
        errors.push(format!(
            "relay.relay_url must use ws:// or wss:// (got '{url}')"
        ));
    }

    for entry in &config.workspaces {
        if entry.name.trim().is_empty() {
            errors.push(format!(
                "workspace entry '{}' has an empty name",
                entry.path.display()
            ));
        }
        if entry.path.as_os_str().is_empty() {
            errors.push(format!("workspace '{}' has an empty path", entry.name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
