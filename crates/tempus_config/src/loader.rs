//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "tempus.toml";

/// Loads and validates a `tempus.toml` configuration from a project directory.
///
/// Reads `<project_dir>/tempus.toml`, parses it, and validates required fields.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE_NAME))
}

/// Loads and validates a configuration from an explicit file path.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `tempus.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and configuration values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.design.name.is_empty() {
        return Err(ConfigError::MissingField("design.name".to_string()));
    }
    if config.design.netlist.is_empty() {
        return Err(ConfigError::MissingField("design.netlist".to_string()));
    }
    if config.check_timing.loop_vertex_budget == Some(0) {
        return Err(ConfigError::ValidationError(
            "check_timing.loop_vertex_budget must be at least 1".to_string(),
        ));
    }
    Ok(())
}
