//! Taskfile discovery and parsing

use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult, DrakeError};
use std::fs;
use std::path::{Path, PathBuf};

/// Taskfile names to search for, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["Drakefile.yml", "Drakefile.yaml", "drake.yml"];

/// Find the taskfile by searching `start_dir` and its parents
pub fn find_config_file_from(start_dir: &Path) -> ConfigResult<PathBuf> {
    let mut searched_paths = Vec::new();

    for dir in start_dir.ancestors() {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = dir.join(file_name);
            if config_path.is_file() {
                return Ok(config_path);
            }
            searched_paths.push(config_path.display().to_string());
        }
    }

    Err(ConfigError::NotFound(searched_paths.join(", ")))
}

/// Parse a taskfile from a path
pub fn parse_config_file(path: &Path) -> Result<Config, DrakeError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        ConfigError::Invalid(format!("Failed to read {}: {}", path.display(), e))
    })?;
    parse_config(&contents)
}

/// Parse a taskfile from a string
pub fn parse_config(yaml: &str) -> Result<Config, DrakeError> {
    Ok(serde_yaml::from_str(yaml)?)
}
