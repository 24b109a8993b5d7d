//! Taskfile validation

use crate::config::types::Config;
use crate::error::{ConfigError, ConfigResult};
use crate::runner::normalize_task_name;
use regex::Regex;
use std::sync::LazyLock;

static VARIABLE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]\w*$").expect("valid variable name regex"));

/// True if `name` may be used as a variable name
pub fn is_valid_variable_name(name: &str) -> bool {
    VARIABLE_NAME.is_match(name)
}

/// Validate a parsed taskfile
///
/// Task names and prerequisites are checked when they are registered; this
/// covers the settings that are not.
pub fn validate_config(config: &Config) -> ConfigResult<()> {
    if let Some(interpreter) = &config.interpreter {
        if interpreter.is_empty() {
            return Err(ConfigError::Invalid(
                "interpreter must name a program".to_string(),
            ));
        }
    }

    for name in config.vars.keys() {
        if !is_valid_variable_name(name) {
            return Err(ConfigError::IllegalVariableName(name.clone()));
        }
    }

    if let Some(default) = &config.default {
        let declared = normalize_task_name(default).is_ok_and(|default| {
            config
                .tasks
                .keys()
                .any(|name| normalize_task_name(name).is_ok_and(|name| name == default))
        });
        if !declared {
            return Err(ConfigError::DefaultTaskNotFound(default.clone()));
        }
    }

    Ok(())
}
