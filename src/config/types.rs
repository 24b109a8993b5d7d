//! Taskfile types
//!
//! This module defines the data structures that represent a Drakefile.yml.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Top-level taskfile structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Task run when no task is named on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Interpreter used for commands (e.g., ["bash", "-c"])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Vec<String>>,

    /// Default variable values
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,

    /// Tasks keyed by name
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,
}

/// A task definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Task {
    /// Description shown in task listings; tasks without one are hidden
    #[serde(default, alias = "description", skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,

    /// Prerequisite task names, file paths or globs
    #[serde(
        default,
        alias = "deps",
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_string_or_list"
    )]
    pub prereqs: Vec<String>,

    /// Commands to run, in order; a `parallel` entry runs its group concurrently
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "deserialize_commands"
    )]
    pub run: Vec<Command>,
}

/// A command to execute
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Command {
    /// Simple string command
    Simple(String),

    /// Complex command with additional options
    Complex(CommandDetail),

    /// Commands started together
    Parallel(ParallelGroup),
}

/// A group of commands run concurrently
///
/// ```yaml
/// run:
///   - parallel:
///       - cc -c a.c
///       - cc -c b.c
///   - cc -o app a.o b.o
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ParallelGroup {
    #[serde(deserialize_with = "deserialize_commands")]
    pub parallel: Vec<Command>,
}

/// Detailed command specification
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CommandDetail {
    /// The command to execute
    pub exec: String,

    /// What to print when running (defaults to exec)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub print: Option<String>,

    /// Whether to suppress the command echo
    #[serde(default)]
    pub quiet: bool,

    /// Working directory for the command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Accept a single string or a list of strings
fn deserialize_string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(vec![s]),
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| String::deserialize(item).map_err(D::Error::custom))
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("expected a string or a list of strings")),
    }
}

/// Accept a single command or a list of commands
fn deserialize_commands<'de, D>(deserializer: D) -> Result<Vec<Command>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(vec![Command::Simple(s)]),
        value @ Value::Mapping(_) => Ok(vec![Command::deserialize(value).map_err(D::Error::custom)?]),
        Value::Sequence(seq) => seq
            .into_iter()
            .map(|item| Command::deserialize(item).map_err(D::Error::custom))
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("run must be a string, object, or array")),
    }
}
