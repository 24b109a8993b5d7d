//! Error types for Drake

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Drake operations
pub type Result<T> = std::result::Result<T, DrakeError>;

/// Main error type for Drake
#[derive(Error, Debug)]
pub enum DrakeError {
    /// Task registration errors
    #[error("{0}")]
    Registration(#[from] RegistrationError),

    /// Task lookup and dependency resolution errors
    #[error("{0}")]
    Resolution(#[from] ResolutionError),

    /// Every cycle found in the prerequisite graph
    #[error("{}", .0.join(", "))]
    CyclicDependency(Vec<String>),

    /// Task execution errors
    #[error("{0}")]
    Execution(#[from] ExecutionError),

    /// Build cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Taskfile errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Variable interpolation errors
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Errors raised while registering tasks
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("blank task name")]
    BlankName,

    #[error("wildcard task name not allowed: {0}")]
    WildcardName(String),

    #[error("task already exists: {0}")]
    DuplicateTask(String),

    #[error("{task}: duplicate prerequisite: {prerequisite}")]
    DuplicatePrerequisite { task: String, prerequisite: String },

    #[error("invalid glob pattern '{pattern}': {error}")]
    InvalidGlob { pattern: String, error: String },
}

/// Errors raised while looking up tasks and resolving their prerequisites
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("missing task: {0}")]
    MissingTask(String),

    #[error("{task}: missing prerequisite task: {prerequisite}")]
    MissingPrerequisite { task: String, prerequisite: String },

    #[error("no task specified")]
    NoTaskSpecified,
}

/// Task execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("{task}: missing prerequisite file: {path}")]
    MissingPrerequisiteFile { task: String, path: String },

    #[error("{task}: {source}")]
    ActionFailed {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{command}: command failed with exit code {code:?}")]
    CommandFailed { command: String, code: Option<i32> },

    #[error("{command}: failed to start: {error}")]
    Spawn { command: String, error: String },
}

/// Build cache load and save errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("corrupt cache file '{path}': {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{path}': {error}")]
    Write { path: PathBuf, error: String },

    #[error("failed to stat '{path}': {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Taskfile parsing and validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find taskfile (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Default task '{0}' is not defined")]
    DefaultTaskNotFound(String),

    #[error("Illegal variable name: {0}")]
    IllegalVariableName(String),

    #[error("--directory missing or not a directory: {0}")]
    BadDirectory(PathBuf),
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),

    #[error("Recursive interpolation detected")]
    RecursiveInterpolation,
}

/// Specialized result type for registration operations
pub type RegistrationResult<T> = std::result::Result<T, RegistrationError>;

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;

