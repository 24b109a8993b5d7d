//! Run context
//!
//! The context carries the mode flags and settings a run is executed with.
//! It is built once and passed by reference to `run` and `execute`.

use crate::error::DrakeError;
use colored::Colorize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;

/// Run configuration
#[derive(Debug, Clone)]
pub struct Context {
    /// Run file tasks even when they are up to date
    pub always_make: bool,

    /// Report what would run without running actions or writing the cache
    pub dry_run: bool,

    /// Print visible tasks instead of running
    pub list_tasks: bool,

    /// Print all tasks, hidden ones included, instead of running
    pub list_all: bool,

    /// Exit the process on fatal errors instead of returning them
    pub abort_exits: bool,

    /// Cache file path; relative paths resolve against the registry directory
    pub cache_path: Option<PathBuf>,

    /// Variables (from the taskfile and the command line)
    pub vars: HashMap<String, String>,

    /// Shell used by command actions (e.g., ["bash", "-c"])
    pub interpreter: Vec<String>,

    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

/// Default shell for command actions
pub fn default_interpreter() -> Vec<String> {
    if cfg!(windows) {
        vec!["cmd".to_string(), "/C".to_string()]
    } else {
        vec!["sh".to_string(), "-c".to_string()]
    }
}

impl Context {
    /// Create a new context with default settings
    pub fn new() -> Self {
        Context {
            always_make: false,
            dry_run: false,
            list_tasks: false,
            list_all: false,
            abort_exits: false,
            cache_path: None,
            vars: HashMap::new(),
            interpreter: default_interpreter(),
            verbosity: Verbosity::Normal,
        }
    }

    pub fn with_always_make(mut self, always_make: bool) -> Self {
        self.always_make = always_make;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_list_tasks(mut self, list_tasks: bool) -> Self {
        self.list_tasks = list_tasks;
        self
    }

    pub fn with_list_all(mut self, list_all: bool) -> Self {
        self.list_all = list_all;
        self
    }

    pub fn with_abort_exits(mut self, abort_exits: bool) -> Self {
        self.abort_exits = abort_exits;
        self
    }

    /// Override the cache file location
    pub fn with_cache_path(mut self, path: PathBuf) -> Self {
        self.cache_path = Some(path);
        self
    }

    /// Set variables
    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Get a variable value
    pub fn get_var(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    /// True in either listing mode
    pub fn is_listing(&self) -> bool {
        self.list_tasks || self.list_all
    }

    /// Pass a result through, or exit the process if it failed and
    /// `abort_exits` is set
    pub fn abort_on_error<T>(&self, result: Result<T, DrakeError>) -> Result<T, DrakeError> {
        match result {
            Err(e) if self.abort_exits => {
                self.print_error(&e.to_string());
                process::exit(1);
            }
            other => other,
        }
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "drake:".green(), message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{} {}", "drake: error:".red().bold(), message);
        }
    }

    /// Print debug message (only in verbose mode)
    pub fn print_debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("{} {}", "drake:".dimmed(), message);
        }
    }

    /// Print task start message
    pub fn print_task_start(&self, task_name: &str) {
        self.print_info(&format!("task: {}", task_name.bold()));
    }

    /// Print task complete message
    pub fn print_task_complete(&self, task_name: &str) {
        self.print_debug(&format!("task completed: {}", task_name));
    }

    /// Print task skip message
    pub fn print_task_skip(&self, task_name: &str, reason: &str) {
        self.print_info(&format!("skipping {}: {}", task_name, reason));
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
