//! Task engine
//!
//! This module holds the task registry, dependency resolution, cycle
//! detection, the incremental build cache and the execution engine.

pub mod cache;
pub mod command;
pub mod context;
pub mod engine;
pub mod graph;
pub mod interpolate;
pub mod name;
pub mod registry;
pub mod task;

// Re-export main types
pub use cache::{BuildCache, Fingerprint, DEFAULT_CACHE_FILE};
pub use command::{command_action, execute_command, run_step, CommandStep, ShellCommand};
pub use context::{Context, Verbosity};
pub use graph::Graph;
pub use interpolate::{interpolate, interpolate_strict};
pub use name::{glob_files, is_file_task, is_normal_task, normalize_path, normalize_task_name};
pub use registry::Registry;
pub use task::{Action, ActionResult, Task, TaskKind};
